//! Source -> tokenizer -> accumulator -> ranking, once per request.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use log::info;
use serde::Serialize;

use crate::accumulator::{Accumulator, AssociationTable, FrequencyTable};
use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::ranking::{rank_associations, top_words};
use crate::source::{DocumentFilter, DocumentSource, DocumentStream, SourceQuery};
use crate::tokenizer::Tokenizer;

/// Reviews above this rating count as positive.
pub const POSITIVE_RATING_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    CommonWords,
    PositiveWords,
    NegativeWords,
    WordCloud,
    WordAssociations,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 5] = [
        AnalysisKind::CommonWords,
        AnalysisKind::PositiveWords,
        AnalysisKind::NegativeWords,
        AnalysisKind::WordCloud,
        AnalysisKind::WordAssociations,
    ];

    pub fn filter(&self) -> DocumentFilter {
        match self {
            AnalysisKind::PositiveWords => DocumentFilter::rating_above(POSITIVE_RATING_THRESHOLD),
            AnalysisKind::NegativeWords => {
                DocumentFilter::rating_at_most(POSITIVE_RATING_THRESHOLD)
            }
            _ => DocumentFilter::with_text(),
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisKind::CommonWords => "common words",
            AnalysisKind::PositiveWords => "positive words",
            AnalysisKind::NegativeWords => "negative words",
            AnalysisKind::WordCloud => "word cloud",
            AnalysisKind::WordAssociations => "word association",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    #[serde(rename = "_id")]
    pub id: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudWord {
    pub text: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Association {
    pub word: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordAssociations {
    pub word: String,
    pub associations: Vec<Association>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResults {
    Words(Vec<WordCount>),
    Cloud(Vec<CloudWord>),
    Associations(Vec<WordAssociations>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sample_size: u64,
    pub processed_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub results: AnalysisResults,
    /// Documents that went through the accumulator.
    #[serde(skip)]
    pub processed: usize,
}

/// Runs analyses against one document source. Holds no state between runs.
pub struct Pipeline<'a> {
    source: &'a dyn DocumentSource,
    config: &'a AnalyticsConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn DocumentSource, config: &'a AnalyticsConfig) -> Self {
        Self { source, config }
    }

    /// One full pass for `kind`. `started` is the request's arrival time; `elapsedMs` counts
    /// from it. A read failure aborts the pass and nothing partial is returned. An invalid
    /// config fails with `Config` before the source is opened.
    pub async fn run(&self, kind: AnalysisKind, started: Instant) -> Result<AnalysisReport> {
        self.config.validate()?;
        let settings = self.config.settings(kind);
        info!(
            "Starting {} analysis (document cap {}, source limit {:?})",
            kind, settings.document_cap, settings.source_limit
        );

        let query = SourceQuery::new(kind.filter())
            .with_limit(settings.source_limit)
            .with_batch_size(self.config.batch_size);
        let stream = self.source.open(query).await?;
        let cap = settings.document_cap;

        let (results, processed) = match kind {
            AnalysisKind::CommonWords
            | AnalysisKind::PositiveWords
            | AnalysisKind::NegativeWords => {
                let tokenizer = Tokenizer::new();
                let table = FrequencyTable::with_ceiling(self.config.frequency_ceiling());
                let (table, processed) = self.accumulate(stream, &tokenizer, table, cap).await?;
                let words = top_words(&table, settings.top_k)
                    .into_iter()
                    .map(|(id, count)| WordCount { id, count })
                    .collect();
                (AnalysisResults::Words(words), processed)
            }
            AnalysisKind::WordCloud => {
                let tokenizer = Tokenizer::with_filter(self.config.word_filter());
                let table = FrequencyTable::with_ceiling(self.config.frequency_ceiling());
                let (table, processed) = self.accumulate(stream, &tokenizer, table, cap).await?;
                let words = top_words(&table, settings.top_k)
                    .into_iter()
                    .map(|(text, size)| CloudWord { text, size })
                    .collect();
                (AnalysisResults::Cloud(words), processed)
            }
            AnalysisKind::WordAssociations => {
                let tokenizer = Tokenizer::new();
                let table = AssociationTable::with_ceiling(
                    self.config.window_radius,
                    self.config.association_ceiling(),
                );
                let (table, processed) = self.accumulate(stream, &tokenizer, table, cap).await?;
                let neighbors = self.config.neighbors_per_word;
                let graph = rank_associations(&table, neighbors, settings.top_k)
                    .into_iter()
                    .map(|ranked| WordAssociations {
                        word: ranked.word,
                        associations: ranked
                            .neighbors
                            .into_iter()
                            .map(|(word, count)| Association { word, count })
                            .collect(),
                    })
                    .collect();
                (AnalysisResults::Associations(graph), processed)
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            "Finished {} analysis: {} documents in {} ms",
            kind, processed, elapsed_ms
        );

        Ok(AnalysisReport {
            metadata: ReportMetadata {
                description: settings.description,
                sample_size: settings.sample_size.unwrap_or(processed as u64),
                processed_at: Utc::now(),
                elapsed_ms,
            },
            results,
            processed,
        })
    }

    /// Folds at most `cap` documents into `accumulator`.
    async fn accumulate<A: Accumulator>(
        &self,
        stream: DocumentStream,
        tokenizer: &Tokenizer,
        accumulator: A,
        cap: usize,
    ) -> Result<(A, usize)> {
        let batch_size = self.config.batch_size;
        stream
            .take(cap)
            .try_fold((accumulator, 0usize), |(mut accumulator, processed), doc| async move {
                accumulator.observe(&tokenizer.tokenize(doc.text()));
                let processed = processed + 1;
                if processed % batch_size == 0 {
                    info!("Processed {} documents", processed);
                }
                Ok((accumulator, processed))
            })
            .await
    }
}
