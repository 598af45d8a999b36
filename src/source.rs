//! Forward-only review streams.
//!
//! A [`DocumentSource`] applies the filter and the hard limit itself, so the pipeline only ever
//! sees matching documents. [`JsonLinesSource`] reads the Yelp review dump (one JSON object per
//! line), [`MemorySource`] serves a fixed vector.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use crate::error::{AnalyticsError, Result};

const READ_BUFFER_BYTES: usize = 64 * 1024;

/// The projected part of one review record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub text: Option<String>,
    /// Star rating, `stars` in the dataset.
    #[serde(default, rename = "stars")]
    pub rating: Option<f64>,
}

impl RawDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            rating: None,
        }
    }

    pub fn rated(text: impl Into<String>, rating: f64) -> Self {
        Self {
            text: Some(text.into()),
            rating: Some(rating),
        }
    }

    /// Text of the review, empty when absent.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RatingFilter {
    #[default]
    Any,
    /// `stars > threshold`
    Above(f64),
    /// `stars <= threshold`
    AtMost(f64),
}

/// Server-side match condition. Text must always be present and non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DocumentFilter {
    pub rating: RatingFilter,
}

impl DocumentFilter {
    pub fn with_text() -> Self {
        Self::default()
    }

    pub fn rating_above(threshold: f64) -> Self {
        Self {
            rating: RatingFilter::Above(threshold),
        }
    }

    pub fn rating_at_most(threshold: f64) -> Self {
        Self {
            rating: RatingFilter::AtMost(threshold),
        }
    }

    pub fn matches(&self, doc: &RawDocument) -> bool {
        if doc.text().is_empty() {
            return false;
        }
        match (self.rating, doc.rating) {
            (RatingFilter::Any, _) => true,
            (RatingFilter::Above(t), Some(stars)) => stars > t,
            (RatingFilter::AtMost(t), Some(stars)) => stars <= t,
            // a missing rating matches no rating condition
            (_, None) => false,
        }
    }
}

/// What to stream: filter, optional hard cap and read batch size.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuery {
    pub filter: DocumentFilter,
    pub limit: Option<usize>,
    pub batch_size: usize,
}

impl SourceQuery {
    pub fn new(filter: DocumentFilter) -> Self {
        Self {
            filter,
            limit: None,
            batch_size: 10_000,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

pub type DocumentStream = BoxStream<'static, Result<RawDocument>>;

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fails with `SourceUnavailable` when the store cannot be reached.
    async fn ping(&self) -> Result<()>;

    /// Open a fresh cursor. Each call starts from the beginning of the collection.
    async fn open(&self, query: SourceQuery) -> Result<DocumentStream>;
}

/// Yelp `review.json` dump read line by line.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    path: PathBuf,
    max_time: Option<Duration>,
}

struct Cursor {
    lines: Lines<BufReader<File>>,
    line: usize,
    returned: usize,
    query: SourceQuery,
    opened: Instant,
    max_time: Option<Duration>,
    batch: VecDeque<RawDocument>,
}

impl Cursor {
    async fn next_match(&mut self) -> Result<Option<RawDocument>> {
        if self.batch.is_empty() {
            self.fill_batch().await?;
        }
        Ok(self.batch.pop_front())
    }

    /// Reads ahead until `batch_size` matches are buffered, the limit is hit or the file ends.
    async fn fill_batch(&mut self) -> Result<()> {
        while self.batch.len() < self.query.batch_size.max(1) {
            if self.query.limit.is_some_and(|limit| self.returned >= limit) {
                break;
            }
            if let Some(max_time) = self.max_time {
                if self.opened.elapsed() > max_time {
                    return Err(AnalyticsError::SourceTimeout {
                        limit_ms: max_time.as_millis() as u64,
                    });
                }
            }
            let Some(raw) = self.lines.next_line().await? else {
                break;
            };
            self.line += 1;
            if raw.trim().is_empty() {
                continue;
            }
            let doc: RawDocument = serde_json::from_str(&raw).map_err(|e| {
                AnalyticsError::MalformedDocument {
                    line: self.line,
                    message: e.to_string(),
                }
            })?;
            if self.query.filter.matches(&doc) {
                self.returned += 1;
                self.batch.push_back(doc);
            }
        }
        Ok(())
    }
}

impl JsonLinesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_time: None,
        }
    }

    /// Store-side ceiling on how long one cursor may stay open.
    pub fn with_max_time(mut self, max_time: Option<Duration>) -> Self {
        self.max_time = max_time;
        self
    }

    async fn open_file(&self) -> Result<File> {
        File::open(&self.path).await.map_err(|e| {
            AnalyticsError::source_unavailable(format!("{}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl DocumentSource for JsonLinesSource {
    async fn ping(&self) -> Result<()> {
        let file = self.open_file().await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(AnalyticsError::source_unavailable(format!(
                "{} is not a file",
                self.path.display()
            )));
        }
        Ok(())
    }

    async fn open(&self, query: SourceQuery) -> Result<DocumentStream> {
        let file = self.open_file().await?;
        let cursor = Cursor {
            lines: BufReader::with_capacity(READ_BUFFER_BYTES, file).lines(),
            line: 0,
            returned: 0,
            query,
            opened: Instant::now(),
            max_time: self.max_time,
            batch: VecDeque::new(),
        };
        let stream = stream::try_unfold(cursor, |mut cursor| async move {
            let next = cursor.next_match().await?;
            Ok::<_, AnalyticsError>(next.map(|doc| (doc, cursor)))
        });
        Ok(stream.boxed())
    }
}

/// In-memory collection with the same filter semantics as the file source.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: Arc<Vec<RawDocument>>,
}

impl MemorySource {
    pub fn new(documents: Vec<RawDocument>) -> Self {
        Self {
            documents: Arc::new(documents),
        }
    }

}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn open(&self, query: SourceQuery) -> Result<DocumentStream> {
        let limit = query.limit.unwrap_or(usize::MAX);
        let matching: Vec<RawDocument> = self
            .documents
            .iter()
            .filter(|doc| query.filter.matches(doc))
            .take(limit)
            .cloned()
            .collect();
        Ok(stream::iter(matching.into_iter().map(Ok)).boxed())
    }
}
