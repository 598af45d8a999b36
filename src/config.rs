//! Analysis settings, optionally read from a TOML file.
//!
//! Every key is optional:
//!
//! ```toml
//! batch_size = 10000
//! frequency_ceiling = 1000000
//!
//! [word_cloud]
//! top_k = 50
//! source_limit = 100000
//!
//! [common_words]
//! sample_size = 1000000
//!
//! [rate_limit]
//! max_requests = 100
//! window_secs = 900
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AnalyticsError, Result};
use crate::pipeline::AnalysisKind;
use crate::tokenizer::{DEFAULT_REJECTED_SUFFIXES, DEFAULT_STOP_WORDS, StopWords, WordFilter};

/// Documents accumulated per request unless overridden.
pub const DEFAULT_DOCUMENT_CAP: usize = 10_000;
/// Hard cursor limit of the word cloud.
pub const DEFAULT_WORD_CLOUD_SOURCE_LIMIT: usize = 100_000;

/// Fully resolved settings for one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Ranked entries returned (words for the association graph).
    pub top_k: usize,
    /// Pipeline-side early stop.
    pub document_cap: usize,
    /// Hard limit handed to the document source.
    pub source_limit: Option<usize>,
    /// Fixed `sampleSize` to report; the processed count when `None`.
    pub sample_size: Option<u64>,
    pub description: Option<String>,
    /// Wrap results in `{ metadata, results }`; bare array otherwise.
    pub include_metadata: bool,
}

impl AnalysisSettings {
    pub fn defaults_for(kind: AnalysisKind) -> Self {
        let base = Self {
            top_k: 10,
            document_cap: DEFAULT_DOCUMENT_CAP,
            source_limit: None,
            sample_size: None,
            description: None,
            include_metadata: true,
        };
        match kind {
            AnalysisKind::CommonWords => Self { top_k: 20, ..base },
            AnalysisKind::PositiveWords => Self {
                include_metadata: false,
                ..base
            },
            AnalysisKind::NegativeWords => Self {
                description: Some("Top 10 words from negative reviews (rating ≤ 3)".to_string()),
                ..base
            },
            AnalysisKind::WordCloud => Self {
                top_k: 100,
                source_limit: Some(DEFAULT_WORD_CLOUD_SOURCE_LIMIT),
                description: Some(
                    "Word cloud analysis with simplified part-of-speech filtering".to_string(),
                ),
                ..base
            },
            AnalysisKind::WordAssociations => Self { top_k: 100, ..base },
        }
    }
}

/// Per-analysis table of the config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisOverrides {
    pub top_k: Option<usize>,
    pub document_cap: Option<usize>,
    /// `0` removes the limit.
    pub source_limit: Option<usize>,
    pub sample_size: Option<u64>,
    pub description: Option<String>,
    pub include_metadata: Option<bool>,
}

impl AnalysisOverrides {
    fn apply(&self, mut settings: AnalysisSettings) -> AnalysisSettings {
        if let Some(top_k) = self.top_k {
            settings.top_k = top_k;
        }
        if let Some(cap) = self.document_cap {
            settings.document_cap = cap;
        }
        if let Some(limit) = self.source_limit {
            settings.source_limit = (limit > 0).then_some(limit);
        }
        if self.sample_size.is_some() {
            settings.sample_size = self.sample_size;
        }
        if self.description.is_some() {
            settings.description = self.description.clone();
        }
        if let Some(include) = self.include_metadata {
            settings.include_metadata = include;
        }
        settings
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Progress is logged every `batch_size` documents.
    pub batch_size: usize,
    /// Distinct words kept per frequency pass, `0` for no ceiling.
    pub frequency_ceiling: usize,
    /// Distinct `(word, neighbor)` pairs kept per association pass, `0` for no ceiling.
    pub association_ceiling: usize,
    pub window_radius: usize,
    pub neighbors_per_word: usize,
    pub stop_words: Vec<String>,
    pub rejected_suffixes: Vec<String>,
    pub rate_limit: RateLimitConfig,
    pub common_words: AnalysisOverrides,
    pub positive_words: AnalysisOverrides,
    pub negative_words: AnalysisOverrides,
    pub word_cloud: AnalysisOverrides,
    pub word_associations: AnalysisOverrides,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            frequency_ceiling: 1_000_000,
            association_ceiling: 8_000_000,
            window_radius: 3,
            neighbors_per_word: 10,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
            rejected_suffixes: DEFAULT_REJECTED_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rate_limit: RateLimitConfig::default(),
            common_words: AnalysisOverrides::default(),
            positive_words: AnalysisOverrides::default(),
            negative_words: AnalysisOverrides::default(),
            word_cloud: AnalysisOverrides::default(),
            word_associations: AnalysisOverrides::default(),
        }
    }
}

impl AnalyticsConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalyticsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalyticsError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(AnalyticsError::config("batch_size must be at least 1"));
        }
        if self.window_radius == 0 {
            return Err(AnalyticsError::config("window_radius must be at least 1"));
        }
        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            return Err(AnalyticsError::config(
                "rate_limit needs max_requests and window_secs above 0",
            ));
        }
        for kind in AnalysisKind::ALL {
            if self.settings(kind).document_cap == 0 {
                return Err(AnalyticsError::config(format!(
                    "document_cap of {} must be at least 1",
                    kind
                )));
            }
        }
        Ok(())
    }

    /// Defaults for `kind` with the file's overrides applied.
    pub fn settings(&self, kind: AnalysisKind) -> AnalysisSettings {
        let overrides = match kind {
            AnalysisKind::CommonWords => &self.common_words,
            AnalysisKind::PositiveWords => &self.positive_words,
            AnalysisKind::NegativeWords => &self.negative_words,
            AnalysisKind::WordCloud => &self.word_cloud,
            AnalysisKind::WordAssociations => &self.word_associations,
        };
        overrides.apply(AnalysisSettings::defaults_for(kind))
    }

    pub fn word_filter(&self) -> WordFilter {
        WordFilter::new(
            StopWords::new(self.stop_words.iter().cloned()),
            self.rejected_suffixes.clone(),
        )
    }

    pub fn frequency_ceiling(&self) -> Option<usize> {
        (self.frequency_ceiling > 0).then_some(self.frequency_ceiling)
    }

    pub fn association_ceiling(&self) -> Option<usize> {
        (self.association_ceiling > 0).then_some(self.association_ceiling)
    }
}
