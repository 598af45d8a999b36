#![forbid(unsafe_code)]
//! # Review Text Analytics
//!
//! Read-only text analytics over a corpus of Yelp reviews, served over HTTP.
//!
//! Every request streams the matching reviews once, tokenizes them, tallies words (or word
//! pairs within a small window) and returns the highest-ranked entries as JSON:
//!
//! - `top-20-common-words`, `top-10-positive-words`, `top-10-negative-words`
//! - `word-cloud-analysis` (stop words and likely verbs/adverbs removed)
//! - `word-association-graph` (co-occurrence within ±3 words)
//!
//! ## Example
//! ```
//! use std::time::Instant;
//! use review_text_analytics::{AnalysisKind, AnalyticsConfig, MemorySource, Pipeline, RawDocument};
//!
//! let source = MemorySource::new(vec![
//!     RawDocument::rated("Great pizza and service", 5.0),
//!     RawDocument::rated("Great service", 4.0),
//!     RawDocument::rated("Bad pizza", 1.0),
//! ]);
//! let config = AnalyticsConfig::default();
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let report = runtime
//!     .block_on(Pipeline::new(&source, &config).run(AnalysisKind::CommonWords, Instant::now()))
//!     .unwrap();
//! assert_eq!(report.metadata.sample_size, 3);
//! ```

pub mod accumulator;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod ranking;
pub mod server;
pub mod source;
pub mod tokenizer;

pub use accumulator::{Accumulator, AssociationTable, FrequencyTable};
pub use config::{AnalysisSettings, AnalyticsConfig, RateLimitConfig};
pub use error::{AnalyticsError, Result};
pub use pipeline::{AnalysisKind, AnalysisReport, AnalysisResults, Pipeline};
pub use ranking::{rank_associations, select_top_k};
pub use server::{AnalyticsServer, AppState, build_router};
pub use source::{
    DocumentFilter, DocumentSource, JsonLinesSource, MemorySource, RawDocument, SourceQuery,
};
pub use tokenizer::{StopWords, Tokenizer, WordFilter};
