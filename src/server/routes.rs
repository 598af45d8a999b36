//! Handlers for the review analytics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, State};
use axum::response::{IntoResponse, Response};
use log::error;

use crate::error::Result;
use crate::pipeline::{AnalysisKind, Pipeline};
use crate::server::{AppState, RequestStart};

/// GET /
pub async fn index() -> &'static str {
    "Yelp API is running!"
}

/// GET /api/review/top-20-common-words
pub async fn common_words(
    State(state): State<Arc<AppState>>,
    Extension(start): Extension<RequestStart>,
) -> Result<Response> {
    analyze(&state, AnalysisKind::CommonWords, start).await
}

/// GET /api/review/top-10-positive-words
pub async fn positive_words(
    State(state): State<Arc<AppState>>,
    Extension(start): Extension<RequestStart>,
) -> Result<Response> {
    analyze(&state, AnalysisKind::PositiveWords, start).await
}

/// GET /api/review/top-10-negative-words
pub async fn negative_words(
    State(state): State<Arc<AppState>>,
    Extension(start): Extension<RequestStart>,
) -> Result<Response> {
    analyze(&state, AnalysisKind::NegativeWords, start).await
}

/// GET /api/review/word-cloud-analysis
pub async fn word_cloud(
    State(state): State<Arc<AppState>>,
    Extension(start): Extension<RequestStart>,
) -> Result<Response> {
    analyze(&state, AnalysisKind::WordCloud, start).await
}

/// GET /api/review/word-association-graph
pub async fn word_associations(
    State(state): State<Arc<AppState>>,
    Extension(start): Extension<RequestStart>,
) -> Result<Response> {
    analyze(&state, AnalysisKind::WordAssociations, start).await
}

async fn analyze(state: &AppState, kind: AnalysisKind, start: RequestStart) -> Result<Response> {
    let pipeline = Pipeline::new(state.source.as_ref(), &state.config);
    let report = pipeline.run(kind, start.0).await.inspect_err(|e| {
        error!("Error running {} analysis: {}", kind, e);
    })?;

    if state.config.settings(kind).include_metadata {
        Ok(Json(report).into_response())
    } else {
        Ok(Json(report.results).into_response())
    }
}
