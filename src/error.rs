//! Error type shared by the pipeline, the document source and the HTTP layer.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// The backing store cannot be reached or a cursor read failed.
    #[error("Document source unavailable: {message}")]
    SourceUnavailable { message: String },

    /// The store-side cursor ran past its configured maximum time.
    #[error("Document source timed out after {limit_ms} ms")]
    SourceTimeout { limit_ms: u64 },

    /// A stored record could not be decoded.
    #[error("Malformed document at line {line}: {message}")]
    MalformedDocument { line: usize, message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Rate limit exceeded, retry in {retry_after_secs} s")]
    RateLimited { retry_after_secs: u64 },
}

impl AnalyticsError {
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status reported to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalyticsError::SourceTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AnalyticsError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AnalyticsError::SourceUnavailable { .. }
            | AnalyticsError::MalformedDocument { .. }
            | AnalyticsError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing summary. The detailed cause goes into the `error` field.
    pub fn public_message(&self) -> &'static str {
        match self {
            AnalyticsError::SourceTimeout { .. } => {
                "Database connection timed out. Please try again later."
            }
            AnalyticsError::RateLimited { .. } => "Too many requests, please try again later.",
            _ => "Internal server error",
        }
    }
}

impl From<std::io::Error> for AnalyticsError {
    fn from(err: std::io::Error) -> Self {
        Self::source_unavailable(err.to_string())
    }
}

impl From<toml::de::Error> for AnalyticsError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

/// JSON body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for AnalyticsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            message: self.public_message(),
            error: match &self {
                AnalyticsError::RateLimited { .. } => None,
                other => Some(other.to_string()),
            },
        };
        let mut response = (status, Json(body)).into_response();
        if let AnalyticsError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
