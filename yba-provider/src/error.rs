//! REST client error types

use thiserror::Error;
use yba_core::provider::{ErrorKind, ProviderError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YBA API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Http(_) | ApiError::Json(_) => ErrorKind::Transport,
            ApiError::Status { status: 404, .. } => ErrorKind::NotFound,
            ApiError::Status { .. } => ErrorKind::Api,
            ApiError::InvalidConfig(_) => ErrorKind::Validation,
        }
    }
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        ProviderError::new(err.to_string())
            .with_kind(err.kind())
            .with_cause(err)
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
