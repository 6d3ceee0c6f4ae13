// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Failure reported by a storage backend. Not further classified.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        StoreError(format!("query failed: {}", e))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError(format!("malformed row: {}", e))
    }
}

/// Typed failure of a social operation, rendered inline by the caller
#[derive(Error, Debug)]
pub enum SocialError {
    #[error("{0}")]
    Authorization(&'static str),

    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("This account is private")]
    Forbidden,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl SocialError {
    pub fn not_logged_in() -> Self {
        SocialError::Authorization("You must be logged in.")
    }
}

impl IntoResponse for SocialError {
    fn into_response(self) -> Response {
        let status = match &self {
            SocialError::Authorization(_) => StatusCode::UNAUTHORIZED,
            SocialError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SocialError::NotFound(_) => StatusCode::NOT_FOUND,
            SocialError::Forbidden => StatusCode::FORBIDDEN,
            SocialError::Store(e) => {
                error!("Store error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Store details stay in the logs
        let message = match &self {
            SocialError::Store(_) => "Something went wrong. Please try again.".to_string(),
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
