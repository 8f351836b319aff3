// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use validator::ValidationErrors;

/// Message returned for unknown users and public identifiers.
pub const USER_NOT_FOUND: &str = "user does not exist";
/// Message returned for unknown session identifiers.
pub const SESSION_NOT_FOUND: &str = "session does not exist";

const GENERIC_ERROR: &str = "something went wrong";

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("No active session for track {0}")]
    NoActiveSession(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn user_not_found() -> Self {
        AppError::NotFound(USER_NOT_FOUND.to_string())
    }

    pub fn session_not_found() -> Self {
        AppError::NotFound(SESSION_NOT_FOUND.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, Vec<String>>>,
}

/// Flatten validator errors into `field -> [code, ...]`.
fn field_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let codes = errs.iter().map(|e| e.code.to_string()).collect();
            (field.to_string(), codes)
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, fields) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "validation failed".to_string(),
                Some(field_errors(errors)),
            ),
            AppError::NoActiveSession(track) => {
                tracing::error!(track = %track, "No active session for track");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR.to_string(), None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR.to_string(), None)
            }
        };

        (status, Json(ErrorResponse { error, fields })).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
