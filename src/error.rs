use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::StoreError;

/// Where an access-denied request is sent.
pub const SAFE_REDIRECT: &str = "/";

/// Response marker for the identity middleware: queue the access-denied flash.
#[derive(Debug, Clone, Copy)]
pub struct AccessDenied;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Username or email already taken")]
    DuplicateIdentity,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access unauthorized")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Invalid input")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation => AppError::DuplicateIdentity,
            StoreError::Database(e) => AppError::Internal(e.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            AppError::Unauthorized => {
                let mut res = Redirect::to(SAFE_REDIRECT).into_response();
                res.extensions_mut().insert(AccessDenied);
                res
            }
            AppError::NotFound => crate::pages::not_found_view().into_response(),
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "Invalid input", "errors": errors })),
            )
                .into_response(),
            AppError::DuplicateIdentity => (
                StatusCode::CONFLICT,
                Json(json!({ "error": message })),
            )
                .into_response(),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": message })),
            )
                .into_response(),
            AppError::Session(e) => {
                error!(error = %e, "session store failure");
                internal_response()
            }
            AppError::Internal(e) => {
                error!(error = ?e, "request failed");
                internal_response()
            }
        }
    }
}

fn internal_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}
