//! API error responses
//!
//! Every failure is recoverable and reported as `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bingo_common::{RosterError, RosterUpdateError, StateError, StoreError, SubmitError};
use serde_json::json;
use tracing::warn;

#[derive(Debug)]
pub enum ApiError {
    Submit(SubmitError),
    Roster(RosterError),
    Store(StoreError),
    /// Caller is not on the admin roster
    Forbidden,
    BadRequest(String),
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        ApiError::Submit(err)
    }
}

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        ApiError::Roster(err)
    }
}

impl From<RosterUpdateError> for ApiError {
    fn from(err: RosterUpdateError) -> Self {
        match err {
            RosterUpdateError::Roster(e) => ApiError::Roster(e),
            RosterUpdateError::Store(e) => ApiError::Store(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::DuplicateKey(_) => StatusCode::CONFLICT,
        StoreError::Unauthorized(_) => StatusCode::FORBIDDEN,
        StoreError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Submit(SubmitError::Validation(e)) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Submit(SubmitError::State(e @ StateError::AlreadyComplete)) => (
                StatusCode::CONFLICT,
                format!("{}! Check the admin panel for review.", e),
            ),
            ApiError::Submit(SubmitError::State(e)) => (StatusCode::CONFLICT, e.to_string()),
            ApiError::Submit(SubmitError::Store(e)) | ApiError::Store(e) => {
                warn!("Store failure: {}", e);
                (store_status(&e), e.to_string())
            }
            ApiError::Roster(e) => {
                let status = match e {
                    RosterError::AlreadyAdmin(_) | RosterError::LastAdmin => StatusCode::CONFLICT,
                    RosterError::NotAdmin(_) => StatusCode::NOT_FOUND,
                    RosterError::Empty => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string())
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Access denied. Admin only.".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
