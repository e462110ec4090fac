//! Player endpoints: progress and submissions

use axum::{extract::State, http::StatusCode, Json};
use bingo_common::{Progress, ProgressTracker, Submission, Symbol};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ApiError;
use super::session::Session;
use crate::AppState;

/// GET /api/progress
///
/// Progress snapshot for the caller's scope.
pub async fn get_progress(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Progress>, ApiError> {
    let tracker = ProgressTracker::load(state.store.as_ref(), session.scope()).await?;
    Ok(Json(tracker.progress()))
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Post URL as typed by the user
    pub reference: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submission: Submission,
    pub progress: Progress,
    pub message: String,
}

/// Player-facing confirmation for an unlocked symbol
pub fn unlock_message(symbol: Symbol, remaining: usize) -> String {
    if remaining == 0 {
        format!("Letter \"{}\" has been struck! You collected all of BASE!", symbol)
    } else {
        format!(
            "Great! Letter \"{}\" has been struck! {} more to go!",
            symbol, remaining
        )
    }
}

/// POST /api/submissions
///
/// Validates the reference and unlocks the caller's next symbol.
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let store = state.store.as_ref();
    let mut tracker = ProgressTracker::load(store, session.scope()).await?;

    let submission = tracker
        .submit(store, &request.reference, session.profile())
        .await?;
    let progress = tracker.progress();

    if progress.complete {
        info!("{} completed the challenge", tracker.scope());
    }

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: unlock_message(submission.symbol, progress.remaining),
            submission,
            progress,
        }),
    ))
}
