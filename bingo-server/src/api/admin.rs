//! Admin panel endpoints
//!
//! Every route here is gated on the caller's principal being on the roster.
//! Roster edits run through `RosterStore::update_roster`, so the never-empty
//! rule is checked against the stored roster inside the same write.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bingo_common::roster::is_admin_or_deny;
use bingo_common::{
    aggregate, AdminRoster, AdminRosterEntry, AdminSummary, Principal, RosterStore, Scope,
    SubmissionStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::error::ApiError;
use super::session::Session;
use crate::AppState;

/// Caller's principal when it is on the roster
async fn require_admin(state: &AppState, session: &Session) -> Result<Principal, ApiError> {
    let principal = session.principal();
    if is_admin_or_deny(state.store.as_ref(), principal.as_ref()).await {
        // is_admin_or_deny only returns true for a present principal
        principal.ok_or(ApiError::Forbidden)
    } else {
        warn!(
            "Admin access denied for {}",
            principal.map_or_else(|| "anonymous caller".to_string(), |p| p.to_string())
        );
        Err(ApiError::Forbidden)
    }
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub is_admin: bool,
}

/// GET /api/admin/access
///
/// Whether to show the admin button. Store failures read as "not admin".
pub async fn get_admin_access(
    State(state): State<AppState>,
    session: Session,
) -> Json<AccessResponse> {
    let principal = session.principal();
    Json(AccessResponse {
        is_admin: is_admin_or_deny(state.store.as_ref(), principal.as_ref()).await,
    })
}

/// GET /api/admin/summary
///
/// Submissions grouped by identity.
pub async fn get_summary(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<AdminSummary>, ApiError> {
    require_admin(&state, &session).await?;

    let submissions = state.store.list_submissions(None).await?;
    Ok(Json(aggregate(&submissions)))
}

#[derive(Debug, Serialize)]
pub struct RosterResponse {
    pub admins: Vec<AdminRosterEntry>,
    /// False while only one admin remains
    pub can_remove: bool,
}

impl From<&AdminRoster> for RosterResponse {
    fn from(roster: &AdminRoster) -> Self {
        Self {
            admins: roster.entries().to_vec(),
            can_remove: roster.can_remove(),
        }
    }
}

/// GET /api/admin/roster
pub async fn get_roster(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<RosterResponse>, ApiError> {
    require_admin(&state, &session).await?;

    let roster = state.store.load_roster().await?;
    Ok(Json(RosterResponse::from(&roster)))
}

#[derive(Debug, Deserialize)]
pub struct AddAdminRequest {
    /// `fid:<n>`, a bare fid, or `@handle`
    pub principal: String,
    pub label: Option<String>,
}

fn parse_principal(raw: &str) -> Result<Principal, ApiError> {
    raw.parse::<Principal>()
        .map_err(|_| ApiError::BadRequest("Please enter a valid FID number or @handle".to_string()))
}

/// POST /api/admin/roster
pub async fn add_admin(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddAdminRequest>,
) -> Result<(StatusCode, Json<RosterResponse>), ApiError> {
    let caller = require_admin(&state, &session).await?;
    let principal = parse_principal(&request.principal)?;

    let entry = match request.label.filter(|l| !l.trim().is_empty()) {
        Some(label) => AdminRosterEntry::new(principal, label),
        None => match principal {
            Principal::Fid(fid) => AdminRosterEntry::fid(fid),
            Principal::Handle(_) => AdminRosterEntry::new(principal.clone(), principal.to_string()),
        },
    };
    let added = entry.principal.clone();

    let roster = state
        .store
        .update_roster(Box::new(move |roster: &mut AdminRoster| roster.add_admin(entry)))
        .await?;

    info!("{} added admin {}", caller, added);
    Ok((StatusCode::CREATED, Json(RosterResponse::from(&roster))))
}

/// DELETE /api/admin/roster/:principal
pub async fn remove_admin(
    State(state): State<AppState>,
    session: Session,
    Path(raw): Path<String>,
) -> Result<Json<RosterResponse>, ApiError> {
    let caller = require_admin(&state, &session).await?;
    let principal = parse_principal(&raw)?;

    let removed = principal.clone();
    let roster = state
        .store
        .update_roster(Box::new(move |roster: &mut AdminRoster| {
            roster.remove_admin(&removed).map(|_| ())
        }))
        .await?;

    info!("{} removed admin {}", caller, principal);
    Ok(Json(RosterResponse::from(&roster)))
}

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    /// `local` or `fid:<n>`; every scope when absent
    pub scope: Option<String>,
}

/// DELETE /api/admin/submissions
///
/// Administrative reset, the only way submissions are ever deleted.
pub async fn reset_submissions(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ResetQuery>,
) -> Result<Json<Value>, ApiError> {
    let caller = require_admin(&state, &session).await?;

    let scope = match query.scope.as_deref() {
        Some(raw) => Some(
            raw.parse::<Scope>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid scope: {}", raw)))?,
        ),
        None => None,
    };

    let removed = state.store.clear_submissions(scope.as_ref()).await?;
    warn!(
        "{} reset {} submissions ({})",
        caller,
        removed,
        scope.as_ref().map_or_else(|| "all scopes".to_string(), Scope::key)
    );

    Ok(Json(json!({ "removed": removed })))
}
