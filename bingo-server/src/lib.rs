//! bingo-server library - HTTP surface for Based Bingo
//!
//! JSON API the browser front-end calls: progress, submissions, and the
//! admin panel.

use axum::Router;
use bingo_common::BingoStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Submission and roster store
    pub store: Arc<dyn BingoStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn BingoStore>) -> Self {
        Self { store }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get};

    let player = Router::new()
        .route("/api/progress", get(api::get_progress))
        .route("/api/submissions", axum::routing::post(api::submit));

    let admin = Router::new()
        .route("/api/admin/access", get(api::get_admin_access))
        .route("/api/admin/summary", get(api::get_summary))
        .route("/api/admin/roster", get(api::get_roster).post(api::add_admin))
        .route("/api/admin/roster/:principal", delete(api::remove_admin))
        .route("/api/admin/submissions", delete(api::reset_submissions));

    Router::new()
        .merge(player)
        .merge(admin)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
