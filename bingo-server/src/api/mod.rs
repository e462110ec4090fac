//! HTTP API handlers for bingo-server

pub mod admin;
pub mod error;
pub mod health;
pub mod progress;
pub mod session;

pub use admin::{add_admin, get_admin_access, get_roster, get_summary, remove_admin, reset_submissions};
pub use error::ApiError;
pub use health::health_routes;
pub use progress::{get_progress, submit};
pub use session::Session;
