//! # Based Bingo Common Library
//!
//! Core of the "collect four letters" challenge shared by every front-end:
//! - Sequence symbols and the post-reference validator
//! - Identity resolution for submissions
//! - The progress tracker state machine
//! - Admin aggregation and the admin roster
//! - The submission store interface and its implementations
//! - Configuration loading

pub mod aggregator;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod roster;
pub mod store;
pub mod symbol;
pub mod tracker;
pub mod validator;

pub use aggregator::{aggregate, AdminSummary, AggregateRow};
pub use error::{
    Error, Result, RosterError, RosterUpdateError, StateError, StoreError, SubmitError,
    ValidationError,
};
pub use identity::{resolve_identity, Profile};
pub use roster::{AdminRoster, AdminRosterEntry, Principal, DEFAULT_ADMIN_FID};
pub use store::{
    BingoStore, NewSubmission, RosterEdit, RosterStore, Scope, Submission, SubmissionStore,
};
pub use symbol::{Symbol, SEQUENCE, SEQUENCE_LEN};
pub use tracker::{Progress, ProgressTracker, TrackerState};
pub use validator::is_valid_reference;
