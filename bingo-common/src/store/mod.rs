//! Submission store interface
//!
//! The progress tracker only ever talks to these traits. Three interchangeable
//! implementations are provided:
//! - [`memory::InMemoryStore`]: process-local, for tests and throwaway sessions
//! - [`local::LocalStateStore`]: single JSON key-value file (the browser-storage layout)
//! - [`sqlite::SqliteStore`]: SQLite via sqlx, multi-writer safe through a
//!   UNIQUE(scope, reference) constraint

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{RosterError, RosterUpdateError, StoreError};
use crate::identity::Profile;
use crate::roster::{AdminRoster, AdminRosterEntry, Principal};
use crate::symbol::Symbol;

pub mod local;
pub mod memory;
pub mod sqlite;

pub use local::LocalStateStore;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Identity boundary progress is tracked against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Scope {
    /// Single anonymous session
    Local,
    /// Authenticated platform user
    Principal(i64),
}

impl Scope {
    /// Scope for a request: the authenticated fid when there is one
    pub fn for_profile(profile: Option<&Profile>) -> Scope {
        match profile.and_then(|p| p.fid) {
            Some(fid) => Scope::Principal(fid),
            None => Scope::Local,
        }
    }

    /// Storage key: `local` or `fid:<n>`
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Local => write!(f, "local"),
            Scope::Principal(fid) => write!(f, "fid:{}", fid),
        }
    }
}

impl FromStr for Scope {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "local" {
            return Ok(Scope::Local);
        }
        s.strip_prefix("fid:")
            .and_then(|fid| fid.parse().ok())
            .map(Scope::Principal)
            .ok_or_else(|| StoreError::Corrupt(format!("Invalid scope key: {:?}", s)))
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.key()
    }
}

impl TryFrom<String> for Scope {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Submission as handed to a store, before it is assigned an id and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub scope: Scope,
    pub reference: String,
    pub symbol: Symbol,
    pub identity: String,
    pub sequence_index: u32,
}

impl NewSubmission {
    pub fn into_submission(self, id: Uuid, created_at: DateTime<Utc>) -> Submission {
        Submission {
            id,
            scope: self.scope,
            reference: self.reference,
            symbol: self.symbol,
            identity: self.identity,
            sequence_index: self.sequence_index,
            created_at,
        }
    }
}

/// One accepted proof. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub scope: Scope,
    /// Validated post URL
    pub reference: String,
    pub symbol: Symbol,
    pub identity: String,
    /// 1-based position within the scope
    pub sequence_index: u32,
    pub created_at: DateTime<Utc>,
}

/// Durable record of submissions plus read access to the admin roster
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist one submission
    ///
    /// Must fail with [`StoreError::DuplicateKey`] when the scope already holds
    /// the same reference.
    async fn insert_submission(&self, record: NewSubmission) -> Result<Submission, StoreError>;

    /// Submissions for one scope, or all of them, oldest first
    async fn list_submissions(&self, scope: Option<&Scope>) -> Result<Vec<Submission>, StoreError>;

    /// Administrative reset; returns how many submissions were removed
    async fn clear_submissions(&self, scope: Option<&Scope>) -> Result<u64, StoreError>;

    async fn list_admins(&self) -> Result<Vec<AdminRosterEntry>, StoreError>;

    async fn is_admin_principal(&self, principal: &Principal) -> Result<bool, StoreError> {
        Ok(self
            .list_admins()
            .await?
            .iter()
            .any(|entry| &entry.principal == principal))
    }
}

/// Edit applied to the roster inside [`RosterStore::update_roster`]
pub type RosterEdit = Box<dyn FnOnce(&mut AdminRoster) -> Result<(), RosterError> + Send>;

/// Persistence for roster edits
#[async_trait]
pub trait RosterStore: Send + Sync {
    async fn load_roster(&self) -> Result<AdminRoster, StoreError>;

    /// Overwrite the stored roster
    async fn save_roster(&self, roster: &AdminRoster) -> Result<(), StoreError>;

    /// Load, edit and save as one step
    ///
    /// No other roster write can land between the load and the save. Nothing
    /// is written when `edit` fails. Returns the roster as saved.
    async fn update_roster(&self, edit: RosterEdit) -> Result<AdminRoster, RosterUpdateError>;
}

/// A store usable for both submissions and roster management
pub trait BingoStore: SubmissionStore + RosterStore {}

impl<T: SubmissionStore + RosterStore> BingoStore for T {}
