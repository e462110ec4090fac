//! Local key-value store
//!
//! Persists the whole game state as one serialized record under the key
//! [`STATE_KEY`] inside a JSON object file, the same shape browser local
//! storage uses. Missing or malformed state is replaced by defaults, never
//! reported as an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{NewSubmission, RosterEdit, RosterStore, Scope, Submission, SubmissionStore};
use crate::error::{RosterUpdateError, StoreError};
use crate::identity::UNKNOWN_IDENTITY;
use crate::roster::{AdminRoster, AdminRosterEntry, Principal, DEFAULT_ADMIN_FID};
use crate::symbol::Symbol;

/// Key holding the serialized game state
pub const STATE_KEY: &str = "basedBingoState";

/// Persisted game state record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalState {
    #[serde(default)]
    pub completed_letters: Vec<Symbol>,
    #[serde(default)]
    pub submissions: Vec<StoredSubmission>,
    #[serde(default = "default_admin_fids")]
    pub admin_fids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admin_handles: Vec<String>,
}

impl Default for LocalState {
    fn default() -> Self {
        Self {
            completed_letters: Vec::new(),
            submissions: Vec::new(),
            admin_fids: default_admin_fids(),
            admin_handles: Vec::new(),
        }
    }
}

fn default_admin_fids() -> Vec<i64> {
    vec![DEFAULT_ADMIN_FID]
}

/// Submission in the local record layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubmission {
    pub tweet_url: String,
    pub letter: Symbol,
    pub timestamp: DateTime<Utc>,
    pub submission_number: u32,
    #[serde(default = "unknown_identity")]
    pub wallet_address: String,
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub scope: Option<Scope>,
}

fn unknown_identity() -> String {
    UNKNOWN_IDENTITY.to_string()
}

impl StoredSubmission {
    fn scope(&self) -> Scope {
        self.scope.clone().unwrap_or(Scope::Local)
    }

    fn to_submission(&self) -> Submission {
        Submission {
            // Assigned in open()
            id: self.id.unwrap_or_else(Uuid::nil),
            scope: self.scope(),
            reference: self.tweet_url.clone(),
            symbol: self.letter,
            identity: self.wallet_address.clone(),
            sequence_index: self.submission_number,
            created_at: self.timestamp,
        }
    }

    fn from_submission(submission: &Submission) -> Self {
        Self {
            tweet_url: submission.reference.clone(),
            letter: submission.symbol,
            timestamp: submission.created_at,
            submission_number: submission.sequence_index,
            wallet_address: submission.identity.clone(),
            id: Some(submission.id),
            scope: match submission.scope {
                Scope::Local => None,
                ref scope => Some(scope.clone()),
            },
        }
    }
}

impl LocalState {
    /// Roster view of `adminFids` / `adminHandles`, default when both are empty
    pub fn roster(&self) -> AdminRoster {
        let entries = self
            .admin_fids
            .iter()
            .map(|fid| AdminRosterEntry::fid(*fid))
            .chain(self.admin_handles.iter().map(|handle| {
                AdminRosterEntry::new(Principal::Handle(handle.clone()), format!("@{}", handle))
            }))
            .collect();

        AdminRoster::from_entries(entries).unwrap_or_else(|_| {
            warn!("Stored admin roster is empty, restoring default admin");
            AdminRoster::default()
        })
    }

    fn set_roster(&mut self, roster: &AdminRoster) {
        self.admin_fids = roster.fids();
        self.admin_handles = roster
            .entries()
            .iter()
            .filter_map(|e| match &e.principal {
                Principal::Handle(handle) => Some(handle.clone()),
                Principal::Fid(_) => None,
            })
            .collect();
    }

    fn rebuild_completed_letters(&mut self) {
        self.completed_letters = self
            .submissions
            .iter()
            .filter(|s| s.scope() == Scope::Local)
            .map(|s| s.letter)
            .collect();
    }
}

/// Decode a key-value file body into the game state
///
/// Returns the other keys too, so they survive a rewrite.
fn decode(body: &str) -> (BTreeMap<String, String>, LocalState) {
    let entries: BTreeMap<String, String> = match serde_json::from_str(body) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Discarding unreadable local storage file: {}", e);
            return (BTreeMap::new(), LocalState::default());
        }
    };

    let state = match entries.get(STATE_KEY) {
        Some(raw) => match serde_json::from_str::<LocalState>(raw) {
            Ok(state) => state,
            Err(e) => {
                warn!("Discarding malformed {} record: {}", STATE_KEY, e);
                LocalState::default()
            }
        },
        None => LocalState::default(),
    };

    (entries, state)
}

struct LocalInner {
    entries: BTreeMap<String, String>,
    state: LocalState,
}

/// Store backed by a single JSON key-value file
pub struct LocalStateStore {
    path: PathBuf,
    inner: Mutex<LocalInner>,
}

impl LocalStateStore {
    /// Open (or start) the file at `path`
    ///
    /// Never fails: unreadable content is logged and replaced with defaults.
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let (entries, mut state) = match tokio::fs::read_to_string(&path).await {
            Ok(body) => decode(&body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No local state at {}, starting fresh", path.display());
                (BTreeMap::new(), LocalState::default())
            }
            Err(e) => {
                warn!("Could not read local state {}: {}", path.display(), e);
                (BTreeMap::new(), LocalState::default())
            }
        };

        for submission in state.submissions.iter_mut() {
            if submission.id.is_none() {
                submission.id = Some(Uuid::new_v4());
            }
        }

        debug!(
            "Loaded {} submissions and {} admins from {}",
            state.submissions.len(),
            state.admin_fids.len() + state.admin_handles.len(),
            path.display()
        );

        Self {
            path,
            inner: Mutex::new(LocalInner { entries, state }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current record
    pub async fn state(&self) -> LocalState {
        self.inner.lock().await.state.clone()
    }

    /// Write the whole record back: temp file, then rename over the original
    async fn persist(&self, inner: &mut LocalInner) -> Result<(), StoreError> {
        let record = serde_json::to_string(&inner.state)
            .map_err(|e| StoreError::Unavailable(format!("Failed to encode state: {}", e)))?;
        inner.entries.insert(STATE_KEY.to_string(), record);

        let body = serde_json::to_string_pretty(&inner.entries)
            .map_err(|e| StoreError::Unavailable(format!("Failed to encode storage: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", self.path.display(), e)))?;

        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for LocalStateStore {
    async fn insert_submission(&self, record: NewSubmission) -> Result<Submission, StoreError> {
        let mut inner = self.inner.lock().await;

        for existing in inner.state.submissions.iter().filter(|s| s.scope() == record.scope) {
            if existing.tweet_url == record.reference {
                return Err(StoreError::DuplicateKey(format!(
                    "{} already submitted {}",
                    record.scope, record.reference
                )));
            }
            if existing.submission_number == record.sequence_index {
                return Err(StoreError::DuplicateKey(format!(
                    "{} already holds submission #{}",
                    record.scope, record.sequence_index
                )));
            }
        }

        let submission = record.into_submission(Uuid::new_v4(), Utc::now());
        let previous = inner.state.clone();

        inner
            .state
            .submissions
            .push(StoredSubmission::from_submission(&submission));
        if submission.scope == Scope::Local {
            inner.state.completed_letters.push(submission.symbol);
        }

        if let Err(e) = self.persist(&mut inner).await {
            inner.state = previous;
            return Err(e);
        }
        Ok(submission)
    }

    async fn list_submissions(&self, scope: Option<&Scope>) -> Result<Vec<Submission>, StoreError> {
        let inner = self.inner.lock().await;
        let mut submissions: Vec<Submission> = inner
            .state
            .submissions
            .iter()
            .filter(|s| scope.map_or(true, |scope| &s.scope() == scope))
            .map(StoredSubmission::to_submission)
            .collect();
        submissions.sort_by_key(|s| s.created_at);
        Ok(submissions)
    }

    async fn clear_submissions(&self, scope: Option<&Scope>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let previous = inner.state.clone();

        let before = inner.state.submissions.len();
        inner
            .state
            .submissions
            .retain(|s| !scope.map_or(true, |scope| &s.scope() == scope));
        let removed = (before - inner.state.submissions.len()) as u64;
        inner.state.rebuild_completed_letters();

        if let Err(e) = self.persist(&mut inner).await {
            inner.state = previous;
            return Err(e);
        }
        Ok(removed)
    }

    async fn list_admins(&self) -> Result<Vec<AdminRosterEntry>, StoreError> {
        Ok(self.inner.lock().await.state.roster().entries().to_vec())
    }
}

#[async_trait]
impl RosterStore for LocalStateStore {
    async fn load_roster(&self) -> Result<AdminRoster, StoreError> {
        Ok(self.inner.lock().await.state.roster())
    }

    async fn save_roster(&self, roster: &AdminRoster) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let previous = inner.state.clone();
        inner.state.set_roster(roster);

        if let Err(e) = self.persist(&mut inner).await {
            inner.state = previous;
            return Err(e);
        }
        Ok(())
    }

    async fn update_roster(&self, edit: RosterEdit) -> Result<AdminRoster, RosterUpdateError> {
        let mut inner = self.inner.lock().await;
        let mut roster = inner.state.roster();
        edit(&mut roster)?;

        let previous = inner.state.clone();
        inner.state.set_roster(&roster);

        if let Err(e) = self.persist(&mut inner).await {
            inner.state = previous;
            return Err(e.into());
        }
        Ok(inner.state.roster())
    }
}
