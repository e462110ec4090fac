//! Process-local store

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewSubmission, RosterEdit, RosterStore, Scope, Submission, SubmissionStore};
use crate::error::{RosterUpdateError, StoreError};
use crate::roster::{AdminRoster, AdminRosterEntry, Principal};

#[derive(Debug, Default)]
struct MemoryState {
    submissions: Vec<Submission>,
    roster: AdminRoster,
}

/// Store that lives only as long as the process
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(roster: AdminRoster) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                submissions: Vec::new(),
                roster,
            }),
        }
    }
}

fn in_scope(submission: &Submission, scope: Option<&Scope>) -> bool {
    scope.map_or(true, |s| &submission.scope == s)
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn insert_submission(&self, record: NewSubmission) -> Result<Submission, StoreError> {
        let mut state = self.state.write().await;

        for existing in state.submissions.iter().filter(|s| s.scope == record.scope) {
            if existing.reference == record.reference {
                return Err(StoreError::DuplicateKey(format!(
                    "{} already submitted {}",
                    record.scope, record.reference
                )));
            }
            if existing.sequence_index == record.sequence_index {
                return Err(StoreError::DuplicateKey(format!(
                    "{} already holds submission #{}",
                    record.scope, record.sequence_index
                )));
            }
        }

        let submission = record.into_submission(Uuid::new_v4(), Utc::now());
        state.submissions.push(submission.clone());
        Ok(submission)
    }

    async fn list_submissions(&self, scope: Option<&Scope>) -> Result<Vec<Submission>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .submissions
            .iter()
            .filter(|s| in_scope(s, scope))
            .cloned()
            .collect())
    }

    async fn clear_submissions(&self, scope: Option<&Scope>) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.submissions.len();
        state.submissions.retain(|s| !in_scope(s, scope));
        Ok((before - state.submissions.len()) as u64)
    }

    async fn list_admins(&self) -> Result<Vec<AdminRosterEntry>, StoreError> {
        Ok(self.state.read().await.roster.entries().to_vec())
    }

    async fn is_admin_principal(&self, principal: &Principal) -> Result<bool, StoreError> {
        Ok(self.state.read().await.roster.is_admin(principal))
    }
}

#[async_trait]
impl RosterStore for InMemoryStore {
    async fn load_roster(&self) -> Result<AdminRoster, StoreError> {
        Ok(self.state.read().await.roster.clone())
    }

    async fn save_roster(&self, roster: &AdminRoster) -> Result<(), StoreError> {
        self.state.write().await.roster = roster.clone();
        Ok(())
    }

    async fn update_roster(&self, edit: RosterEdit) -> Result<AdminRoster, RosterUpdateError> {
        let mut state = self.state.write().await;
        let mut roster = state.roster.clone();
        edit(&mut roster)?;
        state.roster = roster.clone();
        Ok(roster)
    }
}
