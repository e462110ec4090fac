//! Progress tracker
//!
//! Holds the submissions of one scope and decides what the next submission
//! unlocks. Symbols unlock strictly in sequence order, one per accepted
//! submission:
//!
//! ```text
//! Empty --submit--> Partial(1) --submit--> Partial(2) --submit--> Partial(3) --submit--> Complete
//! ```
//!
//! `Complete` is terminal; every further submit fails with `AlreadyComplete`.
//!
//! The tracker owns no store. Callers pass one in per operation, so a tracker
//! is a plain per-session (or per-request) value.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{StateError, StoreError, SubmitError};
use crate::identity::{resolve_identity, Profile};
use crate::store::{NewSubmission, Scope, Submission, SubmissionStore};
use crate::symbol::{Symbol, SEQUENCE_LEN};
use crate::validator::validate_reference;

/// Position in the unlock state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "unlocked", rename_all = "snake_case")]
pub enum TrackerState {
    Empty,
    /// 1..=3 symbols unlocked
    Partial(u8),
    Complete,
}

/// Serializable snapshot of a scope's progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub scope: Scope,
    pub state: TrackerState,
    pub unlocked: Vec<Symbol>,
    pub unlocked_count: usize,
    pub remaining: usize,
    pub next_symbol: Option<Symbol>,
    pub complete: bool,
    pub submission_count: usize,
}

/// In-memory mirror of one scope's submissions
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    scope: Scope,
    submissions: Vec<Submission>,
}

impl ProgressTracker {
    /// Tracker with no submissions
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            submissions: Vec::new(),
        }
    }

    /// Tracker over submissions already read from a store
    pub fn from_submissions(scope: Scope, submissions: Vec<Submission>) -> Self {
        let submissions = submissions
            .into_iter()
            .filter(|s| s.scope == scope)
            .collect();
        Self { scope, submissions }
    }

    /// Load the scope's submissions from `store`
    pub async fn load<S>(store: &S, scope: Scope) -> Result<Self, StoreError>
    where
        S: SubmissionStore + ?Sized,
    {
        let submissions = store.list_submissions(Some(&scope)).await?;
        Ok(Self::from_submissions(scope, submissions))
    }

    /// Validate `reference`, unlock the next symbol and persist the submission
    ///
    /// The store is the authority when several writers share a scope. A
    /// `DuplicateKey` means the mirror is stale: it is reloaded and the checks
    /// run again, so a concurrent writer's symbol is never unlocked twice.
    /// Any other failure leaves the tracker unchanged.
    pub async fn submit<S>(
        &mut self,
        store: &S,
        reference: &str,
        profile: Option<&Profile>,
    ) -> Result<Submission, SubmitError>
    where
        S: SubmissionStore + ?Sized,
    {
        let reference = validate_reference(reference)?;

        loop {
            let symbol = self.next_symbol().ok_or(StateError::AlreadyComplete)?;

            if self.submissions.iter().any(|s| s.reference == reference) {
                return Err(StateError::DuplicateReference.into());
            }

            let record = NewSubmission {
                scope: self.scope.clone(),
                reference: reference.to_string(),
                symbol,
                identity: resolve_identity(reference, profile),
                sequence_index: self.submissions.len() as u32 + 1,
            };

            match store.insert_submission(record).await {
                Ok(submission) => {
                    self.submissions.push(submission.clone());
                    info!(
                        "{} unlocked {} with submission #{} ({} remaining)",
                        submission.identity,
                        submission.symbol,
                        submission.sequence_index,
                        self.remaining()
                    );
                    return Ok(submission);
                }
                Err(StoreError::DuplicateKey(key)) => {
                    warn!("Store rejected submission for {}: {}", self.scope, key);
                    let known = self.submissions.len();
                    self.reload(store).await?;
                    if self.submissions.len() <= known {
                        // Nothing new in the store, so the conflict is this reference
                        return Err(StateError::DuplicateReference.into());
                    }
                    debug!(
                        "{} advanced to {} submissions, retrying",
                        self.scope,
                        self.submissions.len()
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Replace the mirror with the store's current submissions for this scope
    pub async fn reload<S>(&mut self, store: &S) -> Result<(), StoreError>
    where
        S: SubmissionStore + ?Sized,
    {
        let submissions = store.list_submissions(Some(&self.scope)).await?;
        self.submissions = submissions
            .into_iter()
            .filter(|s| s.scope == self.scope)
            .collect();
        Ok(())
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// Distinct symbols unlocked, in the order they were first unlocked
    pub fn unlocked_symbols(&self) -> Vec<Symbol> {
        let mut unlocked: Vec<Symbol> = Vec::with_capacity(SEQUENCE_LEN);
        for submission in &self.submissions {
            if !unlocked.contains(&submission.symbol) {
                unlocked.push(submission.symbol);
            }
        }
        unlocked
    }

    /// Number of distinct symbols unlocked
    pub fn unlocked_count(&self) -> usize {
        self.unlocked_symbols().len()
    }

    /// Symbol the next accepted submission unlocks, `None` once complete
    pub fn next_symbol(&self) -> Option<Symbol> {
        Symbol::at(self.unlocked_count())
    }

    pub fn remaining(&self) -> usize {
        SEQUENCE_LEN.saturating_sub(self.unlocked_count())
    }

    /// True once every symbol of the sequence is unlocked
    pub fn is_complete(&self) -> bool {
        self.unlocked_count() >= SEQUENCE_LEN
    }

    pub fn state(&self) -> TrackerState {
        match self.unlocked_count() {
            0 => TrackerState::Empty,
            n if n >= SEQUENCE_LEN => TrackerState::Complete,
            n => TrackerState::Partial(n as u8),
        }
    }

    pub fn progress(&self) -> Progress {
        let unlocked = self.unlocked_symbols();
        let unlocked_count = unlocked.len();

        Progress {
            scope: self.scope.clone(),
            state: self.state(),
            unlocked,
            unlocked_count,
            remaining: self.remaining(),
            next_symbol: self.next_symbol(),
            complete: self.is_complete(),
            submission_count: self.submissions.len(),
        }
    }
}
