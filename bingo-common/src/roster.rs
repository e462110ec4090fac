//! Admin roster
//!
//! The set of principals allowed to view aggregated submissions. The roster
//! is never empty: every constructor and mutation checks this before it
//! changes anything.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::RosterError;
use crate::store::SubmissionStore;

/// Admin seeded into every roster that is absent or corrupt
pub const DEFAULT_ADMIN_FID: i64 = 348330;

/// Identifier used to authorize admin access
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Principal {
    /// Numeric platform id
    Fid(i64),
    /// Platform handle, stored without the leading `@`
    Handle(String),
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Fid(fid) => write!(f, "fid:{}", fid),
            Principal::Handle(handle) => write!(f, "@{}", handle),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid principal: {0:?}")]
pub struct ParsePrincipalError(pub String);

impl FromStr for Principal {
    type Err = ParsePrincipalError;

    /// Accepts `fid:<n>`, a bare integer, `@handle` or `handle`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ParsePrincipalError(s.to_string());

        if let Some(fid) = trimmed.strip_prefix("fid:") {
            return fid.trim().parse().map(Principal::Fid).map_err(|_| invalid());
        }
        if let Ok(fid) = trimmed.parse::<i64>() {
            return Ok(Principal::Fid(fid));
        }

        let handle = trimmed.strip_prefix('@').unwrap_or(trimmed);
        if handle.is_empty() || handle.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(invalid());
        }
        Ok(Principal::Handle(handle.to_string()))
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.to_string()
    }
}

impl TryFrom<String> for Principal {
    type Error = ParsePrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One roster member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRosterEntry {
    pub principal: Principal,
    pub label: String,
}

impl AdminRosterEntry {
    pub fn new(principal: Principal, label: impl Into<String>) -> Self {
        Self {
            principal,
            label: label.into(),
        }
    }

    /// Entry labelled the way the admin panel shows numeric ids
    pub fn fid(fid: i64) -> Self {
        Self::new(Principal::Fid(fid), format!("FID: {}", fid))
    }
}

/// Non-empty, insertion-ordered set of admins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<AdminRosterEntry>", try_from = "Vec<AdminRosterEntry>")]
pub struct AdminRoster {
    entries: Vec<AdminRosterEntry>,
}

impl AdminRoster {
    pub fn new(first: AdminRosterEntry) -> Self {
        Self {
            entries: vec![first],
        }
    }

    /// Build a roster from stored entries
    ///
    /// Repeated principals keep their first entry. Fails with
    /// [`RosterError::Empty`] when nothing is left.
    pub fn from_entries(entries: Vec<AdminRosterEntry>) -> Result<Self, RosterError> {
        let mut deduped: Vec<AdminRosterEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if deduped.iter().any(|e| e.principal == entry.principal) {
                debug!("Dropping repeated roster entry for {}", entry.principal);
                continue;
            }
            deduped.push(entry);
        }

        if deduped.is_empty() {
            return Err(RosterError::Empty);
        }
        Ok(Self { entries: deduped })
    }

    pub fn add_admin(&mut self, entry: AdminRosterEntry) -> Result<(), RosterError> {
        if self.is_admin(&entry.principal) {
            return Err(RosterError::AlreadyAdmin(entry.principal));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove a principal
    ///
    /// The last-admin check runs first, so a singleton roster always reports
    /// [`RosterError::LastAdmin`].
    pub fn remove_admin(&mut self, principal: &Principal) -> Result<AdminRosterEntry, RosterError> {
        if self.entries.len() <= 1 {
            return Err(RosterError::LastAdmin);
        }
        let index = self
            .entries
            .iter()
            .position(|e| &e.principal == principal)
            .ok_or_else(|| RosterError::NotAdmin(principal.clone()))?;
        Ok(self.entries.remove(index))
    }

    pub fn is_admin(&self, principal: &Principal) -> bool {
        self.entries.iter().any(|e| &e.principal == principal)
    }

    pub fn entries(&self) -> &[AdminRosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry may currently be removed
    pub fn can_remove(&self) -> bool {
        self.entries.len() > 1
    }

    /// Numeric ids on the roster, in roster order
    pub fn fids(&self) -> Vec<i64> {
        self.entries
            .iter()
            .filter_map(|e| match e.principal {
                Principal::Fid(fid) => Some(fid),
                Principal::Handle(_) => None,
            })
            .collect()
    }
}

impl Default for AdminRoster {
    fn default() -> Self {
        Self::new(AdminRosterEntry::fid(DEFAULT_ADMIN_FID))
    }
}

impl From<AdminRoster> for Vec<AdminRosterEntry> {
    fn from(roster: AdminRoster) -> Self {
        roster.entries
    }
}

impl TryFrom<Vec<AdminRosterEntry>> for AdminRoster {
    type Error = RosterError;

    fn try_from(entries: Vec<AdminRosterEntry>) -> Result<Self, Self::Error> {
        AdminRoster::from_entries(entries)
    }
}

/// Admin check for non-critical reads
///
/// Any store failure is logged and treated as "not admin" so the caller is
/// never blocked by an unavailable store.
pub async fn is_admin_or_deny<S>(store: &S, principal: Option<&Principal>) -> bool
where
    S: SubmissionStore + ?Sized,
{
    let Some(principal) = principal else {
        return false;
    };

    match store.is_admin_principal(principal).await {
        Ok(is_admin) => is_admin,
        Err(e) => {
            warn!("Admin check for {} failed, denying access: {}", principal, e);
            false
        }
    }
}
