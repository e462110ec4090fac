//! Identity resolution for submissions
//!
//! A submission is attributed either to the authenticated session profile
//! supplied by the host platform, or to the handle embedded in the post URL.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::roster::Principal;

/// Fallback identity when nothing better can be derived
pub const UNKNOWN_IDENTITY: &str = "Unknown";

/// Authenticated session profile forwarded by the host platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Numeric platform id
    pub fid: Option<i64>,
    /// Canonical handle
    pub username: Option<String>,
    pub display_name: Option<String>,
}

impl Profile {
    /// Canonical handle, ignoring blank values
    pub fn handle(&self) -> Option<&str> {
        non_blank(self.username.as_deref())
    }

    /// Principal used for admin checks: the numeric id when present, else the handle
    pub fn principal(&self) -> Option<Principal> {
        match (self.fid, self.handle()) {
            (Some(fid), _) => Some(Principal::Fid(fid)),
            (None, Some(handle)) => Some(Principal::Handle(handle.to_string())),
            (None, None) => None,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Display identity for a submission
///
/// Never fails: every extraction failure degrades to [`UNKNOWN_IDENTITY`].
pub fn resolve_identity(reference: &str, profile: Option<&Profile>) -> String {
    if let Some(profile) = profile {
        return profile
            .handle()
            .or_else(|| non_blank(profile.display_name.as_deref()))
            .unwrap_or(UNKNOWN_IDENTITY)
            .to_string();
    }

    match handle_from_reference(reference) {
        Some(handle) => format!("@{}", handle),
        None => UNKNOWN_IDENTITY.to_string(),
    }
}

/// Path segment immediately preceding `status` in a post URL
pub fn handle_from_reference(reference: &str) -> Option<String> {
    let url = Url::parse(reference.trim()).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();
    let status_at = segments.iter().position(|s| *s == "status")?;
    let handle = segments.get(status_at.checked_sub(1)?)?;

    if handle.is_empty() {
        None
    } else {
        Some(handle.to_string())
    }
}
