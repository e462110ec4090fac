//! Session profile extraction
//!
//! The host platform authenticates the user and forwards the profile in
//! request headers. Requests without any profile header are anonymous and
//! play in the local scope.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use bingo_common::{Principal, Profile, Scope};

use super::error::ApiError;

pub const FID_HEADER: &str = "x-bingo-fid";
pub const USERNAME_HEADER: &str = "x-bingo-username";
pub const DISPLAY_NAME_HEADER: &str = "x-bingo-display-name";

/// Profile of the caller, if the host platform supplied one
#[derive(Debug, Clone, Default)]
pub struct Session(pub Option<Profile>);

impl Session {
    pub fn profile(&self) -> Option<&Profile> {
        self.0.as_ref()
    }

    pub fn scope(&self) -> Scope {
        Scope::for_profile(self.profile())
    }

    pub fn principal(&self) -> Option<Principal> {
        self.profile().and_then(Profile::principal)
    }
}

fn header(parts: &Parts, name: &str) -> Result<Option<String>, ApiError> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim().to_string()).filter(|v| !v.is_empty()))
            .map_err(|_| ApiError::BadRequest(format!("Header {} is not valid text", name))),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let fid = match header(parts, FID_HEADER)? {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                ApiError::BadRequest(format!("Header {} must be a number", FID_HEADER))
            })?),
            None => None,
        };
        let username = header(parts, USERNAME_HEADER)?;
        let display_name = header(parts, DISPLAY_NAME_HEADER)?;

        if fid.is_none() && username.is_none() && display_name.is_none() {
            return Ok(Session(None));
        }

        Ok(Session(Some(Profile {
            fid,
            username,
            display_name,
        })))
    }
}
