//! Session identifier type.
//!
//! Session identifiers are opaque UUIDs minted by the HTTP entry layer the
//! first time an OAuth callback succeeds for a browser session. They are
//! carried in a cookie and are not themselves a credential for any provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Error returned when parsing a session identifier from a string fails.
///
/// The entry layer treats a malformed identifier the same as an absent one,
/// so this error never crosses the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSessionIdError {
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseSessionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse session id: {}", self.reason)
    }
}

impl std::error::Error for ParseSessionIdError {}

/// Unique identifier for an anonymous browser session.
///
/// Identifiers are minted from a cryptographically random UUID so they
/// cannot collide across unrelated browsers, and are never chosen by the
/// client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Mints a new random session identifier.
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = ParseSessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self).map_err(|e| ParseSessionIdError {
            reason: e.to_string(),
        })
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<SessionId> for Uuid {
    fn from(id: SessionId) -> Self {
        id.0
    }
}
