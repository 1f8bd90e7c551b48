//! Store contract and error type.

use async_trait::async_trait;
use std::fmt;

use crate::{Provider, SessionId, SessionRecord};

/// Errors from credential-store operations.
///
/// A storage failure is deliberately distinct from "not authenticated":
/// a caller that conflated the two would treat a storage outage as a
/// logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing storage could not be reached or the query failed.
    Unavailable { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => {
                write!(f, "credential store unavailable: {details}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Durable mapping from session identifier to per-provider credentials.
///
/// The single source of truth for "is this caller authenticated with
/// provider X". Implementations must apply each write atomically:
/// concurrent writes to the same session serialize to one complete upsert
/// after another, never a field-level interleaving. The store performs no
/// retries of its own; atomic writes are what make caller-side retries
/// safe.
///
/// Each provider's write is a named operation touching only that
/// provider's fields, so the "other providers untouched" invariant is
/// structural rather than a caller obligation.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up a session's credential bundle.
    ///
    /// Keyed lookup with no side effects. Returns `None` for a session the
    /// store has never seen.
    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, StoreError>;

    /// Inserts or updates the Outlook token pair for a session.
    ///
    /// Creates the record if this is the session's first callback; returns
    /// the full resulting bundle.
    async fn set_outlook_tokens(
        &self,
        session_id: &SessionId,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<SessionRecord, StoreError>;

    /// Inserts or updates the GitHub access token for a session.
    async fn set_github_token(
        &self,
        session_id: &SessionId,
        access_token: &str,
    ) -> Result<SessionRecord, StoreError>;

    /// Inserts or updates the Teams token pair for a session.
    async fn set_teams_tokens(
        &self,
        session_id: &SessionId,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<SessionRecord, StoreError>;

    /// Clears the provider's tokens for a session (logout).
    ///
    /// No-op if the session does not exist or the provider was already
    /// unauthenticated. Other providers' fields are untouched; the record
    /// itself is kept.
    async fn clear_provider(
        &self,
        session_id: &SessionId,
        provider: Provider,
    ) -> Result<(), StoreError>;

    /// True iff the session exists and holds a non-empty access token for
    /// the provider.
    ///
    /// A session the store has never seen yields `false`, never an error;
    /// storage failures still surface as [`StoreError::Unavailable`].
    async fn is_authenticated(
        &self,
        session_id: &SessionId,
        provider: Provider,
    ) -> Result<bool, StoreError> {
        Ok(self
            .get(session_id)
            .await?
            .map(|record| record.is_authenticated(provider))
            .unwrap_or(false))
    }
}
