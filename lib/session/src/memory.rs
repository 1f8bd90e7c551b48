//! In-memory credential store.
//!
//! The test double for the HTTP layer and the store used in single-process
//! development. Applies the same record semantics as the Postgres-backed
//! store; each operation takes the map mutex for one critical section and
//! never holds it across an await point, which gives the same
//! one-complete-upsert-after-another serialization per session.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{CredentialStore, Provider, SessionId, SessionRecord, StoreError};

/// Mutex-guarded map of session records, keyed by session identifier.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    sessions: Mutex<HashMap<SessionId, SessionRecord>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, SessionRecord>>, StoreError> {
        self.sessions.lock().map_err(|_| StoreError::Unavailable {
            details: "session map mutex poisoned".to_string(),
        })
    }

    fn upsert_with(
        &self,
        session_id: &SessionId,
        apply: impl FnOnce(&mut SessionRecord),
    ) -> Result<SessionRecord, StoreError> {
        let mut sessions = self.lock()?;
        let record = sessions
            .entry(*session_id)
            .or_insert_with(|| SessionRecord::new(*session_id));
        apply(record);
        Ok(record.clone())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.lock()?.get(session_id).cloned())
    }

    async fn set_outlook_tokens(
        &self,
        session_id: &SessionId,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<SessionRecord, StoreError> {
        self.upsert_with(session_id, |record| {
            record.set_outlook_tokens(access_token.to_string(), refresh_token.map(str::to_string));
        })
    }

    async fn set_github_token(
        &self,
        session_id: &SessionId,
        access_token: &str,
    ) -> Result<SessionRecord, StoreError> {
        self.upsert_with(session_id, |record| {
            record.set_github_token(access_token.to_string());
        })
    }

    async fn set_teams_tokens(
        &self,
        session_id: &SessionId,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<SessionRecord, StoreError> {
        self.upsert_with(session_id, |record| {
            record.set_teams_tokens(access_token.to_string(), refresh_token.map(str::to_string));
        })
    }

    async fn clear_provider(
        &self,
        session_id: &SessionId,
        provider: Provider,
    ) -> Result<(), StoreError> {
        let mut sessions = self.lock()?;
        if let Some(record) = sessions.get_mut(session_id) {
            record.clear_provider(provider);
        }
        Ok(())
    }
}
