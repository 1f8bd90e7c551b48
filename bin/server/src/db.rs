//! Postgres-backed credential store.
//!
//! One `sessions` table keyed by session identifier. Each named upsert is
//! a single `INSERT .. ON CONFLICT DO UPDATE` statement touching only that
//! provider's columns, so concurrent writes to the same session serialize
//! at the row and a cancelled request never leaves a half-applied write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use copper_courier_session::{CredentialStore, Provider, SessionId, SessionRecord, StoreError};

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    session_id: String,
    outlook_access_token: Option<String>,
    outlook_refresh_token: Option<String>,
    github_access_token: Option<String>,
    teams_access_token: Option<String>,
    teams_refresh_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_record(self) -> Result<SessionRecord, StoreError> {
        let session_id =
            SessionId::from_str(&self.session_id).map_err(|e| StoreError::Unavailable {
                details: format!("invalid session id '{}' in storage: {}", self.session_id, e),
            })?;

        Ok(SessionRecord {
            session_id,
            outlook_access_token: self.outlook_access_token,
            outlook_refresh_token: self.outlook_refresh_token,
            github_access_token: self.github_access_token,
            teams_access_token: self.teams_access_token,
            teams_refresh_token: self.teams_refresh_token,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable {
        details: e.to_string(),
    }
}

/// Credential store over the `sessions` table.
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Creates a store over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT session_id, outlook_access_token, outlook_refresh_token,
                   github_access_token, teams_access_token, teams_refresh_token,
                   created_at, updated_at
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        match row {
            Some(r) => Ok(Some(r.try_into_record()?)),
            None => Ok(None),
        }
    }

    async fn set_outlook_tokens(
        &self,
        session_id: &SessionId,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<SessionRecord, StoreError> {
        let row: SessionRow = sqlx::query_as(
            r#"
            INSERT INTO sessions
                (session_id, outlook_access_token, outlook_refresh_token, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (session_id) DO UPDATE
            SET outlook_access_token = EXCLUDED.outlook_access_token,
                outlook_refresh_token = EXCLUDED.outlook_refresh_token,
                updated_at = NOW()
            RETURNING session_id, outlook_access_token, outlook_refresh_token,
                      github_access_token, teams_access_token, teams_refresh_token,
                      created_at, updated_at
            "#,
        )
        .bind(session_id.to_string())
        .bind(access_token)
        .bind(refresh_token)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        row.try_into_record()
    }

    async fn set_github_token(
        &self,
        session_id: &SessionId,
        access_token: &str,
    ) -> Result<SessionRecord, StoreError> {
        let row: SessionRow = sqlx::query_as(
            r#"
            INSERT INTO sessions
                (session_id, github_access_token, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            ON CONFLICT (session_id) DO UPDATE
            SET github_access_token = EXCLUDED.github_access_token,
                updated_at = NOW()
            RETURNING session_id, outlook_access_token, outlook_refresh_token,
                      github_access_token, teams_access_token, teams_refresh_token,
                      created_at, updated_at
            "#,
        )
        .bind(session_id.to_string())
        .bind(access_token)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        row.try_into_record()
    }

    async fn set_teams_tokens(
        &self,
        session_id: &SessionId,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<SessionRecord, StoreError> {
        let row: SessionRow = sqlx::query_as(
            r#"
            INSERT INTO sessions
                (session_id, teams_access_token, teams_refresh_token, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (session_id) DO UPDATE
            SET teams_access_token = EXCLUDED.teams_access_token,
                teams_refresh_token = EXCLUDED.teams_refresh_token,
                updated_at = NOW()
            RETURNING session_id, outlook_access_token, outlook_refresh_token,
                      github_access_token, teams_access_token, teams_refresh_token,
                      created_at, updated_at
            "#,
        )
        .bind(session_id.to_string())
        .bind(access_token)
        .bind(refresh_token)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        row.try_into_record()
    }

    async fn clear_provider(
        &self,
        session_id: &SessionId,
        provider: Provider,
    ) -> Result<(), StoreError> {
        let query = match provider {
            Provider::Outlook => {
                r#"
                UPDATE sessions
                SET outlook_access_token = NULL, outlook_refresh_token = NULL, updated_at = NOW()
                WHERE session_id = $1
                "#
            }
            Provider::Github => {
                r#"
                UPDATE sessions
                SET github_access_token = NULL, updated_at = NOW()
                WHERE session_id = $1
                "#
            }
            Provider::Teams => {
                r#"
                UPDATE sessions
                SET teams_access_token = NULL, teams_refresh_token = NULL, updated_at = NOW()
                WHERE session_id = $1
                "#
            }
        };

        sqlx::query(query)
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(())
    }
}
