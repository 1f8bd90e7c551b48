//! The per-session credential bundle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Provider, SessionId};

/// Credential bundle for one anonymous browser session.
///
/// A record is created lazily by the first successful OAuth callback for
/// any provider, not at first page visit. Each provider's fields are
/// independent: writing one provider's tokens never touches another's.
/// Records are never hard-deleted; logout nulls the provider's fields and
/// keeps the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The session this bundle belongs to.
    pub session_id: SessionId,
    /// Outlook (Microsoft Graph mail) access token.
    pub outlook_access_token: Option<String>,
    /// Outlook refresh token.
    pub outlook_refresh_token: Option<String>,
    /// GitHub access token.
    pub github_access_token: Option<String>,
    /// Teams (Microsoft Graph) access token.
    pub teams_access_token: Option<String>,
    /// Teams refresh token.
    pub teams_refresh_token: Option<String>,
    /// When the record was first created.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Creates an empty record for a session, with no provider credentials.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            outlook_access_token: None,
            outlook_refresh_token: None,
            github_access_token: None,
            teams_access_token: None,
            teams_refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the provider's access token, if present and non-empty.
    ///
    /// An empty string counts as absent: a session whose token field holds
    /// `""` is not authenticated with that provider.
    #[must_use]
    pub fn access_token(&self, provider: Provider) -> Option<&str> {
        let token = match provider {
            Provider::Outlook => self.outlook_access_token.as_deref(),
            Provider::Github => self.github_access_token.as_deref(),
            Provider::Teams => self.teams_access_token.as_deref(),
        };
        token.filter(|t| !t.is_empty())
    }

    /// Returns the provider's refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Outlook => self.outlook_refresh_token.as_deref(),
            Provider::Github => None,
            Provider::Teams => self.teams_refresh_token.as_deref(),
        }
    }

    /// True iff this session holds a usable access token for the provider.
    #[must_use]
    pub fn is_authenticated(&self, provider: Provider) -> bool {
        self.access_token(provider).is_some()
    }

    /// Providers this session currently holds credentials for.
    #[must_use]
    pub fn connected_providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.is_authenticated(*p))
            .collect()
    }

    /// Sets the Outlook token pair. All other fields are untouched.
    pub fn set_outlook_tokens(&mut self, access_token: String, refresh_token: Option<String>) {
        self.outlook_access_token = Some(access_token);
        self.outlook_refresh_token = refresh_token;
        self.touch();
    }

    /// Sets the GitHub access token. All other fields are untouched.
    pub fn set_github_token(&mut self, access_token: String) {
        self.github_access_token = Some(access_token);
        self.touch();
    }

    /// Sets the Teams token pair. All other fields are untouched.
    pub fn set_teams_tokens(&mut self, access_token: String, refresh_token: Option<String>) {
        self.teams_access_token = Some(access_token);
        self.teams_refresh_token = refresh_token;
        self.touch();
    }

    /// Clears the provider's access and refresh tokens (logout).
    ///
    /// Other providers' fields are untouched; clearing an already-clear
    /// provider still advances `updated_at`.
    pub fn clear_provider(&mut self, provider: Provider) {
        match provider {
            Provider::Outlook => {
                self.outlook_access_token = None;
                self.outlook_refresh_token = None;
            }
            Provider::Github => {
                self.github_access_token = None;
            }
            Provider::Teams => {
                self.teams_access_token = None;
                self.teams_refresh_token = None;
            }
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
