//! Authentication module for the copper-courier server.
//!
//! This module provides:
//! - OAuth authorization-code flows for Outlook, GitHub, and Teams
//! - The session cookie contract: minted on the first successful callback,
//!   echoed by the user agent afterwards, kept across logout
//! - Authentication extractors gating routes on per-provider credentials
//!
//! The credential store is threaded through [`AppState`] as an explicit
//! trait object: tokens are always addressed by the session identifier
//! from the request, never by ambient process-wide state. The OAuth
//! clients never talk to the store; the callback routes receive the
//! exchanged tokens and hand them over.

pub mod client;
pub mod middleware;
pub mod providers;
pub mod routes;

use std::sync::Arc;

use copper_courier_session::{CredentialStore, Provider};

use crate::config::{ServerConfig, SessionConfig};
use client::OAuthClient;

pub use client::{OAuthError, ProviderTokens};
pub use middleware::{CurrentSession, RequireGithub, RequireOutlook, RequireTeams};
pub use routes::SESSION_COOKIE;

/// OAuth clients for the configured providers.
///
/// A provider left unconfigured is `None` here; its login routes answer
/// 503 while the rest of the server keeps working.
#[derive(Clone, Default)]
pub struct OAuthClients {
    /// Outlook (Microsoft Graph mail) client.
    pub outlook: Option<OAuthClient>,
    /// GitHub client.
    pub github: Option<OAuthClient>,
    /// Teams (Microsoft Graph) client.
    pub teams: Option<OAuthClient>,
}

impl OAuthClients {
    /// Builds clients for every provider with complete configuration.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            outlook: Self::build(providers::outlook_client(&config.outlook)),
            github: Self::build(providers::github_client(&config.github)),
            teams: Self::build(providers::teams_client(&config.teams)),
        }
    }

    fn build(result: Result<OAuthClient, OAuthError>) -> Option<OAuthClient> {
        match result {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "OAuth provider unavailable; login disabled");
                None
            }
        }
    }

    /// Returns the client for a provider, if configured.
    #[must_use]
    pub fn get(&self, provider: Provider) -> Option<&OAuthClient> {
        match provider {
            Provider::Outlook => self.outlook.as_ref(),
            Provider::Github => self.github.as_ref(),
            Provider::Teams => self.teams.as_ref(),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Session credential store.
    pub store: Arc<dyn CredentialStore>,
    /// OAuth clients per provider.
    pub oauth: OAuthClients,
    /// Session cookie configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        oauth: OAuthClients,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            store,
            oauth,
            session_config,
        }
    }
}
