//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables with a `__`
//! separator (e.g. `SESSION__SECURE_COOKIES`, `OUTLOOK__CLIENT_ID`).

use serde::Deserialize;

/// Server configuration composed from section configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address to bind the HTTP listener to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Outlook (Microsoft Graph mail) OAuth application.
    #[serde(default)]
    pub outlook: OAuthProviderConfig,

    /// GitHub OAuth application.
    #[serde(default)]
    pub github: OAuthProviderConfig,

    /// Teams (Microsoft Graph) OAuth application.
    #[serde(default)]
    pub teams: OAuthProviderConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8000".to_string()
}

/// Session-cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP
    /// development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secure_cookies: default_secure_cookies(),
        }
    }
}

/// OAuth application credentials for one provider.
///
/// Every field is optional: a provider left unconfigured has its login
/// flow unavailable without preventing server startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthProviderConfig {
    /// OAuth application client id.
    pub client_id: Option<String>,
    /// OAuth application client secret.
    pub client_secret: Option<String>,
    /// Redirect URL registered with the provider for the callback route.
    pub redirect_url: Option<String>,
    /// Microsoft directory tenant. Ignored by GitHub; Microsoft providers
    /// fall back to the multi-tenant `common` endpoint.
    pub tenant: Option<String>,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert!(config.secure_cookies);
    }

    #[test]
    fn provider_config_defaults_to_unconfigured() {
        let config = OAuthProviderConfig::default();
        assert!(config.client_id.is_none());
        assert!(config.client_secret.is_none());
        assert!(config.redirect_url.is_none());
        assert!(config.tenant.is_none());
    }
}
