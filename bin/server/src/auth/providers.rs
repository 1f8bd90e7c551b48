//! Provider endpoint definitions and client construction.
//!
//! The authorization/token URLs for the three providers, the scope sets
//! requested at login, and the per-provider client builders.

use copper_courier_session::Provider;

use super::client::{OAuthClient, OAuthEndpoints, OAuthError};
use crate::config::OAuthProviderConfig;

/// GitHub OAuth authorization URL.
const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";

/// GitHub OAuth token URL.
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Microsoft identity platform tenant used when none is configured.
const DEFAULT_MICROSOFT_TENANT: &str = "common";

/// Outlook scopes: offline access for a refresh token, plus mail read.
const OUTLOOK_SCOPES: &[&str] = &["offline_access", "Mail.Read"];

/// GitHub scopes: repository, profile, and org read access.
const GITHUB_SCOPES: &[&str] = &["repo", "user", "read:org"];

/// Teams scopes: offline access plus chat, channel, team, calendar, and
/// meeting read access.
const TEAMS_SCOPES: &[&str] = &[
    "offline_access",
    "Chat.Read",
    "Chat.ReadWrite",
    "Channel.ReadBasic.All",
    "Team.ReadBasic.All",
    "User.Read",
    "Calendars.Read",
    "OnlineMeetings.Read",
];

fn microsoft_endpoints(tenant: Option<&str>) -> OAuthEndpoints {
    let tenant = tenant.unwrap_or(DEFAULT_MICROSOFT_TENANT);
    OAuthEndpoints {
        auth_url: format!("https://login.microsoftonline.com/{tenant}/oauth2/v2.0/authorize"),
        token_url: format!("https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token"),
    }
}

/// Builds the Outlook OAuth client.
///
/// # Errors
///
/// Returns an error if the Outlook application configuration is incomplete.
pub fn outlook_client(config: &OAuthProviderConfig) -> Result<OAuthClient, OAuthError> {
    OAuthClient::new(
        Provider::Outlook,
        config,
        microsoft_endpoints(config.tenant.as_deref()),
        OUTLOOK_SCOPES,
        vec![("response_mode", "query")],
        true,
    )
}

/// Builds the GitHub OAuth client.
///
/// GitHub OAuth apps do not support PKCE; the flow relies on CSRF state
/// alone.
///
/// # Errors
///
/// Returns an error if the GitHub application configuration is incomplete.
pub fn github_client(config: &OAuthProviderConfig) -> Result<OAuthClient, OAuthError> {
    OAuthClient::new(
        Provider::Github,
        config,
        OAuthEndpoints {
            auth_url: GITHUB_AUTH_URL.to_string(),
            token_url: GITHUB_TOKEN_URL.to_string(),
        },
        GITHUB_SCOPES,
        vec![],
        false,
    )
}

/// Builds the Teams OAuth client.
///
/// Teams apps are commonly single-tenant; the configured tenant replaces
/// the `common` endpoint when present.
///
/// # Errors
///
/// Returns an error if the Teams application configuration is incomplete.
pub fn teams_client(config: &OAuthProviderConfig) -> Result<OAuthClient, OAuthError> {
    OAuthClient::new(
        Provider::Teams,
        config,
        microsoft_endpoints(config.tenant.as_deref()),
        TEAMS_SCOPES,
        vec![("response_mode", "query")],
        true,
    )
}
