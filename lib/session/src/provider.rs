//! Provider identity for the three external services.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the external services a session can hold credentials for.
///
/// Providers are fully independent: a session may be authenticated with
/// zero, one, two, or all three at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Microsoft Graph mail.
    Outlook,
    /// GitHub REST API.
    Github,
    /// Microsoft Graph Teams endpoints.
    Teams,
}

impl Provider {
    /// All providers, in display order.
    pub const ALL: [Provider; 3] = [Self::Outlook, Self::Github, Self::Teams];

    /// Stable lowercase name, used in route paths and log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Outlook => "outlook",
            Self::Github => "github",
            Self::Teams => "teams",
        }
    }

    /// Whether this provider's OAuth flow issues a refresh token.
    ///
    /// GitHub OAuth apps issue long-lived access tokens with no refresh
    /// token; both Microsoft providers issue one when offline access is
    /// requested.
    #[must_use]
    pub const fn issues_refresh_token(&self) -> bool {
        matches!(self, Self::Outlook | Self::Teams)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names() {
        assert_eq!(Provider::Outlook.as_str(), "outlook");
        assert_eq!(Provider::Github.as_str(), "github");
        assert_eq!(Provider::Teams.as_str(), "teams");
    }

    #[test]
    fn refresh_token_issuance() {
        assert!(Provider::Outlook.issues_refresh_token());
        assert!(!Provider::Github.issues_refresh_token());
        assert!(Provider::Teams.issues_refresh_token());
    }

    #[test]
    fn provider_serde_snake_case() {
        let json = serde_json::to_string(&Provider::Github).expect("serialize");
        assert_eq!(json, "\"github\"");
        let parsed: Provider = serde_json::from_str("\"teams\"").expect("deserialize");
        assert_eq!(parsed, Provider::Teams);
    }
}
