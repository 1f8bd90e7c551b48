//! OAuth 2.0 authorization-code client shared by the three providers.
//!
//! Wraps the `oauth2` crate's code flow: authorization-URL generation with
//! CSRF state (plus PKCE for providers that support it), and the
//! code-for-token exchange. The client never talks to the credential
//! store; the callback routes receive the tokens and hand them over.

use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EmptyExtraTokenFields,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, StandardTokenResponse, TokenResponse,
    TokenUrl,
    basic::{BasicClient, BasicTokenType},
};

use copper_courier_session::Provider;

use crate::config::OAuthProviderConfig;

/// Type alias for the token response type.
type CodeTokenResponse = StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>;

/// Authorization and token endpoints of one provider.
#[derive(Debug, Clone)]
pub struct OAuthEndpoints {
    /// Authorization URL the user agent is redirected to.
    pub auth_url: String,
    /// Token URL the authorization code is exchanged against.
    pub token_url: String,
}

/// OAuth client for a single provider.
#[derive(Clone)]
pub struct OAuthClient {
    provider: Provider,
    client_id: String,
    client_secret: String,
    endpoints: OAuthEndpoints,
    redirect_url: String,
    scopes: Vec<String>,
    extra_auth_params: Vec<(&'static str, &'static str)>,
    use_pkce: bool,
}

impl OAuthClient {
    /// Creates a client from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::NotConfigured`] if the application credentials
    /// are incomplete, or [`OAuthError::Configuration`] if the redirect URL
    /// is invalid.
    pub fn new(
        provider: Provider,
        config: &OAuthProviderConfig,
        endpoints: OAuthEndpoints,
        scopes: &[&str],
        extra_auth_params: Vec<(&'static str, &'static str)>,
        use_pkce: bool,
    ) -> Result<Self, OAuthError> {
        let client_id = config
            .client_id
            .as_ref()
            .ok_or(OAuthError::NotConfigured { provider })?
            .clone();
        let client_secret = config
            .client_secret
            .as_ref()
            .ok_or(OAuthError::NotConfigured { provider })?
            .clone();
        let redirect_url = config
            .redirect_url
            .as_ref()
            .ok_or(OAuthError::NotConfigured { provider })?
            .clone();

        // Validate the redirect URL at construction time
        let _ = RedirectUrl::new(redirect_url.clone())
            .map_err(|e| OAuthError::Configuration(format!("invalid redirect URL: {e}")))?;

        Ok(Self {
            provider,
            client_id,
            client_secret,
            endpoints,
            redirect_url,
            scopes: scopes.iter().map(|s| (*s).to_string()).collect(),
            extra_auth_params,
            use_pkce,
        })
    }

    /// Returns the provider this client authenticates against.
    #[must_use]
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Generates the authorization URL for one login round-trip.
    ///
    /// Returns the URL to redirect the user agent to, along with the flow
    /// state the callback handler must validate against.
    pub fn authorization_url(&self) -> (String, AuthFlowState) {
        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(self.endpoints.auth_url.clone()).expect("valid auth URL"))
            .set_redirect_uri(
                RedirectUrl::new(self.redirect_url.clone()).expect("valid redirect URL"),
            );

        let mut auth_request = client.authorize_url(CsrfToken::new_random);

        let pkce_verifier = if self.use_pkce {
            let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
            auth_request = auth_request.set_pkce_challenge(pkce_challenge);
            Some(pkce_verifier.secret().clone())
        } else {
            None
        };

        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }
        for (name, value) in &self.extra_auth_params {
            auth_request = auth_request.add_extra_param(*name, *value);
        }

        let (auth_url, csrf_token) = auth_request.url();

        let state = AuthFlowState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier,
        };

        (auth_url.to_string(), state)
    }

    /// Exchanges the authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: Option<&str>,
    ) -> Result<ProviderTokens, OAuthError> {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| OAuthError::TokenExchange(format!("HTTP client error: {e}")))?;

        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_token_uri(
                TokenUrl::new(self.endpoints.token_url.clone()).expect("valid token URL"),
            )
            .set_redirect_uri(
                RedirectUrl::new(self.redirect_url.clone()).expect("valid redirect URL"),
            );

        let mut request = client.exchange_code(AuthorizationCode::new(code.to_string()));
        if let Some(verifier) = pkce_verifier {
            request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_string()));
        }

        let token_result: CodeTokenResponse = request
            .request_async(&http_client)
            .await
            .map_err(|e| OAuthError::TokenExchange(format!("token exchange failed: {e}")))?;

        Ok(ProviderTokens {
            access_token: token_result.access_token().secret().clone(),
            refresh_token: token_result.refresh_token().map(|t| t.secret().clone()),
            expires_in_seconds: token_result.expires_in().map(|d| d.as_secs()),
        })
    }
}

/// State stashed during one login round-trip.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuthFlowState {
    /// CSRF token the callback's `state` parameter must match.
    pub csrf_token: String,
    /// PKCE verifier, for providers whose flow uses one.
    pub pkce_verifier: Option<String>,
}

/// Result of a code-for-token exchange.
#[derive(Debug)]
pub struct ProviderTokens {
    /// Bearer token for the provider's API.
    pub access_token: String,
    /// Refresh token, when the provider issued one.
    pub refresh_token: Option<String>,
    /// Access-token lifetime as reported by the provider.
    pub expires_in_seconds: Option<u64>,
}

/// OAuth client errors.
#[derive(Debug)]
pub enum OAuthError {
    /// The provider has no complete OAuth application configuration.
    NotConfigured { provider: Provider },
    /// Configuration error.
    Configuration(String),
    /// Token exchange failed.
    TokenExchange(String),
}

impl std::fmt::Display for OAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured { provider } => {
                write!(f, "{provider} OAuth is not configured")
            }
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::TokenExchange(msg) => write!(f, "token exchange error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthError {}
