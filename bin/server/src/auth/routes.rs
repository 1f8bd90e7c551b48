//! OAuth login, callback, and logout routes for the three providers.
//!
//! Every provider follows the same shape:
//!
//! - `/auth/{provider}/start` redirects to the authorization URL and
//!   stashes CSRF state (plus the PKCE verifier where used) in a
//!   short-lived cookie
//! - `/auth/{provider}/callback` validates the state, exchanges the code,
//!   and upserts that provider's tokens under the session identifier,
//!   minting the session cookie on the first successful callback
//! - `/auth/{provider}/logout` clears that provider's tokens only; the
//!   session cookie survives logout

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration as TimeDuration;

use copper_courier_session::{Provider, SessionId, StoreError};

use super::{
    AppState,
    client::{OAuthError, ProviderTokens},
};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "mcp_session_id";

/// Lifetime of the state cookie covering one login round-trip.
const AUTH_STATE_TTL: TimeDuration = TimeDuration::minutes(10);

fn auth_state_cookie_name(provider: Provider) -> String {
    format!("{}_auth_state", provider.as_str())
}

/// Query parameters for an OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: String,
    state: String,
}

/// Serializable flow state for cookie storage.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct AuthStateData {
    csrf_token: String,
    pkce_verifier: Option<String>,
}

/// Initiates the Outlook login flow.
pub async fn outlook_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    start_flow(&state, jar, Provider::Outlook)
}

/// Initiates the GitHub login flow.
pub async fn github_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    start_flow(&state, jar, Provider::Github)
}

/// Initiates the Teams login flow.
pub async fn teams_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    start_flow(&state, jar, Provider::Teams)
}

fn start_flow(
    state: &AppState,
    jar: CookieJar,
    provider: Provider,
) -> Result<(CookieJar, Redirect), AuthError> {
    let client = state
        .oauth
        .get(provider)
        .ok_or(AuthError::NotConfigured { provider })?;

    let (auth_url, flow_state) = client.authorization_url();

    let state_json = serde_json::to_string(&AuthStateData {
        csrf_token: flow_state.csrf_token,
        pkce_verifier: flow_state.pkce_verifier,
    })
    .expect("serialize auth state");

    let cookie = Cookie::build((auth_state_cookie_name(provider), state_json))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(AUTH_STATE_TTL);

    Ok((jar.add(cookie), Redirect::to(&auth_url)))
}

/// Handles the Outlook OAuth callback.
pub async fn outlook_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let (jar, session_id, tokens) = run_exchange(&state, Provider::Outlook, &query, jar).await?;

    state
        .store
        .set_outlook_tokens(
            &session_id,
            &tokens.access_token,
            tokens.refresh_token.as_deref(),
        )
        .await?;

    tracing::info!(session_id = %session_id, "Outlook connected");
    Ok((jar, Redirect::to("/dashboard")))
}

/// Handles the GitHub OAuth callback.
pub async fn github_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let (jar, session_id, tokens) = run_exchange(&state, Provider::Github, &query, jar).await?;

    state
        .store
        .set_github_token(&session_id, &tokens.access_token)
        .await?;

    tracing::info!(session_id = %session_id, "GitHub connected");
    Ok((jar, Redirect::to("/dashboard")))
}

/// Handles the Teams OAuth callback.
pub async fn teams_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let (jar, session_id, tokens) = run_exchange(&state, Provider::Teams, &query, jar).await?;

    state
        .store
        .set_teams_tokens(
            &session_id,
            &tokens.access_token,
            tokens.refresh_token.as_deref(),
        )
        .await?;

    tracing::info!(session_id = %session_id, "Teams connected");
    Ok((jar, Redirect::to("/dashboard")))
}

/// Validates flow state, exchanges the code, and resolves the session.
///
/// The caller's session is reused when the cookie carries a valid
/// identifier; otherwise one is minted. The identifier is never chosen by
/// the client, and a malformed cookie is treated the same as an absent
/// one.
async fn run_exchange(
    state: &AppState,
    provider: Provider,
    query: &CallbackQuery,
    jar: CookieJar,
) -> Result<(CookieJar, SessionId, ProviderTokens), AuthError> {
    let client = state
        .oauth
        .get(provider)
        .ok_or(AuthError::NotConfigured { provider })?;

    let state_cookie_name = auth_state_cookie_name(provider);
    let state_cookie = jar
        .get(&state_cookie_name)
        .ok_or(AuthError::MissingAuthState)?;

    let state_data: AuthStateData =
        serde_json::from_str(state_cookie.value()).map_err(|_| AuthError::InvalidAuthState)?;

    if query.state != state_data.csrf_token {
        return Err(AuthError::CsrfMismatch);
    }

    let tokens = client
        .exchange_code(&query.code, state_data.pkce_verifier.as_deref())
        .await?;

    let session_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| SessionId::from_str(cookie.value()).ok())
        .unwrap_or_else(SessionId::mint);

    let session_cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax);

    let remove_state = Cookie::build((state_cookie_name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    Ok((jar.add(session_cookie).add(remove_state), session_id, tokens))
}

/// Logs the session out of Outlook.
pub async fn outlook_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    logout_flow(&state, &jar, Provider::Outlook).await
}

/// Logs the session out of GitHub.
pub async fn github_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    logout_flow(&state, &jar, Provider::Github).await
}

/// Logs the session out of Teams.
pub async fn teams_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    logout_flow(&state, &jar, Provider::Teams).await
}

async fn logout_flow(
    state: &AppState,
    jar: &CookieJar,
    provider: Provider,
) -> Result<Redirect, AuthError> {
    if let Some(session_id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| SessionId::from_str(cookie.value()).ok())
    {
        state.store.clear_provider(&session_id, provider).await?;
        tracing::info!(session_id = %session_id, provider = %provider, "provider disconnected");
    }

    Ok(Redirect::to("/"))
}

/// Errors from the OAuth routes.
#[derive(Debug)]
pub enum AuthError {
    /// The provider has no configured OAuth application.
    NotConfigured { provider: Provider },
    /// No state cookie accompanied the callback.
    MissingAuthState,
    /// The state cookie could not be parsed.
    InvalidAuthState,
    /// The callback's `state` did not match the stashed CSRF token.
    CsrfMismatch,
    /// The code-for-token exchange failed.
    TokenExchange(String),
    /// The credential store failed.
    Store(StoreError),
}

impl From<OAuthError> for AuthError {
    fn from(e: OAuthError) -> Self {
        match e {
            OAuthError::NotConfigured { provider } => Self::NotConfigured { provider },
            OAuthError::Configuration(msg) | OAuthError::TokenExchange(msg) => {
                Self::TokenExchange(msg)
            }
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotConfigured { provider } => {
                tracing::warn!(provider = %provider, "login attempted for unconfigured provider");
                (StatusCode::SERVICE_UNAVAILABLE, "Provider login not available")
            }
            Self::MissingAuthState => (StatusCode::BAD_REQUEST, "Missing auth state"),
            Self::InvalidAuthState => (StatusCode::BAD_REQUEST, "Invalid auth state"),
            Self::CsrfMismatch => (StatusCode::BAD_REQUEST, "CSRF token mismatch"),
            Self::TokenExchange(msg) => {
                tracing::error!("Token exchange failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
            }
            Self::Store(e) => {
                tracing::error!(error = %e, "Credential store error during auth flow");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
