//! HTTP routes and router assembly.
//!
//! Provider-gated routes report the session's connection state; the
//! upstream data fetches (mail, repositories, chats) live in downstream
//! API clients that read tokens out of the store. No route ever returns a
//! token value.

use std::sync::Arc;

use axum::{
    Json, Router,
    response::{IntoResponse, Redirect},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use copper_courier_session::{Provider, SessionRecord};

use crate::auth::{
    self, AppState, CurrentSession, RequireGithub, RequireOutlook, RequireTeams,
};

/// Builds the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/dashboard", get(dashboard))
        .route("/auth", get(auth_index))
        .route("/auth/outlook/start", get(auth::routes::outlook_start))
        .route("/auth/outlook/callback", get(auth::routes::outlook_callback))
        .route("/auth/outlook/logout", get(auth::routes::outlook_logout))
        .route("/auth/github/start", get(auth::routes::github_start))
        .route("/auth/github/callback", get(auth::routes::github_callback))
        .route("/auth/github/logout", get(auth::routes::github_logout))
        .route("/auth/teams/start", get(auth::routes::teams_start))
        .route("/auth/teams/callback", get(auth::routes::teams_callback))
        .route("/auth/teams/logout", get(auth::routes::teams_logout))
        .route("/api/session", get(session_status))
        .route("/api/outlook/status", get(outlook_status))
        .route("/api/github/status", get(github_status))
        .route("/api/teams/status", get(teams_status))
        .with_state(state)
}

/// Connection state of one provider for the current session.
#[derive(Debug, Serialize)]
struct ProviderStatus {
    provider: Provider,
    connected: bool,
}

/// Connection overview for one session. Never carries token values.
#[derive(Debug, Serialize)]
struct SessionOverview {
    providers: Vec<ProviderStatus>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl SessionOverview {
    fn from_record(record: Option<&SessionRecord>) -> Self {
        Self {
            providers: Provider::ALL
                .into_iter()
                .map(|provider| ProviderStatus {
                    provider,
                    connected: record.is_some_and(|r| r.is_authenticated(provider)),
                })
                .collect(),
            created_at: record.map(|r| r.created_at),
            updated_at: record.map(|r| r.updated_at),
        }
    }
}

/// Entry point: sends connected sessions to the dashboard, everyone else
/// to the provider chooser.
async fn home(CurrentSession(record): CurrentSession) -> Redirect {
    let connected = record
        .as_ref()
        .is_some_and(|r| !r.connected_providers().is_empty());

    if connected {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/auth")
    }
}

/// Liveness probe.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "copper-courier",
    }))
}

/// Provider chooser: each provider with its login route and connection
/// state for the current session.
async fn auth_index(CurrentSession(record): CurrentSession) -> impl IntoResponse {
    #[derive(Serialize)]
    struct ProviderEntry {
        provider: Provider,
        login_url: String,
        connected: bool,
    }

    let providers: Vec<ProviderEntry> = Provider::ALL
        .into_iter()
        .map(|provider| ProviderEntry {
            provider,
            login_url: format!("/auth/{}/start", provider.as_str()),
            connected: record
                .as_ref()
                .is_some_and(|r| r.is_authenticated(provider)),
        })
        .collect();

    Json(providers)
}

/// Dashboard overview. Outlook-gated, matching the entry layer's contract.
async fn dashboard(RequireOutlook(record): RequireOutlook) -> impl IntoResponse {
    Json(SessionOverview::from_record(Some(&record)))
}

/// Connection overview for the current session; all-disconnected when the
/// store has never seen the caller.
async fn session_status(CurrentSession(record): CurrentSession) -> impl IntoResponse {
    Json(SessionOverview::from_record(record.as_ref()))
}

/// Detail view of one connected provider.
#[derive(Debug, Serialize)]
struct ProviderDetail {
    provider: Provider,
    connected: bool,
    has_refresh_token: bool,
    updated_at: DateTime<Utc>,
}

fn provider_detail(record: &SessionRecord, provider: Provider) -> Json<ProviderDetail> {
    Json(ProviderDetail {
        provider,
        connected: true,
        has_refresh_token: record.refresh_token(provider).is_some(),
        updated_at: record.updated_at,
    })
}

/// Outlook connection status. 401 when the session lacks an Outlook token.
async fn outlook_status(RequireOutlook(record): RequireOutlook) -> impl IntoResponse {
    provider_detail(&record, Provider::Outlook)
}

/// GitHub connection status. 401 when the session lacks a GitHub token.
async fn github_status(RequireGithub(record): RequireGithub) -> impl IntoResponse {
    provider_detail(&record, Provider::Github)
}

/// Teams connection status. 401 when the session lacks a Teams token.
async fn teams_status(RequireTeams(record): RequireTeams) -> impl IntoResponse {
    provider_detail(&record, Provider::Teams)
}
