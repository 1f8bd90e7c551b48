//! End-to-end tests for the OAuth flows and provider-gated routes.
//!
//! The provider token endpoints are mocked with wiremock; requests are
//! dispatched through the real router via `tower::ServiceExt::oneshot`
//! against the in-memory credential store.

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use copper_courier_server::{
    auth::{
        AppState, OAuthClients,
        client::{OAuthClient, OAuthEndpoints},
    },
    config::{OAuthProviderConfig, SessionConfig},
    routes::build_router,
};
use copper_courier_session::{MemoryCredentialStore, Provider};

/// Builds a router wired to an in-memory store and a mocked authorization
/// server. The mock server must outlive the test.
async fn test_app() -> (Router, MockServer) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/outlook/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "outlook_access_token",
            "refresh_token": "outlook_refresh_token",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/github/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "github_access_token",
            "token_type": "bearer",
            "scope": "repo,user",
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/teams/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "teams_access_token",
            "refresh_token": "teams_refresh_token",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;

    let config = OAuthProviderConfig {
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
        redirect_url: Some("http://localhost:8000/auth/callback".to_string()),
        tenant: None,
    };

    let client = |provider: Provider, token_path: &str, use_pkce: bool| {
        OAuthClient::new(
            provider,
            &config,
            OAuthEndpoints {
                auth_url: format!("{}/authorize", server.uri()),
                token_url: format!("{}{}", server.uri(), token_path),
            },
            &["test-scope"],
            vec![],
            use_pkce,
        )
        .expect("client")
    };

    let oauth = OAuthClients {
        outlook: Some(client(Provider::Outlook, "/outlook/token", true)),
        github: Some(client(Provider::Github, "/github/token", false)),
        teams: Some(client(Provider::Teams, "/teams/token", true)),
    };

    let state = Arc::new(AppState::new(
        Arc::new(MemoryCredentialStore::new()),
        oauth,
        SessionConfig {
            secure_cookies: false,
        },
    ));

    (build_router(state), server)
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("request")
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::empty()).expect("request")).await
}

/// Extracts a `name=value` pair from the response's Set-Cookie headers.
fn extract_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .find_map(|value| {
            let value = value.to_str().ok()?;
            value
                .starts_with(&prefix)
                .then(|| value.split(';').next().unwrap_or(value).to_string())
        })
}

fn query_param(location: &str, name: &str) -> Option<String> {
    let (_, query) = location.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse body")
}

/// Drives one full login round-trip for a provider and returns the
/// `mcp_session_id=..` cookie pair from the callback response. An existing
/// session cookie can be carried through to reuse the session.
async fn login(app: &Router, provider: &str, session_cookie: Option<&str>) -> String {
    let response = get(app, &format!("/auth/{provider}/start"), None).await;
    assert!(
        response.status().is_redirection(),
        "start should redirect, got {}",
        response.status()
    );

    let state_cookie =
        extract_cookie(&response, &format!("{provider}_auth_state")).expect("state cookie");
    let location = response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("location is ascii")
        .to_string();
    let csrf = query_param(&location, "state").expect("state param in authorization URL");

    let mut cookies = state_cookie;
    if let Some(session_cookie) = session_cookie {
        cookies = format!("{cookies}; {session_cookie}");
    }

    let response = get(
        app,
        &format!("/auth/{provider}/callback?code=test-code&state={csrf}"),
        Some(&cookies),
    )
    .await;
    assert!(
        response.status().is_redirection(),
        "callback should redirect, got {}",
        response.status()
    );

    extract_cookie(&response, "mcp_session_id").expect("session cookie")
}

fn provider_connected(overview: &serde_json::Value, provider: &str) -> bool {
    overview["providers"]
        .as_array()
        .expect("providers array")
        .iter()
        .find(|entry| entry["provider"] == provider)
        .expect("provider entry")["connected"]
        .as_bool()
        .expect("connected flag")
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let (app, _server) = test_app().await;

    let response = get(&app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn gated_routes_require_a_session() {
    let (app, _server) = test_app().await;

    let response = get(&app, "/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A malformed session identifier is treated like an absent one.
    let response = get(&app, "/dashboard", Some("mcp_session_id=not-a-uuid")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(&app, "/api/github/status", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tokens_are_isolated_between_sessions() {
    let (app, _server) = test_app().await;

    // Session A connects Outlook; session B connects GitHub.
    let cookie_a = login(&app, "outlook", None).await;
    let cookie_b = login(&app, "github", None).await;
    assert_ne!(cookie_a, cookie_b);

    // The Outlook-gated dashboard admits A and rejects B.
    let response = get(&app, "/dashboard", Some(&cookie_a)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/dashboard", Some(&cookie_b)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn one_cookie_accumulates_all_three_providers() {
    let (app, _server) = test_app().await;

    let cookie = login(&app, "outlook", None).await;
    let second = login(&app, "github", Some(&cookie)).await;
    assert_eq!(cookie, second, "existing session must be reused");
    let third = login(&app, "teams", Some(&cookie)).await;
    assert_eq!(cookie, third);

    let response = get(&app, "/api/session", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let overview = body_json(response).await;
    assert!(provider_connected(&overview, "outlook"));
    assert!(provider_connected(&overview, "github"));
    assert!(provider_connected(&overview, "teams"));
}

#[tokio::test]
async fn logout_clears_exactly_one_provider() {
    let (app, _server) = test_app().await;

    let cookie = login(&app, "outlook", None).await;
    login(&app, "github", Some(&cookie)).await;
    login(&app, "teams", Some(&cookie)).await;

    let response = get(&app, "/auth/github/logout", Some(&cookie)).await;
    assert!(response.status().is_redirection());
    // Logout clears the provider's tokens, not the session cookie.
    assert!(extract_cookie(&response, "mcp_session_id").is_none());

    let response = get(&app, "/api/github/status", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(&app, "/api/outlook/status", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/api/teams/status", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn callback_with_mismatched_state_is_rejected() {
    let (app, _server) = test_app().await;

    let response = get(&app, "/auth/github/start", None).await;
    let state_cookie = extract_cookie(&response, "github_auth_state").expect("state cookie");

    let response = get(
        &app,
        "/auth/github/callback?code=test-code&state=tampered",
        Some(&state_cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_without_state_cookie_is_rejected() {
    let (app, _server) = test_app().await;

    let response = get(&app, "/auth/github/callback?code=test-code&state=anything", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn home_redirects_by_connection_state() {
    let (app, _server) = test_app().await;

    let response = get(&app, "/", None).await;
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/auth"
    );

    let cookie = login(&app, "outlook", None).await;
    let response = get(&app, "/", Some(&cookie)).await;
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/dashboard"
    );
}

#[tokio::test]
async fn provider_detail_reports_refresh_token_presence() {
    let (app, _server) = test_app().await;

    let cookie = login(&app, "outlook", None).await;
    login(&app, "github", Some(&cookie)).await;

    let response = get(&app, "/api/outlook/status", Some(&cookie)).await;
    let detail = body_json(response).await;
    assert_eq!(detail["connected"], true);
    assert_eq!(detail["has_refresh_token"], true);

    let response = get(&app, "/api/github/status", Some(&cookie)).await;
    let detail = body_json(response).await;
    assert_eq!(detail["has_refresh_token"], false);
}
