//! Authentication extractors for Axum routes.
//!
//! Gated routes answer 401 when the session lacks the provider's token.
//! A storage failure is a 500, never a 401: an outage must not read as a
//! logout. A missing or malformed session cookie is plain
//! "not authenticated".

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use std::str::FromStr;
use std::sync::Arc;

use copper_courier_session::{Provider, SessionId, SessionRecord};

use super::{AppState, routes::SESSION_COOKIE};

/// Extractor for the caller's session record, if any.
///
/// An absent cookie, a malformed cookie, and a session the store has never
/// seen all yield `None`; only a storage failure rejects.
pub struct CurrentSession(pub Option<SessionRecord>);

impl<S> FromRequestParts<S> for CurrentSession
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthRejection::Internal)?;

        let Some(session_id) = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| SessionId::from_str(cookie.value()).ok())
        else {
            return Ok(CurrentSession(None));
        };

        let record = app_state.store.get(&session_id).await.map_err(|e| {
            tracing::error!(error = %e, "credential store lookup failed");
            AuthRejection::StoreUnavailable
        })?;

        Ok(CurrentSession(record))
    }
}

/// Extractor requiring Outlook authentication.
pub struct RequireOutlook(pub SessionRecord);

/// Extractor requiring GitHub authentication.
pub struct RequireGithub(pub SessionRecord);

/// Extractor requiring Teams authentication.
pub struct RequireTeams(pub SessionRecord);

async fn require_provider<S>(
    parts: &mut Parts,
    state: &S,
    provider: Provider,
) -> Result<SessionRecord, AuthRejection>
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    let CurrentSession(record) = CurrentSession::from_request_parts(parts, state).await?;
    let record = record.ok_or(AuthRejection::NotAuthenticated)?;

    if !record.is_authenticated(provider) {
        return Err(AuthRejection::NotAuthenticated);
    }

    Ok(record)
}

impl<S> FromRequestParts<S> for RequireOutlook
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(require_provider(parts, state, Provider::Outlook).await?))
    }
}

impl<S> FromRequestParts<S> for RequireGithub
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(require_provider(parts, state, Provider::Github).await?))
    }
}

impl<S> FromRequestParts<S> for RequireTeams
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(require_provider(parts, state, Provider::Teams).await?))
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    /// No session, or the session lacks the required provider's token.
    NotAuthenticated,
    /// The credential store could not be queried.
    StoreUnavailable,
    /// Cookie extraction failed.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => {
                (StatusCode::UNAUTHORIZED, "Not authenticated").into_response()
            }
            Self::StoreUnavailable | Self::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
