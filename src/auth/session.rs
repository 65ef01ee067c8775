//! Session identity: the session stores only the user id; every request
//! resolves it once into an [`Identity`] carried in request extensions.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{error, warn};
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::{AccessDenied, AppError};
use crate::state::AppState;

pub const CURR_USER_KEY: &str = "curr_user";
const FLASHES_KEY: &str = "_flashes";

pub const ACCESS_DENIED_MESSAGE: &str = "Access unauthorized.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashKind,
    pub message: String,
}

pub async fn push_flash(
    session: &Session,
    category: FlashKind,
    message: impl Into<String>,
) -> Result<(), AppError> {
    let mut flashes: Vec<Flash> = session.get(FLASHES_KEY).await?.unwrap_or_default();
    flashes.push(Flash {
        category,
        message: message.into(),
    });
    session.insert(FLASHES_KEY, flashes).await?;
    Ok(())
}

/// Drains queued flashes; each message is shown once.
pub async fn take_flashes(session: &Session) -> Result<Vec<Flash>, AppError> {
    Ok(session
        .remove::<Vec<Flash>>(FLASHES_KEY)
        .await?
        .unwrap_or_default())
}

/// Binds the session to `user`, rotating the session id first.
pub async fn login(session: &Session, user: &User) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(CURR_USER_KEY, user.id).await?;
    Ok(())
}

pub async fn logout(session: &Session) -> Result<(), AppError> {
    session.remove::<Uuid>(CURR_USER_KEY).await?;
    Ok(())
}

/// The caller's identity for this request, resolved by [`load_identity`].
#[derive(Debug, Clone, Default)]
pub struct Identity(pub Option<User>);

/// Resolves the session's user once per request and inserts [`Identity`].
/// On the way out, turns an [`AccessDenied`] response into a queued flash.
pub async fn load_identity(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match resolve_user(&state, &session).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "failed to resolve session identity");
            None
        }
    };
    request.extensions_mut().insert(Identity(user));

    let response = next.run(request).await;

    if response.extensions().get::<AccessDenied>().is_some() {
        if let Err(e) = push_flash(&session, FlashKind::Danger, ACCESS_DENIED_MESSAGE).await {
            error!(error = %e, "failed to queue access-denied flash");
        }
    }
    response
}

async fn resolve_user(state: &AppState, session: &Session) -> Result<Option<User>, AppError> {
    let Some(user_id) = session.get::<Uuid>(CURR_USER_KEY).await? else {
        return Ok(None);
    };
    let user = state.users.find_user(user_id).await?;
    if user.is_none() {
        warn!(%user_id, "session refers to a missing user; clearing");
        logout(session).await?;
    }
    Ok(user)
}

fn identity(parts: &Parts) -> Option<User> {
    parts
        .extensions
        .get::<Identity>()
        .and_then(|identity| identity.0.clone())
}

/// The current user, if any.
pub struct CurrentUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(identity(parts)))
    }
}

/// The current user; rejects anonymous callers with `Unauthorized`.
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match identity(parts) {
            Some(user) => Ok(AuthUser(user)),
            None => {
                warn!(uri = %parts.uri, "anonymous request to protected route");
                Err(AppError::Unauthorized)
            }
        }
    }
}
