use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde_json::json;
use tower_sessions::Session;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginForm, ProfileForm, PublicUser, SignupForm},
        services::{self, AuthOutcome},
        session::{self, push_flash, AuthUser, CurrentUser, FlashKind},
    },
    error::AppError,
    pages::PageView,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", get(signup_page).post(signup))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(edit_profile_page).post(edit_profile))
        .route("/users/delete", post(delete_user))
        .route("/users/:id", get(show_user))
}

#[instrument(skip_all)]
pub async fn signup_page(
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<PageView, AppError> {
    PageView::render(&session, "signup", user.as_ref(), json!({})).await
}

#[instrument(skip(state, session, form))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let attempted = json!({ "username": form.username, "email": form.email });

    match services::signup(state.users.as_ref(), form).await {
        Ok(user) => {
            session::login(&session, &user).await?;
            info!(user_id = %user.id, username = %user.username, "user registered");
            Ok(Redirect::to("/").into_response())
        }
        Err(AppError::DuplicateIdentity) => {
            warn!("signup with taken username or email");
            push_flash(&session, FlashKind::Danger, "Username or email already taken").await?;
            let view = PageView::render(&session, "signup", None, json!({ "form": attempted }))
                .await?
                .with_status(StatusCode::CONFLICT);
            Ok(view.into_response())
        }
        Err(AppError::Validation(errors)) => {
            let view = PageView::render(
                &session,
                "signup",
                None,
                json!({ "form": attempted, "errors": errors }),
            )
            .await?
            .with_status(StatusCode::UNPROCESSABLE_ENTITY);
            Ok(view.into_response())
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip_all)]
pub async fn login_page(
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<PageView, AppError> {
    PageView::render(&session, "login", user.as_ref(), json!({})).await
}

#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match services::authenticate(state.users.as_ref(), &form.identifier, &form.password).await? {
        AuthOutcome::Authenticated(user) => {
            session::login(&session, &user).await?;
            push_flash(&session, FlashKind::Success, format!("Hello, {}!", user.username))
                .await?;
            info!(user_id = %user.id, "user logged in");
            Ok(Redirect::to("/").into_response())
        }
        AuthOutcome::Rejected => {
            warn!("login rejected");
            push_flash(&session, FlashKind::Danger, "Invalid credentials.").await?;
            let view = PageView::render(
                &session,
                "login",
                None,
                json!({ "form": { "identifier": form.identifier } }),
            )
            .await?
            .with_status(StatusCode::UNAUTHORIZED);
            Ok(view.into_response())
        }
    }
}

#[instrument(skip_all)]
pub async fn logout(
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Redirect, AppError> {
    session::logout(&session).await?;
    if let Some(user) = user {
        info!(user_id = %user.id, "user logged out");
    }
    push_flash(&session, FlashKind::Success, "Goodbye!").await?;
    Ok(Redirect::to("/login"))
}

/// GET /users/:id: only the owner may view a profile; anyone else is redirected.
#[instrument(skip(state, session, viewer))]
pub async fn show_user(
    State(state): State<AppState>,
    session: Session,
    AuthUser(viewer): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<PageView, AppError> {
    if viewer.id != id {
        warn!(viewer_id = %viewer.id, profile_id = %id, "profile access denied");
        return Err(AppError::Unauthorized);
    }

    let searches = state.searches.list_searches(viewer.id).await?;
    PageView::render(
        &session,
        "profile",
        Some(&viewer),
        json!({ "user": PublicUser::from(&viewer), "searches": searches }),
    )
    .await
}

#[instrument(skip_all)]
pub async fn edit_profile_page(
    session: Session,
    AuthUser(user): AuthUser,
) -> Result<PageView, AppError> {
    PageView::render(
        &session,
        "edit_profile",
        Some(&user),
        json!({ "form": { "username": user.username, "email": user.email } }),
    )
    .await
}

#[instrument(skip(state, session, user, form))]
pub async fn edit_profile(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let attempted = json!({ "username": form.username, "email": form.email });

    let status = match services::update_profile(state.users.as_ref(), &user, form).await {
        Ok(AuthOutcome::Authenticated(updated)) => {
            info!(user_id = %updated.id, "profile updated");
            push_flash(&session, FlashKind::Success, "Profile updated.").await?;
            return Ok(Redirect::to(&format!("/users/{}", updated.id)).into_response());
        }
        Ok(AuthOutcome::Rejected) => {
            warn!(user_id = %user.id, "profile edit with wrong password");
            push_flash(&session, FlashKind::Danger, "Incorrect password.").await?;
            StatusCode::UNAUTHORIZED
        }
        Err(AppError::DuplicateIdentity) => {
            warn!(user_id = %user.id, "profile edit with taken username or email");
            push_flash(&session, FlashKind::Danger, "Username or email already taken").await?;
            StatusCode::CONFLICT
        }
        Err(AppError::Validation(errors)) => {
            let view = PageView::render(
                &session,
                "edit_profile",
                Some(&user),
                json!({ "form": attempted, "errors": errors }),
            )
            .await?
            .with_status(StatusCode::UNPROCESSABLE_ENTITY);
            return Ok(view.into_response());
        }
        Err(e) => return Err(e),
    };

    let view = PageView::render(&session, "edit_profile", Some(&user), json!({ "form": attempted }))
        .await?
        .with_status(status);
    Ok(view.into_response())
}

#[instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
) -> Result<Redirect, AppError> {
    services::delete_account(state.users.as_ref(), user.id).await?;
    session::logout(&session).await?;
    info!(user_id = %user.id, "account deleted");
    push_flash(&session, FlashKind::Success, "Your account has been deleted.").await?;
    Ok(Redirect::to("/signup"))
}
