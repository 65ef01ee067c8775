use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use tower_sessions::Session;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::session::{push_flash, AuthUser, FlashKind},
    error::AppError,
    pages::{PageView, SearchParams},
    searches::{
        dto::{EditSearchForm, NewSearchRequest},
        repo_types::SavedSearch,
        services,
    },
    state::AppState,
};

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search/add", post(add_search))
        .route("/search/:id", get(show_search))
        .route("/search/:id/edit", get(edit_search_page).post(edit_search))
        .route("/search/:id/delete", get(delete_search_page).post(delete_search))
}

/// POST /search/add: saves the current search for the signed-in user.
#[instrument(skip(state, user, body))]
pub async fn add_search(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<NewSearchRequest>,
) -> Result<(StatusCode, Json<SavedSearch>), AppError> {
    let search = services::create(state.searches.as_ref(), &user, body).await?;
    info!(search_id = %search.id, user_id = %user.id, "saved search created");
    Ok((StatusCode::CREATED, Json(search)))
}

#[instrument(skip(state, session, user))]
pub async fn show_search(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<PageView, AppError> {
    let search = services::load_owned(state.searches.as_ref(), &user, id).await?;
    let replay = SearchParams::from(&search);
    PageView::render(
        &session,
        "saved_search",
        Some(&user),
        json!({ "search": search, "replay": replay }),
    )
    .await
}

#[instrument(skip(state, session, user))]
pub async fn edit_search_page(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<PageView, AppError> {
    let search = services::load_owned(state.searches.as_ref(), &user, id).await?;
    PageView::render(&session, "edit_search", Some(&user), json!({ "search": search })).await
}

#[instrument(skip(state, session, user, form))]
pub async fn edit_search(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Form(form): Form<EditSearchForm>,
) -> Result<Response, AppError> {
    match services::rename(state.searches.as_ref(), &user, id, &form.name).await {
        Ok(search) => {
            info!(search_id = %search.id, "saved search renamed");
            push_flash(&session, FlashKind::Success, "Search updated.").await?;
            Ok(Redirect::to(&format!("/users/{}", user.id)).into_response())
        }
        Err(AppError::Validation(errors)) => {
            let search = services::load_owned(state.searches.as_ref(), &user, id).await?;
            let view = PageView::render(
                &session,
                "edit_search",
                Some(&user),
                json!({ "search": search, "errors": errors }),
            )
            .await?
            .with_status(StatusCode::UNPROCESSABLE_ENTITY);
            Ok(view.into_response())
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state, session, user))]
pub async fn delete_search_page(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<PageView, AppError> {
    let search = services::load_owned(state.searches.as_ref(), &user, id).await?;
    PageView::render(&session, "delete_search", Some(&user), json!({ "search": search })).await
}

#[instrument(skip(state, session, user))]
pub async fn delete_search(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    let search = services::delete(state.searches.as_ref(), &user, id).await?;
    info!(search_id = %search.id, "saved search deleted");
    push_flash(&session, FlashKind::Success, format!("Deleted \"{}\".", search.name)).await?;
    Ok(Redirect::to(&format!("/users/{}", user.id)))
}
