//! Page view models. Each GET page answers with `{page, flashes, current_user, data}`;
//! the front end renders it.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_sessions::Session;
use tracing::instrument;

use crate::auth::dto::PublicUser;
use crate::auth::repo_types::User;
use crate::auth::session::{take_flashes, CurrentUser, Flash};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PageView {
    pub page: &'static str,
    pub flashes: Vec<Flash>,
    pub current_user: Option<PublicUser>,
    pub data: Value,
    #[serde(skip)]
    pub status: StatusCode,
}

impl PageView {
    /// Builds a page view, draining the session's pending flashes into it.
    pub async fn render(
        session: &Session,
        page: &'static str,
        user: Option<&User>,
        data: Value,
    ) -> Result<Self, AppError> {
        Ok(Self {
            page,
            flashes: take_flashes(session).await?,
            current_user: user.map(PublicUser::from),
            data,
            status: StatusCode::OK,
        })
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for PageView {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

pub fn not_found_view() -> PageView {
    PageView {
        page: "not_found",
        flashes: Vec::new(),
        current_user: None,
        data: json!({}),
        status: StatusCode::NOT_FOUND,
    }
}

/// Saved-search fields accepted by the search page so a saved search can be replayed.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SearchParams {
    pub query_string: Option<String>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    #[serde(default)]
    pub use_current_location: bool,
    #[serde(default)]
    pub accessible: bool,
    #[serde(default)]
    pub unisex: bool,
    #[serde(default)]
    pub changing_table: bool,
}

/// GET /: landing page for visitors, search page for signed-in users.
#[instrument(skip_all)]
pub async fn landing(
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/search").into_response());
    }
    Ok(PageView::render(&session, "landing", None, json!({}))
        .await?
        .into_response())
}

/// GET /search: the map search page with the map-provider token.
#[instrument(skip_all)]
pub async fn search_page(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<PageView, AppError> {
    PageView::render(
        &session,
        "search",
        user.as_ref(),
        json!({
            "token": state.config.geocoder.token,
            "params": params,
        }),
    )
    .await
}

pub async fn not_found() -> PageView {
    not_found_view()
}
