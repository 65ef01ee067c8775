use std::net::SocketAddr;

use axum::{middleware, routing::get, Router};
use time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::auth::session::load_identity;
use crate::pages;
use crate::state::AppState;
use crate::{auth, geocode, searches};

/// Assembles the router. Sessions are kept in `sessions`.
pub fn build_app<S>(state: AppState, sessions: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = SessionManagerLayer::new(sessions)
        .with_secure(state.config.session.secure)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(
            state.config.session.ttl_minutes,
        )));

    Router::new()
        .route("/", get(pages::landing))
        .route("/search", get(pages::search_page))
        .route("/health", get(|| async { "ok" }))
        .merge(auth::router())
        .merge(searches::router())
        .merge(geocode::router())
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), load_identity))
        .layer(session_layer)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
