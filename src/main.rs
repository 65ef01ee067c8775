use restroom_finder::{app, state::AppState};
use tower_sessions::session_store::ExpiredDeletion;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "restroom_finder=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (app_state, sessions) = AppState::init().await?;

    let sweep = tokio::time::Duration::from_secs(app_state.config.session.sweep_seconds);
    let deletion_task = tokio::task::spawn(sessions.clone().continuously_delete_expired(sweep));

    let app = app::build_app(app_state, sessions);
    let served = app::serve(app).await;
    deletion_task.abort();
    served
}
