use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::state::AppState;

pub fn geocode_routes() -> Router<AppState> {
    Router::new().route("/api/reverse-geocode", post(reverse_geocode))
}

#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeRequest {
    pub lon: f64,
    pub lat: f64,
}

/// POST /api/reverse-geocode: `{result}` with the first place name, or `{detail: {}}`.
#[instrument(skip(state))]
pub async fn reverse_geocode(
    State(state): State<AppState>,
    Json(req): Json<ReverseGeocodeRequest>,
) -> Json<Value> {
    match state.geocoder.reverse(req.lon, req.lat).await {
        Some(result) => Json(json!({ "result": result })),
        None => Json(json!({ "detail": {} })),
    }
}
