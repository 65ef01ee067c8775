pub mod client;
pub mod handlers;

use crate::state::AppState;
use axum::Router;

pub use client::{Geocoder, MapboxGeocoder};

pub fn router() -> Router<AppState> {
    handlers::geocode_routes()
}
