use serde::Deserialize;

use crate::pages::SearchParams;
use crate::searches::repo_types::{AmenityFilters, SavedSearch};

/// JSON body of `POST /search/add`.
#[derive(Debug, Deserialize)]
pub struct NewSearchRequest {
    pub name: String,
    #[serde(default)]
    pub query_string: Option<String>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub use_current_location: bool,
    #[serde(flatten)]
    pub filters: AmenityFilters,
}

/// Edit form; only the name can change.
#[derive(Debug, Deserialize)]
pub struct EditSearchForm {
    pub name: String,
}

impl From<&SavedSearch> for SearchParams {
    fn from(s: &SavedSearch) -> Self {
        Self {
            query_string: s.query_string.clone(),
            lon: s.lon,
            lat: s.lat,
            use_current_location: s.use_current_location,
            accessible: s.accessible,
            unisex: s.unisex,
            changing_table: s.changing_table,
        }
    }
}
