use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Saved search row. Location columns follow `SearchLocation`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SavedSearch {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub query_string: Option<String>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub use_current_location: bool,
    pub accessible: bool,
    pub unisex: bool,
    pub changing_table: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SavedSearch {
    pub fn location(&self) -> SearchLocation {
        match (self.use_current_location, self.lon, self.lat) {
            (true, _, _) => SearchLocation::CurrentLocation,
            (false, Some(lon), Some(lat)) => SearchLocation::Coordinates { lon, lat },
            _ => SearchLocation::Unspecified,
        }
    }

    pub fn filters(&self) -> AmenityFilters {
        AmenityFilters {
            accessible: self.accessible,
            unisex: self.unisex,
            changing_table: self.changing_table,
        }
    }
}

/// Amenity filters narrowing a restroom search. All default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmenityFilters {
    #[serde(default)]
    pub accessible: bool,
    #[serde(default)]
    pub unisex: bool,
    #[serde(default)]
    pub changing_table: bool,
}

/// Where a saved search is anchored. The modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchLocation {
    Unspecified,
    Coordinates { lon: f64, lat: f64 },
    CurrentLocation,
}

impl SearchLocation {
    /// `(lon, lat, use_current_location)` as stored.
    pub fn columns(&self) -> (Option<f64>, Option<f64>, bool) {
        match *self {
            SearchLocation::Unspecified => (None, None, false),
            SearchLocation::Coordinates { lon, lat } => (Some(lon), Some(lat), false),
            SearchLocation::CurrentLocation => (None, None, true),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSavedSearch {
    pub user_id: Uuid,
    pub name: String,
    pub query_string: Option<String>,
    pub location: SearchLocation,
    pub filters: AmenityFilters,
}
