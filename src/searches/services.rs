use tracing::warn;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::{AppError, FieldError};
use crate::searches::dto::NewSearchRequest;
use crate::searches::repo::SavedSearchStore;
use crate::searches::repo_types::{NewSavedSearch, SavedSearch, SearchLocation};

pub const MAX_NAME_LEN: usize = 100;

fn validate_name(name: &str, errors: &mut Vec<FieldError>) -> String {
    let name = name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError::new(
            "name",
            format!("Name must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    name.to_string()
}

fn resolve_location(
    lon: Option<f64>,
    lat: Option<f64>,
    use_current_location: bool,
    errors: &mut Vec<FieldError>,
) -> SearchLocation {
    match (use_current_location, lon, lat) {
        (true, None, None) => SearchLocation::CurrentLocation,
        (true, _, _) => {
            errors.push(FieldError::new(
                "use_current_location",
                "Current location cannot be combined with coordinates",
            ));
            SearchLocation::Unspecified
        }
        (false, None, None) => SearchLocation::Unspecified,
        (false, Some(lon), Some(lat)) => {
            if !(-180.0..=180.0).contains(&lon) {
                errors.push(FieldError::new("lon", "Longitude must be within [-180, 180]"));
            }
            if !(-90.0..=90.0).contains(&lat) {
                errors.push(FieldError::new("lat", "Latitude must be within [-90, 90]"));
            }
            SearchLocation::Coordinates { lon, lat }
        }
        (false, _, _) => {
            errors.push(FieldError::new("lon", "Longitude and latitude go together"));
            SearchLocation::Unspecified
        }
    }
}

pub async fn create(
    store: &dyn SavedSearchStore,
    owner: &User,
    req: NewSearchRequest,
) -> Result<SavedSearch, AppError> {
    let mut errors = Vec::new();
    let name = validate_name(&req.name, &mut errors);
    let location = resolve_location(req.lon, req.lat, req.use_current_location, &mut errors);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let query_string = req
        .query_string
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());

    let search = store
        .insert_search(NewSavedSearch {
            user_id: owner.id,
            name,
            query_string,
            location,
            filters: req.filters,
        })
        .await?;
    Ok(search)
}

/// Loads the record, then checks that `viewer` owns it.
pub async fn load_owned(
    store: &dyn SavedSearchStore,
    viewer: &User,
    id: Uuid,
) -> Result<SavedSearch, AppError> {
    let search = store.find_search(id).await?.ok_or(AppError::NotFound)?;
    if search.user_id != viewer.id {
        warn!(search_id = %id, owner_id = %search.user_id, viewer_id = %viewer.id, "saved search access denied");
        return Err(AppError::Unauthorized);
    }
    Ok(search)
}

/// Renames an owned search. The name is the only editable field.
pub async fn rename(
    store: &dyn SavedSearchStore,
    viewer: &User,
    id: Uuid,
    name: &str,
) -> Result<SavedSearch, AppError> {
    load_owned(store, viewer, id).await?;

    let mut errors = Vec::new();
    let name = validate_name(name, &mut errors);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    store
        .rename_search(id, &name)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn delete(
    store: &dyn SavedSearchStore,
    viewer: &User,
    id: Uuid,
) -> Result<SavedSearch, AppError> {
    let search = load_owned(store, viewer, id).await?;
    if !store.delete_search(id).await? {
        return Err(AppError::NotFound);
    }
    Ok(search)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::SignupForm;
    use crate::auth::repo::UserStore;
    use crate::auth::services::signup;
    use crate::memory::MemoryStore;
    use crate::searches::repo_types::AmenityFilters;

    async fn user(store: &MemoryStore, name: &str) -> User {
        signup(
            store,
            SignupForm {
                username: name.into(),
                email: format!("{name}@x.com"),
                password: "password".into(),
            },
        )
        .await
        .unwrap()
    }

    fn park() -> NewSearchRequest {
        NewSearchRequest {
            name: "Park".into(),
            query_string: None,
            lon: None,
            lat: None,
            use_current_location: false,
            filters: AmenityFilters {
                accessible: true,
                unisex: false,
                changing_table: false,
            },
        }
    }

    #[tokio::test]
    async fn create_sets_id_and_owner() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;

        let search = create(&store, &owner, park()).await.unwrap();
        assert_eq!(search.user_id, owner.id);
        assert_eq!(search.name, "Park");
        assert!(search.accessible);
        assert!(!search.unisex);
        assert!(!search.changing_table);
        assert_eq!(search.location(), SearchLocation::Unspecified);
        assert!(store.find_search(search.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn non_owner_cannot_read_rename_or_delete() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let other = user(&store, "other").await;
        let search = create(&store, &owner, park()).await.unwrap();

        assert!(matches!(
            load_owned(&store, &other, search.id).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            rename(&store, &other, search.id, "Mine now").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            delete(&store, &other, search.id).await,
            Err(AppError::Unauthorized)
        ));

        let stored = store.find_search(search.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Park");
    }

    #[tokio::test]
    async fn owner_can_rename_and_delete() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let search = create(&store, &owner, park()).await.unwrap();

        let renamed = rename(&store, &owner, search.id, "  Library ").await.unwrap();
        assert_eq!(renamed.name, "Library");
        assert_eq!(renamed.filters(), search.filters());

        delete(&store, &owner, search.id).await.unwrap();
        assert!(store.find_search(search.id).await.unwrap().is_none());
        assert!(matches!(
            load_owned(&store, &owner, search.id).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn rename_rejects_blank_name() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let search = create(&store, &owner, park()).await.unwrap();

        let err = rename(&store, &owner, search.id, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn location_modes_are_exclusive() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;

        let both = NewSearchRequest {
            lon: Some(-122.4),
            lat: Some(37.8),
            use_current_location: true,
            ..park()
        };
        assert!(matches!(
            create(&store, &owner, both).await,
            Err(AppError::Validation(_))
        ));

        let half = NewSearchRequest {
            lon: Some(-122.4),
            ..park()
        };
        assert!(matches!(
            create(&store, &owner, half).await,
            Err(AppError::Validation(_))
        ));

        let coords = NewSearchRequest {
            lon: Some(-122.4),
            lat: Some(37.8),
            ..park()
        };
        let saved = create(&store, &owner, coords).await.unwrap();
        assert_eq!(
            saved.location(),
            SearchLocation::Coordinates {
                lon: -122.4,
                lat: 37.8
            }
        );

        let here = NewSearchRequest {
            use_current_location: true,
            ..park()
        };
        let saved = create(&store, &owner, here).await.unwrap();
        assert_eq!(saved.location(), SearchLocation::CurrentLocation);
    }

    #[tokio::test]
    async fn deleting_owner_cascades_to_searches() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let other = user(&store, "other").await;
        create(&store, &owner, park()).await.unwrap();
        create(&store, &owner, park()).await.unwrap();
        let kept = create(&store, &other, park()).await.unwrap();

        store.delete_user(owner.id).await.unwrap();

        assert!(store.list_searches(owner.id).await.unwrap().is_empty());
        assert_eq!(store.search_count().await, 1);
        assert!(store.find_search(kept.id).await.unwrap().is_some());
    }
}
