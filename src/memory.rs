use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo::UserStore;
use crate::auth::repo_types::{NewUser, User};
use crate::db::{StoreError, StoreResult};
use crate::searches::repo::SavedSearchStore;
use crate::searches::repo_types::{NewSavedSearch, SavedSearch};

/// In-process store with the same constraints as the Postgres schema:
/// unique username/email and cascade delete from users to saved searches.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    searches: Vec<SavedSearch>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn search_count(&self) -> usize {
        self.inner.read().await.searches.len()
    }
}

fn identity_taken(users: &[User], skip: Option<Uuid>, username: &str, email: &str) -> bool {
    users
        .iter()
        .filter(|u| Some(u.id) != skip)
        .any(|u| u.username == username || u.email == email)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.inner.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.inner.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.inner.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, new: NewUser) -> StoreResult<User> {
        let mut tables = self.inner.write().await;
        if identity_taken(&tables.users, None, &new.username, &new.email) {
            return Err(StoreError::UniqueViolation);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_identity(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<User>> {
        let mut tables = self.inner.write().await;
        if identity_taken(&tables.users, Some(id), username, email) {
            return Err(StoreError::UniqueViolation);
        }
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.username = username.to_string();
        user.email = email.to_string();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.inner.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        let removed = tables.users.len() != before;
        if removed {
            tables.searches.retain(|s| s.user_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl SavedSearchStore for MemoryStore {
    async fn insert_search(&self, new: NewSavedSearch) -> StoreResult<SavedSearch> {
        let mut tables = self.inner.write().await;
        // mirrors the foreign key on saved_searches.user_id
        if !tables.users.iter().any(|u| u.id == new.user_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        let (lon, lat, use_current_location) = new.location.columns();
        let search = SavedSearch {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            name: new.name,
            query_string: new.query_string,
            lon,
            lat,
            use_current_location,
            accessible: new.filters.accessible,
            unisex: new.filters.unisex,
            changing_table: new.filters.changing_table,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.searches.push(search.clone());
        Ok(search)
    }

    async fn find_search(&self, id: Uuid) -> StoreResult<Option<SavedSearch>> {
        let tables = self.inner.read().await;
        Ok(tables.searches.iter().find(|s| s.id == id).cloned())
    }

    async fn list_searches(&self, user_id: Uuid) -> StoreResult<Vec<SavedSearch>> {
        let tables = self.inner.read().await;
        let mut rows: Vec<SavedSearch> = tables
            .searches
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn rename_search(&self, id: Uuid, name: &str) -> StoreResult<Option<SavedSearch>> {
        let mut tables = self.inner.write().await;
        let Some(search) = tables.searches.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        search.name = name.to_string();
        Ok(Some(search.clone()))
    }

    async fn delete_search(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.inner.write().await;
        let before = tables.searches.len();
        tables.searches.retain(|s| s.id != id);
        Ok(tables.searches.len() != before)
    }
}
