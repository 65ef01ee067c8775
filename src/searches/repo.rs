use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{PgStore, StoreResult};
use crate::searches::repo_types::{NewSavedSearch, SavedSearch};

/// Persistence for saved searches. Ownership is enforced by the services, not here.
#[async_trait]
pub trait SavedSearchStore: Send + Sync {
    async fn insert_search(&self, new: NewSavedSearch) -> StoreResult<SavedSearch>;
    async fn find_search(&self, id: Uuid) -> StoreResult<Option<SavedSearch>>;
    async fn list_searches(&self, user_id: Uuid) -> StoreResult<Vec<SavedSearch>>;
    async fn rename_search(&self, id: Uuid, name: &str) -> StoreResult<Option<SavedSearch>>;
    async fn delete_search(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
impl SavedSearchStore for PgStore {
    async fn insert_search(&self, new: NewSavedSearch) -> StoreResult<SavedSearch> {
        let (lon, lat, use_current_location) = new.location.columns();
        let row = sqlx::query_as::<_, SavedSearch>(
            r#"
            INSERT INTO saved_searches
                (user_id, name, query_string, lon, lat, use_current_location,
                 accessible, unisex, changing_table)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, name, query_string, lon, lat, use_current_location,
                      accessible, unisex, changing_table, created_at
            "#,
        )
        .bind(new.user_id)
        .bind(&new.name)
        .bind(&new.query_string)
        .bind(lon)
        .bind(lat)
        .bind(use_current_location)
        .bind(new.filters.accessible)
        .bind(new.filters.unisex)
        .bind(new.filters.changing_table)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_search(&self, id: Uuid) -> StoreResult<Option<SavedSearch>> {
        let row = sqlx::query_as::<_, SavedSearch>(
            r#"
            SELECT id, user_id, name, query_string, lon, lat, use_current_location,
                   accessible, unisex, changing_table, created_at
            FROM saved_searches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_searches(&self, user_id: Uuid) -> StoreResult<Vec<SavedSearch>> {
        let rows = sqlx::query_as::<_, SavedSearch>(
            r#"
            SELECT id, user_id, name, query_string, lon, lat, use_current_location,
                   accessible, unisex, changing_table, created_at
            FROM saved_searches
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn rename_search(&self, id: Uuid, name: &str) -> StoreResult<Option<SavedSearch>> {
        let row = sqlx::query_as::<_, SavedSearch>(
            r#"
            UPDATE saved_searches
               SET name = $2
             WHERE id = $1
            RETURNING id, user_id, name, query_string, lon, lat, use_current_location,
                      accessible, unisex, changing_table, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_search(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM saved_searches WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
