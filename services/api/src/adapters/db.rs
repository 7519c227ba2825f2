//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` and `SessionStore` ports from the `core` crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rango_core::domain::{Category, Page, SessionData};
use rango_core::ports::{DatabaseService, PortError, PortResult, SessionStore};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage and session ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

const CATEGORY_COLUMNS: &str = "id, name, slug, views, likes";
const PAGE_COLUMNS: &str = "id, category_id, title, url, views";

/// Translates driver errors into port errors, naming the affected item.
fn port_error(e: sqlx::Error, item: impl FnOnce() -> String) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(item()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(format!("{} already exists", item()))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            PortError::NotFound(format!("Owner of {} not found", item()))
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

/// Converts a counter to the `INTEGER` column type without wrapping.
fn counter(value: u32, column: &str) -> PortResult<i32> {
    i32::try_from(value).map_err(|_| {
        PortError::OutOfRange(format!(
            "{} = {} exceeds the largest storable count ({})",
            column,
            value,
            i32::MAX
        ))
    })
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CategoryRecord {
    id: Uuid,
    name: String,
    slug: String,
    views: i32,
    likes: i32,
}
impl CategoryRecord {
    fn to_domain(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            slug: self.slug,
            views: self.views.max(0) as u32,
            likes: self.likes.max(0) as u32,
        }
    }
}

#[derive(FromRow)]
struct PageRecord {
    id: Uuid,
    category_id: Uuid,
    title: String,
    url: String,
    views: i32,
}
impl PageRecord {
    fn to_domain(self) -> Page {
        Page {
            id: self.id,
            category_id: self.category_id,
            title: self.title,
            url: self.url,
            views: self.views.max(0) as u32,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    data: Json<SessionData>,
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_or_create_category(&self, name: &str) -> PortResult<Category> {
        let fresh = Category::new(name);
        sqlx::query(
            "INSERT INTO categories (id, name, slug) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING",
        )
        .bind(fresh.id)
        .bind(&fresh.name)
        .bind(&fresh.slug)
        .execute(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Category '{}'", name)))?;

        let record = sqlx::query_as::<_, CategoryRecord>(&format!(
            "SELECT {} FROM categories WHERE name = $1",
            CATEGORY_COLUMNS
        ))
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Category '{}'", name)))?;

        Ok(record.to_domain())
    }

    async fn create_category(&self, name: &str) -> PortResult<Category> {
        let fresh = Category::new(name);
        let record = sqlx::query_as::<_, CategoryRecord>(&format!(
            "INSERT INTO categories (id, name, slug) VALUES ($1, $2, $3) RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(fresh.id)
        .bind(&fresh.name)
        .bind(&fresh.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Category '{}'", name)))?;
        Ok(record.to_domain())
    }

    async fn save_category(&self, category: &Category) -> PortResult<Category> {
        let mut updated = category.clone();
        updated.refresh_slug();
        let views = counter(updated.views, "views")?;
        let likes = counter(updated.likes, "likes")?;
        let record = sqlx::query_as::<_, CategoryRecord>(&format!(
            "UPDATE categories SET name = $2, slug = $3, views = $4, likes = $5 WHERE id = $1 RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(updated.id)
        .bind(&updated.name)
        .bind(&updated.slug)
        .bind(views)
        .bind(likes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Category {}", category.id)))?;
        Ok(record.to_domain())
    }

    async fn get_category_by_id(&self, category_id: Uuid) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Category {}", category_id)))?;
        Ok(record.to_domain())
    }

    async fn get_category_by_slug(&self, slug: &str) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(&format!(
            "SELECT {} FROM categories WHERE slug = $1",
            CATEGORY_COLUMNS
        ))
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Category '{}'", slug)))?;
        Ok(record.to_domain())
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        let records = sqlx::query_as::<_, CategoryRecord>(&format!(
            "SELECT {} FROM categories ORDER BY name ASC",
            CATEGORY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn top_categories_by_likes(&self, limit: usize) -> PortResult<Vec<Category>> {
        let records = sqlx::query_as::<_, CategoryRecord>(&format!(
            "SELECT {} FROM categories ORDER BY likes DESC, name ASC LIMIT $1",
            CATEGORY_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn increment_category_likes(&self, category_id: Uuid) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(&format!(
            "UPDATE categories SET likes = likes + 1 WHERE id = $1 RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Category {}", category_id)))?;
        Ok(record.to_domain())
    }

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()> {
        // Pages go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Category {}", category_id)));
        }
        Ok(())
    }

    async fn get_or_create_page(&self, category_id: Uuid, title: &str) -> PortResult<Page> {
        sqlx::query(
            "INSERT INTO pages (id, category_id, title) VALUES ($1, $2, $3) ON CONFLICT (category_id, title) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(title)
        .execute(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Page '{}'", title)))?;

        let record = sqlx::query_as::<_, PageRecord>(&format!(
            "SELECT {} FROM pages WHERE category_id = $1 AND title = $2",
            PAGE_COLUMNS
        ))
        .bind(category_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Page '{}'", title)))?;
        Ok(record.to_domain())
    }

    async fn create_page(&self, category_id: Uuid, title: &str, url: &str) -> PortResult<Page> {
        let record = sqlx::query_as::<_, PageRecord>(&format!(
            "INSERT INTO pages (id, category_id, title, url) VALUES ($1, $2, $3, $4) RETURNING {}",
            PAGE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(title)
        .bind(url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Page '{}'", title)))?;
        Ok(record.to_domain())
    }

    async fn save_page(&self, page: &Page) -> PortResult<Page> {
        let views = counter(page.views, "views")?;
        let record = sqlx::query_as::<_, PageRecord>(&format!(
            "UPDATE pages SET category_id = $2, title = $3, url = $4, views = $5 WHERE id = $1 RETURNING {}",
            PAGE_COLUMNS
        ))
        .bind(page.id)
        .bind(page.category_id)
        .bind(&page.title)
        .bind(&page.url)
        .bind(views)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Page {}", page.id)))?;
        Ok(record.to_domain())
    }

    async fn get_page_by_id(&self, page_id: Uuid) -> PortResult<Page> {
        let record = sqlx::query_as::<_, PageRecord>(&format!(
            "SELECT {} FROM pages WHERE id = $1",
            PAGE_COLUMNS
        ))
        .bind(page_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Page {}", page_id)))?;
        Ok(record.to_domain())
    }

    async fn pages_for_category(&self, category_id: Uuid) -> PortResult<Vec<Page>> {
        let records = sqlx::query_as::<_, PageRecord>(&format!(
            "SELECT {} FROM pages WHERE category_id = $1 ORDER BY created_at ASC",
            PAGE_COLUMNS
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn top_pages_by_views(&self, limit: usize) -> PortResult<Vec<Page>> {
        let records = sqlx::query_as::<_, PageRecord>(&format!(
            "SELECT {} FROM pages ORDER BY views DESC, title ASC LIMIT $1",
            PAGE_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn increment_page_views(&self, page_id: Uuid) -> PortResult<Page> {
        let record = sqlx::query_as::<_, PageRecord>(&format!(
            "UPDATE pages SET views = views + 1 WHERE id = $1 RETURNING {}",
            PAGE_COLUMNS
        ))
        .bind(page_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Page {}", page_id)))?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for DbAdapter {
    async fn load_session(&self, session_key: &str) -> PortResult<Option<SessionData>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT data FROM web_sessions WHERE session_key = $1 AND expires_at > now()",
        )
        .bind(session_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.data.0))
    }

    async fn save_session(
        &self,
        session_key: &str,
        data: &SessionData,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO web_sessions (session_key, data, expires_at) VALUES ($1, $2, $3) \
             ON CONFLICT (session_key) DO UPDATE SET data = EXCLUDED.data, expires_at = EXCLUDED.expires_at",
        )
        .bind(session_key)
        .bind(Json(data))
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn delete_session(&self, session_key: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM web_sessions WHERE session_key = $1")
            .bind(session_key)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM web_sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(128, 128)]
    #[case(i32::MAX as u32, i32::MAX)]
    fn counters_within_range_are_stored_as_is(#[case] value: u32, #[case] expected: i32) {
        assert_eq!(counter(value, "views").unwrap(), expected);
    }

    #[rstest]
    #[case(i32::MAX as u32 + 1)]
    #[case(u32::MAX)]
    fn oversized_counters_are_rejected(#[case] value: u32) {
        match counter(value, "likes") {
            Err(PortError::OutOfRange(msg)) => assert!(msg.starts_with("likes = ")),
            other => panic!("expected an out-of-range error, got {:?}", other),
        }
    }
}
