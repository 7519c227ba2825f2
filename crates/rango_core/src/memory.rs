//! crates/rango_core/src/memory.rs
//!
//! An in-process implementation of the storage and session ports. Used by the
//! test suites and by the API when no database is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{Category, Page, SessionData};
use crate::ports::{DatabaseService, PortError, PortResult, SessionStore};

#[derive(Default)]
struct Tables {
    categories: Vec<Category>,
    pages: Vec<Page>,
    sessions: HashMap<String, (SessionData, DateTime<Utc>)>,
}

impl Tables {
    fn category(&self, category_id: Uuid) -> PortResult<&Category> {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .ok_or_else(|| PortError::NotFound(format!("Category {} not found", category_id)))
    }

    fn category_mut(&mut self, category_id: Uuid) -> PortResult<&mut Category> {
        self.categories
            .iter_mut()
            .find(|c| c.id == category_id)
            .ok_or_else(|| PortError::NotFound(format!("Category {} not found", category_id)))
    }

    fn page_mut(&mut self, page_id: Uuid) -> PortResult<&mut Page> {
        self.pages
            .iter_mut()
            .find(|p| p.id == page_id)
            .ok_or_else(|| PortError::NotFound(format!("Page {} not found", page_id)))
    }

    /// Enforces the unique name and slug constraints for `candidate`.
    fn check_category_unique(&self, candidate: &Category) -> PortResult<()> {
        let clash = self.categories.iter().any(|c| {
            c.id != candidate.id && (c.name == candidate.name || c.slug == candidate.slug)
        });
        if clash {
            return Err(PortError::Conflict(format!(
                "Category '{}' ({}) already exists",
                candidate.name, candidate.slug
            )));
        }
        Ok(())
    }

    fn check_page_unique(&self, candidate: &Page) -> PortResult<()> {
        let clash = self.pages.iter().any(|p| {
            p.id != candidate.id
                && p.category_id == candidate.category_id
                && p.title == candidate.title
        });
        if clash {
            return Err(PortError::Conflict(format!(
                "Page '{}' already exists in category {}",
                candidate.title, candidate.category_id
            )));
        }
        Ok(())
    }

    fn insert_category(&mut self, name: &str) -> PortResult<Category> {
        let category = Category::new(name);
        self.check_category_unique(&category)?;
        self.categories.push(category.clone());
        Ok(category)
    }

    fn insert_page(&mut self, page: Page) -> PortResult<Page> {
        self.category(page.category_id)?;
        self.check_page_unique(&page)?;
        self.pages.push(page.clone());
        Ok(page)
    }
}

/// Mutex-guarded tables that behave like the PostgreSQL schema.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PortError::Unexpected("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn get_or_create_category(&self, name: &str) -> PortResult<Category> {
        let mut tables = self.lock()?;
        if let Some(existing) = tables.categories.iter().find(|c| c.name == name) {
            return Ok(existing.clone());
        }
        tables.insert_category(name)
    }

    async fn create_category(&self, name: &str) -> PortResult<Category> {
        self.lock()?.insert_category(name)
    }

    async fn save_category(&self, category: &Category) -> PortResult<Category> {
        let mut tables = self.lock()?;
        let mut updated = category.clone();
        updated.refresh_slug();
        tables.check_category_unique(&updated)?;
        let stored = tables.category_mut(category.id)?;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn get_category_by_id(&self, category_id: Uuid) -> PortResult<Category> {
        self.lock()?.category(category_id).cloned()
    }

    async fn get_category_by_slug(&self, slug: &str) -> PortResult<Category> {
        self.lock()?
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Category '{}' not found", slug)))
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        let mut categories = self.lock()?.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn top_categories_by_likes(&self, limit: usize) -> PortResult<Vec<Category>> {
        let mut categories = self.lock()?.categories.clone();
        categories.sort_by(|a, b| b.likes.cmp(&a.likes).then_with(|| a.name.cmp(&b.name)));
        categories.truncate(limit);
        Ok(categories)
    }

    async fn increment_category_likes(&self, category_id: Uuid) -> PortResult<Category> {
        let mut tables = self.lock()?;
        let category = tables.category_mut(category_id)?;
        category.likes = category.likes.saturating_add(1);
        Ok(category.clone())
    }

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()> {
        let mut tables = self.lock()?;
        tables.category(category_id)?;
        tables.categories.retain(|c| c.id != category_id);
        tables.pages.retain(|p| p.category_id != category_id);
        Ok(())
    }

    async fn get_or_create_page(&self, category_id: Uuid, title: &str) -> PortResult<Page> {
        let mut tables = self.lock()?;
        if let Some(existing) = tables
            .pages
            .iter()
            .find(|p| p.category_id == category_id && p.title == title)
        {
            return Ok(existing.clone());
        }
        tables.insert_page(Page::new(category_id, title, ""))
    }

    async fn create_page(&self, category_id: Uuid, title: &str, url: &str) -> PortResult<Page> {
        self.lock()?.insert_page(Page::new(category_id, title, url))
    }

    async fn save_page(&self, page: &Page) -> PortResult<Page> {
        let mut tables = self.lock()?;
        tables.category(page.category_id)?;
        tables.check_page_unique(page)?;
        let stored = tables.page_mut(page.id)?;
        *stored = page.clone();
        Ok(page.clone())
    }

    async fn get_page_by_id(&self, page_id: Uuid) -> PortResult<Page> {
        self.lock()?
            .pages
            .iter()
            .find(|p| p.id == page_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Page {} not found", page_id)))
    }

    async fn pages_for_category(&self, category_id: Uuid) -> PortResult<Vec<Page>> {
        Ok(self
            .lock()?
            .pages
            .iter()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn top_pages_by_views(&self, limit: usize) -> PortResult<Vec<Page>> {
        let mut pages = self.lock()?.pages.clone();
        pages.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.title.cmp(&b.title)));
        pages.truncate(limit);
        Ok(pages)
    }

    async fn increment_page_views(&self, page_id: Uuid) -> PortResult<Page> {
        let mut tables = self.lock()?;
        let page = tables.page_mut(page_id)?;
        page.views = page.views.saturating_add(1);
        Ok(page.clone())
    }
}

#[async_trait]
impl SessionStore for InMemoryDatabase {
    async fn load_session(&self, session_key: &str) -> PortResult<Option<SessionData>> {
        let mut tables = self.lock()?;
        match tables.sessions.get(session_key) {
            None => return Ok(None),
            Some((data, expires_at)) if *expires_at > Utc::now() => return Ok(Some(data.clone())),
            Some(_) => {}
        }
        tables.sessions.remove(session_key);
        Ok(None)
    }

    async fn save_session(
        &self,
        session_key: &str,
        data: &SessionData,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.lock()?
            .sessions
            .insert(session_key.to_string(), (data.clone(), expires_at));
        Ok(())
    }

    async fn delete_session(&self, session_key: &str) -> PortResult<()> {
        self.lock()?.sessions.remove(session_key);
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> PortResult<u64> {
        let now = Utc::now();
        let mut tables = self.lock()?;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn deleting_a_category_cascades_to_its_pages() {
        let db = InMemoryDatabase::new();
        let python = db.get_or_create_category("Python").await.unwrap();
        let django = db.get_or_create_category("Django").await.unwrap();
        let doomed = db.create_page(python.id, "Tutorial", "http://a.example/").await.unwrap();
        let kept = db.create_page(django.id, "Tutorial", "http://b.example/").await.unwrap();

        db.delete_category(python.id).await.unwrap();

        assert!(matches!(
            db.get_category_by_id(python.id).await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            db.get_page_by_id(doomed.id).await,
            Err(PortError::NotFound(_))
        ));
        assert!(db.pages_for_category(python.id).await.unwrap().is_empty());
        assert_eq!(db.get_page_by_id(kept.id).await.unwrap(), kept);
    }

    #[tokio::test]
    async fn slug_collisions_conflict() {
        let db = InMemoryDatabase::new();
        db.create_category("Rust Lang").await.unwrap();
        assert!(matches!(
            db.create_category("rust  lang").await,
            Err(PortError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn renaming_onto_an_existing_name_conflicts() {
        let db = InMemoryDatabase::new();
        db.create_category("Python").await.unwrap();
        let mut django = db.create_category("Django").await.unwrap();
        django.rename("Python");
        assert!(matches!(
            db.save_category(&django).await,
            Err(PortError::Conflict(_))
        ));
        assert_eq!(db.get_category_by_slug("django").await.unwrap().name, "Django");
    }

    #[tokio::test]
    async fn pages_need_an_existing_category() {
        let db = InMemoryDatabase::new();
        assert!(matches!(
            db.get_or_create_page(Uuid::new_v4(), "Orphan").await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn sessions_round_trip_until_expiry() {
        let db = InMemoryDatabase::new();
        let mut data = SessionData::new();
        data.insert("visits", 2);

        db.save_session("live", &data, Utc::now() + Duration::days(1))
            .await
            .unwrap();
        db.save_session("stale", &data, Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        assert_eq!(db.load_session("live").await.unwrap(), Some(data));
        assert_eq!(db.load_session("stale").await.unwrap(), None);
        assert_eq!(db.load_session("unknown").await.unwrap(), None);

        db.delete_session("live").await.unwrap();
        assert_eq!(db.load_session("live").await.unwrap(), None);
    }

    #[tokio::test]
    async fn purging_drops_only_expired_sessions() {
        let db = InMemoryDatabase::new();
        let data = SessionData::new();
        for key in ["old-1", "old-2"] {
            db.save_session(key, &data, Utc::now() - Duration::minutes(5))
                .await
                .unwrap();
        }
        db.save_session("current", &data, Utc::now() + Duration::days(1))
            .await
            .unwrap();

        assert_eq!(db.purge_expired_sessions().await.unwrap(), 2);
        assert_eq!(db.lock().unwrap().sessions.len(), 1);
        assert!(db.load_session("current").await.unwrap().is_some());
        assert_eq!(db.purge_expired_sessions().await.unwrap(), 0);
    }
}
