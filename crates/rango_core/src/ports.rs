//! crates/rango_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of a specific database or session backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Page, SessionData};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflicting item: {0}")]
    Conflict(String),
    /// A value the backend cannot represent, such as an oversized counter.
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for the category/page aggregates.
///
/// Every save re-derives the category slug from its name. Deleting a category
/// deletes the pages it owns.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Categories ---
    async fn get_or_create_category(&self, name: &str) -> PortResult<Category>;

    /// Inserts a new category; fails with `Conflict` when the name or slug is taken.
    async fn create_category(&self, name: &str) -> PortResult<Category>;

    /// Persists every field of `category` and returns the stored value.
    async fn save_category(&self, category: &Category) -> PortResult<Category>;

    async fn get_category_by_id(&self, category_id: Uuid) -> PortResult<Category>;

    async fn get_category_by_slug(&self, slug: &str) -> PortResult<Category>;

    /// All categories, ordered by name.
    async fn list_categories(&self) -> PortResult<Vec<Category>>;

    async fn top_categories_by_likes(&self, limit: usize) -> PortResult<Vec<Category>>;

    async fn increment_category_likes(&self, category_id: Uuid) -> PortResult<Category>;

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()>;

    // --- Pages ---
    async fn get_or_create_page(&self, category_id: Uuid, title: &str) -> PortResult<Page>;

    /// Inserts a new page; fails with `Conflict` when the title is taken in that category.
    async fn create_page(&self, category_id: Uuid, title: &str, url: &str) -> PortResult<Page>;

    async fn save_page(&self, page: &Page) -> PortResult<Page>;

    async fn get_page_by_id(&self, page_id: Uuid) -> PortResult<Page>;

    /// Pages of one category in creation order.
    async fn pages_for_category(&self, category_id: Uuid) -> PortResult<Vec<Page>>;

    async fn top_pages_by_views(&self, limit: usize) -> PortResult<Vec<Page>>;

    async fn increment_page_views(&self, page_id: Uuid) -> PortResult<Page>;
}

/// Server-side storage for per-client session data.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns `None` for unknown or expired sessions.
    async fn load_session(&self, session_key: &str) -> PortResult<Option<SessionData>>;

    async fn save_session(
        &self,
        session_key: &str,
        data: &SessionData,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn delete_session(&self, session_key: &str) -> PortResult<()>;

    /// Removes every expired session and returns how many were removed.
    async fn purge_expired_sessions(&self) -> PortResult<u64>;
}
