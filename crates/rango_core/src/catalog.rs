//! crates/rango_core/src/catalog.rs
//!
//! Operations on the category/page aggregates, written against the
//! `DatabaseService` port.

use uuid::Uuid;

use crate::domain::{Category, Page};
use crate::forms::{CategoryForm, FormErrors, PageForm};
use crate::ports::{DatabaseService, PortError, PortResult};

/// How many entries the index shows per listing.
pub const INDEX_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid form: {0}")]
    Invalid(FormErrors),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error(transparent)]
    Port(#[from] PortError),
}

/// The most popular categories and pages.
#[derive(Debug, Clone)]
pub struct IndexListing {
    pub categories: Vec<Category>,
    pub pages: Vec<Page>,
}

/// Fetches or creates the category called `name`, then overwrites its
/// counters and saves it.
pub async fn upsert_category(
    db: &dyn DatabaseService,
    name: &str,
    views: u32,
    likes: u32,
) -> PortResult<Category> {
    let mut category = db.get_or_create_category(name).await?;
    category.views = views;
    category.likes = likes;
    db.save_category(&category).await
}

/// Fetches or creates the page `title` in `category`, then overwrites its
/// url and views and saves it.
pub async fn upsert_page(
    db: &dyn DatabaseService,
    category: &Category,
    title: &str,
    url: &str,
    views: u32,
) -> PortResult<Page> {
    let mut page = db.get_or_create_page(category.id, title).await?;
    page.url = url.to_string();
    page.views = views;
    db.save_page(&page).await
}

/// Validates `form` and stores a new category with zeroed counters.
pub async fn create_category(
    db: &dyn DatabaseService,
    form: &CategoryForm,
) -> Result<Category, CatalogError> {
    let valid = form.validate().map_err(CatalogError::Invalid)?;
    match db.create_category(&valid.name).await {
        Ok(category) => Ok(category),
        Err(PortError::Conflict(_)) => Err(CatalogError::Invalid(FormErrors::single(
            "name",
            "Category with this Name already exists.",
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Validates `form` and adds it as a new page, with no views, to the category
/// identified by `slug`.
pub async fn add_page(
    db: &dyn DatabaseService,
    slug: &str,
    form: &PageForm,
) -> Result<Page, CatalogError> {
    let category = find_category(db, slug)
        .await?
        .ok_or_else(|| CatalogError::CategoryNotFound(slug.to_string()))?;
    let valid = form.validate().map_err(CatalogError::Invalid)?;
    match db.create_page(category.id, &valid.title, &valid.url).await {
        Ok(page) => Ok(page),
        Err(PortError::Conflict(_)) => Err(CatalogError::Invalid(FormErrors::single(
            "title",
            "Page with this Title already exists in this category.",
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Looks a category up by slug, mapping a miss to `None`.
pub async fn find_category(db: &dyn DatabaseService, slug: &str) -> PortResult<Option<Category>> {
    match db.get_category_by_slug(slug).await {
        Ok(category) => Ok(Some(category)),
        Err(PortError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// The category with its pages, or `None` when no category has that slug.
pub async fn category_detail(
    db: &dyn DatabaseService,
    slug: &str,
) -> PortResult<Option<(Category, Vec<Page>)>> {
    let Some(category) = find_category(db, slug).await? else {
        return Ok(None);
    };
    let pages = db.pages_for_category(category.id).await?;
    Ok(Some((category, pages)))
}

pub async fn index_listing(db: &dyn DatabaseService) -> PortResult<IndexListing> {
    Ok(IndexListing {
        categories: db.top_categories_by_likes(INDEX_LIMIT).await?,
        pages: db.top_pages_by_views(INDEX_LIMIT).await?,
    })
}

/// Adds one like to the category identified by `slug`.
pub async fn like_category(db: &dyn DatabaseService, slug: &str) -> Result<Category, CatalogError> {
    let category = find_category(db, slug)
        .await?
        .ok_or_else(|| CatalogError::CategoryNotFound(slug.to_string()))?;
    Ok(db.increment_category_likes(category.id).await?)
}

/// Counts a click-through on a page and returns the updated page.
pub async fn track_page_visit(db: &dyn DatabaseService, page_id: Uuid) -> PortResult<Page> {
    db.increment_page_views(page_id).await
}
