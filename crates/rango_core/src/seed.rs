//! crates/rango_core/src/seed.rs
//!
//! Demo data for a fresh installation and the routine that loads it.

use crate::catalog::{upsert_category, upsert_page};
use crate::domain::{Category, Page};
use crate::ports::{DatabaseService, PortResult};

#[derive(Debug, Clone)]
pub struct SeedPage {
    pub title: &'static str,
    pub url: &'static str,
    pub views: u32,
}

#[derive(Debug, Clone)]
pub struct SeedCategory {
    pub name: &'static str,
    pub views: u32,
    pub likes: u32,
    pub pages: Vec<SeedPage>,
}

fn page(title: &'static str, url: &'static str, views: u32) -> SeedPage {
    SeedPage { title, url, views }
}

/// The stock categories and pages.
pub fn fixtures() -> Vec<SeedCategory> {
    vec![
        SeedCategory {
            name: "Python",
            views: 128,
            likes: 64,
            pages: vec![
                page("Official Python Tutorial", "http://docs.python.org/2/tutorial/", 5),
                page(
                    "How to think like a computer scientist",
                    "http://www.greenteapress.com/thinkpython/",
                    3,
                ),
                page(
                    "Learn Python in 10 minutes",
                    "http://www.korokithakis.net/tutorials/python/",
                    5,
                ),
            ],
        },
        SeedCategory {
            name: "Django",
            views: 64,
            likes: 32,
            pages: vec![
                page(
                    "Official Django Tutorial",
                    "https://www.docs.djangoproject.com/en/1.9/intro/tutorial01/",
                    5,
                ),
                page("Django Rocks", "http://www.djangorocks.com/", 5),
                page("How to tango with django", "http://www.tangowithdjango.com/", 5),
            ],
        },
        SeedCategory {
            name: "Other Frameworks",
            views: 64,
            likes: 32,
            pages: vec![
                page("Bottle", "http://bottlepy.org/docs/dev/", 5),
                page("Flask", "http://flask.pocoo.org", 5),
            ],
        },
    ]
}

/// Upserts every category in `data` followed by its pages. Running it again
/// overwrites counters and urls without creating duplicates.
pub async fn populate(
    db: &dyn DatabaseService,
    data: &[SeedCategory],
) -> PortResult<Vec<(Category, Vec<Page>)>> {
    let mut loaded = Vec::with_capacity(data.len());
    for entry in data {
        let category = upsert_category(db, entry.name, entry.views, entry.likes).await?;
        let mut pages = Vec::with_capacity(entry.pages.len());
        for p in &entry.pages {
            pages.push(upsert_page(db, &category, p.title, p.url, p.views).await?);
        }
        loaded.push((category, pages));
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDatabase;

    #[tokio::test]
    async fn populate_loads_every_fixture() {
        let db = InMemoryDatabase::new();
        let loaded = populate(&db, &fixtures()).await.unwrap();

        let slugs: Vec<&str> = loaded.iter().map(|(c, _)| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["python", "django", "other-frameworks"]);
        let page_count: usize = loaded.iter().map(|(_, pages)| pages.len()).sum();
        assert_eq!(page_count, 8);
    }

    #[tokio::test]
    async fn populating_twice_is_idempotent() {
        let db = InMemoryDatabase::new();
        populate(&db, &fixtures()).await.unwrap();
        populate(&db, &fixtures()).await.unwrap();

        let categories = db.list_categories().await.unwrap();
        assert_eq!(categories.len(), 3);
        let mut total_pages = 0;
        for category in &categories {
            total_pages += db.pages_for_category(category.id).await.unwrap().len();
        }
        assert_eq!(total_pages, 8);

        let python = db.get_category_by_slug("python").await.unwrap();
        assert_eq!((python.views, python.likes), (128, 64));
    }
}
