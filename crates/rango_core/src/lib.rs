pub mod catalog;
pub mod domain;
pub mod forms;
pub mod memory;
pub mod ports;
pub mod seed;
pub mod slug;
pub mod visits;

pub use catalog::{upsert_category, upsert_page, CatalogError, IndexListing};
pub use domain::{Category, Page, SessionData};
pub use forms::{CategoryForm, FormErrors, PageForm};
pub use memory::InMemoryDatabase;
pub use ports::{DatabaseService, PortError, PortResult, SessionStore};
pub use visits::{track_visit, VisitError, VisitRecord, VisitState};
