//! crates/rango_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or wire format, with the
//! exception of `SessionData`, which is JSON by nature.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::slug::slugify;

/// A named bucket of pages. The slug is always derived from the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub views: u32,
    pub likes: u32,
}

impl Category {
    /// Builds a fresh, not yet persisted category with zeroed counters.
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
            views: 0,
            likes: 0,
        }
    }

    /// Changes the name. The slug follows on the next save.
    pub fn rename(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Re-derives the slug from the current name. Storage adapters call this
    /// on every save.
    pub fn refresh_slug(&mut self) {
        self.slug = slugify(&self.name);
    }
}

/// A link owned by exactly one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub url: String,
    pub views: u32,
}

impl Page {
    pub fn new(category_id: Uuid, title: &str, url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_id,
            title: title.to_string(),
            url: url.to_string(),
            views: 0,
        }
    }
}

/// Per-client key/value state kept by the session store between requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionData(Map<String, Value>);

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Like `get`, but treats JSON "falsy" values (`null`, `false`, `0`, `""`,
    /// empty arrays and objects) as missing.
    pub fn get_truthy(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| is_truthy(v))
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_category_derives_slug() {
        let category = Category::new("Other Frameworks");
        assert_eq!(category.slug, "other-frameworks");
        assert_eq!((category.views, category.likes), (0, 0));
    }

    #[test]
    fn rename_only_changes_slug_after_refresh() {
        let mut category = Category::new("Python");
        category.rename("Python Three");
        assert_eq!(category.slug, "python");
        category.refresh_slug();
        assert_eq!(category.slug, "python-three");
    }

    #[test]
    fn falsy_session_values_are_hidden() {
        let mut session = SessionData::new();
        session.insert("zero", 0);
        session.insert("empty", "");
        session.insert("null", Value::Null);
        session.insert("visits", 3);

        assert!(session.get_truthy("zero").is_none());
        assert!(session.get_truthy("empty").is_none());
        assert!(session.get_truthy("null").is_none());
        assert!(session.get_truthy("missing").is_none());
        assert_eq!(session.get_truthy("visits"), Some(&json!(3)));
        assert!(session.contains_key("zero"));
    }

    #[test]
    fn session_data_serializes_as_plain_object() {
        let mut session = SessionData::new();
        session.insert("visits", 2);
        let encoded = serde_json::to_value(&session).unwrap();
        assert_eq!(encoded, json!({ "visits": 2 }));
    }
}
