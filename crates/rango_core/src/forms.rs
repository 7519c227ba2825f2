//! crates/rango_core/src/forms.rs
//!
//! Input forms for categories and pages and their field-level validation.

use std::collections::BTreeMap;
use url::Url;

pub const MAX_NAME_LENGTH: usize = 128;
pub const MAX_TITLE_LENGTH: usize = 128;
pub const MAX_URL_LENGTH: usize = 200;

const REQUIRED: &str = "This field is required.";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection holding a single message for `field`.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Data submitted to create a category.
#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    pub name: String,
}

/// A category form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCategory {
    pub name: String,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<ValidCategory, FormErrors> {
        let mut errors = FormErrors::new();
        let name = self.name.trim();
        check_text(&mut errors, "name", name, MAX_NAME_LENGTH);
        errors.into_result(ValidCategory {
            name: name.to_string(),
        })
    }
}

/// Data submitted to add a page to a category.
#[derive(Debug, Clone, Default)]
pub struct PageForm {
    pub title: String,
    pub url: String,
}

/// A page form that passed validation, with the url normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPage {
    pub title: String,
    pub url: String,
}

impl PageForm {
    pub fn validate(&self) -> Result<ValidPage, FormErrors> {
        let mut errors = FormErrors::new();
        let title = self.title.trim();
        check_text(&mut errors, "title", title, MAX_TITLE_LENGTH);

        let raw = normalize_url(self.url.trim());
        let url = if raw.is_empty() {
            errors.add("url", REQUIRED);
            raw
        } else {
            match Url::parse(&raw) {
                // Store the serialized form: the parser drops embedded tabs and
                // newlines that could never go out in a `Location` header.
                Ok(parsed) if parsed.host_str().is_some() => {
                    let url = parsed.to_string();
                    check_length(&mut errors, "url", &url, MAX_URL_LENGTH);
                    url
                }
                _ => {
                    errors.add("url", "Enter a valid URL.");
                    raw
                }
            }
        };

        errors.into_result(ValidPage {
            title: title.to_string(),
            url,
        })
    }
}

/// Prefixes `http://` when the scheme is missing.
pub fn normalize_url(raw: &str) -> String {
    if raw.is_empty() || raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    }
}

fn check_text(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else {
        check_length(errors, field, value, max);
    }
}

fn check_length(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    let length = value.chars().count();
    if length > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, length
            ),
        );
    }
}
