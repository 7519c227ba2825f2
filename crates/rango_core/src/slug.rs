//! crates/rango_core/src/slug.rs
//!
//! URL-safe identifiers derived from human-readable names.

use regex::Regex;
use std::sync::OnceLock;

fn disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid slug regex"))
}

fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-\s]+").expect("valid separator regex"))
}

/// Converts `name` into a slug: non-ASCII characters are dropped, anything
/// that is not a word character, whitespace or hyphen is removed, the result
/// is lowercased, runs of whitespace and hyphens become a single `-`, and
/// leading/trailing `-` and `_` are stripped.
pub fn slugify(name: &str) -> String {
    let ascii: String = name.chars().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let cleaned = disallowed().replace_all(&lowered, "");
    let joined = separators().replace_all(&cleaned, "-");
    joined.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Python", "python")]
    #[case("Other Frameworks", "other-frameworks")]
    #[case("  Django   Rocks ", "django-rocks")]
    #[case("C++ & Rust!", "c-rust")]
    #[case("snake_case stays", "snake_case-stays")]
    #[case("--edge--", "edge")]
    #[case("Café Society", "caf-society")]
    #[case("", "")]
    fn slugify_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[test]
    fn slugify_is_idempotent() {
        let once = slugify("How to Tango with Django");
        assert_eq!(slugify(&once), once);
    }
}
