//! Entity models
//!
//! Categories own pages; users are owned by the upstream auth proxy and
//! each may carry one profile.

use serde::{Deserialize, Serialize};

/// A named, sluggable grouping of pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub likes: u32,
}

/// A single linked resource under a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: u64,
    pub category_id: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub views: u32,
}

/// A user identity asserted by the authentication proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
}

/// Extended user attributes, one per user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl UserProfile {
    pub const fn empty(user_id: u64) -> Self {
        Self {
            user_id,
            website: None,
            picture: None,
        }
    }
}

/// Derive a URL slug from a display name
///
/// ASCII alphanumerics are lowercased and kept, runs of whitespace, `-`
/// and `_` become a single `-`, everything else is dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Usernames are limited to ASCII letters, digits and `@.+-_` so they
/// can sit in a URL path segment unescaped
pub fn is_valid_username(name: &str) -> bool {
    (1..=150).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"@.+-_".contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Python"), "python");
        assert_eq!(slugify("Other Frameworks"), "other-frameworks");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  Rust --  and__Go "), "rust-and-go");
    }

    #[test]
    fn test_slugify_drops_punctuation() {
        assert_eq!(slugify("C++ & C#!"), "c-c");
        assert_eq!(slugify("Django's tips"), "djangos-tips");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_username_charset() {
        assert!(is_valid_username("leifos"));
        assert!(is_valid_username("jo.smith+rango@example.com"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("a b"));
        assert!(!is_valid_username("x?y=1"));
        assert!(!is_valid_username("../admin"));
        assert!(!is_valid_username("x\r\nSet-Cookie"));
        assert!(!is_valid_username(&"a".repeat(151)));
    }
}
