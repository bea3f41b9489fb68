//! Classification of lookup identifiers into primary keys and slugs.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use uuid::Uuid;

static PRIMARY_KEY_PATTERN: OnceLock<Regex> = OnceLock::new();

fn primary_key_pattern() -> &'static Regex {
    PRIMARY_KEY_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("primary key pattern is a valid regex")
    })
}

/// Returns true when `identifier` is shaped like a UUID.
pub fn is_primary_key(identifier: &str) -> bool {
    primary_key_pattern().is_match(identifier)
}

/// Canonical form of a primary key. UUID-shaped keys are lowercased; any other
/// key is returned unchanged.
pub fn canonical_primary_key(key: &str) -> Cow<'_, str> {
    if is_primary_key(key) && key.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(key.to_ascii_lowercase())
    } else {
        Cow::Borrowed(key)
    }
}

/// Generates a new time-ordered (version 7) primary key.
pub fn generate_primary_key() -> String {
    Uuid::now_v7().to_string()
}

/// An identifier supplied by a request, classified by its shape alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey<'a> {
    PrimaryKey(&'a str),
    Slug(&'a str),
}

impl<'a> LookupKey<'a> {
    pub fn classify(identifier: &'a str) -> Self {
        if is_primary_key(identifier) {
            LookupKey::PrimaryKey(identifier)
        } else {
            LookupKey::Slug(identifier)
        }
    }

    pub fn as_str(&self) -> &'a str {
        match self {
            LookupKey::PrimaryKey(value) | LookupKey::Slug(value) => value,
        }
    }
}
