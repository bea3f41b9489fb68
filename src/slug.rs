//! Slug generation from entity attributes.

use crate::error::{Outcome, ResourceError};
use crate::model::{is_blank, Attributes, SLUG};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

static SEPARATOR_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Lowercases `text` and joins its alphanumeric runs with single hyphens.
///
/// ```
/// use resource_engine::slug::slugify;
///
/// assert_eq!(slugify("  Alan Bradley, Ph.D. "), "alan-bradley-ph-d");
/// ```
pub fn slugify(text: &str) -> String {
    let separator = SEPARATOR_PATTERN
        .get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("separator pattern is a valid regex"));
    let lowercase = text.to_lowercase();
    separator
        .replace_all(&lowercase, "-")
        .trim_matches('-')
        .to_string()
}

/// Derives a slug from configured source attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlugGenerator {
    /// Attribute the slug is stored under.
    pub attribute: String,
    /// Source attributes, in the order their values are joined.
    pub sources: Vec<String>,
}

impl Default for SlugGenerator {
    fn default() -> Self {
        Self {
            attribute: SLUG.to_string(),
            sources: vec!["name".to_string()],
        }
    }
}

impl SlugGenerator {
    pub fn from_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns the explicit slug in `attributes` if it is not blank, otherwise a
    /// slug built from the source attributes.
    ///
    /// # Errors
    /// [`ResourceError::EmptySlugSource`] when every source attribute is blank or
    /// the sources contain no alphanumeric characters.
    pub fn generate(&self, attributes: &Attributes) -> Outcome<String> {
        if let Some(Value::String(slug)) = attributes.get(&self.attribute) {
            if !slug.trim().is_empty() {
                return Ok(slug.clone());
            }
        }
        self.generate_from_sources(attributes)
    }

    /// Builds a slug from the source attributes, ignoring any explicit slug.
    pub fn generate_from_sources(&self, attributes: &Attributes) -> Outcome<String> {
        let parts: Vec<String> = self
            .sources
            .iter()
            .filter_map(|source| {
                let value = attributes.get(source);
                if is_blank(value) {
                    return None;
                }
                match value {
                    Some(Value::String(text)) => Some(text.clone()),
                    Some(other) => Some(other.to_string()),
                    None => None,
                }
            })
            .collect();

        let slug = slugify(&parts.join(" "));
        if slug.is_empty() {
            return Err(ResourceError::EmptySlugSource {
                attributes: self.sources.clone(),
            });
        }
        Ok(slug)
    }
}
