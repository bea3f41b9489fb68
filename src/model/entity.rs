use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute name of every entity's primary key.
pub const PRIMARY_KEY: &str = "id";

/// Default attribute name of the slug.
pub const SLUG: &str = "slug";

/// A mapping of attribute names to JSON values.
pub type Attributes = Map<String, Value>;

/// Returns true for `null`, empty strings and whitespace-only strings.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

/// A persisted record of a resource.
///
/// # Shape
/// Entities are opaque attribute maps. A persisted entity always carries a
/// primary key under [`PRIMARY_KEY`]; slugged entities also carry a slug under
/// [`SLUG`] (or the attribute configured on the resource's slug generator).
///
/// Entities serialize transparently as their attribute object, so an entity
/// with `id` and `name` renders as `{"id": "...", "name": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    attributes: Attributes,
}

impl Entity {
    pub fn new(attributes: Attributes) -> Self {
        Self { attributes }
    }

    /// The primary key, if present and a string.
    pub fn primary_key(&self) -> Option<&str> {
        self.get_str(PRIMARY_KEY)
    }

    /// The slug, if present and a string.
    pub fn slug(&self) -> Option<&str> {
        self.get_str(SLUG)
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).and_then(Value::as_str)
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(attribute.into(), value.into());
    }

    /// Overwrites attributes with `changes`, key by key.
    pub fn merge(&mut self, changes: Attributes) {
        for (attribute, value) in changes {
            self.attributes.insert(attribute, value);
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn into_attributes(self) -> Attributes {
        self.attributes
    }

    /// Identifier used in URLs: the slug when present, otherwise the primary key.
    pub fn to_param(&self) -> Option<&str> {
        match self.slug() {
            Some(slug) if !slug.is_empty() => Some(slug),
            _ => self.primary_key(),
        }
    }
}

impl From<Attributes> for Entity {
    fn from(attributes: Attributes) -> Self {
        Self::new(attributes)
    }
}
