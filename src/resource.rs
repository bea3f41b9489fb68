//! Resource definitions: names, slugs, parameter rules and routes.

use crate::error::{Outcome, ResourceError, ValidationErrors};
use crate::model::{is_blank, Attributes, Entity, PRIMARY_KEY};
use crate::slug::SlugGenerator;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A named collection of entities exposed through CRUD-style actions.
///
/// # Example
/// ```
/// use resource_engine::resource::Resource;
///
/// let books = Resource::new("books")
///     .slugged(["title"])
///     .permit(["title", "author", "slug"])
///     .require(["title"]);
///
/// assert_eq!(books.singular_name, "book");
/// assert_eq!(books.entity_class, "Book");
/// assert_eq!(books.index_path(), "/books");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Plural name; also the collection name and the route segment.
    pub name: String,
    /// Singular name; the request parameter key for create/update attributes.
    pub singular_name: String,
    /// Entity class reported in validation failures.
    pub entity_class: String,
    /// Slug configuration. `None` for resources without slugs.
    pub slug: Option<SlugGenerator>,
    /// When set, member identifiers are only looked up by primary key.
    pub require_primary_key: bool,
    /// Attributes accepted from request parameters. `None` accepts all.
    pub permitted_attributes: Option<Vec<String>>,
    /// Attributes that must not be blank when an entity is persisted.
    pub required_attributes: Vec<String>,
    /// Path prefix for every route, e.g. `/admin`.
    pub route_prefix: String,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let singular_name = singularize(&name);
        let entity_class = classify(&singular_name);
        Self {
            name,
            singular_name,
            entity_class,
            slug: None,
            require_primary_key: false,
            permitted_attributes: None,
            required_attributes: Vec::new(),
            route_prefix: String::new(),
        }
    }

    pub fn singular(mut self, singular_name: impl Into<String>) -> Self {
        self.singular_name = singular_name.into();
        self.entity_class = classify(&self.singular_name);
        self
    }

    pub fn entity_class(mut self, entity_class: impl Into<String>) -> Self {
        self.entity_class = entity_class.into();
        self
    }

    /// Generates slugs from `sources`, joined in order.
    pub fn slugged<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.slug = Some(SlugGenerator::from_sources(sources));
        self
    }

    pub fn with_slug_generator(mut self, generator: SlugGenerator) -> Self {
        self.slug = Some(generator);
        self
    }

    pub fn require_primary_key(mut self) -> Self {
        self.require_primary_key = true;
        self
    }

    pub fn permit<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permitted_attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn require<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Attributes the collection must keep unique: the slug, when slugged.
    pub fn unique_attributes(&self) -> Vec<String> {
        self.slug
            .iter()
            .map(|generator| generator.attribute.clone())
            .collect()
    }

    /// Names passed to views and JSON clients.
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.name,
            "singular_name": self.singular_name,
            "entity_class": self.entity_class,
        })
    }

    // --- Parameters ---

    /// Reads the member identifier from `params["id"]`.
    pub fn identifier<'a>(&self, params: &'a Attributes) -> Outcome<&'a str> {
        match params.get(PRIMARY_KEY) {
            Some(Value::String(identifier)) if !identifier.trim().is_empty() => {
                Ok(identifier.as_str())
            }
            Some(_) => Err(ResourceError::invalid_parameters(format!(
                "{} {PRIMARY_KEY} must be a non-empty string",
                self.singular_name
            ))),
            None => Err(ResourceError::invalid_parameters(format!(
                "missing parameter {PRIMARY_KEY}"
            ))),
        }
    }

    /// Reads the resource attributes from `params[<singular name>]`, keeping only
    /// permitted attributes.
    pub fn attributes(&self, params: &Attributes) -> Outcome<Attributes> {
        let attributes = match params.get(&self.singular_name) {
            Some(Value::Object(attributes)) => attributes,
            Some(_) => {
                return Err(ResourceError::invalid_parameters(format!(
                    "parameter {} must be an object",
                    self.singular_name
                )))
            }
            None => {
                return Err(ResourceError::invalid_parameters(format!(
                    "missing parameter {}",
                    self.singular_name
                )))
            }
        };

        let permitted = match &self.permitted_attributes {
            Some(permitted) => attributes
                .iter()
                .filter(|(attribute, _)| permitted.iter().any(|name| name == *attribute))
                .map(|(attribute, value)| (attribute.clone(), value.clone()))
                .collect(),
            None => attributes.clone(),
        };
        Ok(permitted)
    }

    /// Checks required attributes of an entity about to be persisted.
    pub fn validate(&self, entity: &Entity) -> Outcome<()> {
        let mut errors = ValidationErrors::new();
        for attribute in &self.required_attributes {
            if is_blank(entity.get(attribute)) {
                errors.add(attribute.clone(), "can't be blank");
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ResourceError::FailedValidation {
                entity_class: self.entity_class.clone(),
                errors,
            })
        }
    }

    // --- Routes ---

    pub fn index_path(&self) -> String {
        format!("{}/{}", self.route_prefix, self.name)
    }

    pub fn new_path(&self) -> String {
        format!("{}/new", self.index_path())
    }

    /// `/<name>/<slug or id>`, or the index path for entities without either.
    pub fn show_path(&self, entity: &Entity) -> String {
        match self.param_for(entity) {
            Some(param) => format!("{}/{}", self.index_path(), param),
            None => self.index_path(),
        }
    }

    pub fn edit_path(&self, entity: &Entity) -> String {
        match self.param_for(entity) {
            Some(param) => format!("{}/{}/edit", self.index_path(), param),
            None => self.index_path(),
        }
    }

    fn param_for<'a>(&self, entity: &'a Entity) -> Option<&'a str> {
        let slug = self
            .slug
            .as_ref()
            .and_then(|generator| entity.get_str(&generator.attribute))
            .filter(|slug| !slug.is_empty());
        slug.or_else(|| entity.primary_key())
    }
}

fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = name.strip_suffix("ses") {
        format!("{stem}s")
    } else if let Some(stem) = name.strip_suffix('s') {
        stem.to_string()
    } else {
        name.to_string()
    }
}

/// `"book_series"` -> `"BookSeries"`.
fn classify(singular_name: &str) -> String {
    singular_name
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_names_are_derived_from_the_plural_name() {
        let categories = Resource::new("categories");
        assert_eq!(categories.singular_name, "category");
        assert_eq!(categories.entity_class, "Category");

        let passes = Resource::new("bus_passes");
        assert_eq!(passes.singular_name, "bus_pass");
        assert_eq!(passes.entity_class, "BusPass");

        let people = Resource::new("people").singular("person");
        assert_eq!(people.entity_class, "Person");
    }

    #[test]
    fn test_identifier_parameter() {
        let books = Resource::new("books");

        assert_eq!(books.identifier(&params(json!({ "id": "tron" }))), Ok("tron"));
        assert!(matches!(
            books.identifier(&params(json!({}))),
            Err(ResourceError::InvalidParameters { .. })
        ));
        assert!(matches!(
            books.identifier(&params(json!({ "id": 7 }))),
            Err(ResourceError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn test_attributes_are_permitted() {
        let books = Resource::new("books").permit(["title"]);

        let attributes = books
            .attributes(&params(json!({ "book": { "title": "Tron", "admin": true } })))
            .unwrap();
        assert_eq!(attributes, params(json!({ "title": "Tron" })));

        assert_eq!(
            books.attributes(&params(json!({ "book": "Tron" }))),
            Err(ResourceError::invalid_parameters("parameter book must be an object"))
        );
        assert_eq!(
            books.attributes(&params(json!({}))),
            Err(ResourceError::invalid_parameters("missing parameter book"))
        );
    }

    #[test]
    fn test_validate_required_attributes() {
        let books = Resource::new("books").require(["title", "author"]);
        let entity = Entity::new(params(json!({ "id": "u1", "title": "Tron", "author": " " })));

        match books.validate(&entity) {
            Err(ResourceError::FailedValidation {
                entity_class,
                errors,
            }) => {
                assert_eq!(entity_class, "Book");
                assert_eq!(errors.len(), 1);
                let messages: Vec<_> = errors.messages_for("author").collect();
                assert_eq!(messages, vec!["can't be blank"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_routes_prefer_slug() {
        let books = Resource::new("books").slugged(["title"]).with_route_prefix("/library/");
        let slugged = Entity::new(params(json!({ "id": "u1", "slug": "tron" })));
        let unslugged = Entity::new(params(json!({ "id": "u2" })));

        assert_eq!(books.index_path(), "/library/books");
        assert_eq!(books.new_path(), "/library/books/new");
        assert_eq!(books.show_path(&slugged), "/library/books/tron");
        assert_eq!(books.edit_path(&slugged), "/library/books/tron/edit");
        assert_eq!(books.show_path(&unslugged), "/library/books/u2");
    }
}
