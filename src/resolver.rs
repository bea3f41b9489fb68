//! # Entity Resolution
//!
//! Looks up an entity by an identifier that is either a primary key or a slug.
//!
//! Classification is purely syntactic (see [`LookupKey`]): a UUID-shaped identifier
//! is only ever looked up by primary key, anything else is only ever looked up by
//! slug. A slug lookup must match exactly one entity; more than one match means
//! the collection's data is inconsistent and is reported as
//! [`ResourceError::NotUnique`] without picking a winner.

use crate::collection::{Collection, Filter};
use crate::error::{Outcome, ResourceError};
use crate::model::{canonical_primary_key, Entity, LookupKey, SLUG};
use tracing::{debug, instrument, warn};

/// Either an entity the caller already holds or an identifier to look up.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRef<'a> {
    Entity(Entity),
    Identifier(&'a str),
}

/// Resolves identifiers against a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityResolver {
    slug_attribute: String,
}

impl Default for EntityResolver {
    fn default() -> Self {
        Self::new(SLUG)
    }
}

impl EntityResolver {
    pub fn new(slug_attribute: impl Into<String>) -> Self {
        Self {
            slug_attribute: slug_attribute.into(),
        }
    }

    /// Finds the entity identified by `identifier`, by primary key or by slug.
    #[instrument(skip(self, collection), fields(collection = collection.name()))]
    pub async fn resolve<C>(&self, collection: &C, identifier: &str) -> Outcome<Entity>
    where
        C: Collection + ?Sized,
    {
        match LookupKey::classify(identifier) {
            LookupKey::PrimaryKey(primary_key) => {
                let primary_key = canonical_primary_key(primary_key);
                debug!(%primary_key, "Resolving by primary key");
                Ok(collection.find_one(&primary_key).await?)
            }
            LookupKey::Slug(slug) => {
                debug!(%slug, "Resolving by slug");
                self.find_by_slug(collection, slug).await
            }
        }
    }

    /// Returns a held entity as-is, or looks up an identifier.
    ///
    /// With `require_primary_key` set the identifier is only ever treated as a
    /// primary key; slug resolution is skipped entirely.
    pub async fn require_entity<C>(
        &self,
        collection: &C,
        entity: EntityRef<'_>,
        require_primary_key: bool,
    ) -> Outcome<Entity>
    where
        C: Collection + ?Sized,
    {
        match entity {
            EntityRef::Entity(entity) => Ok(entity),
            EntityRef::Identifier(primary_key) if require_primary_key => {
                let primary_key = canonical_primary_key(primary_key);
                debug!(collection = collection.name(), %primary_key, "Requiring primary key");
                Ok(collection.find_one(&primary_key).await?)
            }
            EntityRef::Identifier(identifier) => self.resolve(collection, identifier).await,
        }
    }

    async fn find_by_slug<C>(&self, collection: &C, slug: &str) -> Outcome<Entity>
    where
        C: Collection + ?Sized,
    {
        let filter = Filter::eq(self.slug_attribute.clone(), slug);
        let mut matches = collection.find_matching(filter).await?;

        match matches.len() {
            0 => Err(ResourceError::not_found(
                collection.name(),
                &self.slug_attribute,
                slug,
            )),
            1 => Ok(matches.remove(0)),
            count => {
                warn!(collection = collection.name(), %slug, count, "Slug is not unique");
                Err(ResourceError::not_unique(
                    collection.name(),
                    &self.slug_attribute,
                    slug,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::mock::{create_mock_collection, expect_find_one, MockCollection};
    use crate::collection::{CollectionError, ResourceActor};
    use serde_json::{json, Value};

    const KEY: &str = "0190b6e2-7c1a-7f3e-9a4b-1234567890ab";

    fn entity(value: Value) -> Entity {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_primary_key_is_never_resolved_by_slug() {
        let (client, mut receiver) = create_mock_collection("users", 10);

        let resolve_task =
            tokio::spawn(async move { EntityResolver::default().resolve(&client, KEY).await });

        let (primary_key, responder) = expect_find_one(&mut receiver)
            .await
            .expect("Expected FindOne request");
        assert_eq!(primary_key, KEY);
        responder.send(Ok(entity(json!({ "id": KEY })))).unwrap();

        let resolved = resolve_task.await.unwrap().unwrap();
        assert_eq!(resolved.primary_key(), Some(KEY));

        // The client was dropped with the task; no other request was ever sent.
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_uppercase_primary_keys_are_looked_up_in_canonical_form() {
        let mut mock = MockCollection::new("users");
        mock.expect_find_one(KEY).return_ok(entity(json!({ "id": KEY })));
        mock.expect_find_one(KEY).return_ok(entity(json!({ "id": KEY })));

        let resolver = EntityResolver::default();
        let upper = KEY.to_uppercase();
        let resolved = resolver.resolve(&mock.client(), &upper).await.unwrap();
        assert_eq!(resolved.primary_key(), Some(KEY));

        let required = resolver
            .require_entity(&mock.client(), EntityRef::Identifier(&upper), true)
            .await
            .unwrap();
        assert_eq!(required.primary_key(), Some(KEY));
        mock.verify();
    }

    #[tokio::test]
    async fn test_missing_primary_key_is_not_found() {
        let mut mock = MockCollection::new("users");
        mock.expect_find_one(KEY).return_err(CollectionError::NotFound {
            collection: "users".into(),
            attribute: "id".into(),
            value: KEY.into(),
        });

        let result = EntityResolver::default().resolve(&mock.client(), KEY).await;
        assert_eq!(result, Err(ResourceError::not_found("users", "id", KEY)));
        mock.verify();
    }

    #[tokio::test]
    async fn test_slug_matches() {
        let (actor, client) = ResourceActor::new("users", 10, vec![]);
        tokio::spawn(actor.run());
        let alan = entity(json!({ "id": "u1", "slug": "alan-bradley" }));
        client.insert(alan.clone()).await.unwrap();
        client.insert(entity(json!({ "id": "u2", "slug": "dup" }))).await.unwrap();
        client.insert(entity(json!({ "id": "u3", "slug": "dup" }))).await.unwrap();

        let resolver = EntityResolver::default();

        assert_eq!(resolver.resolve(&client, "alan-bradley").await, Ok(alan));
        assert_eq!(
            resolver.resolve(&client, "missing").await,
            Err(ResourceError::not_found("users", "slug", "missing"))
        );
        assert_eq!(
            resolver.resolve(&client, "dup").await,
            Err(ResourceError::not_unique("users", "slug", "dup"))
        );
    }

    #[tokio::test]
    async fn test_require_entity_returns_held_entity_without_lookup() {
        let mock = MockCollection::new("users");
        let held = entity(json!({ "id": "u1" }));

        let result = EntityResolver::default()
            .require_entity(&mock.client(), EntityRef::Entity(held.clone()), false)
            .await;
        assert_eq!(result, Ok(held));
        mock.verify();
    }

    #[tokio::test]
    async fn test_require_primary_key_skips_slug_resolution() {
        let mut mock = MockCollection::new("users");
        mock.expect_find_one("alan-bradley").return_err(CollectionError::NotFound {
            collection: "users".into(),
            attribute: "id".into(),
            value: "alan-bradley".into(),
        });

        let result = EntityResolver::default()
            .require_entity(&mock.client(), EntityRef::Identifier("alan-bradley"), true)
            .await;
        assert_eq!(
            result,
            Err(ResourceError::not_found("users", "id", "alan-bradley"))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_require_entity_falls_back_to_resolve() {
        let mut mock = MockCollection::new("users");
        mock.expect_find_matching(Filter::eq("slug", "alan-bradley"))
            .return_ok(vec![entity(json!({ "id": "u1", "slug": "alan-bradley" }))]);

        let result = EntityResolver::default()
            .require_entity(&mock.client(), EntityRef::Identifier("alan-bradley"), false)
            .await
            .unwrap();
        assert_eq!(result.primary_key(), Some("u1"));
        mock.verify();
    }
}
