use super::steps::{apply_changes, assign_primary_key, assign_slug, reassign_slug};
use crate::collection::{Collection, CollectionError, Filter};
use crate::error::{Outcome, ResourceError};
use crate::model::{Attributes, Entity};
use crate::resolver::{EntityRef, EntityResolver};
use crate::resource::Resource;
use tracing::{debug, info, instrument, warn};

/// The CRUD action pipelines of one resource.
///
/// # Pipelines
///
/// - index: find all
/// - show: read `id` → require entity
/// - create: read attributes → assign primary key → assign slug → validate → insert
/// - update: read `id` and attributes → require entity → reassign slug → merge →
///   validate → update
/// - destroy: read `id` → require entity → destroy
///
/// Every step returns a `Result`; `?` ends the pipeline at the first failure, so a
/// failed slug or lookup step never reaches `insert`, `update` or `destroy`.
pub struct ResourceActions<C> {
    resource: Resource,
    collection: C,
    resolver: EntityResolver,
}

impl<C: Collection> ResourceActions<C> {
    pub fn new(resource: Resource, collection: C) -> Self {
        let resolver = match &resource.slug {
            Some(generator) => EntityResolver::new(generator.attribute.clone()),
            None => EntityResolver::default(),
        };
        Self {
            resource,
            collection,
            resolver,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    /// Lists every entity, ordered by primary key.
    #[instrument(skip_all, fields(resource = %self.resource.name))]
    pub async fn index(&self, _params: &Attributes) -> Outcome<Vec<Entity>> {
        let entities = self
            .collection
            .find_matching(Filter::all())
            .await
            .map_err(|e| self.persistence_error(e))?;
        debug!(count = entities.len(), "Index");
        Ok(entities)
    }

    #[instrument(skip_all, fields(resource = %self.resource.name))]
    pub async fn show(&self, params: &Attributes) -> Outcome<Entity> {
        let identifier = self.resource.identifier(params)?;
        self.find_entity(identifier).await
    }

    #[instrument(skip_all, fields(resource = %self.resource.name))]
    pub async fn create(&self, params: &Attributes) -> Outcome<Entity> {
        let mut attributes = self.resource.attributes(params)?;
        debug!(?attributes, "Create");

        assign_primary_key(&mut attributes);
        assign_slug(&self.resource, &mut attributes)?;

        let entity = Entity::new(attributes);
        self.resource.validate(&entity)?;

        let entity = self
            .collection
            .insert(entity)
            .await
            .map_err(|e| self.persistence_error(e))?;
        info!(id = entity.primary_key(), "Created");
        Ok(entity)
    }

    #[instrument(skip_all, fields(resource = %self.resource.name))]
    pub async fn update(&self, params: &Attributes) -> Outcome<Entity> {
        let identifier = self.resource.identifier(params)?;
        let mut changes = self.resource.attributes(params)?;
        debug!(%identifier, ?changes, "Update");

        let existing = self.find_entity(identifier).await?;
        reassign_slug(&self.resource, &existing, &mut changes)?;

        let entity = apply_changes(existing, changes);
        self.resource.validate(&entity)?;

        let entity = self
            .collection
            .update(entity)
            .await
            .map_err(|e| self.persistence_error(e))?;
        info!(id = entity.primary_key(), "Updated");
        Ok(entity)
    }

    #[instrument(skip_all, fields(resource = %self.resource.name))]
    pub async fn destroy(&self, params: &Attributes) -> Outcome<Entity> {
        let identifier = self.resource.identifier(params)?;
        let entity = self.find_entity(identifier).await?;
        let primary_key = entity.primary_key().ok_or_else(|| {
            ResourceError::generic(format!("{} has no primary key", self.resource.entity_class))
        })?;

        let destroyed = self
            .collection
            .destroy(primary_key)
            .await
            .map_err(|e| self.persistence_error(e))?;
        info!(id = destroyed.primary_key(), "Destroyed");
        Ok(destroyed)
    }

    async fn find_entity(&self, identifier: &str) -> Outcome<Entity> {
        let result = self
            .resolver
            .require_entity(
                &self.collection,
                EntityRef::Identifier(identifier),
                self.resource.require_primary_key,
            )
            .await;
        if let Err(e) = &result {
            warn!(%identifier, error = %e, "Unable to find entity");
        }
        result
    }

    fn persistence_error(&self, e: CollectionError) -> ResourceError {
        warn!(error = %e, "Collection rejected request");
        e.into_resource_error(&self.resource.entity_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::mock::MockCollection;
    use crate::collection::{ResourceActor, ResourceClient};
    use crate::model::is_primary_key;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn params(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    fn programs() -> Resource {
        Resource::new("programs").slugged(["name"]).require(["name"])
    }

    fn start(resource: Resource) -> ResourceActions<ResourceClient> {
        let (actor, client) =
            ResourceActor::new(resource.name.clone(), 10, resource.unique_attributes());
        tokio::spawn(actor.run());
        ResourceActions::new(resource, client)
    }

    #[tokio::test]
    async fn test_create_generates_primary_key_and_slug() {
        let actions = start(programs());

        let clu = actions
            .create(&params(json!({ "program": { "name": "CLU" } })))
            .await
            .unwrap();

        assert!(is_primary_key(clu.primary_key().unwrap()));
        assert_eq!(clu.slug(), Some("clu"));
        assert_eq!(actions.show(&params(json!({ "id": "clu" }))).await, Ok(clu));
    }

    #[tokio::test]
    async fn test_create_keeps_supplied_primary_key_and_slug() {
        let actions = start(programs());
        let key = "0190b6e2-7c1a-7f3e-9a4b-1234567890ab";

        let tron = actions
            .create(&params(json!({
                "program": { "id": key, "name": "Tron", "slug": "the-tron" },
            })))
            .await
            .unwrap();

        assert_eq!(tron.primary_key(), Some(key));
        assert_eq!(tron.slug(), Some("the-tron"));
        assert_eq!(actions.show(&params(json!({ "id": key }))).await, Ok(tron));
    }

    #[tokio::test]
    async fn test_create_never_inserts_after_failed_slug_step() {
        let mock = MockCollection::new("programs");
        let actions = ResourceActions::new(programs(), mock.client());

        let result = actions.create(&params(json!({ "program": { "name": "  " } }))).await;

        assert!(matches!(result, Err(ResourceError::EmptySlugSource { .. })));
        mock.verify();
    }

    #[tokio::test]
    async fn test_create_fails_validation_before_insert() {
        let mock = MockCollection::new("programs");
        let resource = Resource::new("programs").slugged(["name"]).require(["name", "user"]);
        let actions = ResourceActions::new(resource, mock.client());

        let result = actions.create(&params(json!({ "program": { "name": "Sark" } }))).await;

        match result {
            Err(ResourceError::FailedValidation { entity_class, errors }) => {
                assert_eq!(entity_class, "Program");
                assert_eq!(errors.messages_for("user").count(), 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_reports_duplicate_slug_as_failed_validation() {
        let actions = start(programs());
        actions
            .create(&params(json!({ "program": { "name": "CLU" } })))
            .await
            .unwrap();

        let duplicate = actions
            .create(&params(json!({ "program": { "name": "Clu" } })))
            .await;

        match duplicate {
            Err(ResourceError::FailedValidation { errors, .. }) => {
                assert_eq!(errors.messages_for("slug").collect::<Vec<_>>(), vec!["already exists"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_requires_resource_parameters() {
        let mock = MockCollection::new("programs");
        let actions = ResourceActions::new(programs(), mock.client());

        let result = actions.create(&params(json!({ "name": "CLU" }))).await;

        assert_eq!(
            result,
            Err(ResourceError::invalid_parameters("missing parameter program"))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_update_slug_rules() {
        let actions = start(programs());
        actions
            .create(&params(json!({ "program": { "name": "Tron", "slug": "custom-slug" } })))
            .await
            .unwrap();

        // Absent slug: retained.
        let renamed = actions
            .update(&params(json!({ "id": "custom-slug", "program": { "name": "Rinzler" } })))
            .await
            .unwrap();
        assert_eq!(renamed.slug(), Some("custom-slug"));
        assert_eq!(renamed.get_str("name"), Some("Rinzler"));

        // Empty slug: regenerated from the current name.
        let regenerated = actions
            .update(&params(json!({ "id": "custom-slug", "program": { "slug": "" } })))
            .await
            .unwrap();
        assert_eq!(regenerated.slug(), Some("rinzler"));

        // Explicit slug: kept.
        let explicit = actions
            .update(&params(json!({ "id": "rinzler", "program": { "slug": "the-grid" } })))
            .await
            .unwrap();
        assert_eq!(explicit.slug(), Some("the-grid"));
        assert_eq!(explicit.primary_key(), renamed.primary_key());
    }

    #[tokio::test]
    async fn test_update_missing_entity_never_updates() {
        let mut mock = MockCollection::new("programs");
        mock.expect_find_matching(Filter::eq("slug", "sark")).return_ok(vec![]);
        let actions = ResourceActions::new(programs(), mock.client());

        let result = actions
            .update(&params(json!({ "id": "sark", "program": { "name": "Sark" } })))
            .await;

        assert_eq!(result, Err(ResourceError::not_found("programs", "slug", "sark")));
        mock.verify();
    }

    #[tokio::test]
    async fn test_destroy_resolves_slug_then_destroys_by_primary_key() {
        let mut mock = MockCollection::new("programs");
        let key = "0190b6e2-7c1a-7f3e-9a4b-1234567890ab";
        let yori = Entity::new(params(json!({ "id": key, "name": "Yori", "slug": "yori" })));
        mock.expect_find_matching(Filter::eq("slug", "yori"))
            .return_ok(vec![yori.clone()]);
        mock.expect_destroy(key).return_ok(yori.clone());
        let actions = ResourceActions::new(programs(), mock.client());

        let destroyed = actions.destroy(&params(json!({ "id": "yori" }))).await;

        assert_eq!(destroyed, Ok(yori));
        mock.verify();
    }

    #[tokio::test]
    async fn test_destroy_stops_on_not_unique() {
        let mut mock = MockCollection::new("programs");
        mock.expect_find_matching(Filter::eq("slug", "dup")).return_ok(vec![
            Entity::new(params(json!({ "id": "u1", "slug": "dup" }))),
            Entity::new(params(json!({ "id": "u2", "slug": "dup" }))),
        ]);
        let actions = ResourceActions::new(programs(), mock.client());

        let result = actions.destroy(&params(json!({ "id": "dup" }))).await;

        assert_eq!(result, Err(ResourceError::not_unique("programs", "slug", "dup")));
        mock.verify();
    }

    #[tokio::test]
    async fn test_primary_key_only_resource_skips_slug_lookup() {
        let mut mock = MockCollection::new("programs");
        mock.expect_find_one("tron").return_err(CollectionError::NotFound {
            collection: "programs".into(),
            attribute: "id".into(),
            value: "tron".into(),
        });
        let actions = ResourceActions::new(programs().require_primary_key(), mock.client());

        let result = actions.show(&params(json!({ "id": "tron" }))).await;

        assert_eq!(result, Err(ResourceError::not_found("programs", "id", "tron")));
        mock.verify();
    }

    #[tokio::test]
    async fn test_index_lists_in_creation_order() {
        let actions = start(programs());
        for name in ["Tron", "CLU", "Yori"] {
            actions
                .create(&params(json!({ "program": { "name": name } })))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let names: Vec<String> = actions
            .index(&Attributes::new())
            .await
            .unwrap()
            .iter()
            .filter_map(|entity| entity.get_str("name").map(str::to_string))
            .collect();
        assert_eq!(names, vec!["Tron", "CLU", "Yori"]);
    }
}
