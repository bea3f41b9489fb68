//! Attribute steps run before an entity reaches the collection.
//!
//! These are pure functions over attribute maps; the pipeline decides when each
//! one runs.

use crate::error::Outcome;
use crate::model::{
    canonical_primary_key, generate_primary_key, is_blank, Attributes, Entity, PRIMARY_KEY,
};
use crate::resource::Resource;
use serde_json::Value;
use tracing::debug;

/// Sets a new time-ordered primary key unless one was supplied. A supplied UUID
/// is stored in its canonical lowercase form.
pub fn assign_primary_key(attributes: &mut Attributes) {
    if is_blank(attributes.get(PRIMARY_KEY)) {
        let primary_key = generate_primary_key();
        debug!(%primary_key, "Generated primary key");
        attributes.insert(PRIMARY_KEY.to_string(), Value::String(primary_key));
    } else if let Some(Value::String(primary_key)) = attributes.get_mut(PRIMARY_KEY) {
        let canonical = canonical_primary_key(primary_key).into_owned();
        *primary_key = canonical;
    }
}

/// Sets the slug of a new entity unless a non-blank one was supplied.
pub fn assign_slug(resource: &Resource, attributes: &mut Attributes) -> Outcome<()> {
    let Some(generator) = &resource.slug else {
        return Ok(());
    };
    let slug = generator.generate(attributes)?;
    debug!(%slug, "Assigned slug");
    attributes.insert(generator.attribute.clone(), Value::String(slug));
    Ok(())
}

/// Applies the update rule for slugs to `changes`.
///
/// - slug key present and blank: regenerate from the existing attributes merged
///   with `changes`;
/// - slug key present and non-blank: keep the supplied value;
/// - slug key absent: leave `changes` alone so the existing slug is retained.
pub fn reassign_slug(
    resource: &Resource,
    existing: &Entity,
    changes: &mut Attributes,
) -> Outcome<()> {
    let Some(generator) = &resource.slug else {
        return Ok(());
    };
    if !changes.contains_key(&generator.attribute) || !is_blank(changes.get(&generator.attribute)) {
        return Ok(());
    }

    let mut current = existing.attributes().clone();
    for (attribute, value) in changes.iter() {
        current.insert(attribute.clone(), value.clone());
    }
    let slug = generator.generate_from_sources(&current)?;
    debug!(%slug, previous = existing.get_str(&generator.attribute), "Regenerated slug");
    changes.insert(generator.attribute.clone(), Value::String(slug));
    Ok(())
}

/// Merges `changes` into `entity`. The primary key is never changed.
pub fn apply_changes(mut entity: Entity, mut changes: Attributes) -> Entity {
    changes.remove(PRIMARY_KEY);
    entity.merge(changes);
    entity
}
