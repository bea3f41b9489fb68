//! # Core Collection Layer
//!
//! This module defines the persistence seam used by every resource action and the
//! actor that backs it in memory.
//!
//! ## Key Types
//!
//! - [`Collection`]: The trait the resolver and the action pipeline depend on.
//! - [`ResourceActor`]: The actor that owns a collection's entities.
//! - [`ResourceClient`]: The cloneable client for communicating with the actor.
//! - [`CollectionError`]: Persistence errors (e.g., ActorClosed, NotFound, AlreadyExists).

use crate::error::{ResourceError, ValidationErrors};
use crate::model::{is_blank, Entity, PRIMARY_KEY};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION (Trait and Filters)
// =============================================================================

/// A named set of entities supporting primary-key lookup and predicate search.
///
/// # Architecture Note
/// The resolver and the action pipeline only ever talk to this trait, so the same
/// slug and primary-key logic runs against the in-memory [`ResourceClient`], the
/// [`mock`](crate::collection::mock) collection used in tests, or any database-backed
/// collection a host application provides.
///
/// # Unique Constraints
/// Implementations are expected to reject inserts and updates that would duplicate
/// a primary key or a slug. The resolver only detects duplicates on read; the
/// collection is what keeps them from being written.
#[async_trait]
pub trait Collection: Send + Sync {
    /// The collection name (e.g., `"books"`), used in error messages.
    fn name(&self) -> &str;

    /// Find the entity with the given primary key.
    async fn find_one(&self, primary_key: &str) -> Result<Entity, CollectionError>;

    /// Find every entity matching the filter, ordered by primary key.
    async fn find_matching(&self, filter: Filter) -> Result<Vec<Entity>, CollectionError>;

    /// Persist a new entity. The entity must carry a primary key.
    async fn insert(&self, entity: Entity) -> Result<Entity, CollectionError>;

    /// Replace an existing entity, matched by primary key.
    async fn update(&self, entity: Entity) -> Result<Entity, CollectionError>;

    /// Remove the entity with the given primary key, returning it.
    async fn destroy(&self, primary_key: &str) -> Result<Entity, CollectionError>;
}

/// A conjunction of attribute equality conditions.
///
/// `Filter::all()` has no conditions and matches every entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(attribute, value)
    }

    pub fn and(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((attribute.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        self.conditions
            .iter()
            .all(|(attribute, value)| entity.get(attribute) == Some(value))
    }
}

// =============================================================================
// 2. THE MESSAGES & ERRORS
// =============================================================================

/// Errors that can occur within the collection layer itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum CollectionError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("{collection} not found with {attribute} {value:?}")]
    NotFound {
        collection: String,
        attribute: String,
        value: String,
    },
    #[error("{collection} already exists with {attribute} {value:?}")]
    AlreadyExists {
        collection: String,
        attribute: String,
        value: String,
    },
    #[error("{collection} entity is missing a primary key")]
    MissingPrimaryKey { collection: String },
}

impl CollectionError {
    /// Converts into a [`ResourceError`], reporting unique constraint violations as
    /// validation failures of `entity_class`.
    pub fn into_resource_error(self, entity_class: &str) -> ResourceError {
        match self {
            CollectionError::NotFound {
                collection,
                attribute,
                value,
            } => ResourceError::NotFound {
                collection,
                attribute,
                value,
            },
            CollectionError::AlreadyExists { attribute, .. } => {
                let mut errors = ValidationErrors::new();
                errors.add(attribute, "already exists");
                ResourceError::FailedValidation {
                    entity_class: entity_class.to_string(),
                    errors,
                }
            }
            CollectionError::MissingPrimaryKey { .. } => {
                let mut errors = ValidationErrors::new();
                errors.add(PRIMARY_KEY, "can't be blank");
                ResourceError::FailedValidation {
                    entity_class: entity_class.to_string(),
                    errors,
                }
            }
            e @ (CollectionError::ActorClosed | CollectionError::ActorDropped) => {
                ResourceError::generic(e.to_string())
            }
        }
    }
}

impl From<CollectionError> for ResourceError {
    fn from(e: CollectionError) -> Self {
        let collection = match &e {
            CollectionError::NotFound { collection, .. }
            | CollectionError::AlreadyExists { collection, .. }
            | CollectionError::MissingPrimaryKey { collection } => collection.clone(),
            CollectionError::ActorClosed | CollectionError::ActorDropped => String::new(),
        };
        e.into_resource_error(&collection)
    }
}

/// Type alias for the one-shot reply channel used by the actor.
pub type Reply<T> = oneshot::Sender<Result<T, CollectionError>>;

/// Internal message type sent to the actor to request operations.
///
/// # The CRUD Pattern
/// The variants map to the primitives of [`Collection`]:
///
/// - **FindOne**: Retrieval by primary key.
/// - **FindMatching**: Retrieval of every entity matching a [`Filter`].
/// - **Insert**: Lifecycle start. The entity arrives with its primary key already set.
/// - **Update**: State mutation. Replaces the stored entity with the same primary key.
/// - **Destroy**: Lifecycle end.
#[derive(Debug)]
pub enum CollectionRequest {
    FindOne {
        primary_key: String,
        respond_to: Reply<Entity>,
    },
    FindMatching {
        filter: Filter,
        respond_to: Reply<Vec<Entity>>,
    },
    Insert {
        entity: Entity,
        respond_to: Reply<Entity>,
    },
    Update {
        entity: Entity,
        respond_to: Reply<Entity>,
    },
    Destroy {
        primary_key: String,
        respond_to: Reply<Entity>,
    },
}

// =============================================================================
// 3. THE ACTOR SERVER
// =============================================================================

/// The actor that owns the entities of one collection.
///
/// # Architecture Note
/// This struct is the "Server" half of the collection. It owns the state (`store`)
/// and the receiver end of the channel.
///
/// **Concurrency Model**:
/// Requests are processed *sequentially* in a loop, so the unique constraint check
/// and the write that follows it can never interleave with another request. That is
/// what makes slug uniqueness hold even when two requests race to create the same
/// slug.
pub struct ResourceActor {
    name: String,
    receiver: mpsc::Receiver<CollectionRequest>,
    store: BTreeMap<String, Entity>,
    unique_attributes: Vec<String>,
}

impl ResourceActor {
    /// Creates the actor and its client.
    ///
    /// `unique_attributes` lists the attributes (besides the primary key) whose
    /// non-blank values must not repeat across the collection.
    pub fn new(
        name: impl Into<String>,
        buffer_size: usize,
        unique_attributes: Vec<String>,
    ) -> (Self, ResourceClient) {
        let name = name.into();
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            name: name.clone(),
            receiver,
            store: BTreeMap::new(),
            unique_attributes,
        };
        let client = ResourceClient::new(name, sender);
        (actor, client)
    }

    /// Runs the actor's event loop, processing messages until the channel closes.
    pub async fn run(mut self) {
        let collection = self.name.clone();
        info!(%collection, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CollectionRequest::FindOne {
                    primary_key,
                    respond_to,
                } => {
                    let result = self.store.get(&primary_key).cloned().ok_or_else(|| {
                        CollectionError::NotFound {
                            collection: collection.clone(),
                            attribute: PRIMARY_KEY.to_string(),
                            value: primary_key.clone(),
                        }
                    });
                    debug!(%collection, %primary_key, found = result.is_ok(), "FindOne");
                    let _ = respond_to.send(result);
                }
                CollectionRequest::FindMatching { filter, respond_to } => {
                    let matches: Vec<Entity> = self
                        .store
                        .values()
                        .filter(|entity| filter.matches(entity))
                        .cloned()
                        .collect();
                    debug!(%collection, ?filter, count = matches.len(), "FindMatching");
                    let _ = respond_to.send(Ok(matches));
                }
                CollectionRequest::Insert { entity, respond_to } => {
                    debug!(%collection, ?entity, "Insert");
                    match self.insert(entity) {
                        Ok(entity) => {
                            let size = self.store.len();
                            info!(%collection, id = entity.primary_key(), size, "Inserted");
                            let _ = respond_to.send(Ok(entity));
                        }
                        Err(e) => {
                            warn!(%collection, error = %e, "Insert failed");
                            let _ = respond_to.send(Err(e));
                        }
                    }
                }
                CollectionRequest::Update { entity, respond_to } => {
                    debug!(%collection, ?entity, "Update");
                    match self.update(entity) {
                        Ok(entity) => {
                            info!(%collection, id = entity.primary_key(), "Updated");
                            let _ = respond_to.send(Ok(entity));
                        }
                        Err(e) => {
                            warn!(%collection, error = %e, "Update failed");
                            let _ = respond_to.send(Err(e));
                        }
                    }
                }
                CollectionRequest::Destroy {
                    primary_key,
                    respond_to,
                } => {
                    debug!(%collection, %primary_key, "Destroy");
                    if let Some(entity) = self.store.remove(&primary_key) {
                        info!(%collection, %primary_key, size = self.store.len(), "Destroyed");
                        let _ = respond_to.send(Ok(entity));
                    } else {
                        warn!(%collection, %primary_key, "Not found");
                        let _ = respond_to.send(Err(CollectionError::NotFound {
                            collection: collection.clone(),
                            attribute: PRIMARY_KEY.to_string(),
                            value: primary_key,
                        }));
                    }
                }
            }
        }

        info!(%collection, size = self.store.len(), "Shutdown");
    }

    fn insert(&mut self, entity: Entity) -> Result<Entity, CollectionError> {
        let primary_key = self.require_primary_key(&entity)?;
        if self.store.contains_key(&primary_key) {
            return Err(CollectionError::AlreadyExists {
                collection: self.name.clone(),
                attribute: PRIMARY_KEY.to_string(),
                value: primary_key,
            });
        }
        self.check_unique_attributes(&entity, &primary_key)?;
        self.store.insert(primary_key, entity.clone());
        Ok(entity)
    }

    fn update(&mut self, entity: Entity) -> Result<Entity, CollectionError> {
        let primary_key = self.require_primary_key(&entity)?;
        if !self.store.contains_key(&primary_key) {
            return Err(CollectionError::NotFound {
                collection: self.name.clone(),
                attribute: PRIMARY_KEY.to_string(),
                value: primary_key,
            });
        }
        self.check_unique_attributes(&entity, &primary_key)?;
        self.store.insert(primary_key, entity.clone());
        Ok(entity)
    }

    fn require_primary_key(&self, entity: &Entity) -> Result<String, CollectionError> {
        match entity.primary_key() {
            Some(primary_key) if !primary_key.trim().is_empty() => Ok(primary_key.to_string()),
            _ => Err(CollectionError::MissingPrimaryKey {
                collection: self.name.clone(),
            }),
        }
    }

    /// Rejects `entity` when another stored entity shares one of its unique values.
    fn check_unique_attributes(
        &self,
        entity: &Entity,
        primary_key: &str,
    ) -> Result<(), CollectionError> {
        for attribute in &self.unique_attributes {
            let value = entity.get(attribute);
            if is_blank(value) {
                continue;
            }
            let taken = self
                .store
                .iter()
                .any(|(key, other)| key != primary_key && other.get(attribute) == value);
            if taken {
                let value = match value {
                    Some(Value::String(text)) => text.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                return Err(CollectionError::AlreadyExists {
                    collection: self.name.clone(),
                    attribute: attribute.clone(),
                    value,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// 4. THE CLIENT
// =============================================================================

/// A cloneable [`Collection`] handle for a running `ResourceActor`.
#[derive(Clone)]
pub struct ResourceClient {
    name: String,
    sender: mpsc::Sender<CollectionRequest>,
}

impl ResourceClient {
    pub fn new(name: impl Into<String>, sender: mpsc::Sender<CollectionRequest>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> CollectionRequest,
    ) -> Result<T, CollectionError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| CollectionError::ActorClosed)?;
        response.await.map_err(|_| CollectionError::ActorDropped)?
    }
}

#[async_trait]
impl Collection for ResourceClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, primary_key: &str) -> Result<Entity, CollectionError> {
        let primary_key = primary_key.to_string();
        self.request(|respond_to| CollectionRequest::FindOne {
            primary_key,
            respond_to,
        })
        .await
    }

    async fn find_matching(&self, filter: Filter) -> Result<Vec<Entity>, CollectionError> {
        self.request(|respond_to| CollectionRequest::FindMatching { filter, respond_to })
            .await
    }

    async fn insert(&self, entity: Entity) -> Result<Entity, CollectionError> {
        self.request(|respond_to| CollectionRequest::Insert { entity, respond_to })
            .await
    }

    async fn update(&self, entity: Entity) -> Result<Entity, CollectionError> {
        self.request(|respond_to| CollectionRequest::Update { entity, respond_to })
            .await
    }

    async fn destroy(&self, primary_key: &str) -> Result<Entity, CollectionError> {
        let primary_key = primary_key.to_string();
        self.request(|respond_to| CollectionRequest::Destroy {
            primary_key,
            respond_to,
        })
        .await
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================
