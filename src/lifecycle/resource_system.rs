use crate::collection::{ResourceActor, ResourceClient};
use crate::config::ResponderConfig;
use crate::controller::ResourceController;
use crate::resource::Resource;
use std::collections::BTreeMap;
use tracing::{error, info};

/// Channel capacity of every collection actor.
pub const DEFAULT_BUFFER_SIZE: usize = 32;

/// Starts and stops the collection actors of a set of resources.
///
/// Each resource gets its own [`ResourceActor`], spawned in its own Tokio task, and a
/// [`ResourceController`] wired to the actor's client.
///
/// # Example
///
/// ```ignore
/// let system = ResourceSystem::start(vec![Resource::new("books").slugged(["title"])], config);
///
/// let books = system.controller("books").unwrap();
/// let response = books.handle(ActionName::Create, Format::Json, &params).await;
///
/// system.shutdown().await?;
/// ```
pub struct ResourceSystem {
    controllers: BTreeMap<String, ResourceController<ResourceClient>>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl ResourceSystem {
    /// Spawns one actor per resource. Must be called inside a Tokio runtime.
    ///
    /// A resource named like an earlier one replaces it; the earlier actor stops
    /// once its client is dropped.
    pub fn start(resources: impl IntoIterator<Item = Resource>, config: ResponderConfig) -> Self {
        let mut controllers = BTreeMap::new();
        let mut handles = Vec::new();

        for resource in resources {
            let (actor, client) = ResourceActor::new(
                resource.name.clone(),
                DEFAULT_BUFFER_SIZE,
                resource.unique_attributes(),
            );
            handles.push(tokio::spawn(actor.run()));

            info!(resource = %resource.name, environment = %config.environment, "Started resource");
            let name = resource.name.clone();
            controllers.insert(name, ResourceController::new(resource, client, config.clone()));
        }

        Self {
            controllers,
            handles,
        }
    }

    pub fn controller(&self, name: &str) -> Option<&ResourceController<ResourceClient>> {
        self.controllers.get(name)
    }

    /// A client of the named resource's collection.
    pub fn collection(&self, name: &str) -> Option<ResourceClient> {
        self.controllers
            .get(name)
            .map(|controller| controller.actions().collection().clone())
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(String::as_str)
    }

    /// Drops every controller and waits for the actors to stop.
    ///
    /// Clients handed out by [`collection`](Self::collection) keep their actor
    /// alive, so drop them first. Returns an error if any actor task panicked.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down resources...");

        // Dropping the controllers drops their clients, which closes the channels.
        drop(self.controllers);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Shutdown complete.");
        Ok(())
    }
}
