//! Runtime orchestration and lifecycle management.
//!
//! - [`ResourceSystem`] starts one collection actor per resource, hands out
//!   controllers and shuts the actors down.
//! - [`setup_tracing`] initializes logging.

pub mod resource_system;
pub mod tracing;

pub use resource_system::*;
pub use tracing::*;
