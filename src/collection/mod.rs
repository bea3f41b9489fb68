//! Persistence seam for resources.
//!
//! This module provides the [`Collection`] trait the action pipeline talks to, and an
//! in-memory, actor-backed implementation of it.
//!
//! # Main Components
//!
//! - [`Collection`] - Primary-key lookup, filtered search, insert, update and destroy
//! - [`ResourceActor`] - Owns the entities of one collection and enforces unique attributes
//! - [`ResourceClient`] - Cloneable [`Collection`] handle that talks to a `ResourceActor`
//! - [`CollectionError`] - Errors raised by the persistence layer
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test components without spawning full actors.

pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use self::core::*;
