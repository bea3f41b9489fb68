//! # Resource Engine
//!
//! > **Slug-aware CRUD resources on top of Tokio actors.**
//!
//! This crate runs the shared index/show/create/update/destroy actions of named
//! resources and turns their outcomes into JSON envelopes or HTML render and
//! redirect directives. Entities are looked up by primary key (a UUID) or by a
//! human-readable slug.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Outcomes are values
//! Every action returns an [`Outcome`](error::Outcome): `Result<T, ResourceError>`.
//! The pipelines chain their steps with `?`, and the responders pattern match on the
//! error's [`ErrorKind`](error::ErrorKind) in a declared order. Nothing in the library
//! panics on bad input.
//!
//! ### One actor per collection
//! Each collection is a [`ResourceActor`](collection::ResourceActor) in its own Tokio
//! task. Requests are processed sequentially, so the actor's unique constraint on
//! the slug cannot be raced: two concurrent creates of `"Tron"` produce one entity
//! and one validation failure.
//!
//! ### Configuration is passed in
//! The responders take a [`ResponderConfig`](config::ResponderConfig) at
//! construction. Nothing reads global state while a request is handled.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Data ([`model`], [`slug`], [`error`])
//! - **Role**: Entities as attribute maps, lookup key classification, slug generation
//!   and the error taxonomy.
//! - **Key items**: [`Entity`](model::Entity), [`LookupKey`](model::LookupKey),
//!   [`SlugGenerator`](slug::SlugGenerator), [`ResourceError`](error::ResourceError).
//!
//! ### 2. The Storage ([`collection`])
//! - **Role**: The [`Collection`](collection::Collection) seam, the actor-backed
//!   in-memory collection and a mock for tests.
//!
//! ### 3. The Pipeline ([`resource`], [`resolver`], [`actions`])
//! - **Role**: Resource definitions, identifier resolution and the action pipelines.
//! - **Key items**: [`Resource`](resource::Resource),
//!   [`EntityResolver`](resolver::EntityResolver),
//!   [`ResourceActions`](actions::ResourceActions).
//!
//! ### 4. The Surface ([`responders`], [`controller`], [`config`])
//! - **Role**: Dispatching outcomes to responses, per resource.
//! - **Key items**: [`Responder`](responders::Responder),
//!   [`ResourceController`](controller::ResourceController).
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! - **Role**: Spins up one actor per resource and shuts them down.
//! - **Key items**: [`ResourceSystem`](lifecycle::ResourceSystem),
//!   [`setup_tracing`](lifecycle::setup_tracing).
//!
//! ## 🚀 Quick Start
//!
//! ```ignore
//! let system = ResourceSystem::start(
//!     vec![Resource::new("programs").slugged(["name"])],
//!     ResponderConfig::from_env()?,
//! );
//! let programs = system.controller("programs").unwrap();
//!
//! let params = json!({ "program": { "name": "CLU" } });
//! let response = programs
//!     .handle(ActionName::Create, Format::Json, params.as_object().unwrap())
//!     .await;
//! assert_eq!(response.status(), StatusCode::CREATED);
//!
//! system.shutdown().await?;
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! RUST_LOG=debug cargo test
//! ```

pub mod actions;
pub mod collection;
pub mod config;
pub mod controller;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod resolver;
pub mod resource;
pub mod responders;
pub mod slug;
