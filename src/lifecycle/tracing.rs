//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the `tracing-subscriber` used by binaries and
//! examples built on this crate. Library code only emits events and spans.
//!
//! ## Configuration
//!
//! Log levels come from `RUST_LOG`. The compact format hides the module path
//! (`with_target(false)`) and shows spans inline, so a request reads as
//! `handle:create: Created id="0192..."`.
//!
//! ```bash
//! # Actor lifecycle and completed actions
//! RUST_LOG=info cargo test
//!
//! # Parameters, lookups and dispatch decisions
//! RUST_LOG=debug cargo test
//!
//! # Only the collection actors
//! RUST_LOG=resource_engine::collection=debug cargo test
//! ```
//!
//! ## What Gets Traced
//!
//! - **Actor lifecycle**: `Actor started` / `Shutdown` with the collection name
//! - **Collection operations**: inserts, updates and rejected unique values
//! - **Actions**: one span per action with the resource name; `info!` on writes
//! - **Lookups**: slug queries, and a `warn!` for ambiguous slugs
//! - **Dispatch**: the matched error rule and the response status
//!
//! **With `RUST_LOG=debug`**:
//!
//! ```text
//! DEBUG handle:create: Create attributes={"name": String("CLU")}
//! DEBUG handle:create: Generated primary key primary_key=0192f6d8-...
//! DEBUG handle:create: Assigned slug slug=clu
//! INFO  Inserted collection="programs" id="0192f6d8-..." size=1
//! INFO  handle:create: Created id="0192f6d8-..."
//! DEBUG handle: Dispatched outcome action=create format=json status=201 Created
//! ```

/// Installs a compact, `RUST_LOG`-filtered subscriber as the global default.
///
/// Calling it again (e.g. from several tests) leaves the first subscriber in place.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}
