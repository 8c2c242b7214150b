//! Ephemera - lifecycle and removal engine for ephemeral containers
//!
//! Ephemera tracks short-lived, identity-scoped containers opened on demand
//! and tears them down once no tab uses them anymore: removal triggers are
//! debounced into batches, routed through an instant or delayed policy,
//! executed one at a time with a cooldown, and backed by a periodic sweep.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ephemera::host::InMemoryHost;
//! use ephemera::storage::MemoryStore;
//! use ephemera::{CreateTabRequest, Lifecycle, Preferences};
//!
//! # async fn demo() -> ephemera::Result<()> {
//! let host = Arc::new(InMemoryHost::new());
//! let lifecycle = Lifecycle::new(host.clone(), Preferences::default(), Arc::new(MemoryStore::new()))?;
//! let _sweeper = lifecycle.start();
//!
//! if let Some(tab) = lifecycle
//!     .create_tab_in_container(CreateTabRequest::for_url("https://example.com"))
//!     .await?
//! {
//!     host.close_tab(tab);
//!     lifecycle.enqueue_for_removal(tab);
//! }
//! lifecycle.wait_until_idle().await;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod output;
pub mod queue;
pub mod scenario;
pub mod storage;
pub mod tracker;

pub use config::{NumberMode, Preferences, RemovalPolicy, Timings};
pub use container::{Color, Container, ContainerKind, Icon, Registry};
pub use error::{EphemeraError, Result};
pub use lifecycle::{CreateTabRequest, Lifecycle, RemovalOutcome, RunStatistics, SkipReason, Snapshot};
pub use output::{format_output, OutputFormat};
