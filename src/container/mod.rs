//! Container registry and identity allocation
//!
//! Containers are ephemeral, identity-scoped contexts created on demand. This
//! module keeps the in-memory record of every live container and decides the
//! number, color and icon a new one gets.

pub mod allocator;
mod registry;
mod types;

pub use registry::{Registry, DEFAULT_IDENTITY};
pub use types::{Color, Container, ContainerKind, Icon};
