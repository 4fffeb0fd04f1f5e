//! # Membus Container
//!
//! A dependency-injection container and the [`HandlerResolver`] adapter
//! that lets a Membus bus pull its handlers from it.
//!
//! ```text
//! ┌─────┐ get_all ┌───────────────────┐ resolve_all ┌───────────┐
//! │ Bus │────────▶│ ContainerResolver │────────────▶│ Container │
//! └─────┘         └───────────────────┘             └───────────┘
//!                                                     │ activate
//!                                                     ▼
//!                                    handler factories ─▶ services
//! ```
//!
//! Handlers are registered with the capabilities they answer; the container
//! activates only the components matching a lookup, building their
//! dependencies from registered services on the way.
//!
//! [`HandlerResolver`]: membus_core::HandlerResolver

pub mod container;
pub mod error;
pub mod resolver;

pub use container::{Container, ContainerBuilder, HandlerRegistration, Lifetime, Module};
pub use error::{ContainerError, ContainerResult};
pub use resolver::ContainerResolver;
