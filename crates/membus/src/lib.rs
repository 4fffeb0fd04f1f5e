//! # Membus
//!
//! An in-process, type-routed publish/subscribe bus.
//!
//! ## Overview
//!
//! Producers publish plain Rust values on a [`Bus`](core::Bus). The bus
//! routes each value by its runtime type: it asks a pluggable resolver for
//! the handlers answering that type and runs them synchronously, in
//! resolver order, stopping at the first failure. Handlers may publish
//! again while they run; nested publishes complete before the outer
//! handler resumes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  publish  ┌─────┐  dispatch  ┌──────────────┐  get_all  ┌─────────────────────┐
//! │ Producer │──────────▶│ Bus │───────────▶│ Conservative │──────────▶│ StaticResolver      │
//! └──────────┘           └─────┘            └──────────────┘           │ or ContainerResolver│
//!                           ▲                      │ handle            └─────────────────────┘
//!                           └──── publish ─── Handler
//! ```
//!
//! - [`core`]: events, handlers, resolvers, the conservative strategy,
//!   the bus and its setup
//! - [`container`]: a dependency-injection container handlers can be
//!   resolved from
//! - [`runtime`]: configuration, logging and bootstrap
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use membus::prelude::*;
//!
//! struct UserRegistered { name: String }
//!
//! struct Welcome;
//!
//! impl Handle<UserRegistered> for Welcome {
//!     fn handle(&self, event: &UserRegistered) -> HandlerResult {
//!         println!("welcome, {}", event.name);
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut builder = ContainerBuilder::new();
//!     builder.register_handler(
//!         HandlerRegistration::new(|_| Ok(Welcome)).handles::<UserRegistered>(),
//!     );
//!     let container = builder.build();
//!
//!     let bus = BusSetup::start_with::<Conservative>()
//!         .apply::<IocSupport>(|s| {
//!             s.set_resolver(container.resolver()).set_handler_shape(Handles);
//!         })
//!         .construct()?;
//!
//!     bus.publish(UserRegistered { name: "ada".into() })?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: `membus.toml` configuration files (default)
//! - `yaml-config`: `membus.yaml` configuration files
//! - `json-log`: JSON log output

pub use membus_container as container;
pub use membus_core as core;
pub use membus_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    // Bus and setup
    pub use membus_core::{Bus, BusSetup, Conservative, IocSupport, WeakBus};

    // Handlers
    pub use membus_core::{EventRef, Handle, HandleAny, HandlerEntry, HandlerResult, Handles};

    // Resolvers
    pub use membus_container::{ContainerBuilder, HandlerRegistration, Module};
    pub use membus_core::{HandlerResolver, StaticResolver};

    // Errors
    pub use membus_container::ContainerError;
    pub use membus_core::{DispatchError, SetupError};
}
