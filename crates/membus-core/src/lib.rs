//! # Membus Core
//!
//! The dispatcher at the heart of Membus, an in-process, type-routed
//! publish/subscribe bus.
//!
//! Producers publish plain Rust values. For every publish the bus derives a
//! capability descriptor from the value's runtime type, asks a pluggable
//! [`HandlerResolver`] for the handlers that currently answer it, and invokes
//! them synchronously, in resolver order, on the calling thread.
//!
//! ## Components
//!
//! - **Events** ([`EventType`], [`EventRef`]): any `'static` value; its type
//!   is the routing key
//! - **Handlers** ([`Handle`], [`HandleAny`], [`HandlerEntry`]): objects with
//!   one or more handle capabilities
//! - **Descriptors** ([`HandlerShape`], [`CapabilityDescriptor`]): the key a
//!   resolver is queried with
//! - **Resolvers** ([`HandlerResolver`], [`StaticResolver`]): the lookup seam
//!   in front of whatever owns handler instances
//! - **Strategies** ([`DispatchStrategy`], [`Conservative`]): how handlers
//!   are invoked
//! - **Bus and setup** ([`Bus`], [`BusSetup`], [`IocSupport`]): assembly and
//!   the publish entry point
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────┐  construct  ┌─────┐ publish ┌──────────────┐ get_all ┌──────────┐
//! │ BusSetup │────────────▶│ Bus │────────▶│ Conservative │────────▶│ Resolver │
//! └──────────┘             └─────┘         └──────────────┘         └──────────┘
//!                             ▲                    │ handle
//!                             │ publish            ▼
//!                             └──────────────── Handler
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use membus_core::prelude::*;
//!
//! struct OrderPlaced { id: u64 }
//!
//! struct SendReceipt;
//!
//! impl Handle<OrderPlaced> for SendReceipt {
//!     fn handle(&self, event: &OrderPlaced) -> HandlerResult {
//!         println!("receipt for order {}", event.id);
//!         Ok(())
//!     }
//! }
//!
//! let resolver = StaticResolver::with_handlers([
//!     HandlerEntry::builder(SendReceipt).handles::<OrderPlaced>(),
//! ]);
//!
//! let bus = BusSetup::start_with::<Conservative>()
//!     .apply::<IocSupport>(|s| {
//!         s.set_resolver(resolver).set_handler_shape(Handles);
//!     })
//!     .construct()?;
//!
//! bus.publish(OrderPlaced { id: 1 })?;
//! ```

pub mod bus;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod handler;
pub mod resolver;
pub mod setup;
pub mod strategy;

pub use bus::{Bus, WeakBus};
pub use descriptor::{CapabilityDescriptor, HandlerShape, Handles, ShapeId};
pub use error::{
    DispatchError, DispatchResult, ResolveError, ResolveResult, SetupError, SetupResult,
};
pub use event::{EventRef, EventType, short_type_name};
pub use handler::{
    Accepts, Capability, Handle, HandleAny, HandlerEntry, HandlerEntryBuilder, HandlerResult,
    ResolvedHandler,
};
pub use resolver::{HandlerResolver, StaticResolver};
pub use setup::{BusSetup, IocSettings, IocSupport, SetupContext, SetupExtension};
pub use strategy::{Conservative, DispatchParts, DispatchStrategy, StrategyKind};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        Bus, BusSetup, Conservative, EventRef, Handle, HandleAny, HandlerEntry, HandlerResolver,
        HandlerResult, Handles, IocSupport, StaticResolver, WeakBus,
    };
}
