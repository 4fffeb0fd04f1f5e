//! Handlers and their capabilities.
//!
//! A handler is any `Send + Sync` value implementing [`Handle<E>`] for one or
//! more event types. Because Rust cannot ask "does this object implement
//! `Handle<E>`?" at runtime, each handler instance is registered as a
//! [`HandlerEntry`] that lists its capabilities explicitly:
//!
//! ```rust,ignore
//! struct Audit;
//!
//! impl Handle<OrderPlaced> for Audit {
//!     fn handle(&self, event: &OrderPlaced) -> HandlerResult { Ok(()) }
//! }
//!
//! impl Handle<OrderShipped> for Audit {
//!     fn handle(&self, event: &OrderShipped) -> HandlerResult { Ok(()) }
//! }
//!
//! let entry = HandlerEntry::builder(Audit)
//!     .handles::<OrderPlaced>()
//!     .handles::<OrderShipped>()
//!     .build();
//! ```
//!
//! Each capability is matched independently: publishing `OrderPlaced` reaches
//! `Audit` through its first capability, publishing `OrderShipped` through
//! its second.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;

use crate::descriptor::{CapabilityDescriptor, HandlerShape, Handles, ShapeId};
use crate::event::{EventRef, EventType, short_type_name};

/// Result returned by handler bodies.
///
/// Handlers commonly publish follow-up events; `?` on the nested
/// [`DispatchError`](crate::DispatchError) keeps its full source chain.
pub type HandlerResult = anyhow::Result<()>;

/// The handle capability for event type `E`.
pub trait Handle<E>: Send + Sync {
    fn handle(&self, event: &E) -> HandlerResult;
}

/// A catch-all capability that receives every event of its shape.
///
/// This is the counterpart of a handler declared for a supertype of every
/// event: it matches any descriptor and receives the event type-erased.
pub trait HandleAny: Send + Sync {
    fn handle_any(&self, event: EventRef<'_>) -> HandlerResult;
}

type Invoker = Arc<dyn Fn(EventRef<'_>) -> HandlerResult + Send + Sync>;

/// Which events a capability accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepts {
    /// Exactly one event type.
    Exact(EventType),
    /// Every event type.
    Any,
}

/// One capability of a handler instance, bound to an erased invoker.
#[derive(Clone)]
pub struct Capability {
    shape: ShapeId,
    accepts: Accepts,
    invoke: Invoker,
}

impl Capability {
    /// Returns `true` if this capability answers `descriptor`.
    pub fn satisfies(&self, descriptor: &CapabilityDescriptor) -> bool {
        if self.shape != descriptor.shape() {
            return false;
        }
        match self.accepts {
            Accepts::Exact(event) => event == descriptor.event(),
            Accepts::Any => true,
        }
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    pub fn accepts(&self) -> Accepts {
        self.accepts
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("shape", &self.shape)
            .field("accepts", &self.accepts)
            .finish_non_exhaustive()
    }
}

/// A handler instance together with the capabilities it was registered for.
///
/// Cloning an entry is cheap and shares the underlying handler instance.
#[derive(Clone)]
pub struct HandlerEntry {
    name: &'static str,
    capabilities: Vec<Capability>,
}

impl HandlerEntry {
    /// Starts an entry for a handler that is not shared elsewhere.
    pub fn builder<H: Send + Sync + 'static>(handler: H) -> HandlerEntryBuilder<H> {
        Self::from_shared(Arc::new(handler))
    }

    /// Starts an entry for a handler the caller keeps a reference to,
    /// typically to inspect its state in tests.
    pub fn from_shared<H: Send + Sync + 'static>(handler: Arc<H>) -> HandlerEntryBuilder<H> {
        HandlerEntryBuilder {
            handler,
            capabilities: Vec::new(),
        }
    }

    /// The handler's type name without module path.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Returns `true` if any capability answers `descriptor`.
    pub fn satisfies(&self, descriptor: &CapabilityDescriptor) -> bool {
        self.capabilities.iter().any(|c| c.satisfies(descriptor))
    }

    /// Selects the capability answering `descriptor`, preferring an exact
    /// match over a catch-all one.
    ///
    /// A handler is returned at most once per lookup, however many of its
    /// capabilities match.
    pub fn resolve(&self, descriptor: &CapabilityDescriptor) -> Option<ResolvedHandler> {
        let mut fallback = None;
        for capability in &self.capabilities {
            if !capability.satisfies(descriptor) {
                continue;
            }
            match capability.accepts {
                Accepts::Exact(_) => return Some(self.bind(capability)),
                Accepts::Any => {
                    fallback.get_or_insert(capability);
                }
            }
        }
        fallback.map(|capability| self.bind(capability))
    }

    fn bind(&self, capability: &Capability) -> ResolvedHandler {
        ResolvedHandler {
            name: self.name,
            invoke: Arc::clone(&capability.invoke),
        }
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Builder returned by [`HandlerEntry::builder`] and [`HandlerEntry::from_shared`].
pub struct HandlerEntryBuilder<H> {
    handler: Arc<H>,
    capabilities: Vec<Capability>,
}

impl<H: Send + Sync + 'static> HandlerEntryBuilder<H> {
    /// Declares the `Handle<E>` capability.
    pub fn handles<E: Any>(self) -> Self
    where
        H: Handle<E>,
    {
        self.capability(Handles, Accepts::Exact(EventType::of::<E>()), |handler, event| {
            match event.downcast_ref::<E>() {
                Some(event) => <H as Handle<E>>::handle(handler, event),
                None => Err(mismatch::<H>(EventType::of::<E>(), event.event_type())),
            }
        })
    }

    /// Declares the catch-all [`HandleAny`] capability.
    pub fn handles_any(self) -> Self
    where
        H: HandleAny,
    {
        self.capability(Handles, Accepts::Any, |handler, event| handler.handle_any(event))
    }

    /// Declares a capability under a custom shape.
    pub fn capability<S, F>(mut self, shape: S, accepts: Accepts, invoke: F) -> Self
    where
        S: HandlerShape,
        F: Fn(&H, EventRef<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let handler = Arc::clone(&self.handler);
        self.capabilities.push(Capability {
            shape: shape.shape_id(),
            accepts,
            invoke: Arc::new(move |event: EventRef<'_>| invoke(&handler, event)),
        });
        self
    }

    pub fn build(self) -> HandlerEntry {
        HandlerEntry {
            name: short_type_name(std::any::type_name::<H>()),
            capabilities: self.capabilities,
        }
    }
}

impl<H: Send + Sync + 'static> From<HandlerEntryBuilder<H>> for HandlerEntry {
    fn from(builder: HandlerEntryBuilder<H>) -> Self {
        builder.build()
    }
}

fn mismatch<H>(expected: EventType, actual: EventType) -> anyhow::Error {
    anyhow!(
        "{} was resolved for {expected} but received {actual}",
        short_type_name(std::any::type_name::<H>())
    )
}

/// A handler selected by a resolver for one capability descriptor.
#[derive(Clone)]
pub struct ResolvedHandler {
    name: &'static str,
    invoke: Invoker,
}

impl ResolvedHandler {
    /// Name of the handler type, used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Invokes the handler on `event`.
    pub fn handle(&self, event: EventRef<'_>) -> HandlerResult {
        (self.invoke)(event)
    }
}

impl fmt::Debug for ResolvedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHandler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct OrderPlaced(u32);
    struct OrderShipped;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Handle<OrderPlaced> for Recorder {
        fn handle(&self, event: &OrderPlaced) -> HandlerResult {
            self.seen.lock().push(format!("placed:{}", event.0));
            Ok(())
        }
    }

    impl Handle<OrderShipped> for Recorder {
        fn handle(&self, _event: &OrderShipped) -> HandlerResult {
            self.seen.lock().push("shipped".into());
            Ok(())
        }
    }

    impl HandleAny for Recorder {
        fn handle_any(&self, event: EventRef<'_>) -> HandlerResult {
            self.seen.lock().push(format!("any:{event:?}"));
            Ok(())
        }
    }

    #[derive(Default)]
    struct Reacts;

    impl HandlerShape for Reacts {}

    #[test]
    fn test_multi_capability_handler_matches_each_type() {
        let recorder = Arc::new(Recorder::default());
        let entry = HandlerEntry::from_shared(Arc::clone(&recorder))
            .handles::<OrderPlaced>()
            .handles::<OrderShipped>()
            .build();

        assert_eq!(entry.name(), "Recorder");
        assert_eq!(entry.capabilities().len(), 2);

        let placed = entry
            .resolve(&CapabilityDescriptor::of::<Handles, OrderPlaced>())
            .unwrap();
        placed.handle(EventRef::new(&OrderPlaced(3))).unwrap();

        let shipped = entry
            .resolve(&CapabilityDescriptor::of::<Handles, OrderShipped>())
            .unwrap();
        shipped.handle(EventRef::new(&OrderShipped)).unwrap();

        assert_eq!(*recorder.seen.lock(), vec!["placed:3", "shipped"]);
    }

    #[test]
    fn test_unmatched_descriptor_resolves_nothing() {
        let entry = HandlerEntry::builder(Recorder::default())
            .handles::<OrderPlaced>()
            .build();

        assert!(!entry.satisfies(&CapabilityDescriptor::of::<Handles, OrderShipped>()));
        assert!(
            entry
                .resolve(&CapabilityDescriptor::of::<Handles, OrderShipped>())
                .is_none()
        );
    }

    #[test]
    fn test_exact_capability_preferred_over_catch_all() {
        let recorder = Arc::new(Recorder::default());
        let entry = HandlerEntry::from_shared(Arc::clone(&recorder))
            .handles_any()
            .handles::<OrderPlaced>()
            .build();

        let resolved = entry
            .resolve(&CapabilityDescriptor::of::<Handles, OrderPlaced>())
            .unwrap();
        resolved.handle(EventRef::new(&OrderPlaced(1))).unwrap();

        let fallback = entry
            .resolve(&CapabilityDescriptor::of::<Handles, OrderShipped>())
            .unwrap();
        fallback.handle(EventRef::new(&OrderShipped)).unwrap();

        let seen = recorder.seen.lock();
        assert_eq!(seen[0], "placed:1");
        assert!(seen[1].starts_with("any:"));
    }

    #[test]
    fn test_custom_shape_is_isolated_from_default_shape() {
        let entry = HandlerEntry::builder(Recorder::default())
            .capability(
                Reacts,
                Accepts::Exact(EventType::of::<OrderPlaced>()),
                |_, _| Ok(()),
            )
            .build();

        assert!(entry.satisfies(&CapabilityDescriptor::of::<Reacts, OrderPlaced>()));
        assert!(!entry.satisfies(&CapabilityDescriptor::of::<Handles, OrderPlaced>()));
    }

    #[test]
    fn test_mismatched_event_is_an_error() {
        let entry = HandlerEntry::builder(Recorder::default())
            .handles::<OrderPlaced>()
            .build();
        let resolved = entry
            .resolve(&CapabilityDescriptor::of::<Handles, OrderPlaced>())
            .unwrap();

        let err = resolved.handle(EventRef::new(&OrderShipped)).unwrap_err();
        assert!(err.to_string().contains("received OrderShipped"));
    }
}
