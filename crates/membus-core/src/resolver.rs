//! Handler resolution.
//!
//! [`HandlerResolver`] is the single seam between the dispatcher and
//! whatever owns handler instances: a static list, a dependency-injection
//! container, a service locator. The dispatcher asks it once per publish and
//! never caches the answer, so registration changes show up on the next
//! publish without rebuilding the bus.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::descriptor::CapabilityDescriptor;
use crate::error::ResolveResult;
use crate::handler::{HandlerEntry, ResolvedHandler};

/// Looks up the current handlers for a capability descriptor.
///
/// # Contract
///
/// - An unknown descriptor yields an empty list, never an error.
/// - The order of the returned handlers is the order they are invoked in;
///   it must be deterministic for a given resolver state.
/// - A single call must see a consistent snapshot of the registrations.
///   Consistency across calls is not required.
pub trait HandlerResolver: Send + Sync {
    fn get_all(&self, descriptor: &CapabilityDescriptor) -> ResolveResult<Vec<ResolvedHandler>>;
}

impl<R: HandlerResolver + ?Sized> HandlerResolver for Arc<R> {
    fn get_all(&self, descriptor: &CapabilityDescriptor) -> ResolveResult<Vec<ResolvedHandler>> {
        (**self).get_all(descriptor)
    }
}

impl<R: HandlerResolver + ?Sized> HandlerResolver for &R {
    fn get_all(&self, descriptor: &CapabilityDescriptor) -> ResolveResult<Vec<ResolvedHandler>> {
        (**self).get_all(descriptor)
    }
}

/// A resolver over an explicit, ordered list of handler entries.
///
/// Entries can be added after the bus has been built; keep an
/// `Arc<StaticResolver>` and hand a clone to the setup:
///
/// ```rust,ignore
/// let resolver = Arc::new(StaticResolver::new());
/// let bus = BusSetup::start_with::<Conservative>()
///     .apply::<IocSupport>(|s| {
///         s.set_resolver(resolver.clone()).set_handler_shape(Handles);
///     })
///     .construct()?;
///
/// resolver.add(HandlerEntry::builder(Relay::new(bus.downgrade())).handles::<Ping>());
/// ```
#[derive(Default)]
pub struct StaticResolver {
    entries: RwLock<Vec<HandlerEntry>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver over `entries`, preserving their order.
    pub fn with_handlers<I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<HandlerEntry>,
    {
        let resolver = Self::new();
        resolver.extend(entries);
        resolver
    }

    /// Appends an entry after all existing ones.
    pub fn add(&self, entry: impl Into<HandlerEntry>) {
        self.entries.write().push(entry.into());
    }

    /// Appends several entries in order.
    pub fn extend<I, T>(&self, entries: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<HandlerEntry>,
    {
        self.entries
            .write()
            .extend(entries.into_iter().map(Into::into));
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl HandlerResolver for StaticResolver {
    fn get_all(&self, descriptor: &CapabilityDescriptor) -> ResolveResult<Vec<ResolvedHandler>> {
        // The guard drops before any handler runs, so handlers may register
        // further entries while being dispatched.
        let handlers: Vec<_> = self
            .entries
            .read()
            .iter()
            .filter_map(|entry| entry.resolve(descriptor))
            .collect();

        trace!(capability = %descriptor, count = handlers.len(), "Static lookup");
        Ok(handlers)
    }
}

impl std::fmt::Debug for StaticResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticResolver")
            .field("entries", &self.len())
            .finish()
    }
}
