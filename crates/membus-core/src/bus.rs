//! The bus producers publish on.
//!
//! A [`Bus`] is built once through [`BusSetup`](crate::BusSetup) and is
//! immutable afterwards. It owns exactly one dispatch strategy, keeps no
//! history of published events, and is cheap to clone: clones share the
//! same strategy.
//!
//! # Re-entrancy
//!
//! Handlers may publish on the bus that is currently dispatching to them.
//! A handler that is itself reachable from the bus's resolver should hold a
//! [`WeakBus`] rather than a `Bus`, otherwise the bus, the resolver and the
//! handler keep each other alive.
//!
//! # Thread Safety
//!
//! `Bus` is `Send + Sync`. The core adds no locking around dispatch, so
//! publishing from several threads at once is only sound when every handler
//! and the resolver tolerate it.

use std::any::Any;
use std::sync::{Arc, Weak};

use crate::error::{DispatchError, DispatchResult};
use crate::event::EventRef;
use crate::strategy::DispatchStrategy;

struct BusInner {
    strategy: Box<dyn DispatchStrategy>,
}

/// An immutable, type-routed event bus.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

impl Bus {
    pub(crate) fn new(strategy: Box<dyn DispatchStrategy>) -> Self {
        Self {
            inner: Arc::new(BusInner { strategy }),
        }
    }

    /// Publishes `event` and returns once every handler, including those of
    /// nested publishes, has completed.
    ///
    /// The event is dropped when this call returns.
    pub fn publish<E: Any>(&self, event: E) -> DispatchResult<()> {
        self.publish_ref(&event)
    }

    /// Publishes a borrowed event.
    pub fn publish_ref<E: Any>(&self, event: &E) -> DispatchResult<()> {
        self.publish_erased(EventRef::new(event))
    }

    /// Publishes an already type-erased event, routing on its runtime type.
    pub fn publish_erased(&self, event: EventRef<'_>) -> DispatchResult<()> {
        self.inner.strategy.dispatch(event)
    }

    /// Name of the configured dispatch strategy.
    pub fn strategy_name(&self) -> &'static str {
        self.inner.strategy.name()
    }

    /// Creates a non-owning handle for handlers that republish.
    pub fn downgrade(&self) -> WeakBus {
        WeakBus {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("strategy", &self.strategy_name())
            .finish()
    }
}

/// A non-owning handle to a [`Bus`].
#[derive(Clone, Default)]
pub struct WeakBus {
    inner: Weak<BusInner>,
}

impl WeakBus {
    /// Returns the bus if it is still alive.
    pub fn upgrade(&self) -> Option<Bus> {
        self.inner.upgrade().map(|inner| Bus { inner })
    }

    /// Publishes through the bus, failing with
    /// [`DispatchError::BusDropped`] if it no longer exists.
    pub fn publish<E: Any>(&self, event: E) -> DispatchResult<()> {
        self.upgrade()
            .ok_or(DispatchError::BusDropped)?
            .publish(event)
    }
}

impl std::fmt::Debug for WeakBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakBus")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
