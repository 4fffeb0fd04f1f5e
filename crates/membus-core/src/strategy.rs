//! Dispatch strategies.
//!
//! A [`DispatchStrategy`] decides how a published event reaches its
//! handlers. The [`Bus`](crate::Bus) only forwards to its strategy, so a
//! different strategy can be plugged in through
//! [`BusSetup::start_with`](crate::BusSetup::start_with) without changing the
//! bus's public surface.
//!
//! # Conservative Dispatch
//!
//! [`Conservative`] is the default and the only strategy shipped here:
//!
//! 1. Build the capability descriptor for the event's exact runtime type
//! 2. Ask the resolver for the current handlers
//! 3. Invoke each handler in resolver order, one at a time, on the calling
//!    thread
//! 4. Stop at the first failure and return it
//!
//! A handler that publishes during its own invocation re-enters the same
//! pipeline through plain recursion. The nested publish runs to completion
//! before the outer handler resumes, so dispatch order is depth-first:
//!
//! ```text
//! publish(A) ─▶ H1(A) ─▶ publish(B) ─▶ H3(B)
//!                  ◀──────────────────────┘
//!            ─▶ H2(A)
//! ```
//!
//! Cycles (a handler chain that keeps republishing the event that triggered
//! it) are not detected; they recurse until the stack is exhausted.

use std::sync::Arc;

use tracing::{Level, debug, span, trace};

use crate::descriptor::HandlerShape;
use crate::error::{DispatchError, DispatchResult};
use crate::event::EventRef;
use crate::resolver::HandlerResolver;

/// The algorithm a bus uses to deliver one published event.
pub trait DispatchStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Delivers `event` to its handlers and returns once all of them, and
    /// every publish they trigger, have completed.
    fn dispatch(&self, event: EventRef<'_>) -> DispatchResult<()>;
}

/// Settings a strategy is assembled from, as collected by the setup.
#[derive(Clone)]
pub struct DispatchParts {
    /// Where handlers come from.
    pub resolver: Arc<dyn HandlerResolver>,
    /// How events map to capability descriptors.
    pub shape: Arc<dyn HandlerShape>,
}

/// A strategy that [`BusSetup`](crate::BusSetup) can start from.
pub trait StrategyKind: DispatchStrategy + Sized + 'static {
    fn build(parts: DispatchParts) -> Self;
}

/// Fully synchronous, strictly ordered, fail-fast dispatch.
pub struct Conservative {
    resolver: Arc<dyn HandlerResolver>,
    shape: Arc<dyn HandlerShape>,
}

impl StrategyKind for Conservative {
    fn build(parts: DispatchParts) -> Self {
        Self {
            resolver: parts.resolver,
            shape: parts.shape,
        }
    }
}

impl DispatchStrategy for Conservative {
    fn name(&self) -> &'static str {
        "conservative"
    }

    fn dispatch(&self, event: EventRef<'_>) -> DispatchResult<()> {
        let event_type = event.event_type();
        let descriptor = self.shape.describe(event_type);

        let span = span!(Level::DEBUG, "publish", event = %event_type, capability = %descriptor);
        let _enter = span.enter();

        let handlers =
            self.resolver
                .get_all(&descriptor)
                .map_err(|source| DispatchError::Resolution {
                    event: event_type.short_name(),
                    source,
                })?;

        if handlers.is_empty() {
            trace!("No handlers registered");
            return Ok(());
        }

        debug!(handlers = handlers.len(), "Dispatching");

        for handler in &handlers {
            trace!(handler = handler.name(), "Invoking handler");
            handler
                .handle(event)
                .map_err(|source| DispatchError::Handler {
                    handler: handler.name(),
                    event: event_type.short_name(),
                    source,
                })?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for Conservative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conservative")
            .field("shape", &self.shape.label())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CapabilityDescriptor, Handles};
    use crate::error::{ResolveError, ResolveResult};
    use crate::handler::{Handle, HandlerEntry, HandlerResult, ResolvedHandler};
    use crate::resolver::StaticResolver;
    use anyhow::bail;
    use parking_lot::Mutex;

    struct Tick;

    struct Step {
        name: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Handle<Tick> for Step {
        fn handle(&self, _event: &Tick) -> HandlerResult {
            self.log.lock().push(self.name);
            if self.fail {
                bail!("{} refused", self.name);
            }
            Ok(())
        }
    }

    struct Broken;

    impl HandlerResolver for Broken {
        fn get_all(
            &self,
            descriptor: &CapabilityDescriptor,
        ) -> ResolveResult<Vec<ResolvedHandler>> {
            Err(ResolveError::backend(descriptor, "store offline"))
        }
    }

    fn conservative(resolver: impl HandlerResolver + 'static) -> Conservative {
        Conservative::build(DispatchParts {
            resolver: Arc::new(resolver),
            shape: Arc::new(Handles),
        })
    }

    fn step(name: &'static str, fail: bool, log: &Arc<Mutex<Vec<&'static str>>>) -> HandlerEntry {
        HandlerEntry::builder(Step {
            name,
            fail,
            log: Arc::clone(log),
        })
        .handles::<Tick>()
        .build()
    }

    #[test]
    fn test_invokes_handlers_in_resolver_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let strategy = conservative(StaticResolver::with_handlers([
            step("first", false, &log),
            step("second", false, &log),
            step("third", false, &log),
        ]));

        strategy.dispatch(EventRef::new(&Tick)).unwrap();
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
        assert_eq!(strategy.name(), "conservative");
    }

    #[test]
    fn test_failure_skips_remaining_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let strategy = conservative(StaticResolver::with_handlers([
            step("first", false, &log),
            step("second", true, &log),
            step("third", false, &log),
        ]));

        let err = strategy.dispatch(EventRef::new(&Tick)).unwrap_err();
        match err {
            DispatchError::Handler { handler, event, source } => {
                assert_eq!(handler, "Step");
                assert_eq!(event, "Tick");
                assert_eq!(source.to_string(), "second refused");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_resolution_failure_invokes_nothing() {
        let strategy = conservative(Broken);

        let err = strategy.dispatch(EventRef::new(&Tick)).unwrap_err();
        assert!(err.is_resolution());
        assert_eq!(err.to_string(), "could not resolve handlers for Tick");
    }

    #[test]
    fn test_no_handlers_is_ok() {
        let strategy = conservative(StaticResolver::new());
        assert!(strategy.dispatch(EventRef::new(&Tick)).is_ok());
    }
}
