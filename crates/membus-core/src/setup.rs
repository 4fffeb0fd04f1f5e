//! Bus assembly.
//!
//! A bus is assembled in two phases. [`BusSetup::start_with`] picks the base
//! strategy; each [`BusSetup::apply`] hands one extension's settings to a
//! configuration closure and lets the extension install them; finally
//! [`BusSetup::construct`] checks that every required setting is present and
//! produces the immutable [`Bus`].
//!
//! ```rust,ignore
//! use membus_core::{BusSetup, Conservative, Handles, IocSupport, StaticResolver};
//!
//! let bus = BusSetup::start_with::<Conservative>()
//!     .apply::<IocSupport>(|s| {
//!         s.set_resolver(StaticResolver::new()).set_handler_shape(Handles);
//!     })
//!     .construct()?;
//! ```
//!
//! # Override Rules
//!
//! - Every apply starts from the extension's default settings; only keys
//!   set by that call are installed.
//! - Installed keys accumulate across applies, in application order; a
//!   later step overrides a key set by an earlier one.
//! - Keys a step leaves unset are not touched, even if an earlier apply of
//!   the same extension set them.

use std::sync::Arc;

use tracing::{debug, info};

use crate::bus::Bus;
use crate::descriptor::HandlerShape;
use crate::error::{SetupError, SetupResult};
use crate::resolver::HandlerResolver;
use crate::strategy::{DispatchParts, DispatchStrategy, StrategyKind};

/// The shared settings every extension installs into.
#[derive(Default)]
pub struct SetupContext {
    resolver: Option<Arc<dyn HandlerResolver>>,
    handler_shape: Option<Arc<dyn HandlerShape>>,
}

impl SetupContext {
    pub fn set_resolver(&mut self, resolver: Arc<dyn HandlerResolver>) {
        self.resolver = Some(resolver);
    }

    pub fn set_handler_shape(&mut self, shape: Arc<dyn HandlerShape>) {
        self.handler_shape = Some(shape);
    }

    pub fn resolver(&self) -> Option<&Arc<dyn HandlerResolver>> {
        self.resolver.as_ref()
    }

    pub fn handler_shape(&self) -> Option<&Arc<dyn HandlerShape>> {
        self.handler_shape.as_ref()
    }
}

/// A named configuration step applied through [`BusSetup::apply`].
pub trait SetupExtension: 'static {
    /// Name used in logs and setup errors.
    const NAME: &'static str;

    /// Settings the configuration closure edits.
    type Settings: Default + 'static;

    /// Copies the settings that are set into `context`.
    fn install(settings: &Self::Settings, context: &mut SetupContext);
}

type BuildStrategy = fn(DispatchParts) -> Box<dyn DispatchStrategy>;

fn build_boxed<S: StrategyKind>(parts: DispatchParts) -> Box<dyn DispatchStrategy> {
    Box::new(S::build(parts))
}

/// Builder for a [`Bus`].
pub struct BusSetup {
    build: BuildStrategy,
    strategy: &'static str,
    context: SetupContext,
    applied: Vec<&'static str>,
}

impl BusSetup {
    /// Starts a setup on strategy `S`.
    pub fn start_with<S: StrategyKind>() -> Self {
        Self {
            build: build_boxed::<S>,
            strategy: std::any::type_name::<S>(),
            context: SetupContext::default(),
            applied: Vec::new(),
        }
    }

    /// Applies extension `X`.
    ///
    /// `configure` edits a fresh default `X::Settings`; `X` then installs
    /// the keys set in this call.
    pub fn apply<X: SetupExtension>(mut self, configure: impl FnOnce(&mut X::Settings)) -> Self {
        let mut settings = X::Settings::default();
        configure(&mut settings);
        X::install(&settings, &mut self.context);

        debug!(extension = X::NAME, "Applied setup extension");
        self.applied.push(X::NAME);
        self
    }

    /// Validates the collected settings and builds the bus.
    pub fn construct(self) -> SetupResult<Bus> {
        let resolver = self.context.resolver.ok_or(SetupError::MissingSetting {
            setting: "resolver",
            extension: IocSupport::NAME,
        })?;
        let shape = self
            .context
            .handler_shape
            .ok_or(SetupError::MissingSetting {
                setting: "handler_shape",
                extension: IocSupport::NAME,
            })?;

        let strategy = (self.build)(DispatchParts { resolver, shape });
        info!(
            strategy = strategy.name(),
            extensions = ?self.applied,
            "Bus constructed"
        );

        Ok(Bus::new(strategy))
    }
}

impl std::fmt::Debug for BusSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusSetup")
            .field("strategy", &self.strategy)
            .field("applied", &self.applied)
            .field("has_resolver", &self.context.resolver.is_some())
            .field("has_handler_shape", &self.context.handler_shape.is_some())
            .finish()
    }
}

// =============================================================================
// IocSupport
// =============================================================================

/// Wires a handler resolver and a handler shape into the bus.
pub struct IocSupport;

/// Settings for [`IocSupport`].
#[derive(Default)]
pub struct IocSettings {
    resolver: Option<Arc<dyn HandlerResolver>>,
    handler_shape: Option<Arc<dyn HandlerShape>>,
}

impl IocSettings {
    /// Sets the resolver handlers are looked up through.
    pub fn set_resolver(&mut self, resolver: impl HandlerResolver + 'static) -> &mut Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the shape used to build capability descriptors.
    pub fn set_handler_shape(&mut self, shape: impl HandlerShape) -> &mut Self {
        self.handler_shape = Some(Arc::new(shape));
        self
    }
}

impl SetupExtension for IocSupport {
    const NAME: &'static str = "IocSupport";

    type Settings = IocSettings;

    fn install(settings: &IocSettings, context: &mut SetupContext) {
        if let Some(resolver) = &settings.resolver {
            context.set_resolver(Arc::clone(resolver));
        }
        if let Some(shape) = &settings.handler_shape {
            context.set_handler_shape(Arc::clone(shape));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CapabilityDescriptor, Handles};
    use crate::error::ResolveResult;
    use crate::event::EventRef;
    use crate::handler::{Handle, HandlerEntry, HandlerResult, ResolvedHandler};
    use crate::resolver::StaticResolver;
    use crate::strategy::Conservative;
    use parking_lot::Mutex;

    struct Ping;

    struct Counter(Arc<Mutex<u32>>);

    impl Handle<Ping> for Counter {
        fn handle(&self, _event: &Ping) -> HandlerResult {
            *self.0.lock() += 1;
            Ok(())
        }
    }

    struct Empty;

    impl HandlerResolver for Empty {
        fn get_all(&self, _: &CapabilityDescriptor) -> ResolveResult<Vec<ResolvedHandler>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct Reacts;

    impl HandlerShape for Reacts {}

    /// Installs only a shape, to check that unset keys are left alone.
    struct ShapeOnly;

    impl SetupExtension for ShapeOnly {
        const NAME: &'static str = "ShapeOnly";
        type Settings = ();

        fn install(_: &(), context: &mut SetupContext) {
            context.set_handler_shape(Arc::new(Reacts));
        }
    }

    fn counting_resolver(count: &Arc<Mutex<u32>>) -> StaticResolver {
        StaticResolver::with_handlers([HandlerEntry::builder(Counter(Arc::clone(count)))
            .handles::<Ping>()])
    }

    #[test]
    fn test_construct_without_resolver_fails() {
        let err = BusSetup::start_with::<Conservative>()
            .apply::<IocSupport>(|s| {
                s.set_handler_shape(Handles);
            })
            .construct()
            .unwrap_err();

        assert!(matches!(
            err,
            SetupError::MissingSetting {
                setting: "resolver",
                ..
            }
        ));
    }

    #[test]
    fn test_construct_without_shape_fails() {
        let err = BusSetup::start_with::<Conservative>()
            .apply::<IocSupport>(|s| {
                s.set_resolver(Empty);
            })
            .construct()
            .unwrap_err();

        assert!(matches!(
            err,
            SetupError::MissingSetting {
                setting: "handler_shape",
                ..
            }
        ));
    }

    #[test]
    fn test_construct_with_nothing_applied_fails() {
        assert!(BusSetup::start_with::<Conservative>().construct().is_err());
    }

    #[test]
    fn test_construct_builds_working_bus() {
        let count = Arc::new(Mutex::new(0));
        let bus = BusSetup::start_with::<Conservative>()
            .apply::<IocSupport>(|s| {
                s.set_resolver(counting_resolver(&count))
                    .set_handler_shape(Handles);
            })
            .construct()
            .unwrap();

        assert_eq!(bus.strategy_name(), "conservative");
        bus.publish(Ping).unwrap();
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_keys_accumulate_across_repeated_apply() {
        let count = Arc::new(Mutex::new(0));
        let bus = BusSetup::start_with::<Conservative>()
            .apply::<IocSupport>(|s| {
                s.set_resolver(counting_resolver(&count));
            })
            .apply::<IocSupport>(|s| {
                s.set_handler_shape(Handles);
            })
            .construct()
            .unwrap();

        bus.publish(Ping).unwrap();
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_later_step_overrides_earlier_key() {
        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));
        let bus = BusSetup::start_with::<Conservative>()
            .apply::<IocSupport>(|s| {
                s.set_resolver(counting_resolver(&first))
                    .set_handler_shape(Handles);
            })
            .apply::<IocSupport>(|s| {
                s.set_resolver(counting_resolver(&second));
            })
            .construct()
            .unwrap();

        bus.publish(Ping).unwrap();
        assert_eq!(*first.lock(), 0);
        assert_eq!(*second.lock(), 1);
    }

    #[test]
    fn test_repeated_apply_does_not_reinstall_earlier_keys() {
        let count = Arc::new(Mutex::new(0));
        let bus = BusSetup::start_with::<Conservative>()
            .apply::<IocSupport>(|s| {
                s.set_resolver(Empty).set_handler_shape(Handles);
            })
            .apply::<ShapeOnly>(|_| {})
            .apply::<IocSupport>(|s| {
                s.set_resolver(counting_resolver(&count));
            })
            .construct()
            .unwrap();

        // `Reacts` from `ShapeOnly` survives: the second `IocSupport` step
        // set only the resolver.
        bus.publish(Ping).unwrap();
        assert_eq!(*count.lock(), 0);
    }

    #[test]
    fn test_other_extension_overrides_only_its_keys() {
        let count = Arc::new(Mutex::new(0));
        let bus = BusSetup::start_with::<Conservative>()
            .apply::<IocSupport>(|s| {
                s.set_resolver(counting_resolver(&count))
                    .set_handler_shape(Handles);
            })
            .apply::<ShapeOnly>(|_| {})
            .construct()
            .unwrap();

        // Descriptors are now built under `Reacts`, which `Counter` was not
        // registered for.
        bus.publish(Ping).unwrap();
        assert_eq!(*count.lock(), 0);

        let descriptor = Reacts.describe(EventRef::new(&Ping).event_type());
        assert_eq!(descriptor.to_string(), "Reacts<Ping>");
    }
}
