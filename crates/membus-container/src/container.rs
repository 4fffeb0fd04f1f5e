//! A small type-keyed dependency-injection container.
//!
//! The container knows two kinds of components:
//!
//! - **Services**, keyed by their type (usually `dyn Trait`) and resolved with
//!   [`Container::resolve`]. Handlers use them as constructor dependencies.
//! - **Handlers**, registered with the capabilities they answer and resolved
//!   in bulk with [`Container::resolve_all`], which is the query
//!   [`ContainerResolver`](crate::ContainerResolver) forwards to.
//!
//! ```rust,ignore
//! let mut builder = ContainerBuilder::new();
//! builder
//!     .register_instance::<dyn Clock>(Arc::new(SystemClock))
//!     .register_handler(
//!         HandlerRegistration::new(|c| Ok(StampOrder::new(c.resolve::<dyn Clock>()?)))
//!             .handles::<OrderPlaced>(),
//!     );
//! let container = builder.build();
//! ```
//!
//! Components are activated once per resolution unless marked
//! [`single_instance`](HandlerRegistration::single_instance). Factories run
//! without any container lock held, so they may resolve other components.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use membus_core::{
    Accepts, CapabilityDescriptor, EventType, Handle, HandleAny, HandlerEntry, HandlerEntryBuilder,
    Handles, ShapeId, short_type_name,
};
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::error::{ContainerError, ContainerResult};
use crate::resolver::ContainerResolver;

/// Type-erased service value. The inner `dyn Any` is an `Arc<T>` for the
/// registered service type `T`.
type ServiceArc = Arc<dyn Any + Send + Sync>;

type ServiceFactory = Arc<dyn Fn(&Container) -> ContainerResult<ServiceArc> + Send + Sync>;

type HandlerFactory = Arc<dyn Fn(&Container) -> ContainerResult<HandlerEntry> + Send + Sync>;

/// How long an activated component lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifetime {
    /// A new instance for every resolution.
    #[default]
    PerResolve,
    /// One instance for the container's lifetime, created on first use.
    Single,
}

/// Caches a component's instance according to its [`Lifetime`].
struct Activator<T: Clone> {
    name: &'static str,
    lifetime: Lifetime,
    cache: Mutex<Option<T>>,
}

impl<T: Clone> Activator<T> {
    fn new(name: &'static str, lifetime: Lifetime) -> Self {
        Self {
            name,
            lifetime,
            cache: Mutex::new(None),
        }
    }

    fn get(&self, build: impl FnOnce() -> ContainerResult<T>) -> ContainerResult<T> {
        if self.lifetime == Lifetime::Single {
            if let Some(cached) = self.cache.lock().clone() {
                return Ok(cached);
            }
        }

        trace!(component = self.name, "Activating component");
        let instance = build().map_err(|e| ContainerError::activation(self.name, e))?;

        if self.lifetime == Lifetime::Single {
            // A concurrent activation may have won; keep the first instance.
            return Ok(self.cache.lock().get_or_insert(instance).clone());
        }
        Ok(instance)
    }
}

struct ServiceComponent {
    factory: ServiceFactory,
    activator: Activator<ServiceArc>,
}

struct HandlerComponent {
    accepts: Vec<(ShapeId, Accepts)>,
    factory: HandlerFactory,
    activator: Activator<HandlerEntry>,
}

impl HandlerComponent {
    fn matches(&self, descriptor: &CapabilityDescriptor) -> bool {
        self.accepts.iter().any(|(shape, accepts)| {
            *shape == descriptor.shape()
                && match accepts {
                    Accepts::Exact(event) => *event == descriptor.event(),
                    Accepts::Any => true,
                }
        })
    }
}

// =============================================================================
// Registrations
// =============================================================================

/// Registration of one handler component.
pub struct HandlerRegistration<H> {
    factory: Arc<dyn Fn(&Container) -> ContainerResult<H> + Send + Sync>,
    binders: Vec<fn(HandlerEntryBuilder<H>) -> HandlerEntryBuilder<H>>,
    accepts: Vec<(ShapeId, Accepts)>,
    lifetime: Lifetime,
}

impl<H: Send + Sync + 'static> HandlerRegistration<H> {
    /// Registers `factory` as the way to build `H`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&Container) -> ContainerResult<H> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            binders: Vec::new(),
            accepts: Vec::new(),
            lifetime: Lifetime::default(),
        }
    }

    /// Exposes `H` as a `Handle<E>`.
    pub fn handles<E: Any>(mut self) -> Self
    where
        H: Handle<E>,
    {
        self.binders.push(bind_handle::<H, E>);
        self.accepts
            .push((ShapeId::of::<Handles>(), Accepts::Exact(EventType::of::<E>())));
        self
    }

    /// Exposes `H` as a catch-all handler.
    pub fn handles_any(mut self) -> Self
    where
        H: HandleAny,
    {
        self.binders.push(bind_handle_any::<H>);
        self.accepts.push((ShapeId::of::<Handles>(), Accepts::Any));
        self
    }

    /// Shares one instance across all resolutions.
    pub fn single_instance(mut self) -> Self {
        self.lifetime = Lifetime::Single;
        self
    }

    fn into_component(self) -> HandlerComponent {
        let name = short_type_name(type_name::<H>());
        let Self {
            factory,
            binders,
            accepts,
            lifetime,
        } = self;

        let factory: HandlerFactory = Arc::new(move |container: &Container| {
            let handler = factory(container)?;
            let builder = binders
                .iter()
                .fold(HandlerEntry::builder(handler), |builder, bind| bind(builder));
            Ok(builder.build())
        });

        HandlerComponent {
            accepts,
            factory,
            activator: Activator::new(name, lifetime),
        }
    }
}

fn bind_handle<H, E>(builder: HandlerEntryBuilder<H>) -> HandlerEntryBuilder<H>
where
    H: Handle<E> + Send + Sync + 'static,
    E: Any,
{
    builder.handles::<E>()
}

fn bind_handle_any<H>(builder: HandlerEntryBuilder<H>) -> HandlerEntryBuilder<H>
where
    H: HandleAny + Send + Sync + 'static,
{
    builder.handles_any()
}

/// A group of registrations applied together.
pub trait Module {
    fn load(&self, builder: &mut ContainerBuilder);
}

// =============================================================================
// ContainerBuilder
// =============================================================================

/// Collects registrations and builds an immutable [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    services: HashMap<TypeId, ServiceComponent>,
    handlers: Vec<HandlerComponent>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for service `T`, activated on every resolution.
    ///
    /// A later registration of the same `T` replaces the earlier one.
    pub fn register_service<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        self.insert_service::<T, F>(factory, Lifetime::PerResolve)
    }

    /// Registers a factory for service `T`, activated once.
    pub fn register_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        self.insert_service::<T, F>(factory, Lifetime::Single)
    }

    /// Registers an existing instance as service `T`.
    pub fn register_instance<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert_service::<T, _>(move |_| Ok(Arc::clone(&instance)), Lifetime::Single)
    }

    /// Registers a handler component. Handlers are resolved in registration
    /// order.
    pub fn register_handler<H: Send + Sync + 'static>(
        &mut self,
        registration: HandlerRegistration<H>,
    ) -> &mut Self {
        debug!(handler = short_type_name(type_name::<H>()), "Registering handler");
        self.handlers.push(registration.into_component());
        self
    }

    /// Applies every registration of `module`.
    pub fn register_module(&mut self, module: &impl Module) -> &mut Self {
        module.load(self);
        self
    }

    pub fn build(self) -> Container {
        info!(
            services = self.services.len(),
            handlers = self.handlers.len(),
            "Container built"
        );
        Container {
            inner: Arc::new(ContainerInner {
                services: self.services,
                handlers: self.handlers,
            }),
        }
    }

    fn insert_service<T, F>(&mut self, factory: F, lifetime: Lifetime) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        let name = short_type_name(type_name::<T>());
        let factory: ServiceFactory = Arc::new(move |container: &Container| {
            factory(container).map(|service| Arc::new(service) as ServiceArc)
        });
        let component = ServiceComponent {
            factory,
            activator: Activator::new(name, lifetime),
        };

        if self.services.insert(TypeId::of::<T>(), component).is_some() {
            debug!(service = name, "Service registration replaced");
        }
        self
    }
}

// =============================================================================
// Container
// =============================================================================

struct ContainerInner {
    services: HashMap<TypeId, ServiceComponent>,
    handlers: Vec<HandlerComponent>,
}

/// An immutable set of registrations. Cloning shares the registrations and
/// any single-instance components already activated.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Resolves service `T`.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> ContainerResult<Arc<T>> {
        let name = short_type_name(type_name::<T>());
        let component = self
            .inner
            .services
            .get(&TypeId::of::<T>())
            .ok_or(ContainerError::NotRegistered(name))?;

        let service = component.activator.get(|| (component.factory)(self))?;
        service
            .downcast_ref::<Arc<T>>()
            .map(Arc::clone)
            .ok_or(ContainerError::NotRegistered(name))
    }

    /// Returns `true` if service `T` has a registration.
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.inner.services.contains_key(&TypeId::of::<T>())
    }

    /// Activates every handler component answering `descriptor`, in
    /// registration order. Components that do not match are not activated.
    pub fn resolve_all(
        &self,
        descriptor: &CapabilityDescriptor,
    ) -> ContainerResult<Vec<HandlerEntry>> {
        self.inner
            .handlers
            .iter()
            .filter(|component| component.matches(descriptor))
            .map(|component| component.activator.get(|| (component.factory)(self)))
            .collect()
    }

    /// Number of registered handler components.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }

    /// A handler resolver backed by this container.
    pub fn resolver(&self) -> ContainerResolver {
        ContainerResolver::new(self.clone())
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.inner.services.len())
            .field("handlers", &self.inner.handlers.len())
            .finish()
    }
}
