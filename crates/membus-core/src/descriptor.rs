//! Capability descriptors.
//!
//! A resolver is never asked for "handlers of `OrderPlaced`" directly. It is
//! asked for a [`CapabilityDescriptor`]: the handler *shape* specialized to
//! the published event type, e.g. `Handle<OrderPlaced>`. Keeping the shape
//! separate from the event type lets a resolver sit in front of any
//! registration mechanism, and lets an application route through its own
//! handler shape instead of [`Handle`](crate::Handle).
//!
//! The shape is pluggable through the [`HandlerShape`] trait and is
//! configured on the bus via
//! [`IocSettings::set_handler_shape`](crate::IocSettings::set_handler_shape).

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::event::{EventType, short_type_name};

/// Identifies a handler shape, independent of any event type.
#[derive(Clone, Copy)]
pub struct ShapeId {
    id: TypeId,
    name: &'static str,
}

impl ShapeId {
    /// The id of shape `S`.
    pub fn of<S: Any>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: short_type_name(std::any::type_name::<S>()),
        }
    }

    /// The shape's type name without module path.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ShapeId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ShapeId {}

impl Hash for ShapeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShapeId").field(&self.name).finish()
    }
}

/// Builds capability descriptors from event types.
///
/// Implementors only need to exist; the default methods derive everything
/// from the implementing type. Override [`label`](HandlerShape::label) to
/// change how descriptors print.
pub trait HandlerShape: Any + Send + Sync {
    /// Identifier shared by every descriptor this shape produces.
    fn shape_id(&self) -> ShapeId {
        ShapeId {
            id: TypeId::of::<Self>(),
            name: short_type_name(std::any::type_name::<Self>()),
        }
    }

    /// Human-readable generic name, e.g. `Handle`.
    fn label(&self) -> &'static str {
        self.shape_id().name()
    }

    /// The descriptor for handlers of `event` under this shape.
    fn describe(&self, event: EventType) -> CapabilityDescriptor {
        CapabilityDescriptor {
            shape: self.shape_id(),
            label: self.label(),
            event,
        }
    }
}

/// The default shape: handlers implementing [`Handle<E>`](crate::Handle)
/// or [`HandleAny`](crate::HandleAny).
#[derive(Debug, Clone, Copy, Default)]
pub struct Handles;

impl HandlerShape for Handles {
    fn label(&self) -> &'static str {
        "Handle"
    }
}

/// "The `shape` capability specialized to `event`", e.g. `Handle<OrderPlaced>`.
#[derive(Clone, Copy)]
pub struct CapabilityDescriptor {
    shape: ShapeId,
    label: &'static str,
    event: EventType,
}

impl CapabilityDescriptor {
    /// Describes `E` under shape `S` without a shape instance.
    pub fn of<S: HandlerShape + Default, E: Any>() -> Self {
        S::default().describe(EventType::of::<E>())
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    pub fn event(&self) -> EventType {
        self.event
    }
}

impl PartialEq for CapabilityDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.event == other.event
    }
}

impl Eq for CapabilityDescriptor {}

impl Hash for CapabilityDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shape.hash(state);
        self.event.hash(state);
    }
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("shape", &self.shape)
            .field("event", &self.event)
            .finish()
    }
}

impl fmt::Display for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.label, self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OrderPlaced;
    struct OrderShipped;

    #[derive(Default)]
    struct Reacts;

    impl HandlerShape for Reacts {}

    #[test]
    fn test_default_shape_describes_handle() {
        let descriptor = Handles.describe(EventType::of::<OrderPlaced>());
        assert_eq!(descriptor.to_string(), "Handle<OrderPlaced>");
        assert_eq!(descriptor.shape(), ShapeId::of::<Handles>());
        assert_eq!(descriptor.event(), EventType::of::<OrderPlaced>());
    }

    #[test]
    fn test_descriptors_differ_by_shape_and_event() {
        let a = CapabilityDescriptor::of::<Handles, OrderPlaced>();
        let b = CapabilityDescriptor::of::<Handles, OrderShipped>();
        let c = CapabilityDescriptor::of::<Reacts, OrderPlaced>();

        assert_eq!(a, CapabilityDescriptor::of::<Handles, OrderPlaced>());
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_custom_shape_label_defaults_to_type_name() {
        let descriptor = Reacts.describe(EventType::of::<OrderShipped>());
        assert_eq!(descriptor.to_string(), "Reacts<OrderShipped>");
    }
}
