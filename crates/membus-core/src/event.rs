//! Event identity for the Membus dispatcher.
//!
//! Membus places no requirement on event types: any `'static` value can be
//! published. What the dispatcher needs is a routing key derived from the
//! value's concrete type, which is what [`EventType`] provides, and a way to
//! hand a borrowed, type-erased value to handlers, which is [`EventRef`].
//!
//! ```rust,ignore
//! struct OrderPlaced { id: u64 }
//!
//! let event = OrderPlaced { id: 7 };
//! let erased = EventRef::new(&event);
//!
//! assert!(erased.is::<OrderPlaced>());
//! assert_eq!(erased.downcast_ref::<OrderPlaced>().map(|e| e.id), Some(7));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable routing key for a concrete event type.
///
/// Two `EventType`s are equal when they describe the same Rust type; the
/// name is carried only for logs and error messages.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Returns the routing key of `E`.
    pub fn of<E: Any>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// The underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without its module path, e.g. `OrderPlaced`.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A borrowed, type-erased event travelling through one publish call.
///
/// `EventRef` is `Copy`, so strategies can hand the same event to every
/// resolved handler without cloning the payload.
#[derive(Clone, Copy)]
pub struct EventRef<'a> {
    value: &'a dyn Any,
    event_type: EventType,
}

impl<'a> EventRef<'a> {
    /// Erases a concrete event.
    pub fn new<E: Any>(event: &'a E) -> Self {
        Self {
            value: event,
            event_type: EventType::of::<E>(),
        }
    }

    /// The runtime type of the wrapped event.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Returns `true` if the wrapped event is an `E`.
    pub fn is<E: Any>(&self) -> bool {
        self.value.is::<E>()
    }

    /// Attempts to view the wrapped event as an `E`.
    pub fn downcast_ref<E: Any>(&self) -> Option<&'a E> {
        self.value.downcast_ref()
    }

    /// The wrapped event as `&dyn Any`.
    pub fn as_any(&self) -> &'a dyn Any {
        self.value
    }
}

impl fmt::Debug for EventRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRef")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// Strips module paths from a type name, keeping generic arguments readable.
///
/// `my_app::events::OrderPlaced` becomes `OrderPlaced`. Names containing
/// generics are returned unchanged past their first `<`.
pub fn short_type_name(name: &'static str) -> &'static str {
    let head = name.split('<').next().unwrap_or(name);
    match head.rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}
