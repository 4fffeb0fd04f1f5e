//! Error types for the Membus core.
//!
//! Every failure is reported synchronously to the caller that triggered it:
//! setup errors come out of [`BusSetup::construct`](crate::BusSetup::construct),
//! resolution and handler errors come out of [`Bus::publish`](crate::Bus::publish).
//! There is no background error channel.

use thiserror::Error;

// =============================================================================
// Setup Errors
// =============================================================================

/// Errors raised while assembling a bus.
#[derive(Debug, Clone, Error)]
pub enum SetupError {
    /// A required setting was never installed by any extension.
    #[error("required setting `{setting}` is not configured (apply {extension} to set it)")]
    MissingSetting {
        /// The missing setting key.
        setting: &'static str,
        /// The extension that provides it.
        extension: &'static str,
    },
}

// =============================================================================
// Resolution Errors
// =============================================================================

/// Errors raised by a [`HandlerResolver`](crate::HandlerResolver).
///
/// Resolvers never fail for a descriptor they know nothing about; they
/// return an empty list. An error means the lookup mechanism itself broke.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The resolver's backing store failed to produce handlers.
    #[error("resolver failed to look up {capability}")]
    Backend {
        /// Display form of the requested capability.
        capability: String,
        /// The backend failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ResolveError {
    /// Wraps a backend failure for `capability`.
    pub fn backend(
        capability: impl ToString,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Backend {
            capability: capability.to_string(),
            source: source.into(),
        }
    }
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors surfaced by [`Bus::publish`](crate::Bus::publish).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Handler resolution failed; no handler of this publish ran.
    #[error("could not resolve handlers for {event}")]
    Resolution {
        /// The published event type.
        event: &'static str,
        #[source]
        source: ResolveError,
    },

    /// A handler failed; the handlers after it in this publish were skipped.
    #[error("handler `{handler}` failed on {event}")]
    Handler {
        /// The failing handler type.
        handler: &'static str,
        /// The published event type.
        event: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Published through a [`WeakBus`](crate::WeakBus) after the bus was dropped.
    #[error("the bus has been dropped")]
    BusDropped,
}

impl DispatchError {
    /// Returns `true` if this error, or any nested publish it wraps, failed
    /// during resolution.
    pub fn is_resolution(&self) -> bool {
        match self {
            Self::Resolution { .. } => true,
            Self::Handler { source, .. } => source
                .downcast_ref::<DispatchError>()
                .is_some_and(DispatchError::is_resolution),
            Self::BusDropped => false,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for bus construction.
pub type SetupResult<T> = Result<T, SetupError>;

/// Result type for handler lookups.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result type for publishing.
pub type DispatchResult<T> = Result<T, DispatchError>;
