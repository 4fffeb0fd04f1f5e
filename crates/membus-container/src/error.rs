//! Container error types.

use thiserror::Error;

/// Errors raised while resolving from a [`Container`](crate::Container).
#[derive(Error, Debug)]
pub enum ContainerError {
    /// Nothing was registered for the requested service type.
    #[error("no registration for service `{0}`")]
    NotRegistered(&'static str),

    /// A component's factory failed.
    #[error("failed to activate `{component}`")]
    Activation {
        /// The component being built.
        component: &'static str,
        /// Why its factory failed.
        #[source]
        source: Box<ContainerError>,
    },

    /// A factory reported its own failure.
    #[error("{0}")]
    Custom(String),
}

impl ContainerError {
    /// Creates a custom error, for use inside factories.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    pub(crate) fn activation(component: &'static str, source: ContainerError) -> Self {
        Self::Activation {
            component,
            source: Box::new(source),
        }
    }
}

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;
