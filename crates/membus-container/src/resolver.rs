//! The [`HandlerResolver`] adapter over a [`Container`].

use membus_core::{
    CapabilityDescriptor, HandlerResolver, ResolveError, ResolveResult, ResolvedHandler,
};
use tracing::trace;

use crate::container::Container;

/// Resolves handlers by asking a [`Container`] for every component that
/// answers the requested capability.
///
/// Components are activated per lookup according to their lifetime, so a
/// per-resolve handler is a fresh instance on every publish. Activation
/// failures surface as [`ResolveError::Backend`] and no handler of that
/// publish runs.
#[derive(Debug, Clone)]
pub struct ContainerResolver {
    container: Container,
}

impl ContainerResolver {
    pub fn new(container: Container) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }
}

impl HandlerResolver for ContainerResolver {
    fn get_all(&self, descriptor: &CapabilityDescriptor) -> ResolveResult<Vec<ResolvedHandler>> {
        let entries = self
            .container
            .resolve_all(descriptor)
            .map_err(|e| ResolveError::backend(descriptor, e))?;

        trace!(capability = %descriptor, components = entries.len(), "Resolved from container");
        Ok(entries
            .iter()
            .filter_map(|entry| entry.resolve(descriptor))
            .collect())
    }
}
