//! # Membus Runtime
//!
//! The ambient layer around a Membus bus:
//!
//! - [`config`]: figment-based configuration (`membus.toml`, `MEMBUS_*`)
//! - [`logging`]: `tracing-subscriber` setup driven by that configuration
//! - [`bootstrap`]: starts a [`BusSetup`](membus_core::BusSetup) from it
//!
//! ```rust,ignore
//! use membus_runtime::bootstrap;
//!
//! let (_config, setup) = bootstrap::load_setup()?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod logging;

pub use bootstrap::{load_setup, setup_from_config};
pub use config::{ConfigError, ConfigLoader, ConfigResult, MembusConfig};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by applications
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for applications.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
