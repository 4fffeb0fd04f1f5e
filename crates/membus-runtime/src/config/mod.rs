//! Configuration for Membus applications.
//!
//! Configuration covers the ambient parts of a bus: how logging is set up
//! and which dispatch strategy a setup starts from. Handlers and resolvers
//! are always wired in code.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DispatchConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, MembusConfig, SpanEventConfig,
    StrategyName,
};
pub use validation::validate_config;
