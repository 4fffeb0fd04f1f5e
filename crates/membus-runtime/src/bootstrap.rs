//! Turning a [`MembusConfig`] into a ready-to-finish [`BusSetup`].
//!
//! ```rust,ignore
//! use membus_runtime::bootstrap;
//!
//! let (config, setup) = bootstrap::load_setup()?;
//! let bus = setup
//!     .apply::<IocSupport>(|s| {
//!         s.set_resolver(container.resolver()).set_handler_shape(Handles);
//!     })
//!     .construct()?;
//! ```
//!
//! Configuration never names handlers or resolvers. The returned setup
//! still needs [`IocSupport`](membus_core::IocSupport) applied in code.

use membus_core::{BusSetup, Conservative};
use tracing::info;

use crate::config::{ConfigLoader, ConfigResult, MembusConfig, StrategyName, validate_config};
use crate::logging;

/// Validates `config`, initializes logging from it and starts a setup on
/// the configured strategy.
pub fn setup_from_config(config: &MembusConfig) -> ConfigResult<BusSetup> {
    validate_config(config)?;
    logging::init_from_config(&config.logging);

    info!(strategy = %config.dispatch.strategy, "Starting bus setup");
    Ok(start_with(config.dispatch.strategy))
}

/// Loads configuration from the default locations, then calls
/// [`setup_from_config`].
pub fn load_setup() -> ConfigResult<(MembusConfig, BusSetup)> {
    let config = ConfigLoader::new().load()?;
    let setup = setup_from_config(&config)?;
    Ok((config, setup))
}

fn start_with(strategy: StrategyName) -> BusSetup {
    match strategy {
        StrategyName::Conservative => BusSetup::start_with::<Conservative>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, LogOutput};
    use membus_core::{Handles, IocSupport, SetupError, StaticResolver};

    #[test]
    fn test_setup_from_default_config() {
        let bus = setup_from_config(&MembusConfig::default())
            .unwrap()
            .apply::<IocSupport>(|s| {
                s.set_resolver(StaticResolver::new())
                    .set_handler_shape(Handles);
            })
            .construct()
            .unwrap();

        assert_eq!(bus.strategy_name(), "conservative");
    }

    #[test]
    fn test_setup_still_needs_resolver() {
        let setup = setup_from_config(&MembusConfig::default()).unwrap();
        assert!(matches!(
            setup.construct(),
            Err(SetupError::MissingSetting { .. })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = MembusConfig::default();
        config.logging.output = LogOutput::File;

        assert!(matches!(
            setup_from_config(&config),
            Err(ConfigError::MissingField { .. })
        ));
    }
}
