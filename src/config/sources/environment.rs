//! Environment overrides: `PROVOKE__<SECTION>__<KEY>`, e.g. `PROVOKE__BACKEND__MODEL`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const ENV_PREFIX: &str = "PROVOKE";

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
