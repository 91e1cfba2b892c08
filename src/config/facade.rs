//! Public entry point for loading [`ProvokeConfig`](super::ProvokeConfig).

use super::merge::merge_policy;
use super::sources::{environment, explicit_file, global_file};
use super::ProvokeConfig;
use crate::error::ApiError;
use std::path::{Path, PathBuf};

/// Loads and validates configuration from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, then `PROVOKE__*` environment overrides.
    pub fn load() -> Result<ProvokeConfig, ApiError> {
        Self::load_with(None)
    }

    /// Like [`ConfigLoader::load`], with an explicit file layered between the
    /// global file and the environment. The explicit file must exist.
    pub fn load_with(explicit: Option<&Path>) -> Result<ProvokeConfig, ApiError> {
        Self::validated(Self::load_unvalidated(explicit)?)
    }

    /// The layered configuration before validation, for hosts that apply their
    /// own overrides first and then call [`ConfigLoader::validated`].
    pub fn load_unvalidated(explicit: Option<&Path>) -> Result<ProvokeConfig, ApiError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        builder = global_file::add_to_builder(builder)?;
        if let Some(path) = explicit {
            builder = explicit_file::add_to_builder(builder, path)?;
        }
        builder = environment::add_to_builder(builder)?;

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Defaults plus a single file; ignores the global file and environment.
    pub fn load_from_file(path: &Path) -> Result<ProvokeConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = explicit_file::add_to_builder(builder, path)?;

        let config: ProvokeConfig = builder.build()?.try_deserialize()?;
        Self::validated(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Checks `config`, joining every validation failure into one error.
    pub fn validated(config: ProvokeConfig) -> Result<ProvokeConfig, ApiError> {
        config.validate().map_err(|errors| {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            ApiError::ConfigError(format!("Invalid configuration: {}", joined))
        })?;
        Ok(config)
    }
}
