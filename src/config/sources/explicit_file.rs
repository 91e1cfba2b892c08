//! Config file named by the host, e.g. via `--config`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::{File, FileFormat};
use std::path::Path;

/// Add the file as a required TOML source; a missing file fails the build.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(true)))
}
