//! Settings loading from a TOML file and `TENANTDB__*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use tracing::debug;

use crate::ConfigError;
use crate::settings::Settings;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tenantdb.toml";

/// Prefix for environment overrides, e.g. `TENANTDB__RETRY__MAX_RETRY_WAIT_TIME_SECS=10`.
pub const ENV_PREFIX: &str = "TENANTDB";

pub fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();
    let file = match path {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(DEFAULT_CONFIG_FILE),
    };
    if file.exists() {
        debug!(path = %file.display(), "Loading settings file");
        builder = builder.add_source(File::from(file));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__"),
    );
    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

pub fn load_settings_from_path<P: AsRef<Path>>(path: Option<P>) -> Result<Settings, ConfigError> {
    let p = path
        .as_ref()
        .map(|p| p.as_ref().to_string_lossy().to_string());
    load_settings(p.as_deref())
}
