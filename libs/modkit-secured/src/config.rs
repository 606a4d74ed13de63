//! Configuration for the security extension.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Key of the extension's section in the application configuration.
pub const CONFIG_KEY: &str = "security";

/// Prefix of environment variable overrides, e.g. `MODKIT_SECURITY_ENABLED=false`.
pub const ENV_PREFIX: &str = "MODKIT_SECURITY_";

/// Configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityExtensionConfig {
    /// Deactivation gate. When `false`, discovery and validation do nothing.
    pub enabled: bool,
}

impl Default for SecurityExtensionConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SecurityExtensionConfig {
    /// Extracts the `security` section from an already assembled figment.
    /// A missing section yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the section is malformed or carries unknown fields.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        if !figment.contains(CONFIG_KEY) {
            return Ok(Self::default());
        }
        Ok(figment.extract_inner(CONFIG_KEY)?)
    }

    /// Loads defaults, then the `security` section of `path`, then
    /// `MODKIT_SECURITY_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be parsed or values are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let from_file = Self::from_figment(&Figment::from(Yaml::file(path)))?;
        let figment =
            Figment::from(Serialized::defaults(from_file)).merge(Env::prefixed(ENV_PREFIX));
        Ok(figment.extract()?)
    }
}
