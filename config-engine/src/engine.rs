use figment::{
    providers::{Env, Format, Serialized, Toml, Yaml},
    Figment,
};
use tracing::debug;

use crate::error::Result;
use crate::providers::ConfigSource;
use crate::schema::LedgerConfig;
use crate::validation::validate;

/// Builder that stacks configuration sources over the built-in defaults
#[derive(Debug, Clone, Default)]
pub struct ConfigEngine {
    sources: Vec<ConfigSource>,
}

impl ConfigEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Defaults, then the given file (if any), then `LEDGER_*` environment variables
    pub fn standard(file: Option<std::path::PathBuf>) -> Self {
        let engine = Self::new();
        let engine = match file.or_else(crate::providers::default_config_path) {
            Some(path) => engine.add_source(ConfigSource::File(path)),
            None => engine,
        };
        engine.add_source(ConfigSource::env())
    }

    fn figment(&self) -> Figment {
        self.sources.iter().fold(
            Figment::from(Serialized::defaults(LedgerConfig::default())),
            |figment, source| match source {
                ConfigSource::File(path) if ConfigSource::is_toml(path) => {
                    figment.merge(Toml::file(path))
                }
                ConfigSource::File(path) => figment.merge(Yaml::file(path)),
                ConfigSource::Yaml(document) => figment.merge(Yaml::string(document)),
                ConfigSource::Env { prefix } => {
                    figment.merge(Env::prefixed(prefix).split("__"))
                }
            },
        )
    }

    /// Extract and validate the effective configuration
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::ParseError`] when a source is malformed and
    /// [`crate::ConfigError::ValidationError`] when the merged values are unusable.
    pub fn load(&self) -> Result<LedgerConfig> {
        let config: LedgerConfig = self.figment().extract()?;
        validate(&config)?;
        debug!(sources = self.sources.len(), "configuration loaded");
        Ok(config)
    }
}
