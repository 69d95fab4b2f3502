use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "LEDGER_";
pub const DEFAULT_FILE_NAME: &str = "ledger.yaml";

/// A layer in the configuration stack; later layers override earlier ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// YAML or TOML file, chosen by extension. Missing files contribute nothing.
    File(PathBuf),
    /// Inline YAML document
    Yaml(String),
    /// Environment variables with the given prefix, `__` separating nested keys
    Env { prefix: String },
}

impl ConfigSource {
    pub fn file(path: impl AsRef<Path>) -> Self {
        ConfigSource::File(path.as_ref().to_path_buf())
    }

    pub fn yaml(document: impl Into<String>) -> Self {
        ConfigSource::Yaml(document.into())
    }

    pub fn env() -> Self {
        ConfigSource::Env {
            prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn is_toml(path: &Path) -> bool {
        path.extension().and_then(|ext| ext.to_str()) == Some("toml")
    }
}

/// Per-user configuration file, e.g. `~/.config/ledger-engine/ledger.yaml` on Linux
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "ledger", "ledger-engine")
        .map(|dirs| dirs.config_dir().join(DEFAULT_FILE_NAME))
}
