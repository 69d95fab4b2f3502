use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub obligations: ObligationSettings,
    pub aging: AgingSettings,
    pub cache: CacheSettings,
    pub logging: LoggerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Postgres connection string; the in-memory store is used when absent
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

/// Control-account prefixes scanned by the obligations deriver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObligationSettings {
    pub payables_prefixes: Vec<String>,
    pub receivables_prefixes: Vec<String>,
}

impl Default for ObligationSettings {
    fn default() -> Self {
        Self {
            payables_prefixes: vec!["2.1".to_string()],
            receivables_prefixes: vec!["1.1.3".to_string()],
        }
    }
}

/// Upper bounds (inclusive, in days) of the aging buckets; one overflow bucket follows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingSettings {
    pub bucket_days: Vec<u32>,
}

impl Default for AgingSettings {
    fn default() -> Self {
        Self {
            bucket_days: vec![30, 60, 90],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_entries: 10_000,
        }
    }
}
