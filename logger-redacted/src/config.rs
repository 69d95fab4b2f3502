// Logger configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Default filter directive when `RUST_LOG` is not set
    pub log_level: String,
    /// Emit bunyan-style JSON instead of the human formatter
    pub json: bool,
    /// Name reported in JSON log lines
    pub service_name: String,
    /// Redact tax ids, e-mails and phone numbers in counterparty labels
    pub redaction_enabled: bool,
    /// Replace redacted values with a short hash instead of a mask
    pub hash_for_correlation: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            service_name: "ledger-engine".to_string(),
            redaction_enabled: true,
            hash_for_correlation: true,
        }
    }
}
