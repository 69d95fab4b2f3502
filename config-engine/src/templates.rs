use crate::error::{ConfigError, Result};
use crate::schema::LedgerConfig;

/// Render a configuration as YAML, e.g. to seed a `ledger.yaml`
///
/// # Errors
///
/// Returns [`ConfigError::TemplateError`] if serialization fails.
pub fn render_yaml(config: &LedgerConfig) -> Result<String> {
    serde_yaml::to_string(config).map_err(|e| ConfigError::TemplateError(e.to_string()))
}
