use crate::error::{ConfigError, Result};
use crate::schema::LedgerConfig;

/// Reject configurations the engine cannot run with
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] naming the first offending setting.
pub fn validate(config: &LedgerConfig) -> Result<()> {
    if config.server.port == 0 {
        return Err(invalid("server.port must be non-zero"));
    }

    if config.database.max_connections == 0 {
        return Err(invalid("database.max_connections must be at least 1"));
    }

    let obligations = &config.obligations;
    check_prefixes("obligations.payables_prefixes", &obligations.payables_prefixes)?;
    check_prefixes("obligations.receivables_prefixes", &obligations.receivables_prefixes)?;

    for payable in &obligations.payables_prefixes {
        for receivable in &obligations.receivables_prefixes {
            if nests(payable, receivable) || nests(receivable, payable) {
                return Err(invalid(format!(
                    "payables prefix `{payable}` overlaps receivables prefix `{receivable}`"
                )));
            }
        }
    }

    let buckets = &config.aging.bucket_days;
    if buckets.is_empty() {
        return Err(invalid("aging.bucket_days must list at least one bound"));
    }
    if buckets.first() == Some(&0) || buckets.windows(2).any(|w| w.first() >= w.get(1)) {
        return Err(invalid("aging.bucket_days must be positive and strictly increasing"));
    }

    if config.cache.enabled && config.cache.max_entries == 0 {
        return Err(invalid("cache.max_entries must be at least 1 when the cache is enabled"));
    }

    Ok(())
}

fn check_prefixes(field: &str, prefixes: &[String]) -> Result<()> {
    if prefixes.is_empty() {
        return Err(invalid(format!("{field} must list at least one account code")));
    }
    for prefix in prefixes {
        let well_formed = !prefix.is_empty()
            && prefix
                .split('.')
                .all(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric()));
        if !well_formed {
            return Err(invalid(format!("{field} contains malformed account code `{prefix}`")));
        }
    }
    Ok(())
}

/// True when `inner` equals `outer` or sits below it in the dotted hierarchy
fn nests(outer: &str, inner: &str) -> bool {
    inner == outer
        || inner
            .strip_prefix(outer)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&LedgerConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_malformed_prefix() {
        let mut config = LedgerConfig::default();
        config.obligations.payables_prefixes = vec!["2..1".to_string()];
        assert!(matches!(validate(&config), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_overlapping_control_prefixes() {
        let mut config = LedgerConfig::default();
        config.obligations.payables_prefixes = vec!["1.1".to_string()];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("overlaps"));
    }

    #[test]
    fn test_sibling_prefixes_do_not_overlap() {
        assert!(!nests("1.1.3", "1.1.30"));
        assert!(nests("1.1", "1.1.3"));
    }

    #[test]
    fn test_rejects_unsorted_buckets() {
        let mut config = LedgerConfig::default();
        config.aging.bucket_days = vec![30, 30, 90];
        assert!(validate(&config).is_err());
        config.aging.bucket_days = vec![0, 30];
        assert!(validate(&config).is_err());
    }
}
