use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::config::LoggerConfig;

#[allow(clippy::unwrap_used)]
mod patterns {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        pub static ref CNPJ_REGEX: Regex =
            Regex::new(r"\b\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}\b|\b\d{14}\b").unwrap();
        pub static ref CPF_REGEX: Regex =
            Regex::new(r"\b\d{3}\.\d{3}\.\d{3}-\d{2}\b|\b\d{11}\b").unwrap();
        pub static ref EMAIL_REGEX: Regex =
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
        pub static ref PHONE_REGEX: Regex =
            Regex::new(r"(?:\+55\s?)?\(?\b\d{2}\)?\s?9?\d{4}-\d{4}\b").unwrap();
    }
}

use patterns::{CNPJ_REGEX, CPF_REGEX, EMAIL_REGEX, PHONE_REGEX};

/// Which identifier families get redacted
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub enabled: bool,
    pub redact_cnpj: bool,
    pub redact_cpf: bool,
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_cnpj: true,
            redact_cpf: true,
            redact_emails: true,
            redact_phones: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

impl From<&LoggerConfig> for RedactionConfig {
    fn from(config: &LoggerConfig) -> Self {
        Self {
            enabled: config.redaction_enabled,
            hash_for_correlation: config.hash_for_correlation,
            ..Self::default()
        }
    }
}

/// Redactor for counterparty labels before they reach a log line
#[derive(Debug, Clone, Default)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn from_logger_config(config: &LoggerConfig) -> Self {
        Self::new(RedactionConfig::from(config))
    }

    /// A redactor that passes text through untouched
    pub fn disabled() -> Self {
        Self::new(RedactionConfig {
            enabled: false,
            ..RedactionConfig::default()
        })
    }

    pub fn redact(&self, text: &str) -> String {
        if !self.config.enabled {
            return text.to_string();
        }

        let mut result = text.to_string();

        // CNPJ before CPF: the bare 14-digit form contains an 11-digit run
        if self.config.redact_cnpj {
            result = self.replace(&CNPJ_REGEX, &result, "CNPJ", "**.***.***/****-**");
        }

        if self.config.redact_cpf {
            result = self.replace(&CPF_REGEX, &result, "CPF", "***.***.***-**");
        }

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        if self.config.redact_phones {
            result = self.replace(&PHONE_REGEX, &result, "PHONE", "(**) *****-****");
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    fn replace(&self, pattern: &Regex, text: &str, tag: &str, mask: &str) -> String {
        pattern
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("{}[{}]", tag, self.hash_value(&caps[0]))
                } else {
                    mask.to_string()
                }
            })
            .to_string()
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let email = &caps[0];
                if self.config.hash_for_correlation {
                    format!("EMAIL[{}]", self.hash_value(email))
                } else {
                    match email.split_once('@') {
                        Some((user, domain)) => format!(
                            "{}***@{}***",
                            user.chars().next().unwrap_or('*'),
                            domain.chars().next().unwrap_or('*')
                        ),
                        None => "***@***".to_string(),
                    }
                }
            })
            .to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let digest = Sha256::digest(value.as_bytes());
        // First 8 bytes keep the tag short while staying stable across runs
        general_purpose::STANDARD.encode(digest.get(..8).unwrap_or_default())
    }
}
