use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Diagnostic context attached to an error report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_code: Option<String>,
    /// Signed difference in minor currency units, when one was computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub additional: BTreeMap<String, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry_id(mut self, entry_id: impl ToString) -> Self {
        self.entry_id = Some(entry_id.to_string());
        self
    }

    pub fn with_account_code(mut self, account_code: impl Into<String>) -> Self {
        self.account_code = Some(account_code.into());
        self
    }

    pub fn with_delta(mut self, delta: i64) -> Self {
        self.delta = Some(delta);
        self
    }

    pub fn add_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entry_id.is_none()
            && self.account_code.is_none()
            && self.delta.is_none()
            && self.additional.is_empty()
    }
}
