use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Structured issue recorded during generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// A cycle/recursion truncation attached to an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationRecord {
    /// Dotted path where the decision fired.
    pub path: String,
    /// Which cycle policy fired (`reuse`, `stub`, `null`).
    pub policy: String,
    /// What triggered it (`cycle`, `depth`, `budget`).
    pub trigger: String,
}

/// Audit metadata for one generated instance.
///
/// Downstream explain/audit tooling consumes this to report which
/// provider and policy produced each field and where recursion was
/// truncated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationAudit {
    /// Provider invocations by provider name.
    pub provider_usage: BTreeMap<String, u64>,
    /// Policy decisions by label (e.g. `union.random`, `p_none`,
    /// `default`, `enum.first`).
    pub policy_usage: BTreeMap<String, u64>,
    /// Chosen provider per field path, in the order fields were
    /// generated.
    pub field_providers: Vec<(String, String)>,
    pub fallback_count: u64,
    pub truncations: Vec<TruncationRecord>,
    pub warnings: Vec<GenerationIssue>,
}

impl GenerationAudit {
    pub fn record_provider(&mut self, path: &str, name: &str) {
        *self.provider_usage.entry(name.to_string()).or_insert(0) += 1;
        self.field_providers
            .push((path.to_string(), name.to_string()));
    }

    pub fn record_policy(&mut self, label: &str) {
        *self.policy_usage.entry(label.to_string()).or_insert(0) += 1;
    }

    pub fn record_fallback(&mut self) {
        self.fallback_count += 1;
    }

    pub fn record_truncation(&mut self, record: TruncationRecord) {
        self.truncations.push(record);
    }

    pub fn record_warning(&mut self, code: &str, message: String, path: Option<&str>) {
        warn!(code, path = path.unwrap_or(""), message = %message);
        self.warnings.push(GenerationIssue {
            level: "warning".to_string(),
            code: code.to_string(),
            message,
            path: path.map(|value| value.to_string()),
        });
    }
}
