//! Diagnostic identifiers
//!
//! Each SDK instance gets a random id plus a short, non-identifying SDK key
//! suffix so service-side diagnostics can be correlated per environment.

use serde::Serialize;
use uuid::Uuid;

/// Identifies one SDK instance in diagnostic payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticId {
    diagnostic_id: Uuid,
    sdk_key_suffix: String,
}

impl DiagnosticId {
    /// New random id. Only the last six characters of the SDK key are kept.
    pub fn new(sdk_key: &str) -> Self {
        let cut = sdk_key
            .char_indices()
            .rev()
            .nth(5)
            .map(|(i, _)| i)
            .unwrap_or(0);
        Self {
            diagnostic_id: Uuid::new_v4(),
            sdk_key_suffix: sdk_key[cut..].to_string(),
        }
    }

    pub fn sdk_key_suffix(&self) -> &str {
        &self.sdk_key_suffix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_is_last_six_chars() {
        let id = DiagnosticId::new("sdk-0123456789abcdef");
        assert_eq!(id.sdk_key_suffix(), "abcdef");
    }

    #[test]
    fn test_short_key_keeps_whole_key() {
        let id = DiagnosticId::new("abc");
        assert_eq!(id.sdk_key_suffix(), "abc");
    }

    #[test]
    fn test_ids_are_unique_per_instance() {
        let a = DiagnosticId::new("sdk-key");
        let b = DiagnosticId::new("sdk-key");
        assert_ne!(a, b);
    }

    #[test]
    fn test_serialized_field_names() {
        let id = DiagnosticId::new("sdk-key");
        let value = serde_json::to_value(&id).unwrap();
        assert!(value.get("diagnosticId").is_some());
        assert_eq!(value["sdkKeySuffix"], "dk-key");
    }
}
