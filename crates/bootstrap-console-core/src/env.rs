use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fields;
use crate::form::{FormState, json_is_true, json_to_text};

/// Server-provided defaults, fetched once per session from `/get_env`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvSnapshot {
    values: BTreeMap<String, Value>,
}

impl EnvSnapshot {
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// String form of a default; numbers and booleans are stringified.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        self.values.get(key).map(json_to_text)
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(json_is_true)
    }

    /// Whether automation tasks run from a local checkout, which exposes the
    /// kubeconfig, clean-report and headless controls. Only the string
    /// `"true"` switches it on.
    #[must_use]
    pub fn local_source_mode(&self) -> bool {
        self.values
            .get(fields::TP_AUTO_TASK_FROM_LOCAL_SOURCE)
            .and_then(Value::as_str)
            == Some("true")
    }

    #[must_use]
    pub fn as_map(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn hydrate(&self, form: &mut FormState) -> usize {
        form.hydrate(&self.as_map())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mixed_value_types() {
        let snapshot: EnvSnapshot = match serde_json::from_str(
            r#"{"TP_AUTO_TASK_FROM_LOCAL_SOURCE":"true","HEADLESS":false,"TP_ACTIVATION_SERVER_PORT":7070}"#,
        ) {
            Ok(snapshot) => snapshot,
            Err(error) => panic!("decode failed: {error}"),
        };

        assert!(snapshot.local_source_mode());
        assert!(!snapshot.flag(fields::HEADLESS));
        assert_eq!(
            snapshot.text(fields::TP_ACTIVATION_SERVER_PORT).as_deref(),
            Some("7070")
        );
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn local_source_mode_requires_true() {
        let snapshot = EnvSnapshot::from_pairs([(fields::TP_AUTO_TASK_FROM_LOCAL_SOURCE, "false")]);
        assert!(!snapshot.local_source_mode());
        assert!(!EnvSnapshot::default().local_source_mode());
    }

    #[test]
    fn local_source_mode_ignores_boolean_true() {
        let snapshot: EnvSnapshot =
            match serde_json::from_str(r#"{"TP_AUTO_TASK_FROM_LOCAL_SOURCE":true,"HEADLESS":true}"#) {
                Ok(snapshot) => snapshot,
                Err(error) => panic!("decode failed: {error}"),
            };
        assert!(!snapshot.local_source_mode());
        assert!(snapshot.flag(fields::HEADLESS));
    }
}
