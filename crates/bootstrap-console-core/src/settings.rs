//! Opt-in persistence of the CLI form's connection settings.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::fields;
use crate::form::{FieldKind, FieldValue, FormState};

pub const CLI_SETTING_KEY: &str = "tibcoCliSettings";

/// Fields written to the settings blob when saving is enabled.
pub const CLI_SETTING_FIELDS: [&str; 3] = [
    fields::TIBCOP_CLI_CPURL,
    fields::TIBCOP_CLI_OAUTH_TOKEN,
    fields::SAVE_CLI_SETTING,
];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings_storage_unavailable:{message}")]
    Unavailable { message: String },
    #[error("settings_read_failed:{message}")]
    Read { message: String },
    #[error("settings_write_failed:{message}")]
    Write { message: String },
    #[error("settings_decode_failed:{message}")]
    Decode { message: String },
}

/// String key/value storage: `localStorage` in the browser, a directory of
/// JSON files natively.
pub trait SettingsStore {
    fn read(&self, key: &str) -> Result<Option<String>, SettingsError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    items: BTreeMap<String, String>,
}

impl SettingsStore for MemorySettingsStore {
    fn read(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.items.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Snapshot of the whitelisted fields, or an empty blob when disabled.
#[must_use]
pub fn capture_cli_settings(enabled: bool, form: &FormState) -> Map<String, Value> {
    let mut settings = Map::new();
    if !enabled {
        return settings;
    }
    for field in CLI_SETTING_FIELDS {
        let value = form
            .value(field)
            .cloned()
            .unwrap_or_else(|| FieldValue::empty(FieldKind::Text));
        settings.insert(field.to_string(), value.to_json());
    }
    settings
}

/// Writes the blob; an unchecked toggle stores `{}` and so clears it.
pub fn save_cli_settings(
    store: &mut dyn SettingsStore,
    enabled: bool,
    form: &FormState,
) -> Result<Map<String, Value>, SettingsError> {
    let settings = capture_cli_settings(enabled, form);
    let serialized = serde_json::to_string(&Value::Object(settings.clone())).map_err(|error| {
        SettingsError::Write {
            message: error.to_string(),
        }
    })?;
    store.write(CLI_SETTING_KEY, &serialized)?;
    Ok(settings)
}

/// Reads the blob back. `None` when nothing was ever saved.
pub fn load_cli_settings(
    store: &dyn SettingsStore,
) -> Result<Option<Map<String, Value>>, SettingsError> {
    let Some(raw) = store.read(CLI_SETTING_KEY)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(settings)) => Ok(Some(settings)),
        Ok(other) => Err(SettingsError::Decode {
            message: format!("expected object, found {other}"),
        }),
        Err(error) => Err(SettingsError::Decode {
            message: error.to_string(),
        }),
    }
}

/// Loads the blob and hydrates the form with it. Returns the number of
/// fields restored.
pub fn apply_cli_settings(
    store: &dyn SettingsStore,
    form: &mut FormState,
) -> Result<usize, SettingsError> {
    Ok(load_cli_settings(store)?.map_or(0, |settings| form.hydrate(&settings)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_form(cp_url: &str, token: &str) -> FormState {
        let mut form = FormState::console();
        form.set_text(fields::TIBCOP_CLI_CPURL, cp_url);
        form.set_text(fields::TIBCOP_CLI_OAUTH_TOKEN, token);
        form.set_text(fields::TIBCOP_CLI_DP_NAME, "not-persisted");
        form.set_checked(fields::SAVE_CLI_SETTING, true);
        form
    }

    #[test]
    fn saved_settings_round_trip() {
        let mut store = MemorySettingsStore::default();
        if let Err(error) = save_cli_settings(&mut store, true, &cli_form("x", "y")) {
            panic!("save failed: {error}");
        }

        let mut restored = FormState::console();
        match apply_cli_settings(&store, &mut restored) {
            Ok(applied) => assert_eq!(applied, 3),
            Err(error) => panic!("load failed: {error}"),
        }
        assert_eq!(restored.text(fields::TIBCOP_CLI_CPURL), "x");
        assert_eq!(restored.text(fields::TIBCOP_CLI_OAUTH_TOKEN), "y");
        assert!(restored.checked(fields::SAVE_CLI_SETTING));
        assert_eq!(restored.text(fields::TIBCOP_CLI_DP_NAME), "");
    }

    #[test]
    fn disabled_save_clears_blob() {
        let mut store = MemorySettingsStore::default();
        if let Err(error) = save_cli_settings(&mut store, true, &cli_form("x", "y")) {
            panic!("save failed: {error}");
        }
        if let Err(error) = save_cli_settings(&mut store, false, &cli_form("x", "y")) {
            panic!("save failed: {error}");
        }

        assert_eq!(
            store.read(CLI_SETTING_KEY).ok().flatten().as_deref(),
            Some("{}")
        );
        let mut restored = FormState::console();
        match apply_cli_settings(&store, &mut restored) {
            Ok(applied) => assert_eq!(applied, 0),
            Err(error) => panic!("load failed: {error}"),
        }
        assert_eq!(restored.text(fields::TIBCOP_CLI_CPURL), "");
    }

    #[test]
    fn missing_blob_is_not_an_error() {
        let store = MemorySettingsStore::default();
        assert!(matches!(load_cli_settings(&store), Ok(None)));
    }

    #[test]
    fn malformed_blob_is_a_decode_error() {
        let mut store = MemorySettingsStore::default();
        if let Err(error) = store.write(CLI_SETTING_KEY, "{not json") {
            panic!("write failed: {error}");
        }
        assert!(matches!(
            load_cli_settings(&store),
            Err(SettingsError::Decode { .. })
        ));

        if let Err(error) = store.write(CLI_SETTING_KEY, "[1,2]") {
            panic!("write failed: {error}");
        }
        assert!(matches!(
            load_cli_settings(&store),
            Err(SettingsError::Decode { .. })
        ));
    }
}
