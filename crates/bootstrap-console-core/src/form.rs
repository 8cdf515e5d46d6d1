use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::fields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Checkbox,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
}

impl FieldValue {
    #[must_use]
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Checkbox => Self::Checked(false),
            FieldKind::Text => Self::Text(String::new()),
        }
    }

    /// Converts a snapshot or settings value for an element of `kind`.
    ///
    /// Checkboxes accept the string `"true"` or boolean `true`; everything
    /// else becomes its string form.
    #[must_use]
    pub fn from_json(kind: FieldKind, value: &Value) -> Self {
        match kind {
            FieldKind::Checkbox => Self::Checked(json_is_true(value)),
            FieldKind::Text => Self::Text(json_to_text(value)),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Checked(checked) => Value::Bool(*checked),
        }
    }
}

#[must_use]
pub fn json_is_true(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => text == "true",
        _ => false,
    }
}

#[must_use]
pub fn json_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldSlot {
    kind: FieldKind,
    value: FieldValue,
}

/// Current values of the console's form controls, keyed by element id.
///
/// Only registered fields exist; hydration skips unknown identifiers the
/// same way the page skips ids with no element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    slots: BTreeMap<String, FieldSlot>,
}

impl FormState {
    /// Form with every control of both automation forms registered and empty.
    #[must_use]
    pub fn console() -> Self {
        let mut form = Self::default();
        form.register(fields::GUI_AUTO_CASE, FieldKind::Text);
        form.register(fields::CLI_AUTO_CASE, FieldKind::Text);
        for field in fields::GUI_CHECKBOX_FIELDS {
            form.register(field, FieldKind::Checkbox);
        }
        for field in fields::GUI_TEXT_FIELDS {
            form.register(field, FieldKind::Text);
        }
        for field in [
            fields::TP_AUTO_ADMIN_URL,
            fields::CP_ADMIN_EMAIL,
            fields::CP_ADMIN_PASSWORD,
            fields::TP_AUTO_TOKEN_NAME,
            fields::APP_FILE,
        ] {
            form.register(field, FieldKind::Text);
        }
        for field in fields::CLI_TEXT_FIELDS {
            form.register(field, FieldKind::Text);
        }
        form.register(fields::SAVE_CLI_SETTING, FieldKind::Checkbox);
        form
    }

    pub fn register(&mut self, id: &str, kind: FieldKind) {
        self.slots.insert(
            id.to_string(),
            FieldSlot {
                kind,
                value: FieldValue::empty(kind),
            },
        );
    }

    /// Registered ids with their kinds, in id order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.slots.iter().map(|(id, slot)| (id.as_str(), slot.kind))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    #[must_use]
    pub fn kind(&self, id: &str) -> Option<FieldKind> {
        self.slots.get(id).map(|slot| slot.kind)
    }

    #[must_use]
    pub fn value(&self, id: &str) -> Option<&FieldValue> {
        self.slots.get(id).map(|slot| &slot.value)
    }

    /// Text of a field; empty for checkboxes and unregistered ids.
    #[must_use]
    pub fn text(&self, id: &str) -> &str {
        match self.value(id) {
            Some(FieldValue::Text(text)) => text.as_str(),
            _ => "",
        }
    }

    #[must_use]
    pub fn checked(&self, id: &str) -> bool {
        matches!(self.value(id), Some(FieldValue::Checked(true)))
    }

    /// Sets a text value. Returns false when the id is not a text field.
    pub fn set_text(&mut self, id: &str, text: impl Into<String>) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) if slot.kind != FieldKind::Checkbox => {
                slot.value = FieldValue::Text(text.into());
                true
            }
            _ => false,
        }
    }

    /// Sets a checkbox. Returns false when the id is not a checkbox.
    pub fn set_checked(&mut self, id: &str, checked: bool) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) if slot.kind == FieldKind::Checkbox => {
                slot.value = FieldValue::Checked(checked);
                true
            }
            _ => false,
        }
    }

    /// Applies a flat id → value mapping. Returns the number of fields set.
    pub fn hydrate(&mut self, values: &Map<String, Value>) -> usize {
        let mut applied = 0;
        for (id, value) in values {
            let Some(slot) = self.slots.get_mut(id) else {
                continue;
            };
            slot.value = FieldValue::from_json(slot.kind, value);
            applied += 1;
        }
        applied
    }
}
