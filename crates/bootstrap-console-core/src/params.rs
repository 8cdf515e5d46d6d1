//! Form state → run parameters.
//!
//! Both forms submit a flat, ordered key/value bag as a query string. After
//! the fields are read, a remapping pass folds scenario-specific cases into
//! the generic case files the backend actually ships.

use std::fmt;

use crate::endpoints::{AppFileType, UploadOutcome};
use crate::fields;
use crate::form::FormState;

pub const PROVISION_CAPABILITY_CASE: &str = "case.k8s_provision_capability";
pub const CREATE_BWCE_APP_CASE: &str = "case.k8s_create_and_start_bwce_app";
pub const CREATE_BW5CE_APP_CASE: &str = "case.k8s_create_and_start_bw5ce_app";
pub const CREATE_FLOGO_APP_CASE: &str = "case.k8s_create_and_start_flogo_app";
pub const DELETE_APP_CASE: &str = "case.k8s_delete_app";
pub const CLI_PROVISION_CAPABILITY_CASE: &str = "tplatform:provision-capability";

/// Provision shortcuts: case → flag set to true on the generic provision case.
pub const PROVISION_CASE_FLAGS: [(&str, &str); 6] = [
    ("provision_bwce", "TP_AUTO_IS_PROVISION_BWCE"),
    ("provision_bw5ce", "TP_AUTO_IS_PROVISION_BW5CE"),
    ("provision_ems", "TP_AUTO_IS_PROVISION_EMS"),
    ("provision_flogo", "TP_AUTO_IS_PROVISION_FLOGO"),
    ("provision_pulsar", "TP_AUTO_IS_PROVISION_PULSAR"),
    ("provision_tibcohub", "TP_AUTO_IS_PROVISION_TIBCOHUB"),
];

/// BWCE and BW5CE app creation share one case file.
pub const CREATE_CASE_CAPABILITIES: [(&str, &str); 2] = [
    (CREATE_BWCE_APP_CASE, "bwce"),
    (CREATE_BW5CE_APP_CASE, "bw5ce"),
];

pub const DELETE_CASE_CAPABILITIES: [(&str, &str); 3] = [
    ("delete_bwce_app", "bwce"),
    ("delete_bw5ce_app", "bw5ce"),
    ("delete_flogo_app", "flogo"),
];

/// Create-app cases that upload the chosen app file before running.
pub const APP_UPLOAD_CASES: [&str; 3] = [
    CREATE_BWCE_APP_CASE,
    CREATE_BW5CE_APP_CASE,
    CREATE_FLOGO_APP_CASE,
];

#[must_use]
pub fn case_uploads_app_file(case: &str) -> bool {
    APP_UPLOAD_CASES.contains(&case)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Flag(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Insertion-ordered parameter bag; setting an existing key keeps its slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunParams {
    entries: Vec<(String, ParamValue)>,
}

impl RunParams {
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).map(ToString::to_string)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn case(&self) -> Option<String> {
        self.get_text(fields::CASE_PARAM)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// `application/x-www-form-urlencoded` rendering, in insertion order.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            serializer.append_pair(key, &value.to_string());
        }
        serializer.finish()
    }
}

/// Reads the GUI automation form, merges the upload outcome, then remaps.
#[must_use]
pub fn assemble_gui_params(form: &FormState, upload: Option<&UploadOutcome>) -> RunParams {
    let mut params = RunParams::default();
    params.set(fields::TP_AUTO_IS_CONFIG_O11Y, true);
    params.set(fields::CASE_PARAM, form.text(fields::GUI_AUTO_CASE));
    // The checkbox reads "show browser", the script flag is the inverse.
    params.set(fields::HEADLESS, !form.checked(fields::HEADLESS));
    params.set(
        fields::FORCE_RUN_AUTOMATION,
        form.checked(fields::FORCE_RUN_AUTOMATION),
    );
    params.set(fields::IS_CLEAN_REPORT, form.checked(fields::IS_CLEAN_REPORT));

    for field in fields::GUI_TEXT_FIELDS {
        if field == fields::TP_AUTO_K8S_DP_SERVICE_ACCOUNT_CREATION_ADDITIONAL_SETTINGS {
            params.set(
                fields::TP_AUTO_DATA_PLANE_O11Y_SYSTEM_CONFIG,
                form.checked(fields::TP_AUTO_DATA_PLANE_O11Y_SYSTEM_CONFIG),
            );
        }
        params.set(field, form.text(field));
    }

    if let Some(upload) = upload {
        apply_upload_outcome(&mut params, upload);
    }
    remap_gui_case(&mut params);
    params
}

#[must_use]
pub fn assemble_cli_params(form: &FormState) -> RunParams {
    let mut params = RunParams::default();
    params.set(fields::TP_AUTO_IS_CONFIG_O11Y, true);
    params.set(fields::CASE_PARAM, form.text(fields::CLI_AUTO_CASE));
    for field in fields::CLI_TEXT_FIELDS {
        params.set(field, form.text(field));
    }
    remap_cli_case(&mut params);
    params
}

/// Adds the stored app filename under the parameter its file type selects.
pub fn apply_upload_outcome(params: &mut RunParams, upload: &UploadOutcome) {
    let Some(filename) = upload
        .filename
        .as_deref()
        .filter(|filename| !filename.is_empty())
    else {
        return;
    };
    match &upload.filetype {
        Some(AppFileType::Flogo) => params.set(fields::TP_AUTO_FLOGO_APP_FILE_NAME, filename),
        // Every .ear upload is typed BWCE; both BW case files read it.
        Some(AppFileType::Bwce) => {
            params.set(fields::TP_AUTO_BWCE_APP_FILE_NAME, filename);
            params.set(fields::TP_AUTO_BW5CE_APP_FILE_NAME, filename);
        }
        Some(AppFileType::Other(_)) | None => {}
    }
}

fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(case, _)| *case == key)
        .map(|(_, value)| *value)
}

/// Folds GUI shortcut cases into their generic case files.
///
/// Rewritten case ids miss every table, so a second pass changes nothing.
pub fn remap_gui_case(params: &mut RunParams) {
    let Some(case) = params.case() else {
        return;
    };

    if let Some(flag) = lookup(&PROVISION_CASE_FLAGS, &case) {
        params.set(flag, true);
        params.set(fields::CASE_PARAM, PROVISION_CAPABILITY_CASE);
        return;
    }

    if let Some(capability) = lookup(&CREATE_CASE_CAPABILITIES, &case) {
        if !params.contains(fields::CAPABILITY) {
            params.set(fields::CAPABILITY, capability);
        }
        params.set(fields::CASE_PARAM, CREATE_BWCE_APP_CASE);
        return;
    }

    if let Some(capability) = lookup(&DELETE_CASE_CAPABILITIES, &case) {
        params.set(fields::CAPABILITY, capability);
        params.set(fields::CASE_PARAM, DELETE_APP_CASE);
    }
}

/// Splits `tplatform:provision-capability:<name>` into the bare CLI case
/// plus a `CAPABILITY` parameter.
pub fn remap_cli_case(params: &mut RunParams) {
    let Some(case) = params.case() else {
        return;
    };
    let Some(capability) = case
        .strip_prefix(CLI_PROVISION_CAPABILITY_CASE)
        .and_then(|rest| rest.strip_prefix(':'))
    else {
        return;
    };
    let capability = capability.to_string();
    params.set(fields::CAPABILITY, capability);
    params.set(fields::CASE_PARAM, CLI_PROVISION_CAPABILITY_CASE);
}
