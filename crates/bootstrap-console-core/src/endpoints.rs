use serde::{Deserialize, Serialize};

use crate::params::RunParams;

pub const ENV_PATH: &str = "/get_env";
pub const UPLOAD_PATH: &str = "/upload";
pub const RUN_GUI_SCRIPT_PATH: &str = "/run-gui-script";
pub const RUN_CLI_SCRIPT_PATH: &str = "/run-cli-script";
pub const STOP_SCRIPT_PATH: &str = "/stop-script";

/// Response header carrying the id of the job a run request started.
pub const JOB_ID_HEADER: &str = "one_click_job_id";
/// Multipart field name the upload endpoint reads.
pub const UPLOAD_FIELD: &str = "file";

/// The two automation forms on the console, each with its own runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormKind {
    Gui,
    Cli,
}

impl FormKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gui => "gui",
            Self::Cli => "cli",
        }
    }

    #[must_use]
    pub fn script_path(self) -> &'static str {
        match self {
            Self::Gui => RUN_GUI_SCRIPT_PATH,
            Self::Cli => RUN_CLI_SCRIPT_PATH,
        }
    }
}

#[must_use]
pub fn run_script_path(kind: FormKind, params: &RunParams) -> String {
    format!("{}?{}", kind.script_path(), params.to_query_string())
}

/// Stop path; the job id query is omitted when no job was captured.
#[must_use]
pub fn stop_script_path(job_id: Option<&str>) -> String {
    match job_id.map(str::trim).filter(|job_id| !job_id.is_empty()) {
        Some(job_id) => {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("jobId", job_id)
                .finish();
            format!("{STOP_SCRIPT_PATH}?{query}")
        }
        None => STOP_SCRIPT_PATH.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppFileType {
    Flogo,
    Bwce,
    Other(String),
}

impl From<String> for AppFileType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "FLOGO" => Self::Flogo,
            "BWCE" => Self::Bwce,
            _ => Self::Other(value),
        }
    }
}

impl From<AppFileType> for String {
    fn from(value: AppFileType) -> Self {
        match value {
            AppFileType::Flogo => "FLOGO".to_string(),
            AppFileType::Bwce => "BWCE".to_string(),
            AppFileType::Other(other) => other,
        }
    }
}

/// Body of `/upload`. A missing filename means nothing was stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub filetype: Option<AppFileType>,
}

impl UploadOutcome {
    #[must_use]
    pub fn stored(filename: impl Into<String>, filetype: AppFileType) -> Self {
        Self {
            message: None,
            filename: Some(filename.into()),
            filetype: Some(filetype),
        }
    }
}

/// Body of `/stop-script`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_path_omits_missing_job_id() {
        assert_eq!(stop_script_path(None), "/stop-script");
        assert_eq!(stop_script_path(Some("  ")), "/stop-script");
        assert_eq!(
            stop_script_path(Some("6f1c-42")),
            "/stop-script?jobId=6f1c-42"
        );
    }

    #[test]
    fn upload_outcome_decodes_file_types() {
        let outcome: UploadOutcome = match serde_json::from_str(
            r#"{"message":"Upload successful","filename":"app_20250101_101010.ear","filetype":"BWCE"}"#,
        ) {
            Ok(outcome) => outcome,
            Err(error) => panic!("decode failed: {error}"),
        };
        assert_eq!(outcome.filetype, Some(AppFileType::Bwce));

        let empty: UploadOutcome = match serde_json::from_str(r#"{"message":"No file uploaded"}"#) {
            Ok(outcome) => outcome,
            Err(error) => panic!("decode failed: {error}"),
        };
        assert_eq!(empty.filename, None);
        assert_eq!(empty.filetype, None);
    }
}
