//! HTTP client for the bootstrap console backend.
//!
//! Five endpoints: `/get_env`, `/upload`, `/run-gui-script`,
//! `/run-cli-script` and `/stop-script`. Script runs stream plain text and
//! carry no overall timeout; everything else uses the configured one.

mod controller;

use std::path::Path;
use std::time::Duration;

use bootstrap_console_core::endpoints::{self, UPLOAD_FIELD, UPLOAD_PATH};
use bootstrap_console_core::{EnvSnapshot, FormKind, JOB_ID_HEADER, RunParams, StopResponse, UploadOutcome};
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use uuid::Uuid;

pub use controller::{ConsoleController, ControllerError, RunReport};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3120";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REQUEST_ATTEMPTS: usize = 2;

#[derive(Debug, Clone)]
pub struct BootstrapConsoleClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Attempts for idempotent reads. Script starts and stops are never
    /// retried.
    pub request_attempts: usize,
}

impl BootstrapConsoleClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            request_attempts: DEFAULT_REQUEST_ATTEMPTS,
        }
    }
}

impl Default for BootstrapConsoleClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapConsoleClient {
    base_url: String,
    timeout: Duration,
    request_attempts: usize,
    http: reqwest::Client,
}

#[derive(Debug, Error)]
pub enum ConsoleClientError {
    #[error("console_client_base_url_missing")]
    BaseUrlMissing,
    #[error("console_client_base_url_invalid:{base_url}")]
    BaseUrlInvalid { base_url: String },
    #[error("console_client_invalid_path")]
    InvalidPath,
    #[error("console_request_failed:{message}")]
    Request { message: String },
    #[error("console_read_failed:{message}")]
    Read { message: String },
    #[error("console_http_{status}:{body}")]
    Http { status: StatusCode, body: String },
    #[error("console_json_decode_failed:{message}")]
    Decode { message: String },
    #[error("console_upload_file_unreadable:{path}:{message}")]
    UploadFile { path: String, message: String },
}

/// A started script: the job id from the response header plus the body.
pub struct ScriptStream {
    pub job_id: Option<String>,
    pub body: BoxStream<'static, Result<Vec<u8>, ConsoleClientError>>,
}

impl std::fmt::Debug for ScriptStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptStream")
            .field("job_id", &self.job_id)
            .finish_non_exhaustive()
    }
}

impl BootstrapConsoleClient {
    pub fn new(config: BootstrapConsoleClientConfig) -> Result<Self, ConsoleClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        Ok(Self {
            base_url,
            timeout: Duration::from_millis(config.timeout_ms.max(250)),
            request_attempts: config.request_attempts.max(1),
            http: reqwest::Client::new(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(format!("{}{}", self.base_url, trimmed))
        } else {
            Some(format!("{}/{}", self.base_url, trimmed))
        }
    }

    /// Absolute URL a run request for `params` would hit.
    #[must_use]
    pub fn run_script_url(&self, kind: FormKind, params: &RunParams) -> Option<String> {
        self.endpoint(&endpoints::run_script_path(kind, params))
    }

    pub async fn get_env(&self) -> Result<EnvSnapshot, ConsoleClientError> {
        let url = self
            .endpoint(endpoints::ENV_PATH)
            .ok_or(ConsoleClientError::InvalidPath)?;
        let mut last_error: Option<String> = None;

        for attempt in 0..self.request_attempts {
            let request = self
                .http
                .get(url.as_str())
                .header("x-request-id", request_id())
                .timeout(self.timeout);

            match request.send().await {
                Ok(response) => return decode_json_response(response).await,
                Err(error) => {
                    tracing::debug!(attempt, error = %error, "environment request failed");
                    last_error = Some(error.to_string());
                    if attempt + 1 >= self.request_attempts {
                        break;
                    }
                }
            }
        }

        Err(ConsoleClientError::Request {
            message: last_error.unwrap_or_else(|| "unknown".to_string()),
        })
    }

    pub async fn upload_app_file(&self, path: &Path) -> Result<UploadOutcome, ConsoleClientError> {
        let url = self
            .endpoint(UPLOAD_PATH)
            .ok_or(ConsoleClientError::InvalidPath)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|error| ConsoleClientError::UploadFile {
                path: path.display().to_string(),
                message: error.to_string(),
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::info!(file = %file_name, size = bytes.len(), "uploading app file");

        let form = Form::new().part(UPLOAD_FIELD, Part::bytes(bytes).file_name(file_name));
        let response = self
            .http
            .post(url.as_str())
            .header("x-request-id", request_id())
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|error| ConsoleClientError::Request {
                message: error.to_string(),
            })?;
        decode_json_response(response).await
    }

    /// Starts a script and hands back its output stream without reading it.
    pub async fn start_script(
        &self,
        kind: FormKind,
        params: &RunParams,
    ) -> Result<ScriptStream, ConsoleClientError> {
        let url = self
            .run_script_url(kind, params)
            .ok_or(ConsoleClientError::InvalidPath)?;
        tracing::info!(form = kind.as_str(), case = ?params.case(), "starting script");

        let response = self
            .http
            .get(url.as_str())
            .header("x-request-id", request_id())
            .send()
            .await
            .map_err(|error| ConsoleClientError::Request {
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let bytes = response.bytes().await.unwrap_or_default();
            return Err(format_http_error(status, &bytes));
        }

        let job_id = response
            .headers()
            .get(JOB_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|error| ConsoleClientError::Read {
                        message: error.to_string(),
                    })
            })
            .boxed();

        Ok(ScriptStream { job_id, body })
    }

    pub async fn stop_script(
        &self,
        job_id: Option<&str>,
    ) -> Result<StopResponse, ConsoleClientError> {
        let url = self
            .endpoint(&endpoints::stop_script_path(job_id))
            .ok_or(ConsoleClientError::InvalidPath)?;
        tracing::info!(job_id = ?job_id, "requesting script stop");

        let response = self
            .http
            .get(url.as_str())
            .header("x-request-id", request_id())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| ConsoleClientError::Request {
                message: error.to_string(),
            })?;
        decode_json_response(response).await
    }
}

fn request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

pub fn format_http_error(status: StatusCode, body: &[u8]) -> ConsoleClientError {
    let body = non_empty_string(String::from_utf8_lossy(body).to_string())
        .unwrap_or_else(|| "<empty>".to_string());
    ConsoleClientError::Http { status, body }
}

pub fn normalize_base_url(base_url: &str) -> Result<String, ConsoleClientError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ConsoleClientError::BaseUrlMissing);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConsoleClientError::BaseUrlInvalid {
            base_url: trimmed.to_string(),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

async fn decode_json_response<T>(response: reqwest::Response) -> Result<T, ConsoleClientError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|error| ConsoleClientError::Read {
            message: error.to_string(),
        })?;

    if !status.is_success() {
        return Err(format_http_error(status, &bytes));
    }

    serde_json::from_slice::<T>(&bytes).map_err(|error| ConsoleClientError::Decode {
        message: error.to_string(),
    })
}

fn non_empty_string(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootstrap_console_core::fields;

    #[test]
    fn endpoint_builder_normalizes_paths() {
        let client = BootstrapConsoleClient::new(BootstrapConsoleClientConfig::new(
            "http://localhost:3120/",
        ))
        .expect("console client");

        assert_eq!(
            client.endpoint("/get_env"),
            Some("http://localhost:3120/get_env".to_string())
        );
        assert_eq!(
            client.endpoint("get_env"),
            Some("http://localhost:3120/get_env".to_string())
        );
        assert_eq!(client.endpoint(" "), None);
    }

    #[test]
    fn run_url_carries_encoded_params() {
        let client = BootstrapConsoleClient::new(BootstrapConsoleClientConfig::default())
            .expect("console client");
        let mut params = RunParams::default();
        params.set(fields::CASE_PARAM, "tplatform:list-dp");
        params.set(fields::TIBCOP_CLI_OTHER_ARGS, "--all yes");

        assert_eq!(
            client.run_script_url(FormKind::Cli, &params),
            Some(
                "http://localhost:3120/run-cli-script?case=tplatform%3Alist-dp&TIBCOP_CLI_OTHER_ARGS=--all+yes"
                    .to_string()
            )
        );
    }

    #[test]
    fn http_error_mapping_preserves_shape() {
        let error = format_http_error(StatusCode::BAD_GATEWAY, b" gateway failed ");
        assert_eq!(
            error.to_string(),
            "console_http_502 Bad Gateway:gateway failed"
        );

        let empty_body = format_http_error(StatusCode::SERVICE_UNAVAILABLE, b" ");
        assert_eq!(
            empty_body.to_string(),
            "console_http_503 Service Unavailable:<empty>"
        );
    }

    #[test]
    fn base_url_is_validated() {
        let missing = BootstrapConsoleClient::new(BootstrapConsoleClientConfig::new("   "));
        assert!(matches!(missing, Err(ConsoleClientError::BaseUrlMissing)));

        let invalid = BootstrapConsoleClient::new(BootstrapConsoleClientConfig::new("localhost:3120"));
        assert!(matches!(
            invalid,
            Err(ConsoleClientError::BaseUrlInvalid { .. })
        ));
    }
}
