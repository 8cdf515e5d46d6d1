use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bootstrap_console_core::params::case_uploads_app_file;
use bootstrap_console_core::runner::RunTicket;
use bootstrap_console_core::{
    ConsoleSession, FormKind, RunParams, RunnerError, StopResponse, StreamOutcome, UploadOutcome,
    VisibilityPlan, assemble_cli_params, assemble_gui_params, consume_stream, fields,
};
use thiserror::Error;

use crate::{BootstrapConsoleClient, ConsoleClientError};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Client(#[from] ConsoleClientError),
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// How one run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub job_id: Option<String>,
    pub outcome: StreamOutcome,
}

/// Drives a [`ConsoleSession`] against the backend.
///
/// The session lock is only taken for state transitions and never held
/// across a request, so `stop` can run while `run` is streaming.
#[derive(Debug, Clone)]
pub struct ConsoleController {
    client: BootstrapConsoleClient,
    session: Arc<Mutex<ConsoleSession>>,
}

impl ConsoleController {
    #[must_use]
    pub fn new(client: BootstrapConsoleClient, session: ConsoleSession) -> Self {
        Self {
            client,
            session: Arc::new(Mutex::new(session)),
        }
    }

    #[must_use]
    pub fn client(&self) -> &BootstrapConsoleClient {
        &self.client
    }

    pub fn session(&self) -> MutexGuard<'_, ConsoleSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches the environment snapshot and hydrates the session with it.
    pub async fn load_env(&self) -> Result<VisibilityPlan, ControllerError> {
        let env = self.client.get_env().await?;
        tracing::info!(values = env.len(), "loaded environment defaults");
        Ok(self.session().set_env(env))
    }

    /// Parameters a run would send right now, without uploading anything.
    #[must_use]
    pub fn preview_params(&self, kind: FormKind) -> RunParams {
        let session = self.session();
        match kind {
            FormKind::Gui => assemble_gui_params(&session.form, None),
            FormKind::Cli => assemble_cli_params(&session.form),
        }
    }

    /// Runs the form's script to the end, handing every decoded chunk to
    /// `on_text` as it arrives.
    pub async fn run<F>(&self, kind: FormKind, mut on_text: F) -> Result<RunReport, ControllerError>
    where
        F: FnMut(&str),
    {
        let ticket = self.session().runner_mut(kind).begin()?;
        on_text(bootstrap_console_core::runner::RUNNING_BANNER);

        let params = match self.run_params(kind).await {
            Ok(params) => params,
            Err(error) => return Err(self.abort(kind, &ticket, error)),
        };
        if ticket.cancel.is_cancelled() {
            tracing::info!(form = kind.as_str(), "run stopped before the script started");
            return Ok(RunReport {
                job_id: None,
                outcome: StreamOutcome::Cancelled,
            });
        }
        let stream = match self.client.start_script(kind, &params).await {
            Ok(stream) => stream,
            Err(error) => return Err(self.abort(kind, &ticket, error)),
        };
        if ticket.cancel.is_cancelled() {
            self.stop_orphaned_job(kind, stream.job_id.as_deref()).await;
            return Ok(RunReport {
                job_id: stream.job_id,
                outcome: StreamOutcome::Cancelled,
            });
        }
        tracing::info!(form = kind.as_str(), job_id = ?stream.job_id, "script started");
        self.session()
            .runner_mut(kind)
            .attach_job(ticket.seq, stream.job_id.clone());

        let outcome = consume_stream(stream.body, &ticket.cancel, |bytes| {
            let text = self.session().runner_mut(kind).push_chunk(ticket.seq, bytes);
            if let Some(text) = text.filter(|text| !text.is_empty()) {
                on_text(&text);
            }
        })
        .await;

        let tail = {
            let mut session = self.session();
            let runner = session.runner_mut(kind);
            let before = runner.log().len();
            runner.apply_outcome(ticket.seq, &outcome);
            runner.log().get(before..).unwrap_or_default().to_string()
        };
        if !tail.is_empty() {
            on_text(&tail);
        }
        tracing::info!(form = kind.as_str(), outcome = ?outcome, "script stream finished");

        Ok(RunReport {
            job_id: stream.job_id,
            outcome,
        })
    }

    /// Asks the backend to stop the form's job and resets the runner once it
    /// answers, or once the request fails.
    pub async fn stop(&self, kind: FormKind) -> Result<StopResponse, ControllerError> {
        let job_id = self.session().runner_mut(kind).request_stop();
        match self.client.stop_script(job_id.as_deref()).await {
            Ok(response) => {
                tracing::info!(
                    form = kind.as_str(),
                    job_id = ?job_id,
                    status = ?response.status,
                    "stop acknowledged"
                );
                self.session()
                    .runner_mut(kind)
                    .stop_acknowledged(&response.message);
                Ok(response)
            }
            Err(error) => {
                tracing::warn!(form = kind.as_str(), error = %error, "stop request failed");
                self.session()
                    .runner_mut(kind)
                    .stop_failed(&error.to_string());
                Err(error.into())
            }
        }
    }

    /// A stop that landed while the run request was in flight had no job id
    /// to target, so the job it started is stopped here.
    async fn stop_orphaned_job(&self, kind: FormKind, job_id: Option<&str>) {
        let Some(job_id) = job_id else {
            tracing::warn!(form = kind.as_str(), "stopped run started a job without an id");
            return;
        };
        match self.client.stop_script(Some(job_id)).await {
            Ok(response) => tracing::info!(
                form = kind.as_str(),
                job_id,
                status = ?response.status,
                "stopped job started after the run was stopped"
            ),
            Err(error) => tracing::warn!(
                form = kind.as_str(),
                job_id,
                error = %error,
                "could not stop job started after the run was stopped"
            ),
        }
    }

    async fn run_params(&self, kind: FormKind) -> Result<RunParams, ConsoleClientError> {
        if kind == FormKind::Cli {
            let params = assemble_cli_params(&self.session().form);
            return Ok(params);
        }
        let upload = match self.pending_upload() {
            Some(path) => Some(self.client.upload_app_file(&path).await?),
            None => None,
        };
        log_upload(upload.as_ref());
        let params = assemble_gui_params(&self.session().form, upload.as_ref());
        Ok(params)
    }

    fn pending_upload(&self) -> Option<PathBuf> {
        let session = self.session();
        let case = session.form.text(fields::GUI_AUTO_CASE);
        let app_file = session.form.text(fields::APP_FILE).trim();
        (case_uploads_app_file(case) && !app_file.is_empty()).then(|| PathBuf::from(app_file))
    }

    fn abort(
        &self,
        kind: FormKind,
        ticket: &RunTicket,
        error: ConsoleClientError,
    ) -> ControllerError {
        tracing::warn!(form = kind.as_str(), error = %error, "script did not start");
        self.session()
            .runner_mut(kind)
            .fail(ticket.seq, &error.to_string());
        error.into()
    }
}

fn log_upload(upload: Option<&UploadOutcome>) {
    if let Some(upload) = upload {
        tracing::info!(
            filename = ?upload.filename,
            filetype = ?upload.filetype,
            message = ?upload.message,
            "app file uploaded"
        );
    }
}
