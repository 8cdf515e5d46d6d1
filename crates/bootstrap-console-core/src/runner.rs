//! Script run lifecycle for one automation form.
//!
//! `Idle → Running → Idle` on stream completion, or
//! `Running → Stopping → Idle` once the stop endpoint answers. The stop path
//! also trips a [`CancelToken`] that [`consume_stream`] checks between
//! chunks; the backend still has to end the process itself, the token only
//! stops the client from reading.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::{Stream, StreamExt};
use thiserror::Error;

pub const RUNNING_BANNER: &str = "Running script...\n";
/// Delay before re-highlighting and scrolling the log after a chunk.
pub const HIGHLIGHT_DEBOUNCE_MS: u32 = 50;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Incremental UTF-8 decoder that carries split multi-byte sequences over
/// to the next chunk and replaces invalid bytes with U+FFFD.
#[derive(Debug, Clone, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        let mut offset = 0;
        loop {
            match std::str::from_utf8(&self.pending[offset..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    offset = self.pending.len();
                    break;
                }
                Err(error) => {
                    let valid_end = offset + error.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[offset..valid_end]));
                    match error.error_len() {
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            offset = valid_end + invalid_len;
                        }
                        None => {
                            offset = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..offset);
        out
    }

    /// Flushes a truncated trailing sequence as replacement characters.
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    Stopping,
}

impl RunnerState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

/// Enabled state of the run and stop buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunControls {
    pub run_enabled: bool,
    pub stop_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerError {
    #[error("script_already_running:{state}")]
    AlreadyRunning { state: &'static str },
}

/// Handle for one started run; stale handles are ignored by the runner.
#[derive(Debug, Clone)]
pub struct RunTicket {
    pub seq: u64,
    pub cancel: CancelToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ScriptRunner {
    state: RunnerState,
    log: String,
    job_id: Option<String>,
    seq: u64,
    cancel: CancelToken,
    decoder: Utf8StreamDecoder,
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self {
            state: RunnerState::Idle,
            log: String::new(),
            job_id: None,
            seq: 0,
            cancel: CancelToken::new(),
            decoder: Utf8StreamDecoder::default(),
        }
    }
}

impl ScriptRunner {
    #[must_use]
    pub fn state(&self) -> RunnerState {
        self.state
    }

    #[must_use]
    pub fn log(&self) -> &str {
        &self.log
    }

    #[must_use]
    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    #[must_use]
    pub fn controls(&self) -> RunControls {
        match self.state {
            RunnerState::Idle => RunControls {
                run_enabled: true,
                stop_enabled: false,
            },
            RunnerState::Running => RunControls {
                run_enabled: false,
                stop_enabled: true,
            },
            RunnerState::Stopping => RunControls {
                run_enabled: false,
                stop_enabled: false,
            },
        }
    }

    fn is_current(&self, seq: u64) -> bool {
        seq == self.seq && self.state != RunnerState::Idle
    }

    /// Starts a run: clears the log, forgets the previous job id and hands
    /// out a fresh cancel token.
    pub fn begin(&mut self) -> Result<RunTicket, RunnerError> {
        if self.state != RunnerState::Idle {
            return Err(RunnerError::AlreadyRunning {
                state: self.state.as_str(),
            });
        }
        self.seq += 1;
        self.state = RunnerState::Running;
        self.log = RUNNING_BANNER.to_string();
        self.job_id = None;
        self.cancel = CancelToken::new();
        self.decoder = Utf8StreamDecoder::default();
        Ok(RunTicket {
            seq: self.seq,
            cancel: self.cancel.clone(),
        })
    }

    pub fn attach_job(&mut self, seq: u64, job_id: Option<String>) {
        if !self.is_current(seq) {
            return;
        }
        self.job_id = job_id
            .map(|job_id| job_id.trim().to_string())
            .filter(|job_id| !job_id.is_empty());
    }

    /// Appends a decoded chunk. Returns the appended text, `None` when the
    /// chunk belongs to a finished run.
    pub fn push_chunk(&mut self, seq: u64, bytes: &[u8]) -> Option<String> {
        if !self.is_current(seq) {
            return None;
        }
        let text = self.decoder.decode(bytes);
        self.log.push_str(&text);
        Some(text)
    }

    pub fn complete(&mut self, seq: u64) {
        if !self.is_current(seq) {
            return;
        }
        let rest = self.decoder.finish();
        self.log.push_str(&rest);
        self.state = RunnerState::Idle;
    }

    /// Read failures end the run so the controls never stay locked.
    pub fn fail(&mut self, seq: u64, message: &str) {
        if !self.is_current(seq) {
            return;
        }
        let rest = self.decoder.finish();
        self.log.push_str(&rest);
        self.log.push_str(&format!("\n[ERROR] {message}\n"));
        self.state = RunnerState::Idle;
    }

    pub fn apply_outcome(&mut self, seq: u64, outcome: &StreamOutcome) {
        match outcome {
            StreamOutcome::Completed => self.complete(seq),
            // The stop acknowledgement settles the state.
            StreamOutcome::Cancelled => {
                if self.is_current(seq) {
                    let rest = self.decoder.finish();
                    self.log.push_str(&rest);
                }
            }
            StreamOutcome::Failed(message) => self.fail(seq, message),
        }
    }

    /// Marks a running script as stopping and trips its cancel token.
    /// Returns the job id the stop request should target.
    pub fn request_stop(&mut self) -> Option<String> {
        if self.state == RunnerState::Running {
            self.state = RunnerState::Stopping;
            self.cancel.cancel();
        }
        self.job_id.clone()
    }

    /// The stop endpoint answered: report its message and return to Idle
    /// whether or not the job really ended.
    pub fn stop_acknowledged(&mut self, message: &str) {
        self.log.push_str(&format!("\n[INFO] {message}\n"));
        self.cancel.cancel();
        self.state = RunnerState::Idle;
    }

    pub fn stop_failed(&mut self, message: &str) {
        self.log.push_str(&format!("\n[ERROR] {message}\n"));
        self.cancel.cancel();
        self.state = RunnerState::Idle;
    }
}

/// Reads `stream` until it ends, fails, or `cancel` trips between chunks.
pub async fn consume_stream<S, B, E, F>(
    mut stream: S,
    cancel: &CancelToken,
    mut on_chunk: F,
) -> StreamOutcome
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: fmt::Display,
    F: FnMut(&[u8]),
{
    loop {
        if cancel.is_cancelled() {
            return StreamOutcome::Cancelled;
        }
        match stream.next().await {
            None => return StreamOutcome::Completed,
            Some(Ok(chunk)) => on_chunk(chunk.as_ref()),
            Some(Err(error)) => {
                let message = error.to_string();
                tracing::warn!(error = %message, "script output stream failed");
                return StreamOutcome::Failed(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::stream;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<&'static [u8], String>> + Unpin {
        stream::iter(
            parts
                .iter()
                .map(|part| Ok::<_, String>(part.as_bytes()))
                .collect::<Vec<_>>(),
        )
    }

    fn run_to_end(runner: &mut ScriptRunner, parts: &[&'static str]) -> StreamOutcome {
        let ticket = match runner.begin() {
            Ok(ticket) => ticket,
            Err(error) => panic!("begin failed: {error}"),
        };
        let mut received = Vec::new();
        let outcome = block_on(consume_stream(chunks(parts), &ticket.cancel, |chunk| {
            received.push(chunk.to_vec());
        }));
        for chunk in received {
            let _ = runner.push_chunk(ticket.seq, &chunk);
        }
        runner.apply_outcome(ticket.seq, &outcome);
        outcome
    }

    #[test]
    fn streamed_chunks_accumulate_and_return_to_idle() {
        let mut runner = ScriptRunner::default();
        let outcome = run_to_end(&mut runner, &["A", "B"]);

        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(runner.log(), "Running script...\nAB");
        assert_eq!(runner.state(), RunnerState::Idle);
        assert_eq!(
            runner.controls(),
            RunControls {
                run_enabled: true,
                stop_enabled: false
            }
        );
    }

    #[test]
    fn begin_locks_controls_and_rejects_second_run() {
        let mut runner = ScriptRunner::default();
        assert!(runner.begin().is_ok());
        assert_eq!(runner.log(), RUNNING_BANNER);
        assert_eq!(
            runner.controls(),
            RunControls {
                run_enabled: false,
                stop_enabled: true
            }
        );
        assert_eq!(
            runner.begin().err(),
            Some(RunnerError::AlreadyRunning { state: "running" })
        );
    }

    #[test]
    fn stop_before_stream_end_forces_idle() {
        let mut runner = ScriptRunner::default();
        let ticket = match runner.begin() {
            Ok(ticket) => ticket,
            Err(error) => panic!("begin failed: {error}"),
        };
        runner.attach_job(ticket.seq, Some("job-1".to_string()));
        let _ = runner.push_chunk(ticket.seq, b"step 1\n");

        assert_eq!(runner.request_stop().as_deref(), Some("job-1"));
        assert_eq!(runner.state(), RunnerState::Stopping);
        assert!(ticket.cancel.is_cancelled());

        runner.stop_acknowledged("Process terminated successfully");
        assert_eq!(runner.state(), RunnerState::Idle);
        assert!(runner.controls().run_enabled);
        assert!(!runner.controls().stop_enabled);
        assert!(
            runner
                .log()
                .ends_with("step 1\n\n[INFO] Process terminated successfully\n")
        );

        // The reader notices the token and late output is dropped.
        let outcome = block_on(consume_stream(chunks(&["late"]), &ticket.cancel, |_| {}));
        assert_eq!(outcome, StreamOutcome::Cancelled);
        assert_eq!(runner.push_chunk(ticket.seq, b"late"), None);
        runner.apply_outcome(ticket.seq, &outcome);
        assert_eq!(runner.state(), RunnerState::Idle);
    }

    #[test]
    fn stop_before_job_attaches_cancels_ticket() {
        let mut runner = ScriptRunner::default();
        let ticket = match runner.begin() {
            Ok(ticket) => ticket,
            Err(error) => panic!("begin failed: {error}"),
        };

        assert_eq!(runner.request_stop(), None);
        runner.stop_acknowledged("No running process found");
        assert!(ticket.cancel.is_cancelled());
        assert_eq!(runner.state(), RunnerState::Idle);

        runner.attach_job(ticket.seq, Some("job-late".to_string()));
        assert_eq!(runner.job_id(), None);
    }

    #[test]
    fn stale_ticket_cannot_touch_next_run() {
        let mut runner = ScriptRunner::default();
        let first = match runner.begin() {
            Ok(ticket) => ticket,
            Err(error) => panic!("begin failed: {error}"),
        };
        let _ = runner.request_stop();
        runner.stop_acknowledged("No process running");

        let second = match runner.begin() {
            Ok(ticket) => ticket,
            Err(error) => panic!("begin failed: {error}"),
        };
        runner.complete(first.seq);
        assert_eq!(runner.state(), RunnerState::Running);
        assert_eq!(runner.push_chunk(first.seq, b"old"), None);
        assert_eq!(runner.push_chunk(second.seq, b"new").as_deref(), Some("new"));
    }

    #[test]
    fn read_failure_returns_to_idle_with_error_line() {
        let mut runner = ScriptRunner::default();
        let ticket = match runner.begin() {
            Ok(ticket) => ticket,
            Err(error) => panic!("begin failed: {error}"),
        };
        let failing = stream::iter(vec![
            Ok::<&'static [u8], String>(b"partial"),
            Err("connection reset".to_string()),
        ]);
        let mut received = Vec::new();
        let outcome = block_on(consume_stream(failing, &ticket.cancel, |chunk| {
            received.push(chunk.to_vec());
        }));
        for chunk in received {
            let _ = runner.push_chunk(ticket.seq, &chunk);
        }
        runner.apply_outcome(ticket.seq, &outcome);

        assert_eq!(
            outcome,
            StreamOutcome::Failed("connection reset".to_string())
        );
        assert_eq!(runner.state(), RunnerState::Idle);
        assert!(runner.log().ends_with("partial\n[ERROR] connection reset\n"));
    }

    #[test]
    fn stop_without_job_targets_no_job() {
        let mut runner = ScriptRunner::default();
        assert_eq!(runner.request_stop(), None);
        runner.stop_failed("stop request failed");
        assert_eq!(runner.state(), RunnerState::Idle);
    }

    #[test]
    fn decoder_carries_split_multibyte_sequences() {
        let mut decoder = Utf8StreamDecoder::default();
        let bytes = "ok ✓".as_bytes();
        let split = bytes.len() - 1;
        assert_eq!(decoder.decode(&bytes[..split]), "ok ");
        assert_eq!(decoder.decode(&bytes[split..]), "✓");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8StreamDecoder::default();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{fffd}b");
        assert_eq!(decoder.decode(b"\xe2\x9c"), "");
        assert_eq!(decoder.finish(), "\u{fffd}");
    }
}
