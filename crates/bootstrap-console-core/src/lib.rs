//! Browser-independent core of the bootstrap console.
//!
//! The console is a form over a small automation backend: it hydrates inputs
//! from the server environment, shows the fields a selected case needs,
//! turns the form into run parameters, and streams script output into a log
//! panel. Everything in this crate is pure or generic over the transport so
//! the native CLI and the WASM shell share one set of rules.

pub mod endpoints;
pub mod env;
pub mod fields;
pub mod form;
pub mod mirror;
pub mod params;
pub mod runner;
pub mod session;
pub mod settings;
pub mod tabs;
pub mod visibility;

pub use endpoints::{FormKind, JOB_ID_HEADER, StopResponse, UploadOutcome};
pub use env::EnvSnapshot;
pub use form::{FieldKind, FieldValue, FormState};
pub use params::{ParamValue, RunParams, assemble_cli_params, assemble_gui_params};
pub use runner::{
    CancelToken, RunControls, RunnerError, RunnerState, ScriptRunner, StreamOutcome,
    consume_stream,
};
pub use session::ConsoleSession;
pub use settings::{MemorySettingsStore, SettingsError, SettingsStore};
pub use tabs::TabRouter;
pub use visibility::{VisibilityPlan, baseline_visibility, compute_visibility};
