use bootstrap_console_core::{ConsoleSession, FieldKind, FormKind, FormState, fields};
use serde::Serialize;
use thiserror::Error;

pub(crate) const DISPLAY_VISIBLE: &str = "flex";
pub(crate) const DISPLAY_HIDDEN: &str = "none";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum PageError {
    #[error("window_unavailable")]
    WindowUnavailable,
    #[error("element_missing:{selector}")]
    ElementMissing { selector: String },
    #[error("request_failed:{message}")]
    Request { message: String },
    #[error("console_http_{status}:{body}")]
    Http { status: u16, body: String },
    #[error("decode_failed:{message}")]
    Decode { message: String },
}

impl PageError {
    pub(crate) fn missing(selector: impl Into<String>) -> Self {
        Self::ElementMissing {
            selector: selector.into(),
        }
    }
}

/// What an edit of one control asks the page to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlEvent {
    CaseSelected,
    HostPrefixEdited,
    ControlPlaneUrlChanged,
    AppFileChosen,
    SaveSettingsToggled,
    FieldEdited(FieldKind),
    Ignored,
}

/// Maps a DOM `input`/`change` event on control `id` to a page action.
pub(crate) fn classify_control(form: &FormState, id: &str, event_type: &str) -> ControlEvent {
    match (id, event_type) {
        (fields::GUI_AUTO_CASE, "change") => ControlEvent::CaseSelected,
        (fields::DP_HOST_PREFIX, "input") => ControlEvent::HostPrefixEdited,
        (fields::TIBCOP_CLI_CPURL, "change") => ControlEvent::ControlPlaneUrlChanged,
        (fields::APP_FILE, "change") => ControlEvent::AppFileChosen,
        (fields::SAVE_CLI_SETTING, "change") => ControlEvent::SaveSettingsToggled,
        _ => form
            .kind(id)
            .map_or(ControlEvent::Ignored, ControlEvent::FieldEdited),
    }
}

/// Class selector of the row wrapping a field's label and control.
pub(crate) fn field_row_selector(field: &str) -> String {
    format!(".{field}")
}

pub(crate) fn display_value(visible: bool) -> &'static str {
    if visible {
        DISPLAY_VISIBLE
    } else {
        DISPLAY_HIDDEN
    }
}

/// Case select each automation form carries; the form element is found
/// from it.
pub(crate) fn case_select_id(kind: FormKind) -> &'static str {
    match kind {
        FormKind::Gui => fields::GUI_AUTO_CASE,
        FormKind::Cli => fields::CLI_AUTO_CASE,
    }
}

pub(crate) fn form_kind_for_case_select(id: &str) -> Option<FormKind> {
    match id {
        fields::GUI_AUTO_CASE => Some(FormKind::Gui),
        fields::CLI_AUTO_CASE => Some(FormKind::Cli),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RunnerSnapshot {
    pub(crate) state: &'static str,
    pub(crate) job_id: Option<String>,
    pub(crate) log_bytes: usize,
}

/// Read-only view of the page session, exported for debugging from the
/// browser console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PageSnapshot {
    pub(crate) env_loaded: bool,
    pub(crate) local_source: bool,
    pub(crate) active_tab: String,
    pub(crate) gui_case: String,
    pub(crate) cli_case: String,
    pub(crate) gui: RunnerSnapshot,
    pub(crate) cli: RunnerSnapshot,
}

impl PageSnapshot {
    pub(crate) fn capture(session: &ConsoleSession) -> Self {
        let runner = |kind| {
            let runner = session.runner(kind);
            RunnerSnapshot {
                state: runner.state().as_str(),
                job_id: runner.job_id().map(ToString::to_string),
                log_bytes: runner.log().len(),
            }
        };
        Self {
            env_loaded: session.env().is_some(),
            local_source: session.local_source_mode(),
            active_tab: session.tabs.active_panel().to_string(),
            gui_case: session.form.text(fields::GUI_AUTO_CASE).to_string(),
            cli_case: session.form.text(fields::CLI_AUTO_CASE).to_string(),
            gui: runner(FormKind::Gui),
            cli: runner(FormKind::Cli),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootstrap_console_core::EnvSnapshot;

    #[test]
    fn special_controls_win_over_plain_edits() {
        let form = FormState::console();
        assert_eq!(
            classify_control(&form, fields::GUI_AUTO_CASE, "change"),
            ControlEvent::CaseSelected
        );
        assert_eq!(
            classify_control(&form, fields::DP_HOST_PREFIX, "input"),
            ControlEvent::HostPrefixEdited
        );
        assert_eq!(
            classify_control(&form, fields::TIBCOP_CLI_CPURL, "change"),
            ControlEvent::ControlPlaneUrlChanged
        );
        assert_eq!(
            classify_control(&form, fields::APP_FILE, "change"),
            ControlEvent::AppFileChosen
        );
        assert_eq!(
            classify_control(&form, fields::SAVE_CLI_SETTING, "change"),
            ControlEvent::SaveSettingsToggled
        );
    }

    #[test]
    fn other_controls_are_mirrored_by_kind() {
        let form = FormState::console();
        assert_eq!(
            classify_control(&form, fields::HEADLESS, "change"),
            ControlEvent::FieldEdited(FieldKind::Checkbox)
        );
        assert_eq!(
            classify_control(&form, fields::TIBCOP_CLI_CPURL, "input"),
            ControlEvent::FieldEdited(FieldKind::Text)
        );
        assert_eq!(
            classify_control(&form, "search-box", "input"),
            ControlEvent::Ignored
        );
    }

    #[test]
    fn selectors_and_targets() {
        assert_eq!(field_row_selector(fields::HEADLESS), ".HEADLESS");
        assert_eq!(display_value(true), "flex");
        assert_eq!(display_value(false), "none");
        for kind in [FormKind::Gui, FormKind::Cli] {
            assert_eq!(form_kind_for_case_select(case_select_id(kind)), Some(kind));
        }
        assert_eq!(form_kind_for_case_select("other"), None);
    }

    #[test]
    fn snapshot_reflects_session() {
        let mut session = ConsoleSession::default();
        session.set_env(EnvSnapshot::from_pairs([(
            fields::TP_AUTO_TASK_FROM_LOCAL_SOURCE,
            "true",
        )]));
        session.tabs.route_fragment("#tab2");
        session
            .runner_mut(FormKind::Cli)
            .begin()
            .expect("idle runner starts");

        let snapshot = PageSnapshot::capture(&session);
        assert!(snapshot.env_loaded);
        assert!(snapshot.local_source);
        assert_eq!(snapshot.active_tab, "tab2");
        assert_eq!(snapshot.gui.state, "idle");
        assert_eq!(snapshot.cli.state, "running");

        let json = serde_json::to_value(&snapshot).expect("serialize snapshot");
        assert_eq!(json["cli"]["log_bytes"], 18);
    }
}
