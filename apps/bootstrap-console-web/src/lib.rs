#[cfg(any(target_arch = "wasm32", test))]
mod page;
#[cfg(target_arch = "wasm32")]
mod wasm_constants;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use bootstrap_console_core::endpoints::{ENV_PATH, UPLOAD_FIELD, UPLOAD_PATH};
    use bootstrap_console_core::endpoints::{run_script_path, stop_script_path};
    use bootstrap_console_core::form::{json_is_true, json_to_text};
    use bootstrap_console_core::mirror::{choose_app_file, normalize_cli_control_plane_url};
    use bootstrap_console_core::params::case_uploads_app_file;
    use bootstrap_console_core::runner::HIGHLIGHT_DEBOUNCE_MS;
    use bootstrap_console_core::settings::{load_cli_settings, save_cli_settings};
    use bootstrap_console_core::{
        CancelToken, ConsoleSession, EnvSnapshot, FieldValue, FormKind, JOB_ID_HEADER,
        SettingsError, SettingsStore, StopResponse, TabRouter, UploadOutcome, VisibilityPlan,
        assemble_cli_params, assemble_gui_params, consume_stream, fields,
    };
    use futures_util::StreamExt;
    use futures_util::stream::LocalBoxStream;
    use gloo_net::http::Request;
    use gloo_timers::callback::Timeout;
    use serde_json::Value;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::{JsFuture, spawn_local};
    use web_sys::{
        Element, HtmlButtonElement, HtmlElement, HtmlInputElement, HtmlSelectElement,
        HtmlTextAreaElement,
    };

    use crate::page::{
        ControlEvent, PageError, PageSnapshot, case_select_id, classify_control, display_value,
        field_row_selector, form_kind_for_case_select,
    };
    use crate::wasm_constants::*;

    mod dom;
    mod network;
    mod routing;
    mod storage;

    use dom::*;
    use network::*;
    use routing::*;
    use storage::*;

    type ChunkStream = LocalBoxStream<'static, Result<Vec<u8>, PageError>>;

    thread_local! {
        static SESSION: RefCell<ConsoleSession> = RefCell::new(ConsoleSession::default());
        static HIGHLIGHT_TIMERS: RefCell<HashMap<FormKind, Timeout>> = RefCell::new(HashMap::new());
        static CONTROL_INPUT_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static CONTROL_CHANGE_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static PAGE_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static HASH_CHANGE_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        spawn_local(async {
            if let Err(error) = boot().await {
                log_error(&format!("bootstrap console failed to start: {error}"));
            }
        });
    }

    #[wasm_bindgen]
    pub fn page_state_json() -> String {
        SESSION.with(|session| {
            serde_json::to_string(&PageSnapshot::capture(&session.borrow()))
                .unwrap_or_else(|_| "{}".to_string())
        })
    }

    async fn boot() -> Result<(), PageError> {
        install_control_handlers()?;
        install_tab_routing()?;

        set_loading(true);
        let loaded = fetch_env().await;
        set_loading(false);
        match loaded {
            Ok(env) => {
                apply_values(env.iter());
                let plan = SESSION.with(|session| session.borrow_mut().set_env(env));
                apply_visibility(&plan);
            }
            Err(error) => log_error(&format!("environment defaults unavailable: {error}")),
        }

        restore_cli_settings();
        for kind in [FormKind::Gui, FormKind::Cli] {
            render_runner(kind);
        }
        Ok(())
    }

    fn on_control_event(event: &web_sys::Event) {
        let Some(element) = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
        else {
            return;
        };
        let id = element.id();
        let event_type = event.type_();
        let action =
            SESSION.with(|session| classify_control(&session.borrow().form, &id, &event_type));

        match action {
            ControlEvent::Ignored => {}
            ControlEvent::FieldEdited(_) => sync_control(&id),
            ControlEvent::CaseSelected => {
                sync_control(&id);
                let plan = SESSION.with(|session| {
                    let mut session = session.borrow_mut();
                    let case = session.form.text(fields::GUI_AUTO_CASE).to_string();
                    session.select_case(&case)
                });
                apply_visibility(&plan);
                if let Some(field) = plan.reset_app_name() {
                    write_form_fields(&[fields::APP_FILE, field]);
                }
            }
            ControlEvent::HostPrefixEdited => {
                sync_control(&id);
                let mirrored = SESSION.with(|session| {
                    let mut session = session.borrow_mut();
                    let prefix = session.form.text(fields::DP_HOST_PREFIX).to_string();
                    session.host_prefix_changed(&prefix)
                });
                if mirrored {
                    write_form_fields(&[fields::TP_AUTO_LOGIN_URL, fields::DP_USER_EMAIL]);
                }
            }
            ControlEvent::ControlPlaneUrlChanged => {
                sync_control(&id);
                let trimmed = SESSION
                    .with(|session| normalize_cli_control_plane_url(&mut session.borrow_mut().form));
                if trimmed {
                    write_form_fields(&[fields::TIBCOP_CLI_CPURL]);
                }
            }
            ControlEvent::AppFileChosen => {
                sync_control(&id);
                let filled = SESSION.with(|session| {
                    let mut session = session.borrow_mut();
                    let path = session.form.text(fields::APP_FILE).to_string();
                    choose_app_file(&mut session.form, &path)
                });
                if let Some(field) = filled {
                    write_form_fields(&[field]);
                }
            }
            ControlEvent::SaveSettingsToggled => {
                sync_control(&id);
                persist_cli_settings();
            }
        }
    }

    fn on_page_click(event: &web_sys::Event) {
        let Some(element) = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
        else {
            return;
        };

        if let Ok(Some(button)) = element.closest(TAB_BUTTON_SELECTOR) {
            let target = button.get_attribute(TAB_TARGET_ATTRIBUTE).unwrap_or_default();
            let panel = TabRouter::click_target(&target);
            if !panel.is_empty() {
                event.prevent_default();
                select_tab(&panel);
            }
            return;
        }
        let run_button = element.closest(RUN_BUTTON_SELECTOR).ok().flatten();
        if let Some(kind) = run_button.as_ref().and_then(owning_form_kind) {
            event.prevent_default();
            start_run(kind);
            return;
        }
        let stop_button = element.closest(STOP_BUTTON_SELECTOR).ok().flatten();
        if let Some(kind) = stop_button.as_ref().and_then(owning_form_kind) {
            event.prevent_default();
            start_stop(kind);
        }
    }

    fn start_run(kind: FormKind) {
        spawn_local(async move {
            if let Err(error) = run_form(kind).await {
                log_error(&format!("{} script failed: {error}", kind.as_str()));
            }
        });
    }

    fn start_stop(kind: FormKind) {
        spawn_local(async move {
            stop_form(kind).await;
        });
    }

    async fn run_form(kind: FormKind) -> Result<(), PageError> {
        sync_form_from_dom();
        let ticket = match SESSION.with(|session| session.borrow_mut().runner_mut(kind).begin()) {
            Ok(ticket) => ticket,
            Err(error) => {
                log_info(&format!("{} run ignored: {error}", kind.as_str()));
                return Ok(());
            }
        };
        render_runner(kind);
        if kind == FormKind::Cli {
            persist_cli_settings();
        }

        let (job_id, body) = match start_form_script(kind, &ticket.cancel).await {
            Ok(Some(started)) => started,
            Ok(None) => {
                log_info(&format!("{} run stopped before the script started", kind.as_str()));
                return Ok(());
            }
            Err(error) => {
                SESSION.with(|session| {
                    session
                        .borrow_mut()
                        .runner_mut(kind)
                        .fail(ticket.seq, &error.to_string());
                });
                render_runner(kind);
                highlight_output(kind);
                return Err(error);
            }
        };
        SESSION.with(|session| {
            session
                .borrow_mut()
                .runner_mut(kind)
                .attach_job(ticket.seq, job_id);
        });

        let outcome = consume_stream(body, &ticket.cancel, |bytes| {
            let appended = SESSION.with(|session| {
                session
                    .borrow_mut()
                    .runner_mut(kind)
                    .push_chunk(ticket.seq, bytes)
            });
            if appended.is_some_and(|text| !text.is_empty()) {
                render_runner(kind);
                schedule_highlight(kind);
            }
        })
        .await;

        SESSION.with(|session| {
            session
                .borrow_mut()
                .runner_mut(kind)
                .apply_outcome(ticket.seq, &outcome);
        });
        render_runner(kind);
        highlight_output(kind);
        Ok(())
    }

    /// Uploads when needed and starts the script. `None` when a stop landed
    /// first; a job started while the stop was in flight is stopped again.
    async fn start_form_script(
        kind: FormKind,
        cancel: &CancelToken,
    ) -> Result<Option<(Option<String>, ChunkStream)>, PageError> {
        let upload = match kind {
            FormKind::Gui => upload_selected_app_file().await?,
            FormKind::Cli => None,
        };
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let path = SESSION.with(|session| {
            let session = session.borrow();
            let params = match kind {
                FormKind::Gui => assemble_gui_params(&session.form, upload.as_ref()),
                FormKind::Cli => assemble_cli_params(&session.form),
            };
            run_script_path(kind, &params)
        });
        let (job_id, body) = start_script(&path).await?;
        if !cancel.is_cancelled() {
            return Ok(Some((job_id, body)));
        }
        let Some(job_id) = job_id else {
            return Ok(None);
        };
        if let Err(error) = stop_script(Some(&job_id)).await {
            log_error(&format!("{} job {job_id} left running: {error}", kind.as_str()));
        }
        Ok(None)
    }

    async fn upload_selected_app_file() -> Result<Option<UploadOutcome>, PageError> {
        let uploads = SESSION.with(|session| {
            case_uploads_app_file(session.borrow().form.text(fields::GUI_AUTO_CASE))
        });
        if !uploads {
            return Ok(None);
        }
        let Some(file) = selected_app_file() else {
            return Ok(None);
        };
        let outcome = upload_app_file(&file).await?;
        log_info(&format!(
            "app file uploaded: {}",
            outcome.filename.as_deref().unwrap_or("<not stored>")
        ));
        Ok(Some(outcome))
    }

    async fn stop_form(kind: FormKind) {
        let job_id = SESSION.with(|session| session.borrow_mut().runner_mut(kind).request_stop());
        render_runner(kind);
        match stop_script(job_id.as_deref()).await {
            Ok(response) => SESSION.with(|session| {
                session
                    .borrow_mut()
                    .runner_mut(kind)
                    .stop_acknowledged(&response.message);
            }),
            Err(error) => {
                log_error(&format!("{} stop failed: {error}", kind.as_str()));
                SESSION.with(|session| {
                    session
                        .borrow_mut()
                        .runner_mut(kind)
                        .stop_failed(&error.to_string());
                });
            }
        }
        render_runner(kind);
        highlight_output(kind);
    }

    fn owning_form_kind(element: &Element) -> Option<FormKind> {
        let form = element.closest(FORM_SELECTOR).ok().flatten()?;
        let select = form.query_selector(CASE_SELECT_SELECTOR).ok().flatten()?;
        form_kind_for_case_select(&select.id())
    }

    pub(super) fn log_error(message: &str) {
        web_sys::console::error_1(&JsValue::from_str(message));
    }

    pub(super) fn log_info(message: &str) {
        web_sys::console::info_1(&JsValue::from_str(message));
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::page_state_json;

#[cfg(not(target_arch = "wasm32"))]
pub fn page_state_json() -> String {
    "{\"phase\":\"native\",\"detail\":\"page state only available on wasm\"}".to_string()
}
