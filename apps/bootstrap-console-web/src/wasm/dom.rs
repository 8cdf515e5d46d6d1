use super::*;

    pub(super) fn document() -> Result<web_sys::Document, PageError> {
        web_sys::window()
            .and_then(|window| window.document())
            .ok_or(PageError::WindowUnavailable)
    }

    fn elements(selector: &str) -> Vec<HtmlElement> {
        let Ok(document) = document() else {
            return Vec::new();
        };
        let Ok(nodes) = document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
            .collect()
    }

    pub(super) fn install_control_handlers() -> Result<(), PageError> {
        let document = document()?;
        for (event_name, slot) in [
            ("input", &CONTROL_INPUT_HANDLER),
            ("change", &CONTROL_CHANGE_HANDLER),
        ] {
            slot.with(|slot| {
                if slot.borrow().is_some() {
                    return;
                }
                let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event| {
                    on_control_event(&event);
                }));
                let _ = document
                    .add_event_listener_with_callback(event_name, callback.as_ref().unchecked_ref());
                *slot.borrow_mut() = Some(callback);
            });
        }

        PAGE_CLICK_HANDLER.with(|slot| {
            if slot.borrow().is_some() {
                return;
            }
            let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event| {
                on_page_click(&event);
            }));
            let _ = document.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref());
            *slot.borrow_mut() = Some(callback);
        });
        Ok(())
    }

    pub(super) fn set_loading(loading: bool) {
        let display = if loading { LOADING_DISPLAY } else { "none" };
        for element in elements(LOADING_SELECTOR) {
            let _ = element.style().set_property("display", display);
        }
    }

    pub(super) fn apply_visibility(plan: &VisibilityPlan) {
        for (field, visible) in plan.entries() {
            for row in elements(&field_row_selector(field)) {
                let _ = row.style().set_property("display", display_value(visible));
            }
        }
    }

    /// Writes values into the controls with matching ids. Inputs get their
    /// value or checked state, other elements their text content.
    pub(super) fn apply_values<'a>(values: impl Iterator<Item = (&'a str, &'a Value)>) {
        let Ok(document) = document() else {
            return;
        };
        for (id, value) in values {
            if let Some(element) = document.get_element_by_id(id) {
                write_control(&element, value);
            }
        }
    }

    fn write_control(element: &Element, value: &Value) {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            match input.type_().as_str() {
                "checkbox" => input.set_checked(json_is_true(value)),
                // Browsers only accept clearing a file input.
                "file" => {
                    if json_to_text(value).is_empty() {
                        input.set_value("");
                    }
                }
                _ => input.set_value(&json_to_text(value)),
            }
        } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            select.set_value(&json_to_text(value));
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(&json_to_text(value));
        } else {
            element.set_text_content(Some(&json_to_text(value)));
        }
    }

    fn read_control(id: &str) -> Option<FieldValue> {
        let element = document().ok()?.get_element_by_id(id)?;
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            return Some(if input.type_() == "checkbox" {
                FieldValue::Checked(input.checked())
            } else {
                FieldValue::Text(input.value())
            });
        }
        if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            return Some(FieldValue::Text(select.value()));
        }
        element
            .dyn_ref::<HtmlTextAreaElement>()
            .map(|area| FieldValue::Text(area.value()))
    }

    /// Copies one control's current DOM value into the session form.
    pub(super) fn sync_control(id: &str) {
        let Some(value) = read_control(id) else {
            return;
        };
        SESSION.with(|session| {
            let mut session = session.borrow_mut();
            match value {
                FieldValue::Text(text) => session.form.set_text(id, text),
                FieldValue::Checked(checked) => session.form.set_checked(id, checked),
            };
        });
    }

    pub(super) fn sync_form_from_dom() {
        let ids: Vec<String> = SESSION.with(|session| {
            session
                .borrow()
                .form
                .fields()
                .map(|(id, _)| id.to_string())
                .collect()
        });
        for id in ids {
            sync_control(&id);
        }
    }

    /// Pushes session form values back into their controls.
    pub(super) fn write_form_fields(ids: &[&str]) {
        let values: Vec<(String, Value)> = SESSION.with(|session| {
            let session = session.borrow();
            ids.iter()
                .filter_map(|id| {
                    session
                        .form
                        .value(id)
                        .map(|value| ((*id).to_string(), value.to_json()))
                })
                .collect()
        });
        apply_values(values.iter().map(|(id, value)| (id.as_str(), value)));
    }

    pub(super) fn selected_app_file() -> Option<web_sys::File> {
        document()
            .ok()?
            .get_element_by_id(fields::APP_FILE)?
            .dyn_into::<HtmlInputElement>()
            .ok()?
            .files()?
            .get(0)
    }

    fn form_element(kind: FormKind) -> Result<Element, PageError> {
        let select_id = case_select_id(kind);
        document()?
            .get_element_by_id(select_id)
            .and_then(|select| select.closest(FORM_SELECTOR).ok().flatten())
            .ok_or_else(|| PageError::missing(format!("#{select_id}")))
    }

    fn set_disabled(element: &Element, disabled: bool) {
        if let Some(button) = element.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_disabled(disabled);
        } else if disabled {
            let _ = element.set_attribute("disabled", "");
        } else {
            let _ = element.remove_attribute("disabled");
        }
    }

    /// Shows the runner's log in the form's output and matches the run and
    /// stop buttons to its state.
    pub(super) fn render_runner(kind: FormKind) {
        let Ok(form) = form_element(kind) else {
            return;
        };
        let (log, controls) = SESSION.with(|session| {
            let session = session.borrow();
            let runner = session.runner(kind);
            (runner.log().to_string(), runner.controls())
        });
        if let Ok(Some(output)) = form.query_selector(OUTPUT_SELECTOR) {
            output.set_text_content(Some(&log));
        }
        if let Ok(Some(run_button)) = form.query_selector(RUN_BUTTON_SELECTOR) {
            set_disabled(&run_button, !controls.run_enabled);
        }
        if let Ok(Some(stop_button)) = form.query_selector(STOP_BUTTON_SELECTOR) {
            set_disabled(&stop_button, !controls.stop_enabled);
        }
    }

    /// Highlights after output settles; a newer chunk cancels the pending pass.
    pub(super) fn schedule_highlight(kind: FormKind) {
        let timeout = Timeout::new(HIGHLIGHT_DEBOUNCE_MS, move || highlight_output(kind));
        HIGHLIGHT_TIMERS.with(|timers| {
            timers.borrow_mut().insert(kind, timeout);
        });
    }

    pub(super) fn highlight_output(kind: FormKind) {
        let Ok(form) = form_element(kind) else {
            return;
        };
        if let Ok(Some(output)) = form.query_selector(OUTPUT_SELECTOR) {
            highlight_element(&output);
        }
        if let Ok(Some(logs)) = form.query_selector(LOGS_SELECTOR) {
            logs.set_scroll_top(logs.scroll_height());
        }
    }

    fn highlight_element(element: &Element) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Ok(highlighter) = js_sys::Reflect::get(&window, &JsValue::from_str(HIGHLIGHTER_GLOBAL))
        else {
            return;
        };
        if highlighter.is_undefined() || highlighter.is_null() {
            return;
        }
        let Ok(function) =
            js_sys::Reflect::get(&highlighter, &JsValue::from_str(HIGHLIGHT_FUNCTION))
        else {
            return;
        };
        if let Some(function) = function.dyn_ref::<js_sys::Function>() {
            let _ = function.call1(&highlighter, element);
        }
    }
