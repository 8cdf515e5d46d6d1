use super::*;

    fn tab_panels() -> Vec<String> {
        let Ok(document) = document() else {
            return Vec::new();
        };
        let Ok(nodes) = document.query_selector_all(TAB_CONTENT_SELECTOR) else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| element.id())
            .filter(|id| !id.is_empty())
            .collect()
    }

    fn current_fragment() -> String {
        web_sys::window()
            .and_then(|window| window.location().hash().ok())
            .unwrap_or_default()
    }

    pub(super) fn install_tab_routing() -> Result<(), PageError> {
        let window = web_sys::window().ok_or(PageError::WindowUnavailable)?;
        let fragment = current_fragment();
        let active = SESSION.with(|session| {
            let mut session = session.borrow_mut();
            session.tabs = TabRouter::new(tab_panels());
            session
                .tabs
                .route_initial(Some(fragment.as_str()))
                .to_string()
        });
        activate_panel(&active);

        HASH_CHANGE_HANDLER.with(|slot| {
            if slot.borrow().is_some() {
                return;
            }
            let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
                let fragment = current_fragment();
                let active = SESSION
                    .with(|session| session.borrow_mut().tabs.route_fragment(&fragment).to_string());
                activate_panel(&active);
            }));
            let _ = window
                .add_event_listener_with_callback("hashchange", callback.as_ref().unchecked_ref());
            *slot.borrow_mut() = Some(callback);
        });
        Ok(())
    }

    /// Tab click: rewrite the fragment and activate right away, since an
    /// unchanged fragment fires no hashchange.
    pub(super) fn select_tab(panel: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.location().set_hash(panel);
        }
        let active =
            SESSION.with(|session| session.borrow_mut().tabs.route_fragment(panel).to_string());
        activate_panel(&active);
    }

    fn activate_panel(panel: &str) {
        let Ok(document) = document() else {
            return;
        };
        let target = format!("#{panel}");
        for selector in [TAB_BUTTON_SELECTOR, TAB_CONTENT_SELECTOR] {
            let Ok(nodes) = document.query_selector_all(selector) else {
                continue;
            };
            for element in (0..nodes.length())
                .filter_map(|index| nodes.item(index))
                .filter_map(|node| node.dyn_into::<Element>().ok())
            {
                let active = if selector == TAB_BUTTON_SELECTOR {
                    element.get_attribute(TAB_TARGET_ATTRIBUTE).as_deref() == Some(target.as_str())
                } else {
                    element.id() == panel
                };
                let _ = element.class_list().toggle_with_force(ACTIVE_CLASS, active);
            }
        }
    }
