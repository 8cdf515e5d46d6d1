//! URL-fragment tab routing.
//!
//! The fragment is the single source of truth: a tab click only rewrites the
//! fragment and the fragment-change notification activates the panel.

pub const DEFAULT_PANEL: &str = "tab1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabRouter {
    panels: Vec<String>,
    active: String,
}

impl TabRouter {
    /// Router over `panels`; the first panel is the fallback. An empty list
    /// falls back to [`DEFAULT_PANEL`].
    #[must_use]
    pub fn new<I, S>(panels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut panels: Vec<String> = panels.into_iter().map(Into::into).collect();
        if panels.is_empty() {
            panels.push(DEFAULT_PANEL.to_string());
        }
        let active = panels[0].clone();
        Self { panels, active }
    }

    #[must_use]
    pub fn panels(&self) -> &[String] {
        &self.panels
    }

    #[must_use]
    pub fn active_panel(&self) -> &str {
        &self.active
    }

    #[must_use]
    pub fn is_active(&self, panel: &str) -> bool {
        self.active == panel
    }

    #[must_use]
    pub fn has_panel(&self, panel: &str) -> bool {
        self.panels.iter().any(|candidate| candidate == panel)
    }

    fn first_panel(&self) -> &str {
        self.panels.first().map_or(DEFAULT_PANEL, String::as_str)
    }

    /// Activates the panel a fragment names, or the first panel when the
    /// fragment is empty or names nothing. Returns the active panel.
    pub fn route_fragment(&mut self, fragment: &str) -> &str {
        let panel = panel_from_fragment(fragment);
        let next = if self.has_panel(panel) {
            panel.to_string()
        } else {
            self.first_panel().to_string()
        };
        self.active = next;
        &self.active
    }

    /// Routing on page load.
    pub fn route_initial(&mut self, fragment: Option<&str>) -> &str {
        self.route_fragment(fragment.unwrap_or_default())
    }

    /// Fragment a tab control's `#target` should write. The active panel is
    /// unchanged until the fragment change is routed.
    #[must_use]
    pub fn click_target(target: &str) -> String {
        panel_from_fragment(target).to_string()
    }
}

#[must_use]
pub fn panel_from_fragment(fragment: &str) -> &str {
    fragment.trim().trim_start_matches('#')
}
