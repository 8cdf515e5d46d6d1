pub(crate) const LOADING_SELECTOR: &str = ".is_loading";
pub(crate) const LOADING_DISPLAY: &str = "block";
pub(crate) const TAB_BUTTON_SELECTOR: &str = ".tab-button";
pub(crate) const TAB_CONTENT_SELECTOR: &str = ".tab-content";
pub(crate) const TAB_TARGET_ATTRIBUTE: &str = "data-target";
pub(crate) const ACTIVE_CLASS: &str = "active";
pub(crate) const FORM_SELECTOR: &str = "form";
pub(crate) const CASE_SELECT_SELECTOR: &str = "#guiAutoCase, #cliAutoCase";
pub(crate) const OUTPUT_SELECTOR: &str = ".output";
pub(crate) const LOGS_SELECTOR: &str = ".logs";
pub(crate) const RUN_BUTTON_SELECTOR: &str = ".runBtn";
pub(crate) const STOP_BUTTON_SELECTOR: &str = ".stopBtn";
pub(crate) const HIGHLIGHTER_GLOBAL: &str = "Prism";
pub(crate) const HIGHLIGHT_FUNCTION: &str = "highlightElement";
