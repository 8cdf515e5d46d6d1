use crate::endpoints::FormKind;
use crate::env::EnvSnapshot;
use crate::fields;
use crate::form::FormState;
use crate::mirror;
use crate::runner::ScriptRunner;
use crate::tabs::TabRouter;
use crate::visibility::{VisibilityPlan, baseline_visibility, compute_visibility};

/// Everything one console page owns for its lifetime: the environment
/// snapshot, the form, one runner per automation form and the tab router.
#[derive(Debug, Clone)]
pub struct ConsoleSession {
    env: Option<EnvSnapshot>,
    pub form: FormState,
    gui: ScriptRunner,
    cli: ScriptRunner,
    pub tabs: TabRouter,
}

impl Default for ConsoleSession {
    fn default() -> Self {
        Self::new(TabRouter::new(["tab1", "tab2"]))
    }
}

impl ConsoleSession {
    #[must_use]
    pub fn new(tabs: TabRouter) -> Self {
        Self {
            env: None,
            form: FormState::console(),
            gui: ScriptRunner::default(),
            cli: ScriptRunner::default(),
            tabs,
        }
    }

    #[must_use]
    pub fn env(&self) -> Option<&EnvSnapshot> {
        self.env.as_ref()
    }

    #[must_use]
    pub fn local_source_mode(&self) -> bool {
        self.env.as_ref().is_some_and(EnvSnapshot::local_source_mode)
    }

    /// Stores the snapshot, hydrates the form from it and returns the
    /// baseline visibility it implies.
    pub fn set_env(&mut self, env: EnvSnapshot) -> VisibilityPlan {
        let applied = env.hydrate(&mut self.form);
        tracing::debug!(fields = applied, "hydrated form from environment");
        self.env = Some(env);
        baseline_visibility(self.local_source_mode())
    }

    #[must_use]
    pub fn runner(&self, kind: FormKind) -> &ScriptRunner {
        match kind {
            FormKind::Gui => &self.gui,
            FormKind::Cli => &self.cli,
        }
    }

    pub fn runner_mut(&mut self, kind: FormKind) -> &mut ScriptRunner {
        match kind {
            FormKind::Gui => &mut self.gui,
            FormKind::Cli => &mut self.cli,
        }
    }

    /// Selects a GUI case and returns the plan to apply. Create-app cases
    /// also clear the chosen app file.
    pub fn select_case(&mut self, case: &str) -> VisibilityPlan {
        self.form.set_text(fields::GUI_AUTO_CASE, case);
        let plan = compute_visibility(case, self.local_source_mode());
        if plan.reset_app_name().is_some() {
            mirror::reset_app_file(&mut self.form, self.env.as_ref());
        }
        plan
    }

    /// Host-prefix input handler. A no-op until the environment is loaded.
    pub fn host_prefix_changed(&mut self, prefix: &str) -> bool {
        self.form.set_text(fields::DP_HOST_PREFIX, prefix);
        match self.env.as_ref() {
            Some(env) => mirror::mirror_host_prefix(&mut self.form, env, prefix),
            None => false,
        }
    }

    /// Drops the snapshot, the form and both runners' state, as a page reload
    /// would. The tab router keeps its panels and returns to the first one.
    pub fn reset(&mut self) {
        let panels = self.tabs.panels().to_vec();
        *self = Self::new(TabRouter::new(panels));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CREATE_BW5CE_APP_CASE;
    use crate::runner::RunnerState;

    fn env() -> EnvSnapshot {
        EnvSnapshot::from_pairs([
            (fields::TP_AUTO_TASK_FROM_LOCAL_SOURCE, "true"),
            (fields::BW5CE_APP_NAME, "bw5ce-default"),
            (fields::TP_AUTO_LOGIN_URL, "https://admin.example.com/login"),
            (fields::DP_USER_EMAIL, "ops@example.com"),
        ])
    }

    #[test]
    fn forms_own_independent_runners() {
        let mut session = ConsoleSession::default();
        if let Err(error) = session.runner_mut(FormKind::Gui).begin() {
            panic!("begin failed: {error}");
        }
        assert_eq!(session.runner(FormKind::Gui).state(), RunnerState::Running);
        assert_eq!(session.runner(FormKind::Cli).state(), RunnerState::Idle);
        assert!(session.runner_mut(FormKind::Cli).begin().is_ok());
    }

    #[test]
    fn env_drives_hydration_and_baseline() {
        let mut session = ConsoleSession::default();
        let plan = session.set_env(env());
        assert!(session.local_source_mode());
        assert_eq!(plan.display(fields::HEADLESS), None);
        assert_eq!(session.form.text(fields::BW5CE_APP_NAME), "bw5ce-default");
    }

    #[test]
    fn create_case_selection_resets_app_file() {
        let mut session = ConsoleSession::default();
        session.set_env(env());
        session.form.set_text(fields::GUI_AUTO_CASE, CREATE_BW5CE_APP_CASE);
        mirror::choose_app_file(&mut session.form, "legacy_app.ear");
        assert_eq!(session.form.text(fields::BW5CE_APP_NAME), "legacy-app");

        let plan = session.select_case(CREATE_BW5CE_APP_CASE);
        assert!(plan.is_visible(fields::BW5CE_APP_NAME));
        assert_eq!(session.form.text(fields::APP_FILE), "");
        assert_eq!(session.form.text(fields::BW5CE_APP_NAME), "bw5ce-default");
    }

    #[test]
    fn host_prefix_needs_env() {
        let mut session = ConsoleSession::default();
        assert!(!session.host_prefix_changed("dp2"));
        session.set_env(env());
        assert!(session.host_prefix_changed("dp2"));
        assert_eq!(session.form.text(fields::DP_USER_EMAIL), "dp2@example.com");
    }

    #[test]
    fn reset_clears_everything_but_panels() {
        let mut session = ConsoleSession::new(TabRouter::new(["tab1", "tab2", "tab3"]));
        session.set_env(env());
        session.tabs.route_fragment("#tab3");
        if let Err(error) = session.runner_mut(FormKind::Cli).begin() {
            panic!("begin failed: {error}");
        }

        session.reset();
        assert!(session.env().is_none());
        assert_eq!(session.runner(FormKind::Cli).state(), RunnerState::Idle);
        assert_eq!(session.tabs.active_panel(), "tab1");
        assert_eq!(session.tabs.panels().len(), 3);
        assert_eq!(session.form.text(fields::BW5CE_APP_NAME), "");
    }
}
