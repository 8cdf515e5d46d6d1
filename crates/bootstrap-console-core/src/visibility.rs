//! Case-driven field visibility.
//!
//! The page starts from a baseline where every optional field row is hidden,
//! then each case reveals the rows its script reads. Computing the plan is a
//! pure lookup over [`CASE_FIELD_RULES`]; front ends apply the plan to their
//! own widgets.

use std::collections::BTreeMap;

use crate::fields::{
    APP_FILE, BW5CE_APP_NAME, BWCE_APP_NAME, CP_ADMIN_EMAIL, CP_ADMIN_PASSWORD, DP_HOST_PREFIX,
    FLOGO_APP_NAME, GITHUB_TOKEN, HEADLESS, IS_CLEAN_REPORT, TP_ACTIVATION_SERVER_CERT_HOSTNAME,
    TP_ACTIVATION_SERVER_FINGER_PRINT, TP_ACTIVATION_SERVER_IP, TP_ACTIVATION_SERVER_PORT,
    TP_AUTO_ADMIN_URL, TP_AUTO_DATA_PLANE_O11Y_SYSTEM_CONFIG, TP_AUTO_K8S_BMDP_NAME,
    TP_AUTO_K8S_DP_NAME, TP_AUTO_K8S_DP_SERVICE_ACCOUNT_CREATION_ADDITIONAL_SETTINGS,
    TP_AUTO_KUBECONFIG, TP_AUTO_LOGIN_URL, TP_AUTO_MAIL_URL, TP_AUTO_TOKEN_NAME,
    TP_BMDP_IMAGE_TAG_BW5EMSDM, TP_BMDP_IMAGE_TAG_BW5RVDM, TP_BMDP_IMAGE_TAG_BW6DM,
    TP_BMDP_IMAGE_TAG_EMS,
};

/// Optional field rows hidden until a case asks for them.
pub const OPTIONAL_FIELDS: [&str; 22] = [
    TP_AUTO_ADMIN_URL,
    CP_ADMIN_EMAIL,
    CP_ADMIN_PASSWORD,
    DP_HOST_PREFIX,
    TP_AUTO_MAIL_URL,
    TP_AUTO_TOKEN_NAME,
    TP_AUTO_K8S_BMDP_NAME,
    TP_AUTO_DATA_PLANE_O11Y_SYSTEM_CONFIG,
    TP_AUTO_K8S_DP_SERVICE_ACCOUNT_CREATION_ADDITIONAL_SETTINGS,
    BWCE_APP_NAME,
    BW5CE_APP_NAME,
    FLOGO_APP_NAME,
    APP_FILE,
    GITHUB_TOKEN,
    TP_ACTIVATION_SERVER_IP,
    TP_ACTIVATION_SERVER_PORT,
    TP_ACTIVATION_SERVER_CERT_HOSTNAME,
    TP_ACTIVATION_SERVER_FINGER_PRINT,
    TP_BMDP_IMAGE_TAG_EMS,
    TP_BMDP_IMAGE_TAG_BW5EMSDM,
    TP_BMDP_IMAGE_TAG_BW5RVDM,
    TP_BMDP_IMAGE_TAG_BW6DM,
];

/// Rows that only make sense when tasks run from a local checkout.
pub const LOCAL_SOURCE_FIELDS: [&str; 3] = [TP_AUTO_KUBECONFIG, IS_CLEAN_REPORT, HEADLESS];

/// Rows revealed for every case before the case rule runs.
pub const COMMON_FIELDS: [&str; 2] = [TP_AUTO_LOGIN_URL, TP_AUTO_K8S_DP_NAME];

const BMDP_CREATE_BW5DM_FIELDS: [&str; 10] = [
    TP_AUTO_K8S_BMDP_NAME,
    GITHUB_TOKEN,
    TP_ACTIVATION_SERVER_IP,
    TP_ACTIVATION_SERVER_PORT,
    TP_ACTIVATION_SERVER_CERT_HOSTNAME,
    TP_ACTIVATION_SERVER_FINGER_PRINT,
    TP_BMDP_IMAGE_TAG_EMS,
    TP_BMDP_IMAGE_TAG_BW5EMSDM,
    TP_BMDP_IMAGE_TAG_BW5RVDM,
    TP_BMDP_IMAGE_TAG_BW6DM,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseFieldRule {
    pub case: &'static str,
    pub reveal: &'static [&'static str],
    pub hide: &'static [&'static str],
    /// App-name field restored from the environment when the case is picked;
    /// the chosen app file is cleared at the same time.
    pub reset_app_name: Option<&'static str>,
}

const fn rule(
    case: &'static str,
    reveal: &'static [&'static str],
    hide: &'static [&'static str],
) -> CaseFieldRule {
    CaseFieldRule {
        case,
        reveal,
        hide,
        reset_app_name: None,
    }
}

const fn create_app_rule(
    case: &'static str,
    reveal: &'static [&'static str],
    app_name: &'static str,
) -> CaseFieldRule {
    CaseFieldRule {
        case,
        reveal,
        hide: &[],
        reset_app_name: Some(app_name),
    }
}

pub const CASE_FIELD_RULES: &[CaseFieldRule] = &[
    rule(
        "page_env",
        &[
            TP_AUTO_ADMIN_URL,
            CP_ADMIN_EMAIL,
            CP_ADMIN_PASSWORD,
            TP_AUTO_MAIL_URL,
        ],
        &[TP_AUTO_K8S_DP_NAME],
    ),
    rule("page_token", &[TP_AUTO_TOKEN_NAME], &[TP_AUTO_K8S_DP_NAME]),
    rule(
        "page_auth",
        &[
            TP_AUTO_ADMIN_URL,
            CP_ADMIN_EMAIL,
            CP_ADMIN_PASSWORD,
            DP_HOST_PREFIX,
            TP_AUTO_MAIL_URL,
        ],
        &[TP_AUTO_LOGIN_URL, TP_AUTO_K8S_DP_NAME],
    ),
    rule("page_o11y", &[TP_AUTO_K8S_BMDP_NAME], &[]),
    rule(
        "case.create_global_config",
        &[TP_AUTO_DATA_PLANE_O11Y_SYSTEM_CONFIG],
        &[TP_AUTO_K8S_DP_NAME],
    ),
    rule(
        "case.k8s_config_dp_o11y",
        &[TP_AUTO_DATA_PLANE_O11Y_SYSTEM_CONFIG],
        &[],
    ),
    rule(
        "case.k8s_create_dp",
        &[TP_AUTO_K8S_DP_SERVICE_ACCOUNT_CREATION_ADDITIONAL_SETTINGS],
        &[],
    ),
    create_app_rule(
        "case.k8s_create_and_start_bwce_app",
        &[BWCE_APP_NAME, APP_FILE],
        BWCE_APP_NAME,
    ),
    create_app_rule(
        "case.k8s_create_and_start_bw5ce_app",
        &[BW5CE_APP_NAME, APP_FILE],
        BW5CE_APP_NAME,
    ),
    create_app_rule(
        "case.k8s_create_and_start_flogo_app",
        &[FLOGO_APP_NAME, APP_FILE],
        FLOGO_APP_NAME,
    ),
    rule("delete_bwce_app", &[BWCE_APP_NAME], &[]),
    rule("delete_bw5ce_app", &[BW5CE_APP_NAME], &[]),
    rule("delete_flogo_app", &[FLOGO_APP_NAME], &[]),
    rule(
        "case.bmdp_create_dp",
        &[
            TP_AUTO_K8S_BMDP_NAME,
            TP_AUTO_K8S_DP_SERVICE_ACCOUNT_CREATION_ADDITIONAL_SETTINGS,
        ],
        &[TP_AUTO_K8S_DP_NAME],
    ),
    rule(
        "case.bmdp_delete_dp",
        &[TP_AUTO_K8S_BMDP_NAME],
        &[TP_AUTO_K8S_DP_NAME],
    ),
    rule(
        "case.bmdp_config_dp_o11y",
        &[TP_AUTO_K8S_BMDP_NAME, TP_AUTO_DATA_PLANE_O11Y_SYSTEM_CONFIG],
        &[TP_AUTO_K8S_DP_NAME],
    ),
    rule(
        "case.bmdp_create_bw5dm",
        &BMDP_CREATE_BW5DM_FIELDS,
        &[TP_AUTO_K8S_DP_NAME],
    ),
    rule(
        "case.bmdp_provision_capability",
        &[TP_AUTO_K8S_BMDP_NAME],
        &[TP_AUTO_K8S_DP_NAME],
    ),
    rule(
        "case.bmdp_delete_bw5dm",
        &[],
        &[TP_AUTO_K8S_BMDP_NAME, TP_AUTO_K8S_DP_NAME],
    ),
];

#[must_use]
pub fn case_rule(case: &str) -> Option<&'static CaseFieldRule> {
    CASE_FIELD_RULES.iter().find(|rule| rule.case == case)
}

/// Display decision for every field row the engine manages.
///
/// Rows absent from the plan keep whatever display they already have.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityPlan {
    display: BTreeMap<&'static str, bool>,
    reset_app_name: Option<&'static str>,
}

impl VisibilityPlan {
    fn set_all(&mut self, fields: &[&'static str], visible: bool) {
        for field in fields {
            self.display.insert(*field, visible);
        }
    }

    /// `Some(true)` for revealed rows, `Some(false)` for hidden rows, `None`
    /// for rows the plan leaves alone.
    #[must_use]
    pub fn display(&self, field: &str) -> Option<bool> {
        self.display.get(field).copied()
    }

    #[must_use]
    pub fn is_visible(&self, field: &str) -> bool {
        self.display(field) == Some(true)
    }

    pub fn visible(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.display
            .iter()
            .filter(|(_, visible)| **visible)
            .map(|(field, _)| *field)
    }

    pub fn hidden(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.display
            .iter()
            .filter(|(_, visible)| !**visible)
            .map(|(field, _)| *field)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.display
            .iter()
            .map(|(field, visible)| (*field, *visible))
    }

    #[must_use]
    pub fn reset_app_name(&self) -> Option<&'static str> {
        self.reset_app_name
    }
}

/// Plan applied on page load and before every case rule.
#[must_use]
pub fn baseline_visibility(local_source: bool) -> VisibilityPlan {
    let mut plan = VisibilityPlan::default();
    plan.set_all(&OPTIONAL_FIELDS, false);
    if !local_source {
        plan.set_all(&LOCAL_SOURCE_FIELDS, false);
    }
    plan
}

/// Plan for a selected case. Unknown cases reveal only [`COMMON_FIELDS`].
#[must_use]
pub fn compute_visibility(case: &str, local_source: bool) -> VisibilityPlan {
    let mut plan = baseline_visibility(local_source);
    plan.set_all(&COMMON_FIELDS, true);
    if let Some(rule) = case_rule(case) {
        plan.set_all(rule.reveal, true);
        plan.set_all(rule.hide, false);
        plan.reset_app_name = rule.reset_app_name;
    }
    plan
}
