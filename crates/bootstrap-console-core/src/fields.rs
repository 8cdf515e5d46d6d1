//! Field identifiers shared by the form, the environment snapshot and the
//! run parameters. An identifier doubles as the element id of the input and
//! the class name of its row in the page.

pub const GUI_AUTO_CASE: &str = "guiAutoCase";
pub const CLI_AUTO_CASE: &str = "cliAutoCase";
pub const CASE_PARAM: &str = "case";
pub const CAPABILITY: &str = "CAPABILITY";

pub const HEADLESS: &str = "HEADLESS";
pub const FORCE_RUN_AUTOMATION: &str = "FORCE_RUN_AUTOMATION";
pub const IS_CLEAN_REPORT: &str = "IS_CLEAN_REPORT";
pub const TP_AUTO_IS_CONFIG_O11Y: &str = "TP_AUTO_IS_CONFIG_O11Y";
pub const TP_AUTO_TASK_FROM_LOCAL_SOURCE: &str = "TP_AUTO_TASK_FROM_LOCAL_SOURCE";

pub const TP_AUTO_LOGIN_URL: &str = "TP_AUTO_LOGIN_URL";
pub const TP_AUTO_ADMIN_URL: &str = "TP_AUTO_ADMIN_URL";
pub const CP_ADMIN_EMAIL: &str = "CP_ADMIN_EMAIL";
pub const CP_ADMIN_PASSWORD: &str = "CP_ADMIN_PASSWORD";
pub const DP_HOST_PREFIX: &str = "DP_HOST_PREFIX";
pub const DP_USER_EMAIL: &str = "DP_USER_EMAIL";
pub const DP_USER_PASSWORD: &str = "DP_USER_PASSWORD";
pub const TP_AUTO_MAIL_URL: &str = "TP_AUTO_MAIL_URL";
pub const TP_AUTO_TOKEN_NAME: &str = "TP_AUTO_TOKEN_NAME";
pub const TP_AUTO_K8S_DP_NAME: &str = "TP_AUTO_K8S_DP_NAME";
pub const TP_AUTO_K8S_BMDP_NAME: &str = "TP_AUTO_K8S_BMDP_NAME";
pub const TP_AUTO_KUBECONFIG: &str = "TP_AUTO_KUBECONFIG";
pub const TP_AUTO_DATA_PLANE_O11Y_SYSTEM_CONFIG: &str = "TP_AUTO_DATA_PLANE_O11Y_SYSTEM_CONFIG";
pub const TP_AUTO_K8S_DP_SERVICE_ACCOUNT_CREATION_ADDITIONAL_SETTINGS: &str =
    "TP_AUTO_K8S_DP_SERVICE_ACCOUNT_CREATION_ADDITIONAL_SETTINGS";

pub const BWCE_APP_NAME: &str = "BWCE_APP_NAME";
pub const BW5CE_APP_NAME: &str = "BW5CE_APP_NAME";
pub const FLOGO_APP_NAME: &str = "FLOGO_APP_NAME";
pub const APP_FILE: &str = "app_file";
pub const TP_AUTO_FLOGO_APP_FILE_NAME: &str = "TP_AUTO_FLOGO_APP_FILE_NAME";
pub const TP_AUTO_BWCE_APP_FILE_NAME: &str = "TP_AUTO_BWCE_APP_FILE_NAME";
pub const TP_AUTO_BW5CE_APP_FILE_NAME: &str = "TP_AUTO_BW5CE_APP_FILE_NAME";

pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const TP_ACTIVATION_SERVER_IP: &str = "TP_ACTIVATION_SERVER_IP";
pub const TP_ACTIVATION_SERVER_PORT: &str = "TP_ACTIVATION_SERVER_PORT";
pub const TP_ACTIVATION_SERVER_CERT_HOSTNAME: &str = "TP_ACTIVATION_SERVER_CERT_HOSTNAME";
pub const TP_ACTIVATION_SERVER_FINGER_PRINT: &str = "TP_ACTIVATION_SERVER_FINGER_PRINT";
pub const TP_BMDP_IMAGE_TAG_EMS: &str = "TP_BMDP_IMAGE_TAG_EMS";
pub const TP_BMDP_IMAGE_TAG_BW5EMSDM: &str = "TP_BMDP_IMAGE_TAG_BW5EMSDM";
pub const TP_BMDP_IMAGE_TAG_BW5RVDM: &str = "TP_BMDP_IMAGE_TAG_BW5RVDM";
pub const TP_BMDP_IMAGE_TAG_BW6DM: &str = "TP_BMDP_IMAGE_TAG_BW6DM";

pub const TIBCOP_CLI_CPURL: &str = "TIBCOP_CLI_CPURL";
pub const TIBCOP_CLI_OAUTH_TOKEN: &str = "TIBCOP_CLI_OAUTH_TOKEN";
pub const TIBCOP_CLI_DP_NAME: &str = "TIBCOP_CLI_DP_NAME";
pub const TIBCOP_CLI_OTHER_ARGS: &str = "TIBCOP_CLI_OTHER_ARGS";
pub const SAVE_CLI_SETTING: &str = "SAVE_CLI_SETTING";

/// Checkbox inputs on the GUI automation form.
pub const GUI_CHECKBOX_FIELDS: [&str; 4] = [
    HEADLESS,
    FORCE_RUN_AUTOMATION,
    IS_CLEAN_REPORT,
    TP_AUTO_DATA_PLANE_O11Y_SYSTEM_CONFIG,
];

/// Text inputs on the GUI automation form, in submission order.
pub const GUI_TEXT_FIELDS: [&str; 21] = [
    TP_AUTO_LOGIN_URL,
    DP_HOST_PREFIX,
    DP_USER_EMAIL,
    DP_USER_PASSWORD,
    TP_AUTO_MAIL_URL,
    TP_AUTO_K8S_DP_NAME,
    TP_AUTO_K8S_BMDP_NAME,
    TP_AUTO_KUBECONFIG,
    TP_AUTO_K8S_DP_SERVICE_ACCOUNT_CREATION_ADDITIONAL_SETTINGS,
    BWCE_APP_NAME,
    BW5CE_APP_NAME,
    FLOGO_APP_NAME,
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

/// Text inputs on the CLI automation form, in submission order.
pub const CLI_TEXT_FIELDS: [&str; 4] = [
    TIBCOP_CLI_CPURL,
    TIBCOP_CLI_OAUTH_TOKEN,
    TIBCOP_CLI_DP_NAME,
    TIBCOP_CLI_OTHER_ARGS,
];
