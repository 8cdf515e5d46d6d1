//! Inputs that rewrite other inputs as the user types.

use crate::env::EnvSnapshot;
use crate::fields;
use crate::form::FormState;
use crate::visibility::case_rule;

/// Replaces the first host label following `//`. URLs without one are
/// returned unchanged.
#[must_use]
pub fn replace_subdomain(url: &str, subdomain: &str) -> String {
    let mut index = 0;
    while let Some(found) = url[index..].find("//") {
        let label_start = index + found + 2;
        let label_len = url[label_start..]
            .find(['.', '/'])
            .unwrap_or(url.len() - label_start);
        if label_len > 0 {
            return format!(
                "{}{subdomain}{}",
                &url[..label_start],
                &url[label_start + label_len..]
            );
        }
        index = index + found + 1;
        if index >= url.len() {
            break;
        }
    }
    url.to_string()
}

/// Replaces everything before the first `@`. An empty local part is left
/// as is.
#[must_use]
pub fn replace_email_prefix(email: &str, prefix: &str) -> String {
    let local_len = email.find('@').unwrap_or(email.len());
    if local_len == 0 {
        return email.to_string();
    }
    format!("{prefix}{}", &email[local_len..])
}

/// `scheme://host[:port]` of an http(s) URL, dropping any path, query or
/// fragment. `None` when the value is not an http(s) URL.
#[must_use]
pub fn control_plane_origin(value: &str) -> Option<&str> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))?;
    let host_len = rest.find('/').unwrap_or(rest.len());
    if host_len == 0 {
        return None;
    }
    let scheme_len = value.len() - rest.len();
    Some(&value[..scheme_len + host_len])
}

/// App name derived from a chosen file path: the basename without its last
/// extension, with `.` and `_` turned into `-`.
#[must_use]
pub fn app_name_from_file_path(path: &str) -> Option<String> {
    let basename = path.rsplit(['\\', '/']).next().unwrap_or_default();
    let (stem, _extension) = basename.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.replace(['.', '_'], "-"))
}

/// App-name field of a create-app case.
#[must_use]
pub fn app_name_field_for_case(case: &str) -> Option<&'static str> {
    case_rule(case).and_then(|rule| rule.reset_app_name)
}

/// Rewrites the login URL and DP user email from their environment defaults
/// for a new host prefix. Returns false for an empty prefix.
pub fn mirror_host_prefix(form: &mut FormState, env: &EnvSnapshot, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    if let Some(login_url) = env.text(fields::TP_AUTO_LOGIN_URL) {
        form.set_text(
            fields::TP_AUTO_LOGIN_URL,
            replace_subdomain(&login_url, prefix),
        );
    }
    if let Some(email) = env.text(fields::DP_USER_EMAIL) {
        form.set_text(fields::DP_USER_EMAIL, replace_email_prefix(&email, prefix));
    }
    true
}

/// Trims the CLI control-plane URL down to its origin. Returns whether the
/// field changed.
pub fn normalize_cli_control_plane_url(form: &mut FormState) -> bool {
    let current = form.text(fields::TIBCOP_CLI_CPURL);
    let Some(origin) = control_plane_origin(current) else {
        return false;
    };
    if origin == current {
        return false;
    }
    let origin = origin.to_string();
    form.set_text(fields::TIBCOP_CLI_CPURL, origin)
}

/// Records a chosen app file and fills the active create-app case's app
/// name from it. Returns the field that was filled.
pub fn choose_app_file(form: &mut FormState, path: &str) -> Option<&'static str> {
    form.set_text(fields::APP_FILE, path);
    let app_name = app_name_from_file_path(path)?;
    let field = app_name_field_for_case(form.text(fields::GUI_AUTO_CASE))?;
    form.set_text(field, app_name);
    Some(field)
}

/// Clears the chosen app file and restores the active case's app name from
/// the environment defaults.
pub fn reset_app_file(form: &mut FormState, env: Option<&EnvSnapshot>) {
    form.set_text(fields::APP_FILE, "");
    let Some(field) = app_name_field_for_case(form.text(fields::GUI_AUTO_CASE)) else {
        return;
    };
    let default = env.and_then(|env| env.text(field)).unwrap_or_default();
    form.set_text(field, default);
}
