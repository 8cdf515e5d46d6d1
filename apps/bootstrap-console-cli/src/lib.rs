use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use bootstrap_console_client::{
    BootstrapConsoleClient, BootstrapConsoleClientConfig, ConsoleController, RunReport,
};
use bootstrap_console_core::settings::{
    self, CLI_SETTING_FIELDS, apply_cli_settings, load_cli_settings, save_cli_settings,
};
use bootstrap_console_core::{
    ConsoleSession, FieldKind, FormKind, SettingsError, StreamOutcome, compute_visibility, fields,
    mirror,
};
use clap::{Args, Parser, Subcommand};

mod config;
mod settings_store;

pub use config::{ConfigError, ConsoleConfig};
pub use settings_store::FileSettingsStore;

/// How long to keep reading after a stop before giving up on the stream.
const STOP_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "bootstrap-console")]
#[command(about = "Drive the bootstrap automation console from a terminal")]
pub struct BootstrapConsoleCli {
    /// Backend base URL. Defaults to BOOTSTRAP_CONSOLE_BASE_URL or http://localhost:3120.
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Timeout for non-streaming requests in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,
    /// Directory for persisted CLI settings.
    #[arg(long, global = true)]
    pub settings_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the server environment defaults
    Env,
    /// Show which GUI fields a case reveals and hides
    Fields(FieldsArgs),
    /// Run a GUI automation case and stream its output
    Gui(GuiArgs),
    /// Run a platform CLI case and stream its output
    Cli(CliArgs),
    /// Stop a running job
    Stop(StopArgs),
    /// Inspect or clear the saved CLI settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Args, Debug)]
pub struct FieldsArgs {
    #[arg(long)]
    pub case: String,
    /// Preview as if tasks ran from a local source checkout.
    #[arg(long)]
    pub local_source: bool,
}

#[derive(Args, Debug)]
pub struct GuiArgs {
    #[arg(long)]
    pub case: String,
    /// Set a text field, `FIELD=VALUE`. Repeatable.
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_field_assignment)]
    pub set: Vec<(String, String)>,
    /// Check a checkbox field. Repeatable.
    #[arg(long, value_name = "FIELD")]
    pub check: Vec<String>,
    /// Uncheck a checkbox field. Repeatable.
    #[arg(long, value_name = "FIELD")]
    pub uncheck: Vec<String>,
    /// Data plane host prefix; rewrites the login URL and DP user email.
    #[arg(long)]
    pub host_prefix: Option<String>,
    /// App archive to upload for create-app cases.
    #[arg(long)]
    pub app_file: Option<PathBuf>,
    /// Print the run URL instead of starting the script.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct CliArgs {
    #[arg(long)]
    pub case: String,
    #[arg(long)]
    pub cp_url: Option<String>,
    #[arg(long)]
    pub oauth_token: Option<String>,
    #[arg(long)]
    pub dp_name: Option<String>,
    #[arg(long)]
    pub other_args: Option<String>,
    /// Remember the control plane URL and token for later runs.
    #[arg(long, conflicts_with = "forget_settings")]
    pub save_settings: bool,
    /// Clear remembered settings on this run.
    #[arg(long)]
    pub forget_settings: bool,
    /// Print the run URL instead of starting the script.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct StopArgs {
    /// Job id from a previous run; omitted means the backend's current job.
    #[arg(long)]
    pub job_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print the saved settings with the token masked
    Show,
    /// Forget the saved settings
    Clear,
}

fn parse_field_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {raw:?}"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err("field name must not be empty".to_string());
    }
    Ok((field.to_string(), value.to_string()))
}

pub async fn run() -> Result<()> {
    let cli = BootstrapConsoleCli::parse();
    let config = resolve_config(&cli)?;
    match cli.command {
        Commands::Env => print_env(&config).await,
        Commands::Fields(args) => print_fields(&args),
        Commands::Gui(args) => run_gui(&config, args).await,
        Commands::Cli(args) => run_cli(&config, args).await,
        Commands::Stop(args) => stop_job(&config, args).await,
        Commands::Settings { command } => manage_settings(&config, command),
    }
}

fn resolve_config(cli: &BootstrapConsoleCli) -> Result<ConsoleConfig> {
    let mut config = ConsoleConfig::from_env().context("read console configuration")?;
    if let Some(base_url) = &cli.base_url {
        config.base_url.clone_from(base_url);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(settings_dir) = &cli.settings_dir {
        config.settings_dir.clone_from(settings_dir);
    }
    Ok(config)
}

fn controller(config: &ConsoleConfig) -> Result<ConsoleController> {
    let mut client_config = BootstrapConsoleClientConfig::new(config.base_url.clone());
    client_config.timeout_ms = config.timeout_ms;
    let client = BootstrapConsoleClient::new(client_config).context("build console client")?;
    Ok(ConsoleController::new(client, ConsoleSession::default()))
}

fn write_stdout(text: &str) {
    let mut out = io::stdout().lock();
    if let Err(error) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        tracing::debug!(error = %error, "stdout write failed");
    }
}

fn write_json(value: &serde_json::Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("render json")?;
    write_stdout(&format!("{rendered}\n"));
    Ok(())
}

async fn print_env(config: &ConsoleConfig) -> Result<()> {
    let controller = controller(config)?;
    let env = controller
        .client()
        .get_env()
        .await
        .context("fetch environment")?;
    write_json(&serde_json::Value::Object(env.as_map()))
}

fn print_fields(args: &FieldsArgs) -> Result<()> {
    let plan = compute_visibility(&args.case, args.local_source);
    let mut rendered = String::new();
    for (field, visible) in plan.entries() {
        let marker = if visible { "show" } else { "hide" };
        rendered.push_str(&format!("{marker} {field}\n"));
    }
    if let Some(field) = plan.reset_app_name() {
        rendered.push_str(&format!("reset {field} and {}\n", fields::APP_FILE));
    }
    write_stdout(&rendered);
    Ok(())
}

async fn run_gui(config: &ConsoleConfig, args: GuiArgs) -> Result<()> {
    let controller = controller(config)?;
    controller
        .load_env()
        .await
        .context("fetch environment")?;

    apply_gui_args(&mut controller.session(), &args)?;

    if args.dry_run {
        return print_run_url(&controller, FormKind::Gui);
    }
    stream_run(&controller, FormKind::Gui).await
}

/// Fills the GUI form from the command line. The app file goes in before
/// `--set` so an explicit app name wins over the derived one.
fn apply_gui_args(session: &mut ConsoleSession, args: &GuiArgs) -> Result<()> {
    let plan = session.select_case(&args.case);
    if let Some(prefix) = args.host_prefix.as_deref() {
        session.host_prefix_changed(prefix);
    }
    if let Some(app_file) = &args.app_file {
        if plan.reset_app_name().is_none() {
            bail!("case {} does not take an app file", args.case);
        }
        mirror::choose_app_file(&mut session.form, &app_file.display().to_string());
    }
    for (field, value) in &args.set {
        if !plan.is_visible(field) && plan.display(field).is_some() {
            tracing::warn!(field = %field, case = %args.case, "field is hidden for this case");
        }
        set_text_field(session, field, value)?;
    }
    for field in &args.check {
        set_checkbox_field(session, field, true)?;
    }
    for field in &args.uncheck {
        set_checkbox_field(session, field, false)?;
    }
    Ok(())
}

async fn run_cli(config: &ConsoleConfig, args: CliArgs) -> Result<()> {
    let controller = controller(config)?;
    let mut store = FileSettingsStore::new(&config.settings_dir);

    {
        let mut session = controller.session();
        match apply_cli_settings(&store, &mut session.form) {
            Ok(0) => {}
            Ok(applied) => tracing::info!(fields = applied, "restored saved cli settings"),
            Err(error @ SettingsError::Decode { .. }) => {
                tracing::warn!(error = %error, "ignoring unreadable saved cli settings");
            }
            Err(error) => return Err(error).context("load saved cli settings"),
        }

        let form = &mut session.form;
        form.set_text(fields::CLI_AUTO_CASE, args.case.as_str());
        for (field, value) in [
            (fields::TIBCOP_CLI_CPURL, &args.cp_url),
            (fields::TIBCOP_CLI_OAUTH_TOKEN, &args.oauth_token),
            (fields::TIBCOP_CLI_DP_NAME, &args.dp_name),
            (fields::TIBCOP_CLI_OTHER_ARGS, &args.other_args),
        ] {
            if let Some(value) = value {
                form.set_text(field, value.as_str());
            }
        }
        if mirror::normalize_cli_control_plane_url(form) {
            tracing::info!(
                cp_url = %form.text(fields::TIBCOP_CLI_CPURL),
                "trimmed control plane url to its origin"
            );
        }
        if args.save_settings {
            form.set_checked(fields::SAVE_CLI_SETTING, true);
        }
        if args.forget_settings {
            form.set_checked(fields::SAVE_CLI_SETTING, false);
        }
    }

    if args.dry_run {
        return print_run_url(&controller, FormKind::Cli);
    }

    {
        let session = controller.session();
        let enabled = session.form.checked(fields::SAVE_CLI_SETTING);
        save_cli_settings(&mut store, enabled, &session.form).context("save cli settings")?;
    }
    stream_run(&controller, FormKind::Cli).await
}

fn set_text_field(session: &mut ConsoleSession, field: &str, value: &str) -> Result<()> {
    match session.form.kind(field) {
        Some(FieldKind::Checkbox) => {
            bail!("{field} is a checkbox; use --check or --uncheck")
        }
        Some(_) => {
            if field == fields::DP_HOST_PREFIX {
                session.host_prefix_changed(value);
            } else {
                session.form.set_text(field, value);
            }
            Ok(())
        }
        None => bail!("unknown field {field}"),
    }
}

fn set_checkbox_field(session: &mut ConsoleSession, field: &str, checked: bool) -> Result<()> {
    if session.form.set_checked(field, checked) {
        Ok(())
    } else {
        Err(anyhow!("{field} is not a checkbox field"))
    }
}

fn print_run_url(controller: &ConsoleController, kind: FormKind) -> Result<()> {
    let params = controller.preview_params(kind);
    let url = controller
        .client()
        .run_script_url(kind, &params)
        .ok_or_else(|| anyhow!("could not build run url"))?;
    if kind == FormKind::Gui && !controller.session().form.text(fields::APP_FILE).is_empty() {
        tracing::info!("dry run skips the app file upload");
    }
    write_stdout(&format!("{url}\n"));
    Ok(())
}

async fn stream_run(controller: &ConsoleController, kind: FormKind) -> Result<()> {
    let run = controller.run(kind, write_stdout);
    tokio::pin!(run);

    let report = tokio::select! {
        result = &mut run => result.context("run script")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!(form = kind.as_str(), "interrupt received, stopping script");
            match controller.stop(kind).await {
                Ok(response) => tracing::info!(
                    status = ?response.status,
                    message = %response.message,
                    "backend answered stop"
                ),
                Err(error) => tracing::warn!(error = %error, "stop request failed"),
            }
            match tokio::time::timeout(STOP_GRACE, &mut run).await {
                Ok(result) => result.context("run script")?,
                Err(_) => {
                    tracing::warn!("script output did not end after stop");
                    return Ok(());
                }
            }
        }
    };
    finish_run(&report)
}

fn finish_run(report: &RunReport) -> Result<()> {
    match &report.outcome {
        StreamOutcome::Completed | StreamOutcome::Cancelled => {
            tracing::info!(job_id = ?report.job_id, outcome = ?report.outcome, "script finished");
            Ok(())
        }
        StreamOutcome::Failed(message) => Err(anyhow!("script output stream failed: {message}")),
    }
}

async fn stop_job(config: &ConsoleConfig, args: StopArgs) -> Result<()> {
    let controller = controller(config)?;
    let response = controller
        .client()
        .stop_script(args.job_id.as_deref())
        .await
        .context("stop script")?;
    tracing::info!(status = ?response.status, "stop answered");
    write_stdout(&format!("{}\n", response.message));
    Ok(())
}

fn manage_settings(config: &ConsoleConfig, command: SettingsCommand) -> Result<()> {
    let mut store = FileSettingsStore::new(&config.settings_dir);
    match command {
        SettingsCommand::Show => {
            let saved = load_cli_settings(&store).context("load saved cli settings")?;
            let mut saved = saved.unwrap_or_default();
            if let Some(token) = saved.get_mut(fields::TIBCOP_CLI_OAUTH_TOKEN) {
                if token.as_str().is_some_and(|token| !token.is_empty()) {
                    *token = serde_json::Value::String("********".to_string());
                }
            }
            write_json(&serde_json::Value::Object(saved))
        }
        SettingsCommand::Clear => {
            let form = bootstrap_console_core::FormState::console();
            save_cli_settings(&mut store, false, &form).context("clear cli settings")?;
            tracing::info!(
                dir = %store.dir().display(),
                key = settings::CLI_SETTING_KEY,
                fields = ?CLI_SETTING_FIELDS,
                "cleared saved cli settings"
            );
            Ok(())
        }
    }
}
