use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bootstrap_console_client::{
    BootstrapConsoleClient, BootstrapConsoleClientConfig, ConsoleClientError, ConsoleController,
    ControllerError,
};
use bootstrap_console_core::params::CREATE_BW5CE_APP_CASE;
use bootstrap_console_core::{ConsoleSession, FormKind, RunnerState, StreamOutcome, fields};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc, oneshot};

type ChunkSender = mpsc::UnboundedSender<Result<Bytes, std::io::Error>>;

#[derive(Clone, Default)]
struct MockState {
    run_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    stop_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    uploads: Arc<Mutex<Vec<String>>>,
    upload_delay: Arc<Mutex<Option<Duration>>>,
    open_stream: Arc<Mutex<Option<ChunkSender>>>,
}

struct MockBackend {
    base_url: String,
    state: MockState,
    shutdown: oneshot::Sender<()>,
}

async fn start_mock_backend() -> Result<MockBackend> {
    let state = MockState::default();
    let router = Router::new()
        .route("/get_env", get(get_env))
        .route("/upload", post(upload))
        .route("/run-gui-script", get(run_gui_script))
        .route("/run-cli-script", get(run_cli_script))
        .route("/stop-script", get(stop_script))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind mock backend")?;
    let addr = listener.local_addr().context("mock backend local_addr")?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        if let Err(err) = server.await {
            tracing::error!(error = %err, "mock backend failed");
        }
    });

    Ok(MockBackend {
        base_url: format!("http://{addr}"),
        state,
        shutdown: shutdown_tx,
    })
}

async fn get_env() -> impl IntoResponse {
    Json(json!({
        "TP_AUTO_TASK_FROM_LOCAL_SOURCE": "true",
        "HEADLESS": "true",
        "TP_AUTO_LOGIN_URL": "https://admin.cp1.example.com/cp/login",
        "BW5CE_APP_NAME": "bw5ce-default",
        "NOT_A_FIELD": "ignored"
    }))
}

async fn upload(State(state): State<MockState>, body: Bytes) -> impl IntoResponse {
    let delay = *state.upload_delay.lock().await;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    state
        .uploads
        .lock()
        .await
        .push(String::from_utf8_lossy(&body).to_string());
    Json(json!({
        "message": "File uploaded successfully",
        "filename": "orders_app_20250101_101010.ear",
        "filetype": "BWCE"
    }))
}

async fn run_gui_script(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.run_queries.lock().await.push(query);
    let chunks = futures::stream::iter(vec![
        Ok::<_, Infallible>("case started\n"),
        Ok("case passed\n"),
    ]);
    Response::builder()
        .header("one_click_job_id", "job-gui-1")
        .body(Body::from_stream(chunks))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

async fn run_cli_script(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let case = query.get("case").cloned().unwrap_or_default();
    state.run_queries.lock().await.push(query);

    match case.as_str() {
        "tplatform:broken" => (StatusCode::INTERNAL_SERVER_ERROR, "runner crashed").into_response(),
        "tplatform:flaky" => {
            let chunks = futures::stream::iter(vec![
                Ok(Bytes::from_static(b"partial output\n")),
                Err(std::io::Error::other("pipe closed")),
            ]);
            Response::builder()
                .header("one_click_job_id", "job-cli-flaky")
                .body(Body::from_stream(chunks))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        _ => {
            let (tx, rx) = mpsc::unbounded_channel();
            let _ = tx.send(Ok(Bytes::from_static(b"waiting for cluster\n")));
            *state.open_stream.lock().await = Some(tx);
            let chunks = futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            });
            Response::builder()
                .header("one_click_job_id", "job-cli-1")
                .body(Body::from_stream(chunks))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

async fn stop_script(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.stop_queries.lock().await.push(query);
    match state.open_stream.lock().await.take() {
        Some(tx) => {
            let _ = tx.send(Ok(Bytes::from_static(b"terminated\n")));
            Json(json!({"status": "stopped", "message": "Process terminated successfully"}))
        }
        None => Json(json!({"status": "no_process", "message": "No running process found"})),
    }
}

fn controller(backend: &MockBackend) -> Result<ConsoleController> {
    let client =
        BootstrapConsoleClient::new(BootstrapConsoleClientConfig::new(backend.base_url.clone()))
            .context("console client")?;
    Ok(ConsoleController::new(client, ConsoleSession::default()))
}

#[tokio::test]
async fn load_env_hydrates_session() -> Result<()> {
    let backend = start_mock_backend().await?;
    let controller = controller(&backend)?;

    let plan = controller.load_env().await.context("load env")?;
    assert_eq!(plan.display(fields::HEADLESS), None);
    {
        let session = controller.session();
        assert!(session.local_source_mode());
        assert!(session.form.checked(fields::HEADLESS));
        assert_eq!(
            session.form.text(fields::TP_AUTO_LOGIN_URL),
            "https://admin.cp1.example.com/cp/login"
        );
    }

    let _ = backend.shutdown.send(());
    Ok(())
}

#[tokio::test]
async fn gui_run_uploads_app_file_and_streams_output() -> Result<()> {
    let backend = start_mock_backend().await?;
    let controller = controller(&backend)?;
    controller.load_env().await.context("load env")?;

    let dir = tempfile::tempdir().context("tempdir")?;
    let app_path = dir.path().join("orders_app.ear");
    std::fs::write(&app_path, b"ear-bytes").context("write app file")?;
    {
        let mut session = controller.session();
        session.select_case(CREATE_BW5CE_APP_CASE);
        bootstrap_console_core::mirror::choose_app_file(
            &mut session.form,
            &app_path.display().to_string(),
        );
        assert_eq!(session.form.text(fields::BW5CE_APP_NAME), "orders-app");
    }

    let mut streamed = String::new();
    let report = controller
        .run(FormKind::Gui, |text| streamed.push_str(text))
        .await
        .context("gui run")?;

    assert_eq!(report.outcome, StreamOutcome::Completed);
    assert_eq!(report.job_id.as_deref(), Some("job-gui-1"));
    assert_eq!(streamed, "Running script...\ncase started\ncase passed\n");

    let uploads = backend.state.uploads.lock().await;
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].contains("filename=\"orders_app.ear\""));
    assert!(uploads[0].contains("ear-bytes"));

    let queries = backend.state.run_queries.lock().await;
    let query = &queries[0];
    assert_eq!(query["case"], "case.k8s_create_and_start_bwce_app");
    assert_eq!(query["CAPABILITY"], "bw5ce");
    assert_eq!(query["BW5CE_APP_NAME"], "orders-app");
    assert_eq!(
        query["TP_AUTO_BW5CE_APP_FILE_NAME"],
        "orders_app_20250101_101010.ear"
    );
    assert_eq!(query["HEADLESS"], "false");

    let session = controller.session();
    let runner = session.runner(FormKind::Gui);
    assert_eq!(runner.state(), RunnerState::Idle);
    assert!(runner.controls().run_enabled);
    assert_eq!(runner.job_id(), Some("job-gui-1"));

    let _ = backend.shutdown.send(());
    Ok(())
}

#[tokio::test]
async fn stop_targets_captured_job_and_resets_runner() -> Result<()> {
    let backend = start_mock_backend().await?;
    let controller = controller(&backend)?;
    controller.session().form.set_text(fields::CLI_AUTO_CASE, "tplatform:watch");

    let running = controller.clone();
    let run = tokio::spawn(async move { running.run(FormKind::Cli, |_| {}).await });

    let mut attached = false;
    for _ in 0..200 {
        if controller.session().runner(FormKind::Cli).job_id().is_some() {
            attached = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(attached, "job id never attached");
    assert!(controller.run(FormKind::Cli, |_| {}).await.is_err());

    let response = controller.stop(FormKind::Cli).await.context("stop")?;
    assert_eq!(response.status.as_deref(), Some("stopped"));

    let report = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .context("run did not finish")?
        .context("run task panicked")?
        .context("cli run")?;
    assert!(matches!(
        report.outcome,
        StreamOutcome::Completed | StreamOutcome::Cancelled
    ));

    let stops = backend.state.stop_queries.lock().await;
    assert_eq!(stops[0]["jobId"], "job-cli-1");

    let session = controller.session();
    let runner = session.runner(FormKind::Cli);
    assert_eq!(runner.state(), RunnerState::Idle);
    assert!(runner.log().contains("waiting for cluster"));
    assert!(runner.log().contains("[INFO] Process terminated successfully"));

    let _ = backend.shutdown.send(());
    Ok(())
}

#[tokio::test]
async fn stop_during_upload_never_starts_script() -> Result<()> {
    let backend = start_mock_backend().await?;
    *backend.state.upload_delay.lock().await = Some(Duration::from_millis(300));
    let controller = controller(&backend)?;

    let dir = tempfile::tempdir().context("tempdir")?;
    let app_path = dir.path().join("orders_app.ear");
    std::fs::write(&app_path, b"ear-bytes").context("write app file")?;
    {
        let mut session = controller.session();
        session.select_case(CREATE_BW5CE_APP_CASE);
        bootstrap_console_core::mirror::choose_app_file(
            &mut session.form,
            &app_path.display().to_string(),
        );
    }

    let running = controller.clone();
    let run = tokio::spawn(async move { running.run(FormKind::Gui, |_| {}).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        controller.session().runner(FormKind::Gui).state(),
        RunnerState::Running
    );

    controller.stop(FormKind::Gui).await.context("stop")?;
    assert_eq!(
        controller.session().runner(FormKind::Gui).state(),
        RunnerState::Idle
    );

    let report = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .context("run did not finish")?
        .context("run task panicked")?
        .context("gui run")?;
    assert_eq!(report.outcome, StreamOutcome::Cancelled);
    assert_eq!(report.job_id, None);

    assert_eq!(backend.state.uploads.lock().await.len(), 1);
    assert!(backend.state.run_queries.lock().await.is_empty());
    let session = controller.session();
    let runner = session.runner(FormKind::Gui);
    assert_eq!(runner.state(), RunnerState::Idle);
    assert_eq!(runner.job_id(), None);

    let _ = backend.shutdown.send(());
    Ok(())
}

#[tokio::test]
async fn failed_start_leaves_runner_idle() -> Result<()> {
    let backend = start_mock_backend().await?;
    let controller = controller(&backend)?;
    controller.session().form.set_text(fields::CLI_AUTO_CASE, "tplatform:broken");

    let result = controller.run(FormKind::Cli, |_| {}).await;
    assert!(matches!(
        result,
        Err(ControllerError::Client(ConsoleClientError::Http { status, .. }))
            if status == StatusCode::INTERNAL_SERVER_ERROR
    ));

    let session = controller.session();
    let runner = session.runner(FormKind::Cli);
    assert_eq!(runner.state(), RunnerState::Idle);
    assert!(runner.log().contains("[ERROR] console_http_500"));

    let _ = backend.shutdown.send(());
    Ok(())
}

#[tokio::test]
async fn broken_stream_forces_idle() -> Result<()> {
    let backend = start_mock_backend().await?;
    let controller = controller(&backend)?;
    controller.session().form.set_text(fields::CLI_AUTO_CASE, "tplatform:flaky");

    let report = controller
        .run(FormKind::Cli, |_| {})
        .await
        .context("cli run")?;
    assert!(matches!(report.outcome, StreamOutcome::Failed(_)));

    let session = controller.session();
    let runner = session.runner(FormKind::Cli);
    assert_eq!(runner.state(), RunnerState::Idle);
    assert!(runner.log().contains("[ERROR]"));

    let _ = backend.shutdown.send(());
    Ok(())
}

#[tokio::test]
async fn stop_without_job_reports_no_process() -> Result<()> {
    let backend = start_mock_backend().await?;
    let controller = controller(&backend)?;

    let response = controller.stop(FormKind::Gui).await.context("stop")?;
    assert_eq!(response.status.as_deref(), Some("no_process"));
    assert!(backend.state.stop_queries.lock().await[0].is_empty());
    assert_eq!(
        controller.session().runner(FormKind::Gui).state(),
        RunnerState::Idle
    );

    let _ = backend.shutdown.send(());
    Ok(())
}
