//! End-to-end exercises of the HTTP surface against the real Phase
//! Launcher, using the `cadence-fixtures` phase binaries built alongside
//! this crate's tests. Grounded on spec.md's Testable Properties (engine
//! round-trips a no-op phase, chains through multiple phases, and keeps
//! tier ordering intact end to end) and on
//! `original_source/workflows/handlers.py`'s request/response shapes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cadence_core::{OperationKind, StateStore};
use cadence_dispatch::{build_default_registry, Dispatcher, HandlerDeps, ProcessingMode, RecordingEventSink};
use cadence_server::launcher::PhaseLauncher;
use cadence_server::AppState;

/// The test binary for this crate lands at
/// `target/<profile>/deps/<name>-<hash>`; the fixture binaries cargo
/// builds as workspace dependencies land one level up, at
/// `target/<profile>/<bin-name>`. Walking up from `current_exe()` avoids
/// depending on `CARGO_BIN_EXE_*`, which is only set for a package's own
/// binaries, not a dependency crate's.
fn target_profile_dir() -> PathBuf {
    let mut path = std::env::current_exe().expect("current test exe path");
    path.pop();
    if path.file_name().and_then(|n| n.to_str()) == Some("deps") {
        path.pop();
    }
    path
}

struct TestServer {
    base_url: String,
    states_dir: PathBuf,
    event_sink: Arc<RecordingEventSink>,
    _tmp: tempfile::TempDir,
}

async fn spawn_test_server() -> TestServer {
    let tmp = tempfile::tempdir().expect("tempdir");
    let states_dir = tmp.path().join("states");
    std::fs::create_dir_all(&states_dir).unwrap();
    let phases_dir = target_profile_dir();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");

    let event_sink = Arc::new(RecordingEventSink::new());
    let handler_deps = HandlerDeps::new(states_dir.clone(), event_sink.clone() as Arc<dyn cadence_dispatch::EventSink>);
    let registry = build_default_registry("solve the task".to_string());
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), ProcessingMode::Simulated));
    let launcher = Arc::new(PhaseLauncher::new(phases_dir, states_dir.clone(), base_url.clone()));
    let state_store = Arc::new(StateStore::new(states_dir.clone()));

    let app_state = AppState {
        state_store,
        dispatcher,
        handler_deps,
        launcher,
        mode: ProcessingMode::Simulated,
    };
    let app = cadence_server::api::router(app_state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server task");
    });

    TestServer {
        base_url,
        states_dir,
        event_sink,
        _tmp: tmp,
    }
}

async fn wait_until<F: Fn() -> bool>(predicate: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if predicate() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let server = spawn_test_server().await;
    let response = reqwest::get(format!("{}/health", server.base_url)).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn start_workflow_runs_a_no_op_phase_to_completion() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/start_workflow", server.base_url))
        .json(&serde_json::json!({
            "state_id": "noop-run",
            "workflow_type": "modular",
            "initial_state": { "id": "noop-run" },
            "first_phase": "noop",
        }))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "success");

    // spec.md §8 scenario 1: the persisted state already carries the
    // synthetic init_workflow exchange as its first `previous_results`
    // batch, even though `noop` itself contributes no operations.
    let raw = std::fs::read(server.states_dir.join("noop-run.json")).unwrap();
    let state: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    let previous_results = state["previous_results"].as_array().unwrap();
    assert_eq!(previous_results.len(), 1);
    assert_eq!(previous_results[0][0][0]["type"], "init_workflow");
}

#[tokio::test]
async fn echo_log_phase_chains_once_then_stops() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/start_workflow", server.base_url))
        .json(&serde_json::json!({
            "state_id": "echo-run",
            "workflow_type": "modular",
            "initial_state": { "id": "echo-run" },
            "first_phase": "echo_log",
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let logs_dir = server.states_dir.join("echo-run").join("logs");
    let appeared = wait_until(
        || logs_dir.exists() && std::fs::read_dir(&logs_dir).map(|mut d| d.next().is_some()).unwrap_or(false),
        Duration::from_secs(5),
    )
    .await;
    assert!(appeared, "expected echo_log to append a log record before the chain stopped");

    // Give the second (no-op) hop in the chain time to run and confirm it
    // really did stop instead of looping.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let entries: Vec<_> = std::fs::read_dir(&logs_dir).unwrap().collect();
    assert_eq!(entries.len(), 1, "echo_log should log exactly once across the whole chain");
}

#[tokio::test]
async fn gen_retry_phase_chains_until_attempt_limit_then_stops() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/start_workflow", server.base_url))
        .json(&serde_json::json!({
            "state_id": "gen-run",
            "workflow_type": "modular",
            "initial_state": { "id": "gen-run" },
            "first_phase": "gen_retry",
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let reached_three = wait_until(
        || {
            server
                .event_sink
                .drain()
                .into_iter()
                .filter(|e| e.operation == OperationKind::Generate)
                .count()
                >= 1
        },
        Duration::from_secs(5),
    )
    .await;
    assert!(reached_three, "expected at least one generate event to have been recorded");

    // The chain self-limits at three attempts (see cadence-fixtures'
    // gen_retry binary); give it time to finish, then confirm no further
    // generate events show up afterward.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let trailing = server
        .event_sink
        .drain()
        .into_iter()
        .filter(|e| e.operation == OperationKind::Generate)
        .count();
    assert_eq!(trailing, 0, "gen_retry should have stopped chaining by now");
}
