// Process session tests - real child processes over stdio
//
// Drives the scripted fake server through handshake, discovery and tool calls.

#[path = "../support/mod.rs"]
mod support;

use serde_json::json;
use support::{launch, timing};
use toolrelay_core::session::{ProcessSession, SessionError, SessionState};
use toolrelay_core::tooling::{ToolError, ToolInvoker, ToolRegistry};

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn handshake_skips_log_noise_and_reports_server() {
    let mut session = ProcessSession::open(launch("weather"), timing()).expect("spawn");
    assert_eq!(session.state(), SessionState::Initializing);

    let info = session.initialize().await.expect("handshake");
    assert_eq!(info.name, "fake-weather");
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.instructions(), Some("Locations are city names."));

    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn broken_handshake_is_a_protocol_error() {
    let mut session = ProcessSession::open(launch("bad-handshake"), timing()).expect("spawn");
    let err = session.initialize().await.unwrap_err();
    assert!(matches!(err, SessionError::Protocol { .. }), "{err:?}");
    session.close().await;
}

#[tokio::test]
async fn server_exiting_during_handshake_is_a_transport_error() {
    let mut session = ProcessSession::open(launch("exit-early"), timing()).expect("spawn");
    let err = session.initialize().await.unwrap_err();
    assert!(matches!(err, SessionError::Transport { .. }), "{err:?}");
    session.close().await;
}

#[tokio::test]
async fn missing_executable_is_a_spawn_error() {
    let launch = toolrelay_core::config::ServerLaunch::new("/nonexistent/tool-server", Vec::new());
    let err = ProcessSession::open(launch, timing()).err().expect("spawn fails");
    assert!(matches!(err, SessionError::Spawn { .. }));
}

// ============================================================================
// Discovery and invocation
// ============================================================================

#[tokio::test]
async fn discovery_follows_pagination() {
    let mut session = ProcessSession::open(launch("weather"), timing()).expect("spawn");
    session.initialize().await.expect("handshake");

    let registry = ToolRegistry::discover(&mut session).await.expect("discovery");
    let names: Vec<_> = registry.tools().iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(names, vec!["get_weather", "get_forecast"]);
    for name in names {
        assert!(registry.resolve(name).is_ok());
    }

    session.close().await;
}

#[tokio::test]
async fn get_weather_returns_tool_text_verbatim() {
    let mut session = ProcessSession::open(launch("weather"), timing()).expect("spawn");
    session.initialize().await.expect("handshake");
    let registry = ToolRegistry::discover(&mut session).await.expect("discovery");

    {
        let mut invoker = ToolInvoker::new(&mut session, &registry);
        let weather = invoker
            .call("get_weather", json!({"location": "Paris"}))
            .await
            .expect("tool call");
        assert_eq!(weather.text(), "Paris: ⛅️ +18°C");

        let forecast = invoker
            .call("get_forecast", json!({"location": "Oslo", "days": 2}))
            .await
            .expect("tool call");
        assert_eq!(forecast.text(), "Oslo: sunny for 2 days");

        let unknown = invoker.call("get_tides", json!({})).await.unwrap_err();
        assert!(matches!(unknown, ToolError::UnknownTool(_)));
    }

    assert_eq!(session.state(), SessionState::Ready);
    session.close().await;
}

#[tokio::test]
async fn unanswered_call_times_out() {
    let mut session = ProcessSession::open(launch("stubborn"), timing()).expect("spawn");
    session.initialize().await.expect("handshake");
    let registry = ToolRegistry::discover(&mut session).await.expect("discovery");

    let err = {
        let mut invoker = ToolInvoker::new(&mut session, &registry);
        invoker
            .call("get_weather", json!({"location": "Lima"}))
            .await
            .unwrap_err()
    };
    assert!(
        matches!(err, ToolError::Session(SessionError::Timeout { .. })),
        "{err:?}"
    );
    assert!(err.is_recoverable());
    assert_eq!(session.state(), SessionState::Ready);
    session.close().await;
}

#[tokio::test]
async fn launch_env_and_workdir_reach_the_child() {
    let dir = tempfile::tempdir().expect("tempdir");
    let workdir = dir.path().canonicalize().expect("canonical tempdir");
    let launch = launch("environment")
        .with_env("FAKE_GREETING", "hola")
        .with_workdir(workdir.clone());

    let mut session = ProcessSession::open(launch, timing()).expect("spawn");
    session.initialize().await.expect("handshake");
    assert_eq!(
        session.instructions(),
        Some(format!("greeting=hola cwd={}", workdir.display()).as_str())
    );
    session.close().await;
}

// ============================================================================
// Shutdown
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn close_terminates_a_server_that_ignores_end_of_input() {
    let mut session = ProcessSession::open(launch("stubborn"), timing()).expect("spawn");
    let pid = session.pid().expect("pid");
    session.initialize().await.expect("handshake");
    assert!(support::process_alive(pid));

    session.close().await;
    session.close().await;
    assert!(!support::process_alive(pid));
    assert_eq!(session.state(), SessionState::Closed);
}
