// Session loop tests - end to end against the fake tool server
//
// A scripted agent stands in for the model so the loop's lifecycle, output
// format and error handling can be checked deterministically.

#[path = "../support/mod.rs"]
mod support;

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use support::{launch, timing};
use tokio::sync::Mutex;
use toolrelay_core::agent::{Agent, AgentError, AgentResponse, AgentStatus, MessageEntry, ToolCallEntry};
use toolrelay_core::config::InteractiveConfig;
use toolrelay_core::model::ModelError;
use toolrelay_core::runtime::{
    BANNER, LineSource, LoopError, LoopExit, LoopReport, LoopState, PROMPT, RESPONSE_HEADER,
    RunMode, SessionLoop,
};
use toolrelay_core::session::{ProcessSession, SessionError};
use toolrelay_core::tooling::{ToolError, ToolInvoker};
use toolrelay_core::types::{ChatMessage, Query};

// ============================================================================
// Scripted agent
// ============================================================================

enum Step {
    /// Call get_weather for the location, then answer.
    Weather(&'static str),
    Answer(&'static str),
    RateLimited,
    /// Untyped failure whose text mentions a quota.
    QuotaText,
    Broken,
}

struct Script {
    steps: Mutex<VecDeque<Step>>,
    /// Query text and the history length seen for each run.
    seen: Mutex<Vec<(String, usize)>>,
}

#[derive(Clone)]
struct ScriptedAgent(Arc<Script>);

impl ScriptedAgent {
    fn new(steps: Vec<Step>) -> Self {
        Self(Arc::new(Script {
            steps: Mutex::new(steps.into()),
            seen: Mutex::default(),
        }))
    }

    async fn seen(&self) -> Vec<(String, usize)> {
        self.0.seen.lock().await.clone()
    }
}

fn answer(query: &Query, text: &str) -> AgentResponse {
    AgentResponse {
        messages: vec![
            MessageEntry::Human(query.text.clone()),
            MessageEntry::Ai {
                content: text.to_string(),
                tool_calls: Vec::new(),
            },
        ],
        status: AgentStatus::Completed,
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn model_name(&self) -> &str {
        "scripted-model"
    }

    async fn run(
        &self,
        query: &Query,
        tools: &mut ToolInvoker<'_>,
        history: &[ChatMessage],
    ) -> Result<AgentResponse, AgentError> {
        self.0.seen.lock().await.push((query.text.clone(), history.len()));
        let step = self.0.steps.lock().await.pop_front();
        match step {
            Some(Step::Weather(location)) => {
                let arguments = json!({"location": location});
                let result = tools.call("get_weather", arguments.clone()).await?;
                Ok(AgentResponse {
                    messages: vec![
                        MessageEntry::Human(query.text.clone()),
                        MessageEntry::Ai {
                            content: String::new(),
                            tool_calls: vec![ToolCallEntry {
                                name: "get_weather".into(),
                                arguments,
                            }],
                        },
                        MessageEntry::Tool {
                            tool: "get_weather".into(),
                            content: result.to_value(),
                            is_error: false,
                        },
                        MessageEntry::Ai {
                            content: format!("Here you go: {}", result.text()),
                            tool_calls: Vec::new(),
                        },
                    ],
                    status: AgentStatus::Completed,
                })
            }
            Some(Step::Answer(text)) => Ok(answer(query, text)),
            Some(Step::RateLimited) => Err(AgentError::Model(ModelError::RateLimited {
                provider: "groq".into(),
                status: 429,
                code: Some("rate_limit_exceeded".into()),
                retry_after: None,
                message: "Rate limit reached for model".into(),
            })),
            Some(Step::QuotaText) => Err(AgentError::InvalidResponse(
                "Error code: 403 - You exceeded your current QUOTA".into(),
            )),
            Some(Step::Broken) | None => Err(AgentError::InvalidResponse("gibberish".into())),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct Outcome {
    result: Result<LoopReport, LoopError>,
    output: String,
    state: LoopState,
    history: Vec<ChatMessage>,
    pid: u32,
}

async fn run_loop(agent: ScriptedAgent, mode: &str, run_mode: RunMode, input: &'static str) -> Outcome {
    let session = ProcessSession::open(launch(mode), timing()).expect("spawn fake server");
    let pid = session.pid().expect("pid");
    let mut source = LineSource::new(input.as_bytes());
    let mut session_loop = SessionLoop::new(agent, InteractiveConfig::default(), Vec::new());

    let result = session_loop.run(session, run_mode, &mut source).await;
    let state = session_loop.state();
    let history = session_loop.history().to_vec();
    let output = String::from_utf8(session_loop.into_output()).expect("utf-8 output");
    Outcome {
        result,
        output,
        state,
        history,
        pid,
    }
}

fn assert_child_gone(outcome: &Outcome) {
    assert_eq!(outcome.state, LoopState::Terminated);
    #[cfg(unix)]
    assert!(!support::process_alive(outcome.pid), "tool server still running");
}

// ============================================================================
// One-shot mode
// ============================================================================

#[tokio::test]
async fn one_shot_prints_only_the_canonical_transcript() {
    let agent = ScriptedAgent::new(vec![Step::Weather("Paris")]);
    let outcome = run_loop(
        agent,
        "weather",
        RunMode::OneShot("weather in Paris?".into()),
        "",
    )
    .await;

    let report = outcome.result.as_ref().expect("loop succeeds");
    assert_eq!(report.exit, LoopExit::OneShotComplete);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.queries, 1);
    assert!(!outcome.output.contains(PROMPT.trim()));
    assert!(!outcome.output.contains(BANNER));

    let parsed: Value = serde_json::from_str(&outcome.output).expect("output is JSON");
    let messages = parsed["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(
        messages[0],
        json!({"kind": "HumanMessage", "content": "weather in Paris?"})
    );
    assert_eq!(
        messages[2],
        json!({"kind": "ToolMessage", "content": "Paris: ⛅️ +18°C"})
    );
    assert_eq!(messages[3]["kind"], "AIMessage");
    assert_child_gone(&outcome);
}

#[tokio::test]
async fn blank_one_shot_dispatches_nothing() {
    let agent = ScriptedAgent::new(Vec::new());
    let outcome = run_loop(agent.clone(), "weather", RunMode::OneShot("   ".into()), "").await;

    let report = outcome.result.as_ref().expect("loop succeeds");
    assert_eq!(report.queries, 0);
    assert_eq!(report.exit_code(), 0);
    assert!(outcome.output.is_empty());
    assert!(agent.seen().await.is_empty());
    assert_child_gone(&outcome);
}

#[tokio::test]
async fn rate_limited_one_shot_exits_with_temporary_failure() {
    let agent = ScriptedAgent::new(vec![Step::RateLimited]);
    let outcome = run_loop(agent, "weather", RunMode::OneShot("hi".into()), "").await;

    let report = outcome.result.as_ref().expect("advisory is not an error");
    assert_eq!(report.exit, LoopExit::OneShotRateLimited);
    assert_eq!(report.exit_code(), 75);
    assert!(outcome.output.contains("[rate-limit/quota error]"));
    assert!(outcome.output.contains("- model: scripted-model"));
    assert_child_gone(&outcome);
}

// ============================================================================
// Interactive mode
// ============================================================================

#[tokio::test]
async fn interactive_session_until_quit() {
    let agent = ScriptedAgent::new(vec![Step::Weather("Rome")]);
    let outcome = run_loop(
        agent,
        "weather",
        RunMode::Interactive,
        "\n/tools\nweather in Rome?\nQuit\nnever read\n",
    )
    .await;

    let report = outcome.result.as_ref().expect("loop succeeds");
    assert_eq!(report.exit, LoopExit::QuitRequested);
    assert_eq!(report.queries, 1);
    assert_eq!(report.exit_code(), 0);

    let output = &outcome.output;
    assert!(output.starts_with(BANNER));
    assert!(output.contains("- get_weather: Current weather for a city"));
    assert!(output.contains("- get_forecast: Forecast for the next days"));
    assert!(output.contains(&format!("{RESPONSE_HEADER}\n{{")));
    assert!(output.contains("Rome: ⛅️ +18°C"));
    assert_eq!(output.matches(PROMPT).count(), 4);

    assert_eq!(outcome.history.len(), 2);
    assert_eq!(outcome.history[0].content, "weather in Rome?");
    assert_child_gone(&outcome);
}

#[tokio::test]
async fn end_of_input_exits_cleanly() {
    let agent = ScriptedAgent::new(vec![Step::Answer("hello")]);
    let outcome = run_loop(agent, "weather", RunMode::Interactive, "hi there\n").await;

    let report = outcome.result.as_ref().expect("loop succeeds");
    assert_eq!(report.exit, LoopExit::EndOfInput);
    assert_eq!(report.exit_code(), 0);
    assert!(outcome.output.ends_with("\nEOF received. Exiting.\n"));
    assert_child_gone(&outcome);
}

#[tokio::test]
async fn rate_limits_show_advisory_and_keep_going() {
    let agent = ScriptedAgent::new(vec![Step::RateLimited, Step::QuotaText, Step::Answer("ok")]);
    let outcome = run_loop(agent, "weather", RunMode::Interactive, "one\ntwo\nthree\n").await;

    let report = outcome.result.as_ref().expect("loop succeeds");
    assert_eq!(report.queries, 3);
    assert_eq!(report.advisories, 2);
    assert_eq!(report.exit, LoopExit::EndOfInput);
    assert_eq!(outcome.output.matches("[rate-limit/quota error]").count(), 2);
    assert_eq!(outcome.output.matches(RESPONSE_HEADER).count(), 1);
    assert_child_gone(&outcome);
}

#[tokio::test]
async fn history_accumulates_and_resets() {
    let agent = ScriptedAgent::new(vec![Step::Answer("a"), Step::Answer("b"), Step::Answer("c")]);
    let outcome = run_loop(
        agent.clone(),
        "weather",
        RunMode::Interactive,
        "first\nsecond\n/reset\nthird\n",
    )
    .await;

    outcome.result.as_ref().expect("loop succeeds");
    assert_eq!(
        agent.seen().await,
        vec![
            ("first".to_string(), 0),
            ("second".to_string(), 2),
            ("third".to_string(), 0),
        ]
    );
    assert!(outcome.output.contains("History cleared."));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn fatal_agent_error_still_closes_the_session() {
    let agent = ScriptedAgent::new(vec![Step::Broken]);
    let outcome = run_loop(agent, "weather", RunMode::Interactive, "hi\nnext\n").await;

    let err = outcome.result.as_ref().unwrap_err();
    assert!(matches!(err, LoopError::Fatal(_)), "{err:?}");
    assert_child_gone(&outcome);
}

#[tokio::test]
async fn failed_initialization_is_reported_and_cleaned_up() {
    let agent = ScriptedAgent::new(Vec::new());
    let outcome = run_loop(agent.clone(), "bad-handshake", RunMode::Interactive, "hi\n").await;

    let err = outcome.result.as_ref().unwrap_err();
    assert!(matches!(err, LoopError::Initialize(_)), "{err:?}");
    assert!(!err.user_message().is_empty());
    assert!(outcome.output.is_empty());
    assert!(agent.seen().await.is_empty());
    assert_child_gone(&outcome);
}

#[tokio::test]
async fn broken_session_during_query_is_fatal() {
    let agent = ScriptedAgent::new(vec![Step::Weather("Lima")]);
    let outcome = run_loop(
        agent,
        "exit-on-call",
        RunMode::OneShot("weather in Lima".into()),
        "",
    )
    .await;

    let err = outcome.result.as_ref().unwrap_err();
    assert!(
        matches!(
            err,
            LoopError::Fatal(AgentError::Tool(ToolError::Session(SessionError::Transport { .. })))
        ),
        "{err:?}"
    );
    assert_child_gone(&outcome);
}
