use super::classify::{FailureClass, classify};
use super::error::LoopError;
use super::source::QuerySource;
use super::state::{LoopExit, LoopReport, LoopState, RunMode};
use crate::agent::{Agent, AgentError, AgentResponse};
use crate::config::InteractiveConfig;
use crate::domain::types::{ChatMessage, Query};
use crate::serializer::canonicalize;
use crate::session::{ProcessSession, SessionState};
use crate::tooling::{ToolInvoker, ToolRegistry};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

pub const BANNER: &str = "MCP Client Started! Type 'quit' to exit.";
pub const PROMPT: &str = "\nQuery: ";
pub const RESPONSE_HEADER: &str = "\nResponse:";
const EOF_NOTICE: &str = "\nEOF received. Exiting.";
const HELP_TEXT: &str = "Commands:\n  /tools  list the tools offered by the server\n  /reset  forget the conversation so far\n  /help   show this help\nType 'quit' to exit.";

enum Dispatch {
    Answered(AgentResponse),
    Failed(AgentError),
    Interrupted,
}

/// Owns one tool server session from handshake to termination and feeds
/// queries through the agent.
pub struct SessionLoop<A, W> {
    agent: A,
    interactive: InteractiveConfig,
    output: W,
    state: LoopState,
    history: Vec<ChatMessage>,
}

impl<A, W> SessionLoop<A, W>
where
    A: Agent,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(agent: A, interactive: InteractiveConfig, output: W) -> Self {
        Self {
            agent,
            interactive,
            output,
            state: LoopState::Idle,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Initializes the session, discovers tools, runs the queries, and closes
    /// the session on every exit path.
    pub async fn run(
        &mut self,
        mut session: ProcessSession,
        mode: RunMode,
        input: &mut dyn QuerySource,
    ) -> Result<LoopReport, LoopError> {
        let span = info_span!("session", run = %Uuid::new_v4(), server = %session.name());
        let outcome = self
            .drive(&mut session, mode, input)
            .instrument(span)
            .await;

        session.close().await;
        self.transition(LoopState::Terminated);
        let _ = self.output.flush().await;

        match &outcome {
            Ok(report) => info!(
                queries = report.queries,
                advisories = report.advisories,
                exit = ?report.exit,
                "Session loop finished"
            ),
            Err(err) => warn!(error = %err, "Session loop aborted"),
        }
        outcome
    }

    async fn drive(
        &mut self,
        session: &mut ProcessSession,
        mode: RunMode,
        input: &mut dyn QuerySource,
    ) -> Result<LoopReport, LoopError> {
        if session.state() != SessionState::Ready {
            session.initialize().await.map_err(LoopError::Initialize)?;
        }
        let registry = ToolRegistry::discover(session)
            .await
            .map_err(LoopError::Discovery)?
            .with_instructions(session.instructions());

        match mode {
            RunMode::OneShot(text) => self.run_once(session, &registry, text).await,
            RunMode::Interactive => self.run_interactive(session, &registry, input).await,
        }
    }

    async fn run_once(
        &mut self,
        session: &mut ProcessSession,
        registry: &ToolRegistry,
        text: String,
    ) -> Result<LoopReport, LoopError> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Empty one-shot query; nothing to dispatch");
            return Ok(LoopReport {
                queries: 0,
                advisories: 0,
                exit: LoopExit::OneShotComplete,
            });
        }

        let query = Query::one_shot(text);
        match self.dispatch(session, registry, &query).await {
            Dispatch::Answered(response) => {
                self.transition(LoopState::Formatting);
                let rendered = canonicalize(&response);
                self.write_line(&rendered).await?;
                Ok(LoopReport {
                    queries: 1,
                    advisories: 0,
                    exit: LoopExit::OneShotComplete,
                })
            }
            Dispatch::Failed(err) => match classify(&err) {
                FailureClass::RateLimited => {
                    self.advise(&err).await?;
                    Ok(LoopReport {
                        queries: 1,
                        advisories: 1,
                        exit: LoopExit::OneShotRateLimited,
                    })
                }
                FailureClass::Fatal => Err(LoopError::Fatal(err)),
            },
            Dispatch::Interrupted => Ok(LoopReport {
                queries: 1,
                advisories: 0,
                exit: LoopExit::Interrupted,
            }),
        }
    }

    async fn run_interactive(
        &mut self,
        session: &mut ProcessSession,
        registry: &ToolRegistry,
        input: &mut dyn QuerySource,
    ) -> Result<LoopReport, LoopError> {
        let mut queries = 0;
        let mut advisories = 0;
        self.write_line(BANNER).await?;

        let exit = loop {
            self.transition(LoopState::AwaitingInput);
            self.output.write_all(PROMPT.as_bytes()).await?;
            self.output.flush().await?;

            let Some(line) = input.next_query().await? else {
                self.write_line(EOF_NOTICE).await?;
                break LoopExit::EndOfInput;
            };
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if self.is_quit_word(text) {
                break LoopExit::QuitRequested;
            }
            if self.handle_command(text, registry).await? {
                continue;
            }

            queries += 1;
            let query = Query::interactive(text);
            match self.dispatch(session, registry, &query).await {
                Dispatch::Answered(response) => {
                    self.transition(LoopState::Formatting);
                    let rendered = canonicalize(&response);
                    self.write_line(RESPONSE_HEADER).await?;
                    self.write_line(&rendered).await?;
                    self.remember(&query, &response);
                    self.transition(LoopState::Idle);
                }
                Dispatch::Failed(err) => match classify(&err) {
                    FailureClass::RateLimited => {
                        advisories += 1;
                        self.advise(&err).await?;
                    }
                    FailureClass::Fatal => return Err(LoopError::Fatal(err)),
                },
                Dispatch::Interrupted => break LoopExit::Interrupted,
            }
        };

        Ok(LoopReport {
            queries,
            advisories,
            exit,
        })
    }

    async fn dispatch(
        &mut self,
        session: &mut ProcessSession,
        registry: &ToolRegistry,
        query: &Query,
    ) -> Dispatch {
        self.transition(LoopState::Dispatching);
        let mut invoker = ToolInvoker::new(session, registry);
        let run = self.agent.run(query, &mut invoker, &self.history);

        tokio::select! {
            result = run => match result {
                Ok(response) => Dispatch::Answered(response),
                Err(err) => {
                    warn!(error = %err, "Query dispatch failed");
                    Dispatch::Failed(err)
                }
            },
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted while dispatching a query");
                Dispatch::Interrupted
            }
        }
    }

    async fn advise(&mut self, err: &AgentError) -> Result<(), LoopError> {
        warn!(model = self.agent.model_name(), error = %err, "Rate limit reached");
        let advisory = format!(
            "\n[rate-limit/quota error]\n- model: {}\n- Fix: wait and retry, or switch model via GROQ_MODEL, or check your account limits.\n",
            self.agent.model_name()
        );
        self.write_line(&advisory).await
    }

    /// Returns `true` when `text` was a client command rather than a query.
    async fn handle_command(
        &mut self,
        text: &str,
        registry: &ToolRegistry,
    ) -> Result<bool, LoopError> {
        match text {
            "/tools" => {
                let listing = if registry.is_empty() {
                    "No tools available.".to_string()
                } else {
                    registry
                        .tools()
                        .iter()
                        .map(|tool| {
                            if tool.description.is_empty() {
                                format!("- {}", tool.name)
                            } else {
                                format!("- {}: {}", tool.name, tool.description)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                self.write_line(&listing).await?;
            }
            "/reset" => {
                self.history.clear();
                self.write_line("History cleared.").await?;
            }
            "/help" => self.write_line(HELP_TEXT).await?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn is_quit_word(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.interactive.quit_words.iter().any(|word| *word == lowered)
    }

    fn remember(&mut self, query: &Query, response: &AgentResponse) {
        let limit = self.interactive.history_limit;
        if limit == 0 {
            return;
        }
        self.history.push(ChatMessage::user(query.text.clone()));
        if let Some(answer) = response.final_text() {
            self.history.push(ChatMessage::assistant(answer));
        }
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }

    fn transition(&mut self, next: LoopState) {
        if !self.state.can_transition(next) {
            warn!(from = %self.state, to = %next, "Unexpected loop state transition");
        }
        debug!(from = %self.state, to = %next, "Loop state transition");
        self.state = next;
    }

    async fn write_line(&mut self, text: &str) -> Result<(), LoopError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}
