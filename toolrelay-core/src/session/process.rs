use super::channel::ToolChannel;
use super::error::SessionError;
use super::protocol::{self, InitializeResult, Inbound, METHOD_NOT_FOUND, ServerInfo};
use super::state::SessionState;
use crate::config::{ServerLaunch, SessionConfig};
use crate::constants::PROTOCOL_VERSION;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// An exclusively owned connection to one tool server child process.
pub struct ProcessSession {
    launch: ServerLaunch,
    timing: SessionConfig,
    state: SessionState,
    child: Option<Child>,
    writer: Option<BufWriter<ChildStdin>>,
    reader: Option<Lines<BufReader<ChildStdout>>>,
    next_id: u64,
    server_info: Option<ServerInfo>,
    instructions: Option<String>,
}

impl ProcessSession {
    /// Creates a session in the `Disconnected` state without spawning anything.
    pub fn new(launch: ServerLaunch, timing: SessionConfig) -> Self {
        Self {
            launch,
            timing,
            state: SessionState::Disconnected,
            child: None,
            writer: None,
            reader: None,
            next_id: 1,
            server_info: None,
            instructions: None,
        }
    }

    /// Spawns the server process; the returned session is `Initializing`.
    pub fn open(launch: ServerLaunch, timing: SessionConfig) -> Result<Self, SessionError> {
        let mut session = Self::new(launch, timing);
        session.spawn()?;
        Ok(session)
    }

    fn spawn(&mut self) -> Result<(), SessionError> {
        let mut command = Command::new(&self.launch.command);
        command
            .args(&self.launch.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.launch.workdir {
            command.current_dir(dir);
        }
        for (key, value) in &self.launch.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| SessionError::Spawn {
            server: self.launch.name.clone(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.transport_error("failed to capture server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.transport_error("failed to capture server stdout"))?;

        info!(
            server = %self.launch.name,
            command = %self.launch.command.display(),
            pid = child.id(),
            "Spawned tool server"
        );

        self.writer = Some(BufWriter::new(stdin));
        self.reader = Some(BufReader::new(stdout).lines());
        self.child = Some(child);
        self.state = SessionState::Initializing;
        Ok(())
    }

    /// Performs the handshake and moves the session to `Ready`.
    pub async fn initialize(&mut self) -> Result<&ServerInfo, SessionError> {
        self.expect_state(SessionState::Initializing)?;

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });
        let handshake_timeout = self.timing.handshake_timeout;
        let reply = self
            .exchange("initialize", params, handshake_timeout)
            .await?;

        let init: InitializeResult =
            serde_json::from_value(reply).map_err(|err| SessionError::Protocol {
                server: self.launch.name.clone(),
                reason: format!("malformed initialize reply: {err}"),
            })?;

        if init.protocol_version != PROTOCOL_VERSION {
            warn!(
                server = %self.launch.name,
                requested = PROTOCOL_VERSION,
                negotiated = %init.protocol_version,
                "Server negotiated a different protocol version"
            );
        }

        self.notify("notifications/initialized", json!({})).await?;

        let server_info = init.server_info.unwrap_or_else(|| ServerInfo {
            name: self.launch.name.clone(),
            version: None,
        });
        info!(
            server = %self.launch.name,
            remote_name = %server_info.name,
            remote_version = server_info.version.as_deref().unwrap_or("unknown"),
            "Tool server ready"
        );
        self.instructions = init.instructions.filter(|text| !text.trim().is_empty());
        self.state = SessionState::Ready;
        Ok(&*self.server_info.insert(server_info))
    }

    /// Sends one request on a `Ready` session and waits for its response.
    pub async fn send(&mut self, method: &str, params: Value) -> Result<Value, SessionError> {
        self.expect_state(SessionState::Ready)?;
        let request_timeout = self.timing.request_timeout;
        self.exchange(method, params, request_timeout).await
    }

    /// Terminates the child process and releases the pipes. Safe to call repeatedly.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        if let Some(mut writer) = self.writer.take() {
            // EOF on stdin is the polite shutdown signal for stdio servers
            if let Err(err) = writer.shutdown().await {
                debug!(server = %self.launch.name, %err, "Failed to close server stdin");
            }
        }
        self.reader = None;

        if let Some(mut child) = self.child.take() {
            match timeout(self.timing.shutdown_grace, child.wait()).await {
                Ok(Ok(status)) => {
                    debug!(server = %self.launch.name, %status, "Tool server exited");
                }
                Ok(Err(err)) => {
                    warn!(server = %self.launch.name, %err, "Failed to wait for tool server");
                    let _ = child.kill().await;
                }
                Err(_) => {
                    debug!(
                        server = %self.launch.name,
                        grace = ?self.timing.shutdown_grace,
                        "Tool server still running after grace period; killing"
                    );
                    if let Err(err) = child.kill().await {
                        debug!(
                            server = %self.launch.name,
                            %err,
                            "failed to kill tool server process (may have already exited)"
                        );
                    }
                }
            }
        }

        self.state = SessionState::Closed;
        info!(server = %self.launch.name, "Session closed");
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn name(&self) -> &str {
        &self.launch.name
    }

    /// OS process id of the running server, if any.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// Free-form usage instructions the server sent during the handshake.
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    async fn exchange(
        &mut self,
        method: &str,
        params: Value,
        limit: Duration,
    ) -> Result<Value, SessionError> {
        let id = self.next_id;
        self.next_id += 1;

        debug!(server = %self.launch.name, id, method, "Sending request");
        self.write_message(&protocol::request(id, method, params))
            .await?;

        match timeout(limit, self.read_response(id)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(server = %self.launch.name, id, method, ?limit, "Request timed out");
                Err(SessionError::Timeout {
                    server: self.launch.name.clone(),
                    method: method.to_string(),
                    timeout: limit,
                })
            }
        }
    }

    async fn read_response(&mut self, expected: u64) -> Result<Value, SessionError> {
        loop {
            let Some(reader) = self.reader.as_mut() else {
                return Err(self.transport_error("reader not initialised"));
            };
            let line = reader
                .next_line()
                .await
                .map_err(|err| self.transport_error(format!("failed to read stdout: {err}")))?;

            let Some(line) = line else {
                return Err(self.transport_error("server stdout closed (process may have exited)"));
            };
            if line.trim().is_empty() {
                continue;
            }

            match protocol::decode_line(&line) {
                Inbound::Response { id, outcome } if protocol::id_matches(&id, expected) => {
                    return outcome.map_err(|failure| SessionError::Rpc {
                        server: self.launch.name.clone(),
                        code: failure.code,
                        message: failure.message,
                        data: failure.data,
                    });
                }
                Inbound::Response { id, .. } => {
                    debug!(
                        server = %self.launch.name,
                        response_id = %id,
                        expected,
                        "Discarding response for a stale request"
                    );
                }
                Inbound::Request { id, method } => {
                    self.answer_server_request(id, &method).await?;
                }
                Inbound::Notification { method } => {
                    debug!(server = %self.launch.name, %method, "received notification from server");
                }
                Inbound::Noise => {
                    debug!(server = %self.launch.name, line = %line, "skipping non-JSON line from tool server");
                }
                Inbound::Malformed(reason) => {
                    return Err(SessionError::Protocol {
                        server: self.launch.name.clone(),
                        reason,
                    });
                }
            }
        }
    }

    async fn answer_server_request(&mut self, id: Value, method: &str) -> Result<(), SessionError> {
        let reply = if method == "ping" {
            protocol::response(id, json!({}))
        } else {
            warn!(server = %self.launch.name, method, "server sent unsupported request");
            protocol::error_response(
                id,
                METHOD_NOT_FOUND,
                format!("client does not implement method '{method}'"),
            )
        };
        self.write_message(&reply).await
    }

    async fn notify(&mut self, method: &str, params: Value) -> Result<(), SessionError> {
        self.write_message(&protocol::notification(method, params))
            .await
    }

    async fn write_message(&mut self, message: &Value) -> Result<(), SessionError> {
        let mut encoded = serde_json::to_string(message).map_err(|err| SessionError::Protocol {
            server: self.launch.name.clone(),
            reason: format!("failed to encode message: {err}"),
        })?;
        encoded.push('\n');

        let server = self.launch.name.clone();
        let transport = |reason: String| SessionError::Transport {
            server: server.clone(),
            reason,
        };

        let stream = self
            .writer
            .as_mut()
            .ok_or_else(|| transport("writer not initialised".into()))?;
        stream
            .write_all(encoded.as_bytes())
            .await
            .map_err(|err| transport(format!("failed to write to stdin: {err}")))?;
        stream
            .flush()
            .await
            .map_err(|err| transport(format!("failed to flush stdin: {err}")))?;
        Ok(())
    }

    fn expect_state(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                server: self.launch.name.clone(),
                actual: self.state,
                expected,
            })
        }
    }

    fn transport_error(&self, reason: impl Into<String>) -> SessionError {
        SessionError::Transport {
            server: self.launch.name.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ToolChannel for ProcessSession {
    fn server_name(&self) -> &str {
        self.name()
    }

    fn state(&self) -> SessionState {
        self.state
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value, SessionError> {
        self.send(method, params).await
    }
}
