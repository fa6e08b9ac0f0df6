use crate::cli::Cli;
use std::process::ExitCode;
use thiserror::Error;
use toolrelay_core::agent::DirectiveAgent;
use toolrelay_core::config::{AppConfig, ConfigError, ServerLaunch};
use toolrelay_core::model::{ModelError, OpenAIClient};
use toolrelay_core::runtime::{LoopError, RunMode, SessionLoop, StdinSource};
use toolrelay_core::session::{ProcessSession, SessionError};
use tracing::{debug, info};

/// Failures before or during the session loop that end the process.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Loop(#[from] LoopError),
}

impl StartupError {
    pub fn user_message(&self) -> String {
        match self {
            StartupError::Config(err) => err.to_string(),
            StartupError::Model(err) => err.user_message(),
            StartupError::Session(err) => err.user_message(),
            StartupError::Loop(err) => err.user_message(),
        }
    }
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.model.model = model.clone();
    }
    if let Some(system) = &cli.system {
        config.agent.system_prompt = Some(system.clone());
    }
}

pub async fn run(cli: Cli) -> Result<ExitCode, StartupError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    debug!(model = %config.model.model, endpoint = %config.model.endpoint, "Configuration loaded");

    // Fail on a missing key before a server process exists.
    let api_key = config.model.resolve_api_key()?;
    let provider = OpenAIClient::from_config(&config.model, api_key)?;
    let agent = DirectiveAgent::new(provider, &config.model, &config.agent);

    let launch = ServerLaunch::from_target(&cli.target, cli.server_args.clone());
    info!(server = %launch.name, command = ?launch.command, "Launching tool server");
    let session = ProcessSession::open(launch, config.session.clone())?;

    let mode = match cli.once {
        Some(query) => RunMode::OneShot(query),
        None => RunMode::Interactive,
    };
    let mut session_loop = SessionLoop::new(agent, config.interactive, tokio::io::stdout());
    let report = session_loop
        .run(session, mode, &mut StdinSource::new())
        .await?;

    Ok(ExitCode::from(report.exit_code()))
}
