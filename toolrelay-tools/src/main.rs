//! Stdio tool server. Stdout carries only JSON-RPC; logs go to stderr.

mod rpc;
mod server;
mod tools;

use server::ToolServer;
use std::error::Error;
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::io::BufReader;
use toolrelay_core::config::AppConfig;
use toolrelay_core::model::OpenAIClient;
use tools::{SummarizeTool, ToolSet, WeatherTool, Workspace};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SERVER_NAME: &str = "toolrelay-tools";
const WEATHER_TIMEOUT: Duration = Duration::from_secs(15);

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(false)
            .init();
    });
}

/// Summarization needs a model key; without one the tool is not offered.
fn summarizer(config: &AppConfig) -> Option<SummarizeTool> {
    let api_key = match config.model.resolve_api_key() {
        Ok(key) => key,
        Err(err) => {
            warn!(error = %err, "summarize_text disabled");
            return None;
        }
    };
    match OpenAIClient::from_config(&config.model, api_key) {
        Ok(client) => Some(SummarizeTool::new(client, &config.model)),
        Err(err) => {
            warn!(error = %err, "summarize_text disabled");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = AppConfig::load(None)?;
    let workspace = Arc::new(Workspace::from_env()?);
    info!(root = %workspace.root().display(), "File tools confined to workspace");
    let weather = WeatherTool::from_env(WEATHER_TIMEOUT)?;
    let tools = ToolSet::standard(weather, workspace, summarizer(&config));
    info!(tools = ?tools.names().collect::<Vec<_>>(), "Serving tools over stdio");

    let server = ToolServer::new(SERVER_NAME, tools);
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}
