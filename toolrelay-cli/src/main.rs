mod app;
mod cli;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use std::sync::Once;
use tracing::debug;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Logs go to stderr so stdout carries only prompts and responses.
fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    debug!(target = %cli.target, once = cli.once.is_some(), "Starting toolrelay");

    match app::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            debug!(error = ?err, "toolrelay failed");
            eprintln!("Error: {}", err.user_message());
            ExitCode::FAILURE
        }
    }
}
