use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "toolrelay",
    version,
    about = "Chat with a language model that can call the tools of a stdio tool server"
)]
pub struct Cli {
    /// Tool server to launch: `.py` runs under python, `.js`/`.mjs`/`.cjs`
    /// under node, anything else is executed directly
    pub target: String,
    /// Run a single query non-interactively and exit
    #[arg(long, value_name = "QUERY")]
    pub once: Option<String>,
    /// Configuration file (defaults to config/toolrelay.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Extra system prompt prepended to the agent instructions
    #[arg(long)]
    pub system: Option<String>,
    /// Model name, overriding configuration and environment
    #[arg(long)]
    pub model: Option<String>,
    /// Arguments passed to the tool server, after `--`
    #[arg(last = true)]
    pub server_args: Vec<String>,
}
