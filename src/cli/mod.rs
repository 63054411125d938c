//! CLI module for bridgeport
//!
//! Running the binary with no subcommand starts the server; flags override the
//! configuration file and `BRIDGEPORT_*` environment variables.
//!
//! # Example
//!
//! ```bash
//! # Start on the default address (127.0.0.1:8000)
//! bridgeport
//!
//! # Serve /v2 on all interfaces against a local Ollama model
//! bridgeport --host 0.0.0.0 --port 9000 --api-version 2 --backend-model qwen2.5
//!
//! # Generate shell completions
//! bridgeport completions bash > ~/.bash_completion.d/bridgeport
//! ```

pub mod completions;
pub mod serve;

pub use completions::handle_completions;

use crate::config::BackendKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// bridgeport - OpenAI-compatible chat completions over a plain text model
#[derive(Parser, Debug)]
#[command(
    name = "bridgeport",
    version,
    about = "OpenAI-compatible chat completion server with emulated tool calling",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Path to configuration file (ignored when missing)
    #[arg(short, long, default_value = "bridgeport.toml")]
    pub config: PathBuf,

    /// Override listen host
    #[arg(short = 'H', long, env = "BRIDGEPORT_HOST")]
    pub host: Option<String>,

    /// Override listen port
    #[arg(short, long, env = "BRIDGEPORT_PORT")]
    pub port: Option<u16>,

    /// Model id advertised on /models and used when requests omit one
    #[arg(long)]
    pub model_name: Option<String>,

    /// API version prefix: bare digits, "latest", or e.g. "v1"
    #[arg(long)]
    pub api_version: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "BRIDGEPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Text-generation backend kind (ollama, openai)
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Backend base URL (e.g., http://localhost:11434)
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Model name passed to the backend
    #[arg(long)]
    pub backend_model: Option<String>,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
