//! CLI module for veil
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `serve` - Run an echo service behind the exchange logger
//! - `redact` - Sanitize a JSON document with the configured policy
//! - `mask` - Print the masked rendering of a value
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Sanitize a payload, redacting one extra field
//! echo '{"pin":"1234","cpf":"58707647000"}' | veil redact --redact pin
//!
//! # Generate shell completions
//! veil completions bash > ~/.bash_completion.d/veil
//! ```

pub mod completions;
pub mod config;
pub mod mask;
pub mod redact;
pub mod serve;

pub use completions::handle_completions;
pub use config::handle_config_init;
pub use mask::handle_mask;
pub use redact::handle_redact;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// veil - redacting HTTP exchange logger
#[derive(Parser, Debug)]
#[command(
    name = "veil",
    version,
    about = "Structured HTTP exchange logging with field redaction and masking"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an echo service with exchange logging
    Serve(ServeArgs),
    /// Sanitize a JSON document (file or stdin)
    Redact(RedactArgs),
    /// Mask a single value
    Mask(MaskArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "veil.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "VEIL_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "VEIL_HOST")]
    pub host: Option<String>,

    /// Set log level (fatal, error, warn, info, debug)
    #[arg(short, long, env = "VEIL_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct RedactArgs {
    /// JSON file to sanitize (reads stdin when omitted)
    pub file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, default_value = "veil.toml")]
    pub config: PathBuf,

    /// Additional field to redact (repeatable)
    #[arg(short, long = "redact", value_name = "KEY")]
    pub redact_keys: Vec<String>,

    /// Additional field to mask (repeatable)
    #[arg(short, long = "mask", value_name = "KEY")]
    pub mask_keys: Vec<String>,

    /// Print on a single line
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args, Debug)]
pub struct MaskArgs {
    /// Value to mask
    pub value: String,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "veil.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
