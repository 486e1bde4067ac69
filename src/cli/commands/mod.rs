//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod classify;
mod config_cmd;
mod engines;
mod extract;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::helpers::load_config;

/// Output format for extracted documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Full document record as JSON
    #[default]
    Json,
    /// Plain text, pages separated by blank lines
    Text,
}

#[derive(Parser)]
#[command(name = "pagefuse")]
#[command(about = "Page classification and dual-track OCR/vision text extraction")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a page dump (JSON produced by a document parser)
    Extract {
        /// Page dump: a JSON array of pages or an object with a "pages" array
        input: PathBuf,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Disable the OCR track
        #[arg(long)]
        no_ocr: bool,
        /// Disable the vision track
        #[arg(long)]
        no_vision: bool,
        /// Pages processed concurrently (default: from config)
        #[arg(short = 'j', long)]
        jobs: Option<usize>,
    },

    /// Classify pages without running recognition
    Classify {
        /// Page dump to classify
        input: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configured recognition engines and their availability
    Engines,

    /// Print the effective configuration as TOML
    Config,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Extract {
            input,
            output,
            format,
            no_ocr,
            no_vision,
            jobs,
        } => {
            let options = extract::ExtractOptions {
                output,
                format,
                no_ocr,
                no_vision,
                jobs,
            };
            extract::cmd_extract(config, &input, options).await
        }
        Commands::Classify { input, json } => classify::cmd_classify(&config, &input, json).await,
        Commands::Engines => engines::cmd_engines(&config),
        Commands::Config => config_cmd::cmd_config_show(&config),
    }
}
