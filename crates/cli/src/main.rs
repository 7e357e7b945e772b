//! docchat CLI
//!
//! Ask questions about a folder of documents by text or voice, in English,
//! Hindi, Tamil or Telugu.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{AskCommand, IndexCommand, ListenCommand, StatusCommand};
use docchat_core::{config::AppConfig, logging};
use docchat_pipeline::{PipelineComponents, PipelineOrchestrator};
use std::path::PathBuf;

/// docchat - multilingual question answering over your documents
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(about = "Multilingual question answering over your documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCCHAT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Documents folder to index
    #[arg(short, long, global = true, env = "DOCCHAT_DOCUMENTS")]
    documents: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (groq, openai, ollama)
    #[arg(short, long, global = true, env = "DOCCHAT_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "DOCCHAT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question about the documents
    Ask(AskCommand),

    /// Ask a spoken question from an audio file
    Listen(ListenCommand),

    /// Rebuild the document index
    Index(IndexCommand),

    /// Show service status
    Status(StatusCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ask(_) => "ask",
            Commands::Listen(_) => "listen",
            Commands::Index(_) => "index",
            Commands::Status(_) => "status",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())
        .context("Failed to load configuration")?;
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.documents,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.log_format, config.no_color)?;

    tracing::info!("docchat starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Documents: {:?}", config.documents_dir);

    config.validate().context("Invalid configuration")?;

    let components = PipelineComponents::from_config(&config)
        .await
        .context("Failed to initialise pipeline")?;
    let orchestrator = PipelineOrchestrator::new(components);

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    // `index` builds on its own; everything else serves whatever builds now.
    if !matches!(cli.command, Commands::Index(_)) {
        match orchestrator.rebuild_index().await {
            Ok(stats) => tracing::info!(
                "Indexed {} documents ({} chunks)",
                stats.documents_indexed,
                stats.chunks
            ),
            Err(e) => tracing::warn!("No index available, running in basic mode: {}", e),
        }
    }

    let result = match cli.command {
        Commands::Ask(ref cmd) => cmd.execute(&orchestrator).await,
        Commands::Listen(ref cmd) => cmd.execute(&orchestrator).await,
        Commands::Index(ref cmd) => cmd.execute(&orchestrator).await,
        Commands::Status(ref cmd) => cmd.execute(&orchestrator).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
