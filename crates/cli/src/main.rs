use anyhow::Result;
use clap::{Parser, Subcommand};
use storyflow_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{pitch::PitchCommand, prompt::PromptCommand, queue::QueueCommand};

#[derive(Parser)]
#[command(name = "storyflow")]
#[command(about = "Pitch-to-article generation pipeline for editorial teams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the queue processor and the reconciliation sweep until Ctrl-C
    Serve,
    /// Process one batch from the queue and exit
    Process,
    /// Run one reconciliation sweep and exit
    Sweep,
    /// Create, edit and move pitches through their workflow
    #[command(subcommand)]
    Pitch(PitchCommand),
    /// Manage prompt templates
    #[command(subcommand)]
    Prompt(PromptCommand),
    /// Inspect and feed the work queue
    #[command(subcommand)]
    Queue(QueueCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries JSON results, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve => commands::serve::run(config).await,
        Commands::Process => commands::serve::run_process_once(config).await,
        Commands::Sweep => commands::serve::run_sweep_once(config).await,
        Commands::Pitch(cmd) => commands::pitch::run(cmd, &config).await,
        Commands::Prompt(cmd) => commands::prompt::run(cmd, &config).await,
        Commands::Queue(cmd) => commands::queue::run(cmd, &config).await,
    }
}
