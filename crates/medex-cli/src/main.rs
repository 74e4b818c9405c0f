//! CLI application for patient information extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, extract, models};

/// Extract patient names, dates of birth and claim IDs from medical reports
#[derive(Parser)]
#[command(name = "medex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(flatten)]
    extract: extract::ExtractArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract from every file matching a glob pattern
    Batch(batch::BatchArgs),

    /// Manage NER models
    Models(models::ModelsArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        None => extract::run(cli.extract, cli.config.as_deref()).await,
        Some(Commands::Batch(args)) => batch::run(args, cli.config.as_deref()).await,
        Some(Commands::Models(args)) => models::run(args).await,
        Some(Commands::Config(args)) => config::run(args, cli.config.as_deref()).await,
    }
}
