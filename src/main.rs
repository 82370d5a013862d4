use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gamewatch::config::Paths;
use gamewatch::notify::TracingNotifier;
use gamewatch::{App, Config};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[derive(Parser)]
#[command(name = "gamewatch")]
#[command(
    author,
    version,
    about = "Keep watched game threads and the local game library in sync"
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Keep config, data and cache under this directory instead of the
    /// per-user defaults
    #[arg(long)]
    root: Option<PathBuf>,

    /// Send notices to the log only
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile watched threads with a list of thread URLs
    Sync {
        /// Read URLs from this file (one per line) when none are given
        #[arg(long)]
        file: Option<PathBuf>,
        /// Thread URLs
        urls: Vec<String>,
    },

    /// List updated, unread threads for games that are not installed
    Updated,

    /// Mark a thread's update as read
    Read { remote_id: i64 },

    /// List all watched threads
    Threads,

    /// Add games to the library
    Import {
        #[command(subcommand)]
        action: ImportCommands,
    },

    /// List the game library
    Games,
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Add games from local game directories
    Dirs {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Add every game directory directly under ROOT
    Scan { root: PathBuf },
    /// Add a game by its catalog URL
    Url {
        url: String,
        /// Local directory supplying version, mod flag and install path
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn setup_logging(verbosity: u8, log_file: &Path) -> Result<()> {
    let filter = match verbosity {
        0 => "gamewatch=info",
        1 => "gamewatch=debug",
        2 => "gamewatch=trace",
        _ => "trace",
    };

    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Arc::new(file));

    // Notices reach stdout already; stderr only shows problems
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match &cli.root {
        Some(root) => Paths::rooted_at(root),
        None => Paths::new()?,
    };
    setup_logging(cli.verbose, &paths.log_file())?;

    // Load configuration
    let config = Config::load_with_paths(paths).await?;

    // Initialize app
    let mut app = App::new(config).await?;
    if cli.quiet {
        app = app.with_notifier(Arc::new(TracingNotifier));
    }

    match cli.command {
        Commands::Sync { file, urls } => {
            app.cmd_sync(file.as_deref(), urls).await?;
        }
        Commands::Updated => app.cmd_updated().await?,
        Commands::Read { remote_id } => app.cmd_read(remote_id).await?,
        Commands::Threads => app.cmd_threads().await?,
        Commands::Import { action } => match action {
            ImportCommands::Dirs { paths } => app.cmd_import_dirs(&paths).await?,
            ImportCommands::Scan { root } => app.cmd_import_scan(&root).await?,
            ImportCommands::Url { url, dir } => app.cmd_import_url(&url, dir.as_deref()).await?,
        },
        Commands::Games => app.cmd_games().await?,
    }

    Ok(())
}
