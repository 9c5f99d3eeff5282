use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusforest", version, about = "Grow a forest, one focus session at a time")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a live session
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Session statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fruit and tree variants
    Garden {
        #[command(subcommand)]
        action: commands::garden::GardenAction,
    },
    /// Task list
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Stored data
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
}

/// Logs go to stderr. `FOCUSFOREST_LOG` wins over `RUST_LOG`; default `warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("FOCUSFOREST_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats { json } => commands::stats::run(json),
        Commands::Garden { action } => commands::garden::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Data { action } => commands::data::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
