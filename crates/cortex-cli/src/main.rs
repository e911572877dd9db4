//! cortex CLI: terminal front end for the anatomy quiz, search and dashboard.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cortex", version, about = "Veterinary anatomy quiz, atlas search and progress tracker")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Content JSON file (overrides config)
    #[arg(long, global = true)]
    content: Option<PathBuf>,

    /// Directory for saved progress and history (overrides config)
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show question counts for each selection step
    Counts {
        /// Region to drill into (or "combined")
        #[arg(long)]
        region: Option<String>,

        /// System to drill into (or "combined"); needs --region
        #[arg(long)]
        system: Option<String>,
    },

    /// Search atlas topics, why cards and quiz questions
    Search {
        /// Search terms
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print hits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Take a quiz interactively
    Quiz {
        /// Region (e.g. "Thorax", "Head & Neck", "combined")
        #[arg(long)]
        region: Option<String>,

        /// System (e.g. "Myology", "combined")
        #[arg(long)]
        system: Option<String>,

        /// Format: mcq, tf, fib
        #[arg(long, default_value = "mcq")]
        format: String,

        /// Seed for the question shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Continue the saved quiz instead of starting a new one
        #[arg(long)]
        resume: bool,
    },

    /// Show performance statistics from past quizzes
    Dashboard {
        /// Delete all recorded history
        #[arg(long)]
        clear: bool,
    },

    /// Open the content behind a search hit
    Show {
        /// Search terms
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Which hit to open (1-based)
        #[arg(long, default_value = "1")]
        hit: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let overrides = commands::Overrides {
        config: cli.config,
        content: cli.content,
        storage_dir: cli.storage_dir,
    };
    let config = match commands::resolve_config(&overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Counts { region, system } => commands::counts::execute(&config, region, system),
        Commands::Search { query, json } => commands::search::execute(&config, query, json),
        Commands::Quiz {
            region,
            system,
            format,
            seed,
            resume,
        } => commands::quiz::execute(&config, region, system, format, seed, resume).await,
        Commands::Dashboard { clear } => commands::dashboard::execute(&config, clear),
        Commands::Show { query, hit } => commands::show::execute(&config, query, hit),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
