//! CLI frontend for the Skirmish tactical combat engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "skirmish",
    about = "Skirmish: grid-based tactical combat with adaptive monsters",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine internals (AI scoring, scaling) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fight an encounter to the end, auto-piloting the party
    Run {
        /// Encounter file (JSON)
        file: PathBuf,

        /// RNG seed (overrides the encounter's config)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Stop the fight after this many rounds
        #[arg(long, default_value = "50")]
        max_rounds: u32,

        /// Print only the results, not the event log
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show how each monster would be scaled against the party
    Scale {
        /// Encounter file (JSON)
        file: PathBuf,
    },

    /// Draw the battlefield with starting positions
    Grid {
        /// Encounter file (JSON)
        file: PathBuf,

        /// Mark cells adjacent to an enemy
        #[arg(short, long)]
        threats: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            file,
            seed,
            max_rounds,
            quiet,
        } => commands::run::run(&file, seed, max_rounds, quiet),
        Commands::Scale { file } => commands::scale::run(&file),
        Commands::Grid { file, threats } => commands::grid::run(&file, threats),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
