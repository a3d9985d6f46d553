//! Arvak quantum-inspired optimisation CLI.
//!
//! Loads an optimisation problem and an algorithm configuration from JSON
//! or YAML, runs one driver and prints (or exports) the solution record.
//!
//! ```text
//! arvak-qopt solve --problem campaign.yaml --algorithm qaoa --seed 7
//! arvak-qopt validate --problem campaign.yaml --config anneal.json
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{solve, validate, version};

/// Arvak QOpt - quantum-inspired optimisation on a classical statevector
#[derive(Parser)]
#[command(name = "arvak-qopt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an optimisation problem
    Solve {
        /// Problem file (JSON or YAML)
        #[arg(short, long)]
        problem: String,

        /// Algorithm configuration file (JSON or YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Algorithm (annealing, qaoa, quantum_walk); overrides the config file
        #[arg(short, long)]
        algorithm: Option<String>,

        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Iterations (annealing), optimizer steps (qaoa) or walk steps
        #[arg(long)]
        iterations: Option<usize>,

        /// Wall-clock budget in milliseconds
        #[arg(long)]
        time_limit_ms: Option<u64>,

        /// Write the solution record to a file (.json, .yaml or .yml)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Validate a problem and optional configuration without solving
    Validate {
        /// Problem file (JSON or YAML)
        #[arg(short, long)]
        problem: String,

        /// Algorithm configuration file (JSON or YAML)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Solve {
            problem,
            config,
            algorithm,
            seed,
            iterations,
            time_limit_ms,
            output,
            format,
        } => solve::execute(&solve::SolveArgs {
            problem: &problem,
            config: config.as_deref(),
            algorithm: algorithm.as_deref(),
            seed,
            iterations,
            time_limit_ms,
            output: output.as_deref(),
            format: &format,
        }),

        Commands::Validate { problem, config } => validate::execute(&problem, config.as_deref()),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
