//! CLI entry point for the restonks rebalancer.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use restonks_rebalancer::config::Config;
use restonks_rebalancer::error::Error;
use restonks_rebalancer::execution::{self, PlanOptions};

#[derive(Parser)]
#[command(name = "restonks")]
#[command(about = "Plan how to invest new cash toward target portfolio weights")]
#[command(version)]
struct Cli {
    /// Path to config.toml (defaults apply when the default file is absent)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the buy plan for an investment amount
    Plan {
        /// Investment amount, in the base currency
        investment: f64,

        /// Target weights TOML file
        #[arg(short, long)]
        weights: Option<PathBuf>,

        /// Market snapshot JSON file
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current holdings in the base currency
    Positions {
        /// Market snapshot JSON file
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::load_or_default(&PathBuf::from("config.toml")),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Plan {
            investment,
            weights,
            snapshot,
            json,
        } => {
            let opts = PlanOptions {
                investment,
                weights_file: weights,
                snapshot,
                json,
            };
            execution::run(&config, &opts)
        }
        Command::Positions { snapshot } => execution::show_positions(&config, snapshot.as_ref()),
    };

    if let Err(e) = result {
        match &e {
            Error::Output(io) if io.kind() == std::io::ErrorKind::BrokenPipe => process::exit(0),
            _ if e.is_config() => {
                eprintln!("Configuration error: {e}");
                process::exit(1);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(2);
            }
        }
    }
}
