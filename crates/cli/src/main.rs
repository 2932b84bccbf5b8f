mod args;
mod commands;
pub mod defaults;
mod printing;

use anyhow::Result;
use clap::{Parser, Subcommand};

use args::{InitArgs, RunArgs, ValidateArgs};
use commands::{init, run, validate};

/// Contagio: a multi-region epidemic simulator
///
/// Follows how pathogen variants spread, mutate and recede across a network
/// of regions connected by travel, under vaccination campaigns and
/// lockdowns.
#[derive(Parser, Debug)]
#[command(name = "contagio")]
#[command(author, version, about = "Simulates epidemics across connected regions", long_about = None)]
struct Cli {
    /// Number of threads to use for parallel processing
    ///
    /// If not specified, defaults to the number of logical CPUs.
    #[arg(short = 't', long, global = true)]
    threads: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a sample scenario to start from.
    ///
    /// Three Belgian regions, a mutating coronavirus, a stable influenza
    /// strain, two vaccines and a small intervention schedule.
    Init(InitArgs),

    /// Check a scenario without running it.
    ///
    /// Parses the file, resolves every name and validates every parameter.
    Validate(ValidateArgs),

    /// Run a scenario.
    ///
    /// Executes the simulation step by step, applying scheduled
    /// interventions, and prints a summary per region and variant.
    Run(RunArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    match cli.command {
        Commands::Init(args) => init::init_scenario(&args)?,
        Commands::Validate(args) => validate::validate_scenario(&args)?,
        Commands::Run(args) => run::run_scenario(&args)?,
    }

    Ok(())
}
