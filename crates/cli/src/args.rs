use clap::Args;
use std::path::PathBuf;

use crate::defaults;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the sample scenario
    #[arg(short, long, default_value = defaults::SCENARIO_FILE)]
    pub output: PathBuf,

    /// Overwrite the output file if it already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Scenario file to check
    #[arg(short, long, default_value = defaults::SCENARIO_FILE)]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario file to run
    #[arg(short, long, default_value = defaults::SCENARIO_FILE)]
    pub config: PathBuf,

    /// Override the number of steps (default: use configured total)
    #[arg(short, long)]
    pub steps: Option<u64>,

    /// Override random seed (default: use configured seed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Step regions in parallel on the rayon pool
    #[arg(long)]
    pub parallel: bool,

    /// Draw transitions from binomial distributions instead of flooring
    #[arg(long)]
    pub stochastic: bool,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Write the full per-step history as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
