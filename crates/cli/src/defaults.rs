//! Shared default values for command-line arguments.

pub const SCENARIO_FILE: &str = "scenario.json";

/// Rows shown per table before the remainder is summarized.
pub const MAX_TABLE_ROWS: usize = 40;

pub const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {per_sec}";
