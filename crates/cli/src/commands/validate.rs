use anyhow::{Context, Result};
use contagio_sim::simulation::{Configuration, SimulationBuilder};

use crate::args::ValidateArgs;
use crate::printing::print_simulation_parameters;

pub fn validate_scenario(args: &ValidateArgs) -> Result<()> {
    let path = &args.config;
    println!("🔍 Validating scenario: {}", path.display());

    if !path.exists() {
        anyhow::bail!("Scenario file does not exist");
    }

    let config = Configuration::from_json_file(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    println!("✓ Parsed: {} regions, {} variants", config.regions.len(), config.variants.len());

    let sim = SimulationBuilder::from_configuration(config)
        .build()
        .context("Scenario is invalid")?;
    println!("✓ Entities resolved");
    println!("✓ Schedule: {} interventions", sim.configuration().schedule.len());

    let seeded: u64 = sim
        .active_pairs()
        .map(|(r, v)| sim.current_state(r, v).map(|s| s.symptomatic))
        .sum::<Result<u64, _>>()?;
    println!("✓ Seeded carriers: {seeded}");

    print_simulation_parameters(&sim);
    println!("\n✓ Scenario is valid");
    Ok(())
}
