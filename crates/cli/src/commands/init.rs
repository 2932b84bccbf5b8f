use anyhow::{Context, Result};
use contagio_sim::simulation::Configuration;

use crate::args::InitArgs;
use crate::printing::print_parameters;

pub fn init_scenario(args: &InitArgs) -> Result<()> {
    let output = &args.output;

    println!("🦠 Contagio - Multi-Region Epidemic Simulator");
    println!("============================================\n");

    if output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let config = Configuration::sample();
    print_parameters(&config);

    config
        .to_json_file(output)
        .with_context(|| format!("Failed to write scenario to {}", output.display()))?;

    println!("\n✓ Scenario written to {}", output.display());
    println!("\nNext steps:");
    println!("  contagio validate -c {}", output.display());
    println!("  contagio run -c {} --progress", output.display());

    Ok(())
}
