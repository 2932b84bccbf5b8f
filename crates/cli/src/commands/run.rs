use anyhow::{Context, Result};
use contagio_sim::region::TransitionMode;
use contagio_sim::simulation::{Configuration, SimulationBuilder};
use indicatif::{ProgressBar, ProgressStyle};

use crate::args::RunArgs;
use crate::defaults::PROGRESS_TEMPLATE;
use crate::printing::{print_simulation_parameters, print_summary};

pub fn run_scenario(args: &RunArgs) -> Result<()> {
    println!("🦠 Contagio - Running Simulation");
    println!("============================================\n");

    let mut config = Configuration::from_json_file(&args.config)
        .with_context(|| format!("Failed to read {}", args.config.display()))?;

    if let Some(steps) = args.steps {
        config.execution.total_steps = steps;
    }
    if let Some(seed) = args.seed {
        config.execution.seed = Some(seed);
    }
    if args.parallel {
        config.execution.parallel = true;
    }
    if args.stochastic {
        config.execution.transitions = TransitionMode::Stochastic;
    }

    let mut sim = SimulationBuilder::from_configuration(config)
        .build()
        .context("Failed to build simulation")?;
    print_simulation_parameters(&sim);

    let total_steps = sim.configuration().execution.total_steps;
    println!("\nRunning {total_steps} steps...");

    let pb = if args.progress {
        let pb = ProgressBar::new(total_steps);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_TEMPLATE)
                .context("Invalid progress template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut emerged = 0;
    for _ in 0..total_steps {
        let outcome = sim
            .step()
            .with_context(|| format!("Step {} failed", sim.step_index() + 1))?;
        for spawn in outcome.spawned.iter().filter(|s| s.novel) {
            emerged += 1;
            let message = format!(
                "🧬 Step {}: new variant {} in {}",
                outcome.step,
                sim.variant(spawn.variant)?.name(),
                sim.region(spawn.region)?.name()
            );
            match &pb {
                Some(pb) => pb.println(message),
                None => println!("{message}"),
            }
        }
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    let report = sim.report()?;
    print_summary(&report);
    println!("  • Variants emerged during the run: {emerged}");

    if let Some(output) = &args.output {
        report
            .to_json_file(output)
            .with_context(|| format!("Failed to write history to {}", output.display()))?;
        println!("\n✓ History written to {}", output.display());
    }

    println!("\n✓ Simulation complete!");
    Ok(())
}
