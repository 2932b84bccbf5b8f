use contagio_sim::pathogen::VariantKind;
use contagio_sim::region::VaccineKind;
use contagio_sim::simulation::{Configuration, Intervention, Simulation, SimulationReport};

use crate::defaults::MAX_TABLE_ROWS;

pub fn print_simulation_parameters(sim: &Simulation) {
    print_parameters(sim.configuration());
}

pub fn print_parameters(config: &Configuration) {
    let execution = &config.execution;
    println!("\n📋 Simulation Configuration");
    println!("  • Steps: {} [-s, --steps]", execution.total_steps);
    match execution.seed {
        Some(seed) => println!("  • Random Seed: {seed} [--seed]"),
        None => println!("  • Random Seed: Random [--seed]"),
    }
    println!("  • Transitions: {:?} [--stochastic]", execution.transitions);
    println!(
        "  • Region Stepping: {} [--parallel]",
        if execution.parallel { "Parallel" } else { "Sequential" }
    );

    println!("\n🗺️  Regions");
    println!(
        "  {:<16} {:>12} {:>9}  Neighbors (travel %)",
        "Name", "Population", "Mobility"
    );
    for region in &config.regions {
        let neighbors: Vec<String> = region
            .neighbors
            .iter()
            .map(|n| format!("{} ({})", n.region, n.travel_percentage))
            .collect();
        println!(
            "  {:<16} {:>12} {:>9.2}  {}",
            region.name,
            region.population,
            region.mobility,
            if neighbors.is_empty() { "-".to_string() } else { neighbors.join(", ") }
        );
    }

    println!("\n🦠 Variants");
    for variant in &config.variants {
        let p = &variant.params;
        let kind = match variant.kind {
            VariantKind::Stable => "stable".to_string(),
            VariantKind::Mutating {
                copy_error_probability,
                recombination_probability,
            } => format!(
                "mutating (copy error {copy_error_probability:.1e}, recombination {recombination_probability:.1e})"
            ),
        };
        println!("  • {} [{}]: {}", variant.name, variant.family, kind);
        println!(
            "    - Contagion: {:.3}, Disease Probability: {:.3}, Mortality: {:.4}",
            p.contagion_rate, p.disease_probability, p.mortality_rate
        );
        println!(
            "    - Incubation: {}, Latency: {}, Infectious: {}, Disease: {}, Immunity: {} steps",
            p.incubation_time,
            p.latency_time,
            p.infectious_duration,
            p.disease_duration,
            p.immunity_duration
        );
    }

    if !config.vaccines.is_empty() {
        println!("\n💉 Vaccines");
        for vaccine in &config.vaccines {
            let kind = match vaccine.kind {
                VaccineKind::Inhibiting { effectiveness } => {
                    format!("inhibiting, {effectiveness}% effective")
                }
                VaccineKind::Attenuating { reductions } => format!(
                    "attenuating (mortality -{}%, disease duration -{}%, disease probability -{}%, contagion -{}%)",
                    reductions.mortality_rate,
                    reductions.disease_duration,
                    reductions.disease_probability,
                    reductions.contagion_rate
                ),
            };
            println!(
                "  • {} → {}: {} (active after {} steps, for {})",
                vaccine.name, vaccine.target, kind, vaccine.activation_time, vaccine.duration
            );
        }
    }

    if !config.seeding.is_empty() {
        println!("\n🌱 Initial Seeding");
        for seed in &config.seeding {
            println!("  • {} in {}: {}%", seed.variant, seed.region, seed.percentage);
        }
    }

    if !config.schedule.is_empty() {
        println!("\n📅 Schedule");
        for entry in &config.schedule {
            println!("  • Step {:>4}: {}", entry.step, describe(&entry.action));
        }
    }
}

fn describe(action: &Intervention) -> String {
    match action {
        Intervention::Vaccinate {
            region,
            vaccine,
            percentage,
        } => format!("vaccinate {percentage}% of {region} with {vaccine}"),
        Intervention::Lockdown {
            region,
            mobility,
            duration,
        } => format!("lock {region} down to mobility {mobility} for {duration} steps"),
        Intervention::ReleaseLockdown { region } => format!("release lockdown in {region}"),
        Intervention::CloseFlow { from, to } => format!("close travel {from} ↔ {to}"),
        Intervention::OpenFlow { from, to } => format!("open travel {from} ↔ {to}"),
    }
}

pub fn print_summary(report: &SimulationReport) {
    println!("\n📊 Results after {} steps", report.steps);
    println!(
        "  {:<14} {:<18} {:>11} {:>9} {:>9} {:>9} {:>9} {:>9} {:>8}",
        "Region", "Variant", "Population", "Latent", "Infect.", "Sympt.", "Immune", "Deaths", "Ever %"
    );

    for series in report.series.iter().take(MAX_TABLE_ROWS) {
        let Some(state) = series.latest() else {
            continue;
        };
        let attack = if state.population == 0 {
            0.0
        } else {
            series.totals.ever_infected as f64 / state.population as f64 * 100.0
        };
        println!(
            "  {:<14} {:<18} {:>11} {:>9} {:>9} {:>9} {:>9} {:>9} {:>7.2}%",
            series.region,
            series.variant,
            state.population,
            state.latent,
            state.infectious,
            state.symptomatic,
            state.immune,
            state.deaths,
            attack
        );
    }
    if report.series.len() > MAX_TABLE_ROWS {
        println!("  … {} more rows", report.series.len() - MAX_TABLE_ROWS);
    }

    let deaths: u64 = report.series.iter().map(|s| s.totals.deaths).sum();
    let infected: u64 = report.series.iter().map(|s| s.totals.ever_infected).sum();
    println!("\n  • Variants in circulation: {}", report.variants);
    println!("  • Total infections: {infected}");
    println!("  • Total deaths: {deaths}");
}
