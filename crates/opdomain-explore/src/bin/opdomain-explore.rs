//! CLI binary for the operational domain explorer.
//!
//! Runs flood fill and/or contour tracing over a 2-D parameter grid with a
//! closed-form operational model standing in for the physical simulator.
//!
//! # Usage
//!
//! ```bash
//! # Explore one gate with both strategies over the default 1..10 grid
//! opdomain-explore explore --gate or_bestagon.sqd
//!
//! # Coarser grid, explicit seed, results written to a directory
//! opdomain-explore explore --step 0.25 --seed-at 5.6,5.0 --output results/
//!
//! # Gates x mu values with critical temperatures under the old and new
//! # constants; comparison table saved as JSON
//! opdomain-explore sweep --gate or_a.sqd --gate wire_b.sqd --mu -0.32 --output sweep/
//!
//! # Print a saved comparison table
//! opdomain-explore table --input sweep/sweep.json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use opdomain_explore::analytic::{AnalyticModel, GateOracle};
use opdomain_explore::collector::{load_collector, run_experiment, save_collector, Experiment, SweepCollector};
use opdomain_explore::config::{ExplorationConfig, SeedSelection};
use opdomain_explore::contour::contour_tracing;
use opdomain_explore::domain::Exploration;
use opdomain_explore::flood_fill::flood_fill;
use opdomain_explore::gate::GateCatalog;
use opdomain_explore::report::{format_comparison, format_report};
use opdomain_explore::space::{Dimension, ParameterSpace, SweepParameter};
use opdomain_explore::writer::{
    write_critical_temperature_csv_file, write_domain_csv_file, WriteParams,
};
use std::fs;
use std::path::Path;

/// Random samples the flood fill starts from unless seeds are configured.
const FLOOD_FILL_SAMPLES: usize = 250;
/// Random samples contour tracing starts from unless seeds are configured.
const CONTOUR_SAMPLES: usize = 100;

#[derive(Parser)]
#[command(name = "opdomain-explore")]
#[command(about = "Operational domain exploration for SiDB gate layouts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    FloodFill,
    Contour,
    Both,
}

#[derive(clap::Args)]
struct GridArgs {
    /// Parameter swept along the x axis.
    #[arg(long, default_value = "epsilon_r")]
    x_param: SweepParameter,

    /// Parameter swept along the y axis.
    #[arg(long, default_value = "lambda_tf")]
    y_param: SweepParameter,

    /// Lower bound of both axes.
    #[arg(long, default_value = "1.0")]
    min: f64,

    /// Upper bound of both axes.
    #[arg(long, default_value = "10.0")]
    max: f64,

    /// Step of both axes.
    #[arg(long, default_value = "0.05")]
    step: f64,

    /// Exploration config as JSON; flags below override it.
    #[arg(short, long)]
    config: Option<String>,

    /// Operational model as JSON, e.g. '{"kind": "product", "limit": 30}'.
    #[arg(long)]
    model: Option<String>,

    /// Start from this point (x,y values) instead of random samples.
    #[arg(long, allow_hyphen_values = true)]
    seed_at: Option<String>,

    /// Random seed for sample selection.
    #[arg(long)]
    rng_seed: Option<u64>,

    /// Cap on oracle evaluations per run.
    #[arg(long)]
    max_evaluations: Option<u64>,

    /// Worker threads for flood fill.
    #[arg(short, long)]
    parallelism: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Explore the operational domain of one gate.
    Explore {
        #[command(flatten)]
        grid: GridArgs,

        /// Gate layout name; the prefix up to the first '_' selects the gate type.
        #[arg(short, long, default_value = "or_bestagon.sqd")]
        gate: String,

        /// Strategy to run.
        #[arg(short, long, value_enum, default_value = "both")]
        strategy: StrategyArg,

        /// Output directory for CSV files and the report.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Critical temperature under the old and new constants, then both
    /// strategies, for every gate and mu value.
    Sweep {
        #[command(flatten)]
        grid: GridArgs,

        /// Gate layout names (repeatable).
        #[arg(short, long, default_value = "or_bestagon.sqd")]
        gate: Vec<String>,

        /// Charge transition levels µ₋ (repeatable).
        #[arg(long, default_value = "-0.32", allow_hyphen_values = true)]
        mu: Vec<f64>,

        /// Output directory for sweep.json and per-run CSV files.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the comparison table of a saved sweep.
    Table {
        /// Path to sweep.json.
        #[arg(short, long)]
        input: String,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Explore {
            grid,
            gate,
            strategy,
            output,
        } => cmd_explore(grid, gate, strategy, output),
        Commands::Sweep {
            grid,
            gate,
            mu,
            output,
        } => cmd_sweep(grid, gate, mu, output),
        Commands::Table { input } => cmd_table(input),
    }
}

fn exit_with(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn build_space(grid: &GridArgs) -> ParameterSpace {
    ParameterSpace::new(vec![
        Dimension::new(grid.x_param, grid.min, grid.max, grid.step),
        Dimension::new(grid.y_param, grid.min, grid.max, grid.step),
    ])
    .unwrap_or_else(|e| exit_with(e))
}

fn build_model(grid: &GridArgs) -> AnalyticModel {
    match &grid.model {
        Some(json) => serde_json::from_str(json)
            .unwrap_or_else(|e| exit_with(format!("invalid model '{}': {}", json, e))),
        None => AnalyticModel::default(),
    }
}

/// Base config from the config file, with command line overrides.
fn build_config(grid: &GridArgs, space: &ParameterSpace) -> ExplorationConfig {
    let mut config = match &grid.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .unwrap_or_else(|e| exit_with(format!("failed to read {}: {}", path, e)));
            serde_json::from_str(&json)
                .unwrap_or_else(|e| exit_with(format!("invalid config {}: {}", path, e)))
        }
        None => ExplorationConfig::default(),
    };

    if let Some(seed_at) = &grid.seed_at {
        let values: Vec<f64> = seed_at
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .unwrap_or_else(|e| exit_with(format!("invalid --seed-at '{}': {}", seed_at, e)));
        let point = space
            .point_at(&values)
            .unwrap_or_else(|| exit_with(format!("--seed-at {} lies outside the grid", seed_at)));
        config.seeds = SeedSelection::Explicit(vec![point]);
    }
    if let Some(rng_seed) = grid.rng_seed {
        config.rng_seed = rng_seed;
    }
    if grid.max_evaluations.is_some() {
        config.max_evaluations = grid.max_evaluations;
    }
    if let Some(parallelism) = grid.parallelism {
        config.parallelism = parallelism;
    }
    config
}

/// Per-strategy sample counts unless the user picked seeds.
fn with_sample_count(config: &ExplorationConfig, grid: &GridArgs, count: usize) -> ExplorationConfig {
    let mut config = config.clone();
    if grid.config.is_none() && grid.seed_at.is_none() {
        config.seeds = SeedSelection::Random { count };
    }
    config
}

fn run_flood_fill(space: &ParameterSpace, oracle: &GateOracle, config: &ExplorationConfig) -> Exploration {
    flood_fill(space, oracle, config).unwrap_or_else(|e| exit_with(e))
}

fn run_contour(space: &ParameterSpace, oracle: &GateOracle, config: &ExplorationConfig) -> Exploration {
    contour_tracing(space, oracle, config).unwrap_or_else(|e| exit_with(e))
}

fn create_output_dir(output: &Option<String>) {
    if let Some(dir) = output {
        if let Err(e) = fs::create_dir_all(dir) {
            exit_with(format!("failed to create output directory: {}", e));
        }
    }
}

fn save_csv(exploration: &Exploration, dir: &str, name: &str) {
    let path = Path::new(dir).join(name);
    match write_domain_csv_file(&exploration.domain, &path, &WriteParams::default()) {
        Ok(()) => eprintln!("Saved operational domain to: {}", path.display()),
        Err(e) => eprintln!("Warning: failed to save {}: {}", path.display(), e),
    }
}

fn save_critical_temperature(experiment: &Experiment, dir: &str, name: &str) {
    let path = Path::new(dir).join(name);
    match write_critical_temperature_csv_file(&experiment.old, &experiment.new, &path) {
        Ok(()) => eprintln!("Saved critical temperature to: {}", path.display()),
        Err(e) => eprintln!("Warning: failed to save {}: {}", path.display(), e),
    }
}

fn print_grid(grid: &GridArgs, space: &ParameterSpace, config: &ExplorationConfig) {
    eprintln!("  Axes:           {} x {}", grid.x_param, grid.y_param);
    eprintln!(
        "  Range:          {} .. {} step {} ({} points)",
        grid.min,
        grid.max,
        grid.step,
        space.total_points()
    );
    eprintln!("  Seeds:          {:?}", config.seeds);
    if let Some(max) = config.max_evaluations {
        eprintln!("  Max evals:      {}", max);
    }
    eprintln!("  Parallelism:    {}", config.parallelism);
}

fn cmd_explore(grid: GridArgs, gate: String, strategy: StrategyArg, output: Option<String>) {
    let spec = GateCatalog::spec(&gate).unwrap_or_else(|e| exit_with(e));
    let space = build_space(&grid);
    let model = build_model(&grid);
    let config = build_config(&grid, &space);
    let oracle = GateOracle::new(spec, model);

    create_output_dir(&output);

    eprintln!("═══════════════════════════════════════════════════════════════════════");
    eprintln!("  Operational Domain Exploration");
    eprintln!("═══════════════════════════════════════════════════════════════════════");
    eprintln!();
    eprintln!("Configuration:");
    eprintln!("  Gate:           {} ({:?})", oracle.gate().name, oracle.gate().gate_type);
    print_grid(&grid, &space, &config);
    eprintln!();

    let ff = (strategy != StrategyArg::Contour).then(|| {
        run_flood_fill(&space, &oracle, &with_sample_count(&config, &grid, FLOOD_FILL_SAMPLES))
    });
    let ct = (strategy != StrategyArg::FloodFill)
        .then(|| run_contour(&space, &oracle, &with_sample_count(&config, &grid, CONTOUR_SAMPLES)));

    let mut formatted = String::new();
    for exploration in ct.iter().chain(ff.iter()) {
        formatted.push_str(&format_report(exploration));
        formatted.push('\n');
    }
    if let (Some(ct), Some(ff)) = (&ct, &ff) {
        formatted.push_str(&format_comparison(ct, ff));
    }
    println!("{}", formatted);

    if let Some(dir) = output {
        if let Some(ff) = &ff {
            save_csv(ff, &dir, &format!("{}_flood_fill.csv", oracle.gate().name));
        }
        if let Some(ct) = &ct {
            save_csv(ct, &dir, &format!("{}_contour_tracing.csv", oracle.gate().name));
        }
        let report_path = format!("{}/report.txt", dir);
        if let Err(e) = fs::write(&report_path, &formatted) {
            eprintln!("Warning: failed to save report: {}", e);
        } else {
            eprintln!("Saved report to: {}", report_path);
        }
    }
}

fn cmd_sweep(grid: GridArgs, gates: Vec<String>, mus: Vec<f64>, output: Option<String>) {
    let specs: Vec<_> = gates
        .iter()
        .map(|g| GateCatalog::spec(g).unwrap_or_else(|e| exit_with(e)))
        .collect();
    let space = build_space(&grid);
    let model = build_model(&grid);
    let base = build_config(&grid, &space);

    create_output_dir(&output);

    eprintln!("═══════════════════════════════════════════════════════════════════════");
    eprintln!("  Operational Domain Sweep");
    eprintln!("═══════════════════════════════════════════════════════════════════════");
    eprintln!();
    eprintln!("Configuration:");
    eprintln!("  Gates:          {}", gates.join(", "));
    eprintln!("  mu values:      {:?}", mus);
    print_grid(&grid, &space, &base);
    eprintln!();

    let contour_config = with_sample_count(&base, &grid, CONTOUR_SAMPLES);
    let flood_config = with_sample_count(&base, &grid, FLOOD_FILL_SAMPLES);

    let mut collector = SweepCollector::new();
    for spec in specs {
        let oracle = GateOracle::new(spec, model.clone());
        let gate = oracle.gate().name.clone();
        for &mu in &mus {
            let experiment =
                run_experiment(&gate, &oracle, &space, &contour_config, &flood_config, mu)
                    .unwrap_or_else(|e| exit_with(e));
            eprintln!(
                "{} (mu {:.2}): critical temperature {:.2} K old, {:.2} K new",
                gate, mu, experiment.old.critical_temperature, experiment.new.critical_temperature
            );

            if let Some(dir) = &output {
                save_critical_temperature(
                    &experiment,
                    dir,
                    &format!("critical_temperature_{:.2}_{}.csv", mu, gate),
                );
                save_csv(
                    &experiment.contour_tracing,
                    dir,
                    &format!("operational_domain_contour_tracing_{:.2}_{}.csv", mu, gate),
                );
                save_csv(
                    &experiment.flood_fill,
                    dir,
                    &format!("operational_domain_flood_fill_{:.2}_{}.csv", mu, gate),
                );
            }
            collector.add(experiment.record(gate.clone()));
        }
    }

    println!("{}", collector.render_table());

    if let Some(dir) = output {
        let path = Path::new(&dir).join("sweep.json");
        match save_collector(&path, &collector) {
            Ok(()) => eprintln!("Saved sweep to: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to save sweep: {}", e),
        }
    }
}

fn cmd_table(input: String) {
    let collector = load_collector(&input)
        .unwrap_or_else(|e| exit_with(format!("failed to load {}: {}", input, e)));
    println!("{}", collector.render_table());
}
