use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use coalswap::cli::cli::{Args, Command};
use coalswap::config::scenario_config::ScenarioConfig;
use coalswap::core::pipeline::{self, RunSummary};
use coalswap::utils::csv_export::CsvExporter;
use coalswap::utils::logging;

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging())?;

    match args.command() {
        Command::InitConfig { path } => init_config(path)?,
        command => {
            let summary = run_analysis(&args, command)?;
            println!("\nOutputs written to {}", summary.output_dir.display());
            for file in &summary.files {
                println!("  {}", file.display());
            }
        }
    }

    logging::print_timing_report();
    Ok(())
}

fn init_config(path: &Path) -> Result<()> {
    ScenarioConfig::default()
        .save(path)
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    println!("Wrote default scenario config to {}", path.display());
    Ok(())
}

fn run_analysis(args: &Args, command: &Command) -> Result<RunSummary> {
    // Assumptions are validated on load, before any data is read.
    let mut config = ScenarioConfig::load_or_default(args.config())
        .context("failed to load scenario config")?;
    if args.parallel() {
        config.batch.parallel = true;
    }

    let exporter = CsvExporter::new(args.output_dir(), args.timestamped())
        .with_context(|| format!("failed to prepare output directory {}", args.output_dir().display()))?;
    info!(output_dir = %exporter.output_dir().display(), parallel = config.batch.parallel, "starting run");

    match command {
        Command::Emissions { input } => pipeline::run_emissions_analysis(input, &config, &exporter),
        Command::Tco { input } => pipeline::run_tco_analysis(input, &config, &exporter),
        Command::Opportunity { input, tco_table } => {
            pipeline::run_opportunity_analysis(input, tco_table.as_deref(), &config, &exporter)
        }
        Command::All { input } => pipeline::run_all(input, &config, &exporter),
        Command::InitConfig { .. } => anyhow::bail!("init-config does not run an analysis"),
    }
}
