//! The three analysis runs. Each run reloads the source dataset, writes its
//! tables into the exporter's directory and records what it did in a
//! [`RunSummary`], which is saved as JSON when the run finishes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::emissions::{round_emissions, summarize_emissions, EmissionsSummary};
use crate::analysis::opportunity::{filter_opportunities, intensity_gain_correlation, merge_with_tco};
use crate::analysis::ranking::select_top_emitters;
use crate::analysis::reporting;
use crate::analysis::tco_model::TcoModel;
use crate::config::constants::{RUN_SUMMARY_FILE, SCATTER_PLOT_FILE, TCO_TABLE_FILE};
use crate::config::scenario_config::{ScenarioConfig, TcoAssumptions};
use crate::data::plants_loader::load_plants;
use crate::data::tco_loader::load_tco_table;
use crate::error::{EmptyFilterResult, JoinMismatch, PlantIssue};
use crate::models::plant::{filter_coal, PlantRecord};
use crate::utils::csv_export::CsvExporter;
use crate::utils::scatter_plot::save_scatter_plot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Emissions,
    Tco,
    Opportunity,
}

#[derive(Debug, Clone, Serialize)]
pub struct TcoTotals {
    pub evaluated: usize,
    pub excluded: usize,
    pub total_pv_gain_million_usd: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpportunityTotals {
    pub merged: usize,
    pub selected: usize,
    pub correlation: Option<f64>,
    pub empty_filter: Option<EmptyFilterResult>,
}

/// Per-run record written to `run_summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub output_dir: PathBuf,
    pub analyses: Vec<AnalysisKind>,
    pub assumptions: TcoAssumptions,
    pub emissions: Option<EmissionsSummary>,
    pub tco: Option<TcoTotals>,
    pub opportunity: Option<OpportunityTotals>,
    pub tco_issues: Vec<PlantIssue>,
    pub merge_issues: Vec<PlantIssue>,
    pub join_mismatches: Vec<JoinMismatch>,
    pub files: Vec<PathBuf>,
}

impl RunSummary {
    pub fn new(config: &ScenarioConfig, exporter: &CsvExporter) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            output_dir: exporter.output_dir().to_path_buf(),
            analyses: Vec::new(),
            assumptions: config.tco.clone(),
            emissions: None,
            tco: None,
            opportunity: None,
            tco_issues: Vec::new(),
            merge_issues: Vec::new(),
            join_mismatches: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Writes the summary next to the tables and returns it.
    pub fn finish(mut self, exporter: &CsvExporter) -> Result<Self> {
        let path = exporter.path(RUN_SUMMARY_FILE);
        self.files.push(path.clone());
        exporter
            .write_json(RUN_SUMMARY_FILE, &self)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(self)
    }
}

fn load_coal_plants(input: &Path, config: &ScenarioConfig) -> Result<Vec<PlantRecord>> {
    let plants = load_plants(input, &config.input)
        .with_context(|| format!("failed to load plant dataset {}", input.display()))?;
    let coal = filter_coal(&plants);
    info!(plants = plants.len(), coal = coal.len(), "selected coal plants");
    Ok(coal)
}

/// Coal subset, top emitters and the social cost of their emissions.
pub fn emissions_stage(
    input: &Path,
    config: &ScenarioConfig,
    exporter: &CsvExporter,
    summary: &mut RunSummary,
) -> Result<()> {
    info!(input = %input.display(), "running emissions analysis");
    let coal = round_emissions(&load_coal_plants(input, config)?);

    let path = exporter
        .export_coal_plants(&coal)
        .context("failed to export coal plants")?;
    summary.files.push(path);

    let top = select_top_emitters(&coal, config.thresholds.top_emitter_fraction);
    let path = exporter
        .export_top_emitters(&top)
        .context("failed to export top emitters")?;
    summary.files.push(path);

    let totals = summarize_emissions(&coal, &top, config.tco.scc_price_per_ton);
    reporting::print_emissions_summary(&totals);

    summary.analyses.push(AnalysisKind::Emissions);
    summary.emissions = Some(totals);
    Ok(())
}

/// Coal vs solar TCO for every coal plant. Writes the table the opportunity
/// stage reads back.
pub fn tco_stage(
    input: &Path,
    config: &ScenarioConfig,
    exporter: &CsvExporter,
    summary: &mut RunSummary,
) -> Result<PathBuf> {
    let model = TcoModel::new(config.tco.clone()).context("invalid TCO assumptions")?;

    info!(input = %input.display(), "running TCO analysis");
    let coal = load_coal_plants(input, config)?;
    let batch = model.evaluate_all(&coal, &config.batch);

    let path = exporter
        .export_tco_results(&batch.results)
        .context("failed to export TCO table")?;
    summary.files.push(path.clone());

    reporting::print_tco_summary(&batch);

    summary.analyses.push(AnalysisKind::Tco);
    summary.tco = Some(TcoTotals {
        evaluated: batch.results.len(),
        excluded: batch.issues.len(),
        total_pv_gain_million_usd: batch.total_pv_gain_million_usd(),
    });
    summary.tco_issues.extend(batch.issues);
    Ok(path)
}

/// Joins plants with a TCO table, exports the merged and filtered tables and
/// the scatter plot.
pub fn opportunity_stage(
    input: &Path,
    tco_table: &Path,
    config: &ScenarioConfig,
    exporter: &CsvExporter,
    summary: &mut RunSummary,
) -> Result<()> {
    info!(input = %input.display(), tco_table = %tco_table.display(), "running opportunity analysis");
    let coal = load_coal_plants(input, config)?;
    let tco = load_tco_table(tco_table)
        .with_context(|| format!("failed to load TCO table {}", tco_table.display()))?;

    let outcome = merge_with_tco(&coal, &tco);
    let path = exporter
        .export_merged(&outcome.merged)
        .context("failed to export merged table")?;
    summary.files.push(path);

    let correlation = intensity_gain_correlation(&outcome.merged);

    let (filtered, empty_filter) = match filter_opportunities(&outcome.merged, &config.thresholds) {
        Ok(filtered) => (filtered, None),
        Err(empty) => {
            warn!("{}", empty);
            (Vec::new(), Some(empty))
        }
    };
    let path = exporter
        .export_filtered(&filtered)
        .context("failed to export filtered table")?;
    summary.files.push(path);

    let points: Vec<(f64, f64)> = outcome
        .merged
        .iter()
        .map(|m| (m.co2_intensity, m.pv_gain_million_usd))
        .collect();
    let plot_path = exporter.path(SCATTER_PLOT_FILE);
    save_scatter_plot(&points, &plot_path)
        .with_context(|| format!("failed to render {}", plot_path.display()))?;
    summary.files.push(plot_path);

    reporting::print_opportunity_summary(&outcome, &filtered, correlation);

    summary.analyses.push(AnalysisKind::Opportunity);
    summary.opportunity = Some(OpportunityTotals {
        merged: outcome.merged.len(),
        selected: filtered.len(),
        correlation,
        empty_filter,
    });
    summary.merge_issues.extend(outcome.issues);
    summary.join_mismatches.extend(outcome.mismatches);
    Ok(())
}

pub fn run_emissions_analysis(input: &Path, config: &ScenarioConfig, exporter: &CsvExporter) -> Result<RunSummary> {
    let mut summary = RunSummary::new(config, exporter);
    emissions_stage(input, config, exporter, &mut summary)?;
    summary.finish(exporter)
}

pub fn run_tco_analysis(input: &Path, config: &ScenarioConfig, exporter: &CsvExporter) -> Result<RunSummary> {
    let mut summary = RunSummary::new(config, exporter);
    tco_stage(input, config, exporter, &mut summary)?;
    summary.finish(exporter)
}

/// Uses `tco_table` when given, otherwise the newest TCO table under the
/// output directory (see [`CsvExporter::locate`]).
pub fn run_opportunity_analysis(
    input: &Path,
    tco_table: Option<&Path>,
    config: &ScenarioConfig,
    exporter: &CsvExporter,
) -> Result<RunSummary> {
    let tco_table = match tco_table {
        Some(path) => path.to_path_buf(),
        None => {
            let found = exporter.locate(TCO_TABLE_FILE);
            if let Some(path) = &found {
                info!(tco_table = %path.display(), "using TCO table from an earlier run");
            }
            found.unwrap_or_else(|| exporter.path(TCO_TABLE_FILE))
        }
    };
    let mut summary = RunSummary::new(config, exporter);
    opportunity_stage(input, &tco_table, config, exporter, &mut summary)?;
    summary.finish(exporter)
}

/// Emissions, then TCO, then the opportunity analysis over the TCO table
/// just written.
pub fn run_all(input: &Path, config: &ScenarioConfig, exporter: &CsvExporter) -> Result<RunSummary> {
    let mut summary = RunSummary::new(config, exporter);
    emissions_stage(input, config, exporter, &mut summary)?;
    let tco_table = tco_stage(input, config, exporter, &mut summary)?;
    opportunity_stage(input, &tco_table, config, exporter, &mut summary)?;
    summary.finish(exporter)
}
