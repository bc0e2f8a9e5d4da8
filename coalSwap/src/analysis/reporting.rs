use super::emissions::EmissionsSummary;
use super::opportunity::{MergeOutcome, MergedPlant};
use super::tco_model::TcoBatch;

const RULE: &str = "----------------------------------------";
const TOP_ROWS: usize = 10;

pub fn print_emissions_summary(summary: &EmissionsSummary) {
    println!("\nCoal Emissions Summary");
    println!("{}", RULE);
    println!("Coal plants: {}", summary.coal_plants);
    println!("  With reported emissions: {}", summary.plants_with_emissions);
    println!("Total avoided CO2 by replacing coal: {:.3} Megatons", summary.total_co2eq_megatons);
    println!("Total social cost of carbon: ${:.3} billion (at ${:.2}/ton)",
        summary.total_scc_billion_usd, summary.scc_price_per_ton);
    println!("Top emitters selected: {}", summary.top_emitters);
    if let Some(share) = summary.top_emitters_share {
        println!("  Share of coal emissions: {:.1}%", share * 100.0);
    }
}

pub fn print_tco_summary(batch: &TcoBatch) {
    println!("\nCoal vs Solar TCO Summary");
    println!("{}", RULE);
    println!("Plants evaluated: {}", batch.results.len());
    println!("Plants excluded: {}", batch.issues.len());
    let coal: f64 = batch.results.iter().map(|r| r.coal_tco_million_usd).sum();
    let solar: f64 = batch.results.iter().map(|r| r.solar_tco_million_usd).sum();
    println!("  Coal TCO: ${:.2} million", coal);
    println!("  Solar TCO: ${:.2} million", solar);
    println!("  PV Gain: ${:.2} million", batch.total_pv_gain_million_usd());
    let favourable = batch.results.iter().filter(|r| r.pv_gain_million_usd > 0.0).count();
    println!("Plants where solar is cheaper: {}", favourable);
}

pub fn print_opportunity_summary(
    outcome: &MergeOutcome,
    filtered: &[MergedPlant],
    correlation: Option<f64>,
) {
    println!("\nReplacement Opportunity Summary");
    println!("{}", RULE);
    println!("Merged plants: {}", outcome.merged.len());
    if !outcome.mismatches.is_empty() {
        println!("  Dropped by join: {}", outcome.mismatches.len());
    }
    if !outcome.issues.is_empty() {
        println!("  Excluded for missing data: {}", outcome.issues.len());
    }
    match correlation {
        Some(r) => println!("Correlation between CO2 intensity and PV gain: {:.3}", r),
        None => println!("Correlation between CO2 intensity and PV gain: undefined"),
    }
    println!("Plants above both thresholds: {}", filtered.len());
    for m in filtered.iter().take(TOP_ROWS) {
        println!("  {} ({}): {:.3} t/MWh, ${:.0} million",
            m.name, m.state, m.co2_intensity, m.pv_gain_million_usd);
    }
    println!("{}", RULE);
}
