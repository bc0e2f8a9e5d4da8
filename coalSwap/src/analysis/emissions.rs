use serde::Serialize;

use crate::analysis::ranking::RankedPlant;
use crate::config::const_funcs::round_to;
use crate::config::constants::{BILLION, EMISSIONS_DECIMALS, MILLION};
use crate::models::plant::PlantRecord;

/// Avoidable emissions of the coal fleet and their social cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionsSummary {
    pub coal_plants: usize,
    pub plants_with_emissions: usize,
    pub total_co2eq_tons: f64,
    pub total_co2eq_megatons: f64,
    pub scc_price_per_ton: f64,
    pub total_scc_billion_usd: f64,
    pub top_emitters: usize,
    pub top_emitters_co2eq_tons: f64,
    pub top_emitters_share: Option<f64>,
}

/// Copies of the plants with emissions rounded to the exported precision.
pub fn round_emissions(plants: &[PlantRecord]) -> Vec<PlantRecord> {
    plants
        .iter()
        .map(|p| PlantRecord {
            annual_co2eq_tons: p.annual_co2eq_tons.map(|t| round_to(t, EMISSIONS_DECIMALS)),
            ..p.clone()
        })
        .collect()
}

/// Totals over `coal` (already rounded); missing emissions contribute nothing.
pub fn summarize_emissions(coal: &[PlantRecord], top: &[RankedPlant], scc_price_per_ton: f64) -> EmissionsSummary {
    let emissions: Vec<f64> = coal
        .iter()
        .filter_map(|p| p.annual_co2eq_tons)
        .filter(|t| t.is_finite())
        .collect();
    let total: f64 = emissions.iter().sum();
    let monetized: f64 = emissions.iter().map(|t| t * scc_price_per_ton).sum();
    let top_total: f64 = top.iter().map(|r| r.co2eq_tons).sum();

    EmissionsSummary {
        coal_plants: coal.len(),
        plants_with_emissions: emissions.len(),
        total_co2eq_tons: total,
        total_co2eq_megatons: total / MILLION,
        scc_price_per_ton,
        total_scc_billion_usd: monetized / BILLION,
        top_emitters: top.len(),
        top_emitters_co2eq_tons: top_total,
        top_emitters_share: (total > 0.0).then(|| top_total / total),
    }
}
