//! Joins coal plants with their TCO results and picks out the plants where
//! both CO2 intensity and the gain from switching to solar are high.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::scenario_config::AnalysisThresholds;
use crate::config::us_states::full_state_name;
use crate::error::{EmptyFilterResult, JoinMismatch, PlantIssue};
use crate::models::plant::{PlantId, PlantRecord};
use crate::models::tco::TcoResult;
use crate::utils::logging::{self, ComputeType, OperationCategory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedPlant {
    #[serde(rename = "Plant_ID")]
    pub plant_id: PlantId,
    #[serde(rename = "Plant_Name")]
    pub name: String,
    #[serde(rename = "Plant_Nameplate_Capacity")]
    pub nameplate_capacity_mw: f64,
    #[serde(rename = "Cap_Factor")]
    pub capacity_factor: f64,
    #[serde(rename = "CO2EQ_2023")]
    pub annual_co2eq_tons: f64,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "LAT")]
    pub latitude: f64,
    #[serde(rename = "LON")]
    pub longitude: f64,
    #[serde(rename = "Annual_MWh")]
    pub annual_generation_mwh: f64,
    #[serde(rename = "CO2_Intensity")]
    pub co2_intensity: f64,
    #[serde(rename = "PV Gain (mil$)")]
    pub pv_gain_million_usd: f64,
}

pub const MERGED_TABLE_HEADERS: [&str; 11] = [
    "Plant_ID",
    "Plant_Name",
    "Plant_Nameplate_Capacity",
    "Cap_Factor",
    "CO2EQ_2023",
    "State",
    "LAT",
    "LON",
    "Annual_MWh",
    "CO2_Intensity",
    "PV Gain (mil$)",
];

#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub merged: Vec<MergedPlant>,
    pub mismatches: Vec<JoinMismatch>,
    pub issues: Vec<PlantIssue>,
}

fn required(plant: &PlantRecord, field: &str, value: Option<f64>) -> Result<f64, PlantIssue> {
    value.filter(|v| v.is_finite()).ok_or_else(|| PlantIssue::MissingValue {
        plant_id: plant.plant_id,
        field: field.to_string(),
    })
}

/// Source-side half of a merged row: the fields the join needs, with the
/// derived generation and intensity.
fn merge_row(plant: &PlantRecord, pv_gain_million_usd: f64) -> Result<MergedPlant, PlantIssue> {
    let capacity = required(plant, "nameplate_capacity_mw", plant.nameplate_capacity_mw)?;
    let capacity_factor = required(plant, "capacity_factor", plant.capacity_factor)?;
    let co2 = required(plant, "annual_co2eq_tons", plant.annual_co2eq_tons)?;
    let latitude = required(plant, "latitude", plant.latitude)?;
    let longitude = required(plant, "longitude", plant.longitude)?;

    if !(capacity_factor > 0.0) {
        return Err(PlantIssue::InvalidCapacityFactor { plant_id: plant.plant_id, value: Some(capacity_factor) });
    }
    let co2_intensity = plant.co2_intensity().ok_or(PlantIssue::ZeroGeneration {
        plant_id: plant.plant_id,
        capacity_mw: capacity,
        capacity_factor,
    })?;

    Ok(MergedPlant {
        plant_id: plant.plant_id,
        name: plant.name.clone(),
        nameplate_capacity_mw: capacity,
        capacity_factor,
        annual_co2eq_tons: co2,
        state: full_state_name(&plant.state),
        latitude,
        longitude,
        annual_generation_mwh: plant.annual_generation_mwh(),
        co2_intensity,
        pv_gain_million_usd,
    })
}

/// Inner join of coal plants and TCO rows on plant id, in source order.
/// Rows missing on either side are dropped and reported as mismatches; plants
/// whose intensity cannot be computed are reported as issues.
pub fn merge_with_tco(coal: &[PlantRecord], tco: &[TcoResult]) -> MergeOutcome {
    let _timing = logging::start_timing("merge_with_tco",
        OperationCategory::Computation { subcategory: ComputeType::Merge });

    let gains: HashMap<PlantId, f64> = tco.iter().map(|t| (t.plant_id, t.pv_gain_million_usd)).collect();
    let source_ids: HashSet<PlantId> = coal.iter().map(|p| p.plant_id).collect();

    let mut out = MergeOutcome::default();
    for plant in coal {
        let Some(&gain) = gains.get(&plant.plant_id) else {
            // Plants already set aside by the TCO run are not join mismatches.
            match merge_row(plant, f64::NAN) {
                Ok(_) => out.mismatches.push(JoinMismatch::MissingFromTco { plant_id: plant.plant_id }),
                Err(issue) => out.issues.push(issue),
            }
            continue;
        };
        match merge_row(plant, gain) {
            Ok(row) => out.merged.push(row),
            Err(issue) => out.issues.push(issue),
        }
    }
    for t in tco {
        if !source_ids.contains(&t.plant_id) {
            out.mismatches.push(JoinMismatch::MissingFromSource { plant_id: t.plant_id });
        }
    }

    if !out.mismatches.is_empty() {
        warn!(dropped = out.mismatches.len(), "plant ids did not match between source and TCO table");
    }
    for issue in &out.issues {
        warn!("{}", issue);
    }
    info!(merged = out.merged.len(), "merged coal plants with TCO results");
    out
}

/// Plants above both thresholds (strictly), highest PV gain first.
pub fn filter_opportunities(
    merged: &[MergedPlant],
    thresholds: &AnalysisThresholds,
) -> Result<Vec<MergedPlant>, EmptyFilterResult> {
    let mut selected: Vec<MergedPlant> = merged
        .iter()
        .filter(|m| {
            m.co2_intensity > thresholds.min_co2_intensity
                && m.pv_gain_million_usd > thresholds.min_pv_gain_million_usd
        })
        .cloned()
        .collect();

    if selected.is_empty() {
        return Err(EmptyFilterResult {
            min_co2_intensity: thresholds.min_co2_intensity,
            min_pv_gain_million_usd: thresholds.min_pv_gain_million_usd,
        });
    }

    selected.sort_by(|a, b| {
        b.pv_gain_million_usd
            .partial_cmp(&a.pv_gain_million_usd)
            .unwrap_or(Ordering::Equal)
    });
    Ok(selected)
}

/// Pearson correlation coefficient. `None` for fewer than two points or a
/// constant series.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let _timing = logging::start_timing("pearson_correlation",
        OperationCategory::Computation { subcategory: ComputeType::Statistics });

    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Correlation between CO2 intensity and PV gain across merged plants.
pub fn intensity_gain_correlation(merged: &[MergedPlant]) -> Option<f64> {
    let xs: Vec<f64> = merged.iter().map(|m| m.co2_intensity).collect();
    let ys: Vec<f64> = merged.iter().map(|m| m.pv_gain_million_usd).collect();
    pearson_correlation(&xs, &ys)
}
