use serde::Serialize;
use thiserror::Error;

use crate::models::plant::PlantId;

/// Failures that make the whole source table unusable. Always fatal.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error reading {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error")]
    Csv(#[from] csv::Error),
    #[error("required column '{canonical}' (source header '{header}') not found")]
    MissingColumn { canonical: String, header: String },
    #[error("no header row found after skipping {0} rows")]
    MissingHeader(usize),
}

/// Per-plant anomalies. The plant is excluded from results and aggregates and
/// reported in the run summary; the batch carries on.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlantIssue {
    #[error("plant {plant_id}: invalid capacity factor {value:?} for solar sizing")]
    InvalidCapacityFactor { plant_id: PlantId, value: Option<f64> },
    #[error("plant {plant_id}: capacity {capacity_mw} MW at capacity factor {capacity_factor} generates nothing")]
    ZeroGeneration { plant_id: PlantId, capacity_mw: f64, capacity_factor: f64 },
    #[error("plant {plant_id}: missing value for {field}")]
    MissingValue { plant_id: PlantId, field: String },
    #[error("plant {plant_id}: {field} = {value} is out of range")]
    InvalidValue { plant_id: PlantId, field: String, value: f64 },
}

impl PlantIssue {
    pub fn plant_id(&self) -> PlantId {
        match self {
            PlantIssue::InvalidCapacityFactor { plant_id, .. } => *plant_id,
            PlantIssue::ZeroGeneration { plant_id, .. } => *plant_id,
            PlantIssue::MissingValue { plant_id, .. } => *plant_id,
            PlantIssue::InvalidValue { plant_id, .. } => *plant_id,
        }
    }
}

/// A plant present on one side of the opportunity merge but not the other.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoinMismatch {
    #[error("plant {plant_id} is in the source dataset but not in the TCO table")]
    MissingFromTco { plant_id: PlantId },
    #[error("plant {plant_id} is in the TCO table but not in the source dataset")]
    MissingFromSource { plant_id: PlantId },
}

/// The opportunity filter matched nothing. Not fatal; the exported table is
/// written with headers only.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[error("no plants with CO2 intensity > {min_co2_intensity} t/MWh and PV gain > {min_pv_gain_million_usd} mil$")]
pub struct EmptyFilterResult {
    pub min_co2_intensity: f64,
    pub min_pv_gain_million_usd: f64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config IO error")]
    Io(#[from] std::io::Error),
    #[error("config parse error")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error")]
    Serialize(#[from] toml::ser::Error),
    #[error("delimiter {0:?} is not a single ASCII character")]
    InvalidDelimiter(char),
    #[error("invalid assumption {field} = {value}: {reason}")]
    InvalidAssumption {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error writing {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error")]
    Csv(#[from] csv::Error),
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
    #[error("image error")]
    Image(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::io;

    #[test]
    fn io_cause_appears_once_in_chain() {
        let err = DatasetError::Io {
            path: "plnt23.csv".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "file is gone"),
        };
        let chained = Err::<(), _>(err).context("failed to load plant dataset").unwrap_err();
        let text = format!("{:#}", chained);
        assert_eq!(text.matches("file is gone").count(), 1);
        assert!(text.contains("plnt23.csv"));
    }

    #[test]
    fn export_io_cause_appears_once_in_chain() {
        let err = ExportError::Io {
            path: "out/run_summary.json".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        };
        let text = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(text.matches("read-only").count(), 1);
    }

    #[test]
    fn zero_generation_reports_its_plant() {
        let issue = PlantIssue::ZeroGeneration { plant_id: 7, capacity_mw: 0.0, capacity_factor: 0.5 };
        assert_eq!(issue.plant_id(), 7);
    }
}
