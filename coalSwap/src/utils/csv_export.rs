use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::opportunity::{MergedPlant, MERGED_TABLE_HEADERS};
use crate::analysis::ranking::RankedPlant;
use crate::config::constants::*;
use crate::error::ExportError;
use crate::models::plant::{PlantId, PlantRecord};
use crate::models::tco::{TcoResult, TCO_TABLE_HEADERS};
use crate::utils::logging::{self, ExportType, OperationCategory};

/// Coal plant subset row as exported by the emissions analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoalPlantRow {
    #[serde(rename = "Plant_ID")]
    pub plant_id: PlantId,
    #[serde(rename = "Plant_Name")]
    pub name: String,
    #[serde(rename = "LAT")]
    pub latitude: Option<f64>,
    #[serde(rename = "LON")]
    pub longitude: Option<f64>,
    #[serde(rename = "Plant_Fueltype")]
    pub fuel_type: String,
    #[serde(rename = "CO2EQ_2023")]
    pub annual_co2eq_tons: Option<f64>,
    #[serde(rename = "Plant_Nameplate_Capacity")]
    pub nameplate_capacity_mw: Option<f64>,
    #[serde(rename = "Cap_Factor")]
    pub capacity_factor: Option<f64>,
}

pub const COAL_PLANT_HEADERS: [&str; 8] = [
    "Plant_ID",
    "Plant_Name",
    "LAT",
    "LON",
    "Plant_Fueltype",
    "CO2EQ_2023",
    "Plant_Nameplate_Capacity",
    "Cap_Factor",
];

impl From<&PlantRecord> for CoalPlantRow {
    fn from(p: &PlantRecord) -> Self {
        Self {
            plant_id: p.plant_id,
            name: p.name.clone(),
            latitude: p.latitude,
            longitude: p.longitude,
            fuel_type: p.fuel_type.to_string(),
            annual_co2eq_tons: p.annual_co2eq_tons,
            nameplate_capacity_mw: p.nameplate_capacity_mw,
            capacity_factor: p.capacity_factor,
        }
    }
}

/// Top-emitter row: the coal plant row plus its emissions rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopEmitterRow {
    #[serde(rename = "Plant_ID")]
    pub plant_id: PlantId,
    #[serde(rename = "Plant_Name")]
    pub name: String,
    #[serde(rename = "LAT")]
    pub latitude: Option<f64>,
    #[serde(rename = "LON")]
    pub longitude: Option<f64>,
    #[serde(rename = "Plant_Fueltype")]
    pub fuel_type: String,
    #[serde(rename = "CO2EQ_2023")]
    pub annual_co2eq_tons: f64,
    #[serde(rename = "Plant_Nameplate_Capacity")]
    pub nameplate_capacity_mw: Option<f64>,
    #[serde(rename = "Cap_Factor")]
    pub capacity_factor: Option<f64>,
    #[serde(rename = "Rank")]
    pub rank: f64,
}

pub const TOP_EMITTER_HEADERS: [&str; 9] = [
    "Plant_ID",
    "Plant_Name",
    "LAT",
    "LON",
    "Plant_Fueltype",
    "CO2EQ_2023",
    "Plant_Nameplate_Capacity",
    "Cap_Factor",
    "Rank",
];

impl From<&RankedPlant> for TopEmitterRow {
    fn from(r: &RankedPlant) -> Self {
        let p = &r.plant;
        Self {
            plant_id: p.plant_id,
            name: p.name.clone(),
            latitude: p.latitude,
            longitude: p.longitude,
            fuel_type: p.fuel_type.to_string(),
            annual_co2eq_tons: r.co2eq_tons,
            nameplate_capacity_mw: p.nameplate_capacity_mw,
            capacity_factor: p.capacity_factor,
            rank: r.rank,
        }
    }
}

/// Writes the analysis tables into one output directory.
pub struct CsvExporter {
    base_dir: PathBuf,
    output_dir: PathBuf,
    timestamp: String,
}

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

impl CsvExporter {
    /// Uses `output_dir` directly, or a `YYYYmmdd_HHMMSS` subdirectory of it
    /// when `timestamped` is set. The directory is created if needed.
    pub fn new(output_dir: impl AsRef<Path>, timestamped: bool) -> Result<Self, ExportError> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let full_path = if timestamped {
            output_dir.as_ref().join(&timestamp)
        } else {
            output_dir.as_ref().to_path_buf()
        };

        fs::create_dir_all(&full_path).map_err(|source| ExportError::Io {
            path: full_path.display().to_string(),
            source,
        })?;

        Ok(Self {
            base_dir: output_dir.as_ref().to_path_buf(),
            output_dir: full_path,
            timestamp,
        })
    }

    /// Finds `file_name` written by an earlier run: this run's directory
    /// first, then the base directory, then the newest timestamped
    /// subdirectory of the base that holds it.
    pub fn locate(&self, file_name: &str) -> Option<PathBuf> {
        let own = self.path(file_name);
        if own.is_file() {
            return Some(own);
        }
        let base = self.base_dir.join(file_name);
        if base.is_file() {
            return Some(base);
        }

        let entries = fs::read_dir(&self.base_dir).ok()?;
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                NaiveDateTime::parse_from_str(&name, TIMESTAMP_FORMAT).ok()?;
                let candidate = entry.path().join(file_name);
                candidate.is_file().then_some((name, candidate))
            })
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, path)| path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Writes `headers` then one line per row. The header line is always
    /// present, so an empty table is still a valid file.
    pub fn write_table<T: Serialize>(&self, file_name: &str, headers: &[&str], rows: &[T]) -> Result<PathBuf, ExportError> {
        let _timing = logging::start_timing("write_table",
            OperationCategory::Export { subcategory: ExportType::Table });

        let path = self.path(file_name);
        let file = File::create(&path).map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        writer.write_record(headers)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;

        debug!(rows = rows.len(), path = %path.display(), "wrote table");
        Ok(path)
    }

    pub fn export_coal_plants(&self, plants: &[PlantRecord]) -> Result<PathBuf, ExportError> {
        let rows: Vec<CoalPlantRow> = plants.iter().map(CoalPlantRow::from).collect();
        self.write_table(COAL_PLANTS_FILE, &COAL_PLANT_HEADERS, &rows)
    }

    pub fn export_top_emitters(&self, ranked: &[RankedPlant]) -> Result<PathBuf, ExportError> {
        let rows: Vec<TopEmitterRow> = ranked.iter().map(TopEmitterRow::from).collect();
        self.write_table(TOP_EMITTERS_FILE, &TOP_EMITTER_HEADERS, &rows)
    }

    pub fn export_tco_results(&self, results: &[TcoResult]) -> Result<PathBuf, ExportError> {
        self.write_table(TCO_TABLE_FILE, &TCO_TABLE_HEADERS, results)
    }

    pub fn export_merged(&self, merged: &[MergedPlant]) -> Result<PathBuf, ExportError> {
        self.write_table(MERGED_TABLE_FILE, &MERGED_TABLE_HEADERS, merged)
    }

    pub fn export_filtered(&self, filtered: &[MergedPlant]) -> Result<PathBuf, ExportError> {
        self.write_table(FILTERED_TABLE_FILE, &MERGED_TABLE_HEADERS, filtered)
    }

    pub fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<PathBuf, ExportError> {
        let _timing = logging::start_timing("write_json",
            OperationCategory::Export { subcategory: ExportType::Summary });

        let path = self.path(file_name);
        let file = File::create(&path).map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush().map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "wrote run summary");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plant::FuelType;
    use tempfile::tempdir;

    fn plant(id: PlantId) -> PlantRecord {
        PlantRecord {
            plant_id: id,
            name: "Gibson, Unit \"A\"".to_string(),
            state: "IN".to_string(),
            latitude: Some(38.372),
            longitude: None,
            fuel_type: FuelType::Coal,
            nameplate_capacity_mw: Some(3339.5),
            capacity_factor: Some(0.61),
            annual_co2eq_tons: Some(16_402_001.37),
        }
    }

    #[test]
    fn coal_rows_round_trip() {
        let dir = tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), false).unwrap();
        let path = exporter.export_coal_plants(&[plant(6113), plant(6114)]).unwrap();

        let rows: Vec<CoalPlantRow> = csv::Reader::from_path(path)
            .unwrap()
            .into_deserialize()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows, vec![CoalPlantRow::from(&plant(6113)), CoalPlantRow::from(&plant(6114))]);
        assert_eq!(rows[0].longitude, None);
    }

    #[test]
    fn empty_table_keeps_headers() {
        let dir = tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), false).unwrap();
        let path = exporter.export_filtered(&[]).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.trim_end(), MERGED_TABLE_HEADERS.join(","));
    }

    #[test]
    fn locate_prefers_newest_timestamped_run() {
        let dir = tempdir().unwrap();
        for run in ["20250101_090000", "20250301_090000", "20250201_090000"] {
            let run_dir = dir.path().join(run);
            std::fs::create_dir_all(&run_dir).unwrap();
            std::fs::write(run_dir.join(TCO_TABLE_FILE), "Plant_ID\n").unwrap();
        }
        // Not a run directory, even though it sorts last.
        let stray = dir.path().join("zz_scratch");
        std::fs::create_dir_all(&stray).unwrap();
        std::fs::write(stray.join(TCO_TABLE_FILE), "Plant_ID\n").unwrap();

        let exporter = CsvExporter::new(dir.path(), true).unwrap();
        assert_eq!(
            exporter.locate(TCO_TABLE_FILE),
            Some(dir.path().join("20250301_090000").join(TCO_TABLE_FILE))
        );
        assert_eq!(exporter.locate("absent.csv"), None);
    }

    #[test]
    fn locate_checks_own_directory_first() {
        let dir = tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), false).unwrap();
        let written = exporter.export_tco_results(&[]).unwrap();
        assert_eq!(exporter.locate(TCO_TABLE_FILE), Some(written));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn json_flush_failure_is_reported() {
        // Writes to /dev/full succeed into the buffer and fail on flush.
        if !Path::new("/dev/full").exists() {
            return;
        }
        let exporter = CsvExporter::new("/dev", false).unwrap();
        let err = exporter.write_json("full", &serde_json::json!({ "plants": 3 })).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn timestamped_directory_is_created() {
        let dir = tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), true).unwrap();
        assert!(exporter.output_dir().is_dir());
        assert_eq!(exporter.output_dir(), dir.path().join(exporter.timestamp()));
    }
}
