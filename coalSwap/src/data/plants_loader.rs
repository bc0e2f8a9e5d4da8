use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, warn};

use crate::config::scenario_config::InputConfig;
use crate::error::DatasetError;
use crate::models::plant::{PlantId, PlantRecord};
use crate::utils::logging::{self, OperationCategory};

/// Column positions of the canonical fields in the source header.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    plant_id: usize,
    name: usize,
    state: usize,
    latitude: usize,
    longitude: usize,
    fuel_type: usize,
    nameplate_capacity_mw: usize,
    capacity_factor: usize,
    annual_co2eq_tons: usize,
}

fn resolve_columns(header: &StringRecord, input: &InputConfig) -> Result<ColumnIndex, DatasetError> {
    let find = |canonical: &str, source: &str| -> Result<usize, DatasetError> {
        header
            .iter()
            .position(|h| h.trim() == source)
            .ok_or_else(|| DatasetError::MissingColumn {
                canonical: canonical.to_string(),
                header: source.to_string(),
            })
    };

    // Check every mapping up front so the first missing column is reported
    // before any row is read.
    let mut idx = [0usize; 9];
    for (slot, (canonical, source)) in idx.iter_mut().zip(input.columns.pairs()) {
        *slot = find(canonical, source)?;
    }

    Ok(ColumnIndex {
        plant_id: idx[0],
        name: idx[1],
        state: idx[2],
        latitude: idx[3],
        longitude: idx[4],
        fuel_type: idx[5],
        nameplate_capacity_mw: idx[6],
        capacity_factor: idx[7],
        annual_co2eq_tons: idx[8],
    })
}

fn text(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).map(str::trim).unwrap_or("")
}

/// Blank cells are missing. Thousands separators are tolerated; anything
/// else unparseable is treated as missing and logged.
fn parse_number(record: &StringRecord, idx: usize, row: usize, field: &str) -> Option<f64> {
    let raw = text(record, idx);
    if raw.is_empty() {
        return None;
    }
    match raw.replace(',', "").parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warn!(row, field, value = raw, "unparseable number treated as missing");
            None
        }
    }
}

fn parse_plant_id(raw: &str) -> Option<PlantId> {
    raw.parse::<PlantId>().ok().or_else(|| {
        // Spreadsheet exports sometimes write integer ids as "3.0".
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= PlantId::MAX as f64)
            .map(|v| v as PlantId)
    })
}

fn parse_record(record: &StringRecord, cols: &ColumnIndex, row: usize) -> Option<PlantRecord> {
    let raw_id = text(record, cols.plant_id);
    let Some(plant_id) = parse_plant_id(raw_id) else {
        warn!(row, value = raw_id, "row without a usable plant id skipped");
        return None;
    };

    Some(PlantRecord {
        plant_id,
        name: text(record, cols.name).to_string(),
        state: text(record, cols.state).to_string(),
        latitude: parse_number(record, cols.latitude, row, "latitude"),
        longitude: parse_number(record, cols.longitude, row, "longitude"),
        fuel_type: text(record, cols.fuel_type).to_string().into(),
        nameplate_capacity_mw: parse_number(record, cols.nameplate_capacity_mw, row, "nameplate_capacity_mw"),
        capacity_factor: parse_number(record, cols.capacity_factor, row, "capacity_factor"),
        annual_co2eq_tons: parse_number(record, cols.annual_co2eq_tons, row, "annual_co2eq_tons"),
    })
}

/// Reads the plant sheet: skips `header_offset` rows, maps the header to
/// canonical fields and keeps only those columns.
pub fn load_plants_from_reader<R: Read>(reader: R, input: &InputConfig) -> Result<Vec<PlantRecord>, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(input.delimiter as u8)
        .from_reader(reader);

    let mut records = reader.records();
    for _ in 0..input.header_offset {
        if records.next().transpose()?.is_none() {
            return Err(DatasetError::MissingHeader(input.header_offset));
        }
    }
    let header = records
        .next()
        .transpose()?
        .ok_or(DatasetError::MissingHeader(input.header_offset))?;
    let cols = resolve_columns(&header, input)?;
    debug!(?cols, "resolved source columns");

    let mut plants = Vec::new();
    let mut skipped = 0usize;
    for (i, result) in records.enumerate() {
        let record = result?;
        // 1-based line number in the source file
        let row = input.header_offset + i + 2;
        match parse_record(&record, &cols, row) {
            Some(plant) => plants.push(plant),
            None => skipped += 1,
        }
    }

    info!(plants = plants.len(), skipped, "loaded plant dataset");
    Ok(plants)
}

pub fn load_plants(path: impl AsRef<Path>, input: &InputConfig) -> Result<Vec<PlantRecord>, DatasetError> {
    let _timing = logging::start_timing("load_plants", OperationCategory::DataLoad);

    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_plants_from_reader(file, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plant::FuelType;

    const SHEET: &str = "\
Plant file sequence number,Plant state abbreviation,Plant name,DOE/EIA ORIS plant or facility code,Plant latitude,Plant longitude,Plant primary fuel category,Plant nameplate capacity (MW),Plant capacity factor,Plant annual CO2 equivalent emissions (tons)
SEQPLT23,PSTATABB,PNAME,ORISPL,LAT,LON,PLFUELCT,NAMEPCAP,CAPFAC,PLCO2EQA
1,AL,Barry,3,31.0069,-88.0103,GAS,\"2,758.7\",0.5367,\"5,402,186.412\"
2,WV,Mitchell,3948,39.8297,-80.8153,COAL,1632.6,0.4981,7612540.3
3,KY,Idle Unit,9999,37.0,-87.0,COAL,120,,15.2
4,ND,Bad Row,,47.0,-101.0,COAL,500,0.7,1000
";

    #[test]
    fn maps_egrid_headers_after_offset() {
        let plants = load_plants_from_reader(SHEET.as_bytes(), &InputConfig::default()).unwrap();
        assert_eq!(plants.len(), 3);

        let barry = &plants[0];
        assert_eq!(barry.plant_id, 3);
        assert_eq!(barry.fuel_type, FuelType::Gas);
        assert_eq!(barry.nameplate_capacity_mw, Some(2758.7));
        assert_eq!(barry.annual_co2eq_tons, Some(5_402_186.412));

        let mitchell = &plants[1];
        assert_eq!(mitchell.name, "Mitchell");
        assert_eq!(mitchell.state, "WV");
        assert!(mitchell.is_coal());

        assert_eq!(plants[2].capacity_factor, None);
    }

    #[test]
    fn missing_column_is_fatal() {
        let mut input = InputConfig::default();
        input.columns.capacity_factor = "CAPFAC_X".to_string();
        let err = load_plants_from_reader(SHEET.as_bytes(), &input).unwrap_err();
        match err {
            DatasetError::MissingColumn { canonical, header } => {
                assert_eq!(canonical, "capacity_factor");
                assert_eq!(header, "CAPFAC_X");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_offset_misses_columns() {
        let input = InputConfig { header_offset: 0, ..InputConfig::default() };
        assert!(matches!(
            load_plants_from_reader(SHEET.as_bytes(), &input),
            Err(DatasetError::MissingColumn { .. })
        ));
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(
            load_plants_from_reader("".as_bytes(), &InputConfig::default()),
            Err(DatasetError::MissingHeader(1))
        ));
    }

    #[test]
    fn float_formatted_ids() {
        assert_eq!(parse_plant_id("3948"), Some(3948));
        assert_eq!(parse_plant_id("3948.0"), Some(3948));
        assert_eq!(parse_plant_id("39.5"), None);
        assert_eq!(parse_plant_id(""), None);
    }
}
