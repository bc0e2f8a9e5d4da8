use std::io::Read;
use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::info;

use crate::error::DatasetError;
use crate::models::tco::TcoResult;
use crate::utils::logging::{self, OperationCategory};

pub fn load_tco_table_from_reader<R: Read>(reader: R) -> Result<Vec<TcoResult>, DatasetError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<TcoResult>, csv::Error>>()?;
    Ok(rows)
}

/// Reads a TCO table written by the TCO analysis.
pub fn load_tco_table(path: impl AsRef<Path>) -> Result<Vec<TcoResult>, DatasetError> {
    let _timing = logging::start_timing("load_tco_table", OperationCategory::DataLoad);

    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rows = load_tco_table_from_reader(file)?;
    info!(rows = rows.len(), path = %path.display(), "loaded TCO table");
    Ok(rows)
}
