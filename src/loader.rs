use crate::types::{ProjectRecord, RawRecord, RawRow};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read records file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported records file '{0}' (expected .csv or .json)")]
    UnsupportedExtension(String),
}

/// Load project records from a `.csv` or `.json` file.
pub fn load_records(
    path: impl AsRef<Path>,
) -> Result<(Vec<ProjectRecord>, LoadReport), LoadError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let file = BufReader::new(File::open(path)?);
    let loaded = match ext.as_deref() {
        Some("csv") => read_csv(file)?,
        Some("json") => read_json(file)?,
        _ => return Err(LoadError::UnsupportedExtension(path.display().to_string())),
    };
    debug!(
        path = %path.display(),
        total = loaded.1.total_rows,
        loaded = loaded.1.loaded_rows,
        "records loaded"
    );
    Ok(loaded)
}

pub fn read_csv<R: Read>(reader: R) -> Result<(Vec<ProjectRecord>, LoadReport), LoadError> {
    // flexible: exports with ragged trailing columns still load
    let mut rdr = ReaderBuilder::new().flexible(true).trim(csv::Trim::Headers).from_reader(reader);
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        match result {
            Ok(row) => records.push(normalize(RawRecord::from(row), report.total_rows)),
            // Bad rows are counted and skipped; one bad row never aborts the load.
            Err(err) => {
                report.parse_errors += 1;
                warn!(row = report.total_rows, error = %err, "skipping unreadable CSV row");
            }
        }
    }

    report.loaded_rows = records.len();
    Ok((records, report))
}

/// Expects a top-level array of objects. Elements that are not record-shaped
/// are skipped and counted.
pub fn read_json<R: Read>(reader: R) -> Result<(Vec<ProjectRecord>, LoadReport), LoadError> {
    let rows: Vec<Value> = serde_json::from_reader(reader)?;
    let mut report = LoadReport {
        total_rows: rows.len(),
        ..LoadReport::default()
    };
    let mut records = Vec::with_capacity(rows.len());

    for (i, value) in rows.into_iter().enumerate() {
        match serde_json::from_value::<RawRecord>(value) {
            Ok(raw) => records.push(normalize(raw, i + 1)),
            Err(err) => {
                report.parse_errors += 1;
                warn!(row = i + 1, error = %err, "skipping unreadable JSON record");
            }
        }
    }

    report.loaded_rows = records.len();
    Ok((records, report))
}

fn normalize(raw: RawRecord, row: usize) -> ProjectRecord {
    let mut record = ProjectRecord::from_raw(raw);
    // No id in the source: fall back to the 1-based input row.
    if record.id.is_empty() {
        record.id = format!("ROW-{row}");
    }
    record
}

/// Keep records scheduled to start on or before `cutoff`, in input order.
/// Records without a start date are dropped.
pub fn filter_by_cutoff(records: Vec<ProjectRecord>, cutoff: NaiveDate) -> Vec<ProjectRecord> {
    records
        .into_iter()
        .filter(|r| r.start_date.is_some_and(|d| d <= cutoff))
        .collect()
}
