use crate::sections::DataTable;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::builder::Builder;
use tabled::settings::Style;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `bytes` as `dir/file_name`, creating `dir` if needed.
pub fn write_bytes(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, OutputError> {
    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| OutputError::Io { path, source }
    };
    fs::create_dir_all(dir).map_err(io(dir))?;
    let path = dir.join(file_name);
    fs::write(&path, bytes).map_err(io(&path))?;
    Ok(path)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Markdown rendering of the first `max_rows` rows of `table`.
pub fn preview_table(table: &DataTable, max_rows: usize) -> String {
    if table.rows.is_empty() || max_rows == 0 {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(table.columns.iter().cloned());
    for row in table.rows.iter().take(max_rows) {
        builder.push_record(row.iter().map(|cell| cell.display()));
    }
    builder.build().with(Style::markdown()).to_string()
}
