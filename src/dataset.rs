//! Tabular datasets for templates.
//!
//! Every CSV or TSV file in the data directory becomes one dataset, named by
//! its file stem and exposed to templates as `context.data.<name>`:
//!
//! ```text
//! data/
//! ├── team.csv          → context.data.team
//! ├── sales.2024.tsv    → context.data["sales.2024"]
//! └── README.md         (ignored)
//! ```
//!
//! Each record maps the header row's column names to that row's cells. Rows
//! keep their file order.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Record = BTreeMap<String, String>;
pub type Dataset = Vec<Record>;
pub type Datasets = BTreeMap<String, Dataset>;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("cannot read data directory {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dataset {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Field delimiter for a supported extension, `None` for anything else.
fn delimiter_for(path: &Path) -> Option<u8> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "csv" => Some(b','),
        "tsv" => Some(b'\t'),
        _ => None,
    }
}

/// Load every supported dataset in `dir`.
///
/// A missing directory is an empty mapping. Unsupported and hidden files are
/// skipped.
pub fn load_datasets(dir: &Path) -> Result<Datasets, DatasetError> {
    let mut datasets = Datasets::new();
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "no data directory");
        return Ok(datasets);
    }

    let read_err = |source| DatasetError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let hidden = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if path.is_file() && !hidden {
            files.push(path);
        }
    }
    files.sort();

    for path in files {
        let Some(delimiter) = delimiter_for(&path) else {
            tracing::debug!(file = %path.display(), "skipping unsupported data file");
            continue;
        };
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let records = load_dataset(&path, delimiter)?;
        tracing::debug!(dataset = %name, rows = records.len(), "loaded dataset");
        datasets.insert(name, records);
    }
    Ok(datasets)
}

/// Parse one delimited file into records keyed by its header row.
fn load_dataset(path: &Path, delimiter: u8) -> Result<Dataset, DatasetError> {
    let parse_err = |source| DatasetError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(parse_err)?;

    let headers = reader.headers().map_err(parse_err)?.clone();
    let mut records = Dataset::new();
    for row in reader.records() {
        let row = row.map_err(parse_err)?;
        let record = headers
            .iter()
            .zip(row.iter())
            .map(|(column, value)| (column.to_string(), value.to_string()))
            .collect();
        records.push(record);
    }
    Ok(records)
}
