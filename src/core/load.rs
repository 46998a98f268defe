//! Purpose: One-shot dataset load from disk into an immutable `Table`.
//! Exports: `DataFormat`, `load_table`, `parse_table`.
//! Role: Startup boundary; runs once, single-threaded, before any query is served.
//! Invariants: Format is chosen from the file extension; unknown extensions are usage errors.
//! Invariants: Text formats must be UTF-8; workbooks are read from raw bytes.
//! Invariants: Every load error carries the dataset path.

use std::path::Path;

use super::csv::CsvReader;
use super::error::{Error, ErrorKind};
use super::json_records::{RecordsLayout, read_records};
use super::table::Table;
use super::xlsx::read_workbook;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataFormat {
    Xlsx,
    Csv,
    Tsv,
    Json,
    JsonLines,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xlsx") => Ok(DataFormat::Xlsx),
            Some("csv") => Ok(DataFormat::Csv),
            Some("tsv") => Ok(DataFormat::Tsv),
            Some("json") => Ok(DataFormat::Json),
            Some("jsonl") | Some("ndjson") => Ok(DataFormat::JsonLines),
            _ => Err(Error::new(ErrorKind::Usage)
                .with_message("unsupported dataset format")
                .with_path(path)
                .with_hint(
                    "Use the .xlsx workbook or a .csv, .tsv, .json (records) or .jsonl export.",
                )),
        }
    }
}

pub fn load_table(path: &Path) -> Result<Table, Error> {
    let format = DataFormat::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read dataset")
            .with_path(path)
            .with_source(err)
    })?;
    let table = parse_table(&bytes, format).map_err(|err| err.with_path(path))?;
    tracing::info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.columns().len(),
        "dataset loaded"
    );
    Ok(table)
}

pub fn parse_table(data: impl AsRef<[u8]>, format: DataFormat) -> Result<Table, Error> {
    let bytes = data.as_ref();
    match format {
        DataFormat::Xlsx => read_workbook(bytes),
        DataFormat::Csv => CsvReader::default().read_str(utf8(bytes)?),
        DataFormat::Tsv => CsvReader::default()
            .with_delimiter('\t')
            .read_str(utf8(bytes)?),
        DataFormat::Json => read_records(utf8(bytes)?, RecordsLayout::Array),
        DataFormat::JsonLines => read_records(utf8(bytes)?, RecordsLayout::Lines),
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(bytes).map_err(|err| {
        Error::new(ErrorKind::Corrupt)
            .with_message("dataset is not valid UTF-8")
            .with_source(err)
    })
}
