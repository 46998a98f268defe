//! Purpose: Resolve the dataset file used when `--data` is not given.
//! Exports: `default_data_path`, `DATA_ENV`.
//! Invariants: `AYAT_DATA` wins over the built-in file name; relative paths resolve against the cwd.

use std::path::PathBuf;

pub(crate) const DATA_ENV: &str = "AYAT_DATA";
const DEFAULT_FILE_NAME: &str = "UrduTranslationsFatehMuhammadAndShaikhulHind.xlsx";

pub(crate) fn default_data_path() -> PathBuf {
    match std::env::var_os(DATA_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_FILE_NAME),
    }
}
