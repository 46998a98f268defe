//! Purpose: Open a dataset file as a ready-to-query engine.
//! Exports: `open_engine`.
//! Invariants: Errors always carry the dataset path.

use std::path::Path;

use crate::core::engine::QueryEngine;
use crate::core::error::Error;
use crate::core::load::load_table;

pub fn open_engine(path: &Path) -> Result<QueryEngine, Error> {
    let table = load_table(path)?;
    QueryEngine::new(table).map_err(|err| err.with_path(path))
}
