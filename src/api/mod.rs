//! Purpose: Define the public Rust API boundary for the dataset service.
//! Exports: Engine, table, loader and error types plus the shared response payloads.
//! Role: Single surface used by the CLI, the HTTP server, and integration tests.
//! Invariants: Payload shapes are defined once here so HTTP and CLI output stay identical.

mod dataset;
mod responses;

pub use crate::core::columns;
pub use crate::core::engine::{Predicate, QueryEngine};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::load::{DataFormat, load_table, parse_table};
pub use crate::core::table::{Projection, Record, Row, Table, TableBuilder, Value};
pub use dataset::open_engine;
pub use responses::{
    AyahCount, AyatSearch, ColumnData, ColumnList, ENDPOINTS, Endpoints, ErrorPayload, FormSearch,
    SurahContent, SurahRange, WELCOME, Welcome, all_columns, all_endpoints, ayah_count,
    column_data, error_payload, search_ayat, search_form, surah_content, surah_name, surah_range,
    translations, verse, welcome,
};
