// Core modules: dataset table, loading backends (xlsx, csv, json), query engine, and errors.
pub mod columns;
pub mod csv;
pub mod engine;
pub mod error;
pub mod json_records;
pub mod load;
pub mod table;
pub mod xlsx;
