//! Purpose: Library crate backing the `ayat` CLI and HTTP server.
//! Exports: `core` (table store, loaders, query engine, errors) and `api` (stable surface + payloads).
//! Role: Shared by the binary and integration tests; the binary never reaches past `api`.
//! Invariants: The dataset is loaded once and is read-only for the life of the process.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
