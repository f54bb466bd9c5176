//! Purpose: Library crate behind the `flashdeck` server binary and its tests.
//! Exports: `api` (service boundary), `core` (records, validation, errors), `store`, `ui`.
//! Role: Keeps request handling testable without a listening socket or a live database.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
//! Invariants: The store handle is passed in explicitly; there is no global connection.
pub mod api;
pub mod core;
pub mod store;
pub mod ui;
