//! Filtering and coalescing for coding-assistant debug event logs (JSON lines).
//!
//! The pipeline is `source` -> [`record::LogRecord`] -> [`classify`] -> [`coalesce`],
//! with [`format`] rendering each surviving record as one line.

pub mod api;
pub mod classify;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod format;
pub mod record;
pub mod source;
pub mod util;
