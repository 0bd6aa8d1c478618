//! devlog-cli library, exposed so the viewer can be driven from tests.

pub mod app;
pub mod commands;
pub mod error;
