//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `devlog_core::api` instead of reaching into internal modules.

pub use crate::classify::{
    classify, delta_type, extract_text_delta, is_noise, Classification, COALESCE_DELTAS,
    SKIP_DELTAS,
};
pub use crate::coalesce::{coalesce, Coalescer};
pub use crate::config::{load, AppConfig, LoggingConfig, ViewerConfig};
pub use crate::error::ViewerError;
pub use crate::format::{format_clock, format_detail, format_record};
pub use crate::record::LogRecord;
pub use crate::source::{follow_file, read_batch, FollowOptions, ParseError, ParsedBatch};
