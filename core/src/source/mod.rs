//! Record sources: a finite file read to EOF, or a growing file followed live.

mod batch;
mod follow;

pub use batch::{parse_lines, read_batch, ParseError, ParsedBatch};
pub use follow::{follow_file, FollowBuffer, FollowOptions};
