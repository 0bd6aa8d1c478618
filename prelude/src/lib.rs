//! Helpers for interactive notebook sessions: navigation, file I/O, search,
//! text processing, in-place edits, shell commands and git.
//!
//! Every helper is a method on [`Prelude`] and reports one [`StatusEvent`]
//! to the session's [`StatusSink`].

pub mod edit;
pub mod error;
pub mod fs_ops;
pub mod git;
pub mod handle;
mod ignore;
pub mod registry;
pub mod search;
pub mod shell;
pub mod status;
pub mod text;

pub use edit::{RegexFlags, RsedOptions};
pub use error::{PreludeError, Result};
pub use fs_ops::{FileStat, RemoveOutcome};
pub use git::{Branches, Commit, CommitDetail, DiffQuery, GitStatus, LogQuery};
pub use handle::Prelude;
pub use registry::{helper_docs, HelperDoc};
pub use search::{FindKind, FindOptions, GrepHit, GrepOptions, RgrepOptions};
pub use shell::{ShellOptions, ShellResult};
pub use status::{DisplaySink, MemorySink, StatusEvent, StatusSink, TracingSink, STATUS_MIME};
pub use text::WordCount;
