use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreludeError {
    #[error("{op} failed on {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),
    #[error("no suitable shell found")]
    NoShell,
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("git {args} failed: {stderr}")]
    Git { args: String, stderr: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl PreludeError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { op, path, source }
    }
}

pub type Result<T, E = PreludeError> = std::result::Result<T, E>;
