use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config error: {0}")]
    Config(String),
}

impl ViewerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::FileNotFound(path);
        }
        Self::Io { path, source }
    }

    /// Process exit status for a fatal error.
    pub fn exit_code(&self) -> i32 {
        // 1: missing input file
        // 2: config error
        // 3: other io failures
        match self {
            Self::FileNotFound(_) => 1,
            Self::Config(_) => 2,
            Self::Io { .. } => 3,
        }
    }
}
