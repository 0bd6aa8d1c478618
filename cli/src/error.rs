use devlog_core::api::ViewerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Viewer(#[from] ViewerError),
    #[error("logging setup failed: {0:#}")]
    Logging(anyhow::Error),
    #[error("write failed: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Viewer(e) => e.exit_code(),
            Self::Logging(_) => 2,
            // `devlog x | head` closes stdout early.
            Self::Output(e) if e.kind() == std::io::ErrorKind::BrokenPipe => 0,
            Self::Output(_) => 3,
        }
    }
}
