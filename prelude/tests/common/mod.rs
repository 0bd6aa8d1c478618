#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use devlog_prelude::{MemorySink, Prelude};

pub fn session() -> (tempfile::TempDir, Prelude, Arc<MemorySink>) {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySink::new());
    let prelude = Prelude::with_cwd(dir.path(), sink.clone());
    (dir, prelude, sink)
}

pub fn git_available() -> bool {
    which::which("git").is_ok()
}

/// Runs git synchronously for fixture setup.
pub fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}
