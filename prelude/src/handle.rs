use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::{PreludeError, Result};
use crate::status::{StatusEvent, StatusSink};

/// Handle to the helper toolkit.
///
/// Holding a `Prelude` is what makes the helpers available; there is no
/// process-wide "loaded" flag. The handle owns its working directory and an
/// environment overlay, so several sessions can coexist in one process.
pub struct Prelude {
    cwd: PathBuf,
    env: BTreeMap<String, String>,
    sink: Arc<dyn StatusSink>,
}

impl std::fmt::Debug for Prelude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prelude")
            .field("cwd", &self.cwd)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

impl Prelude {
    /// Starts a session rooted at the process working directory.
    pub fn init(sink: Arc<dyn StatusSink>) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(PreludeError::io("init", "."))?;
        tracing::debug!(cwd = %cwd.display(), "prelude initialised");
        Ok(Self::with_cwd(cwd, sink))
    }

    pub fn with_cwd(cwd: impl Into<PathBuf>, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            cwd: cwd.into(),
            env: BTreeMap::new(),
            sink,
        }
    }

    /// Resolves `path` against the session directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        };
        // Drops `.` components so globbing sees a clean prefix.
        joined
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }

    pub(crate) fn emit(&self, op: &str, fields: Value) {
        let event = StatusEvent::new(op, fields);
        tracing::debug!(op, error = event.is_error(), "prelude op");
        self.sink.emit(&event);
    }

    pub(crate) fn env_overlay(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub(crate) fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn pwd(&self) -> PathBuf {
        self.emit("pwd", json!({ "path": self.cwd.display().to_string() }));
        self.cwd.clone()
    }

    /// Changes the session directory. `~` is expanded; the target must be a directory.
    pub fn cd(&mut self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let raw = path.as_ref().to_string_lossy();
        let expanded = shellexpand::tilde(&raw).into_owned();
        let target = self.resolve(&expanded);
        let target = std::fs::canonicalize(&target).map_err(PreludeError::io("cd", &target))?;
        if !target.is_dir() {
            return Err(PreludeError::InvalidArgument(format!(
                "not a directory: {}",
                target.display()
            )));
        }
        self.cwd = target.clone();
        self.emit("cd", json!({ "path": target.display().to_string() }));
        Ok(target)
    }

    /// All variables visible to spawned commands, sorted by name.
    pub fn env(&self) -> BTreeMap<String, String> {
        let mut items: BTreeMap<String, String> = std::env::vars().collect();
        items.extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        let keys: Vec<&String> = items.keys().take(20).collect();
        self.emit("env", json!({ "count": items.len(), "keys": keys }));
        items
    }

    pub fn env_get(&self, key: &str) -> Option<String> {
        let value = self.lookup_env(key);
        self.emit("env", json!({ "key": key, "value": value, "action": "get" }));
        value
    }

    /// Sets a variable for this session's spawned commands.
    pub fn env_set(&mut self, key: &str, value: &str) -> String {
        self.env.insert(key.to_string(), value.to_string());
        self.emit("env", json!({ "key": key, "value": value, "action": "set" }));
        value.to_string()
    }

    pub(crate) fn lookup_env(&self, key: &str) -> Option<String> {
        self.env
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
    }
}
