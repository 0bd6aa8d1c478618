use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "warn" or "devlog_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Follow mode: sleep between polls when the file has not grown.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Follow mode: print buffered records at least this often.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Follow mode: print early once more than this many records are buffered.
    #[serde(default = "default_batch_threshold")]
    pub batch_threshold: usize,
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_flush_interval_ms() -> u64 {
    500
}

fn default_batch_threshold() -> usize {
    50
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            flush_interval_ms: default_flush_interval_ms(),
            batch_threshold: default_batch_threshold(),
        }
    }
}
