use std::path::{Path, PathBuf};

use super::types::AppConfig;
use crate::error::ViewerError;

/// Default data directory: ~/.devlog
pub fn get_devlog_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".devlog"))
}

/// Loads configuration.
///
/// Priority: explicit `path` (must exist), then `~/.devlog/config.toml`,
/// then `./devlog.toml`, then defaults. Environment overrides apply last.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ViewerError> {
    let mut cfg = match path {
        Some(p) => read_config(p)?,
        None => {
            let home_config = get_devlog_data_dir().map(|d| d.join("config.toml"));
            let local_config = Path::new("devlog.toml");
            match home_config.filter(|p| p.exists()) {
                Some(p) => read_config(&p)?,
                None if local_config.exists() => read_config(local_config)?,
                None => AppConfig::default(),
            }
        }
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

fn read_config(path: &Path) -> Result<AppConfig, ViewerError> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| ViewerError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse_config(&s).map_err(|e| ViewerError::Config(format!("{}: {e}", path.display())))
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str::<AppConfig>(s)
}

/// Applies `DEVLOG_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> Result<(), ViewerError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("DEVLOG_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = non_empty("DEVLOG_POLL_INTERVAL_MS") {
        cfg.viewer.poll_interval_ms = parse_ms("DEVLOG_POLL_INTERVAL_MS", &v)?;
    }
    if let Some(v) = non_empty("DEVLOG_FLUSH_INTERVAL_MS") {
        cfg.viewer.flush_interval_ms = parse_ms("DEVLOG_FLUSH_INTERVAL_MS", &v)?;
    }
    Ok(())
}

fn parse_ms(key: &str, v: &str) -> Result<u64, ViewerError> {
    v.trim()
        .parse::<u64>()
        .map_err(|_| ViewerError::Config(format!("{key} must be milliseconds, got {v:?}")))
}
