mod load;
mod types;

pub use load::{apply_env_overrides, get_devlog_data_dir, load, parse_config};
pub use types::{AppConfig, LoggingConfig, ViewerConfig};
