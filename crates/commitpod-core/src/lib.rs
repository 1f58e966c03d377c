//! # commitpod-core
//!
//! Shared pieces for the commitpod crates: the configuration file model,
//! where configuration lives on disk, and logging setup.

pub mod config;
mod error;
mod logging;

pub use config::{ApiConfig, Config, DiffConfig, GenerateConfig};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;

use std::path::PathBuf;

/// Environment variable that overrides the configuration home
pub const CONFIG_HOME_ENV: &str = "COMMITPOD_CONFIG_HOME";

/// Directory holding `config.toml` and `logs/`.
///
/// `$COMMITPOD_CONFIG_HOME` when set, otherwise `~/.config/commitpod`.
pub fn get_config_home() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_HOME_ENV) {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    dirs::home_dir().map(|home| home.join(".config").join("commitpod"))
}
