mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, OperatorProfile};
pub use database::{CompletionInsert, Database};

use std::path::PathBuf;

/// Returns `~/.config/habitrack[-dev]/` based on HABITRACK_ENV.
///
/// Set HABITRACK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HABITRACK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("habitrack-dev")
    } else {
        base_dir.join("habitrack")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
