//! TOML-based application configuration.
//!
//! Stores the local operator profile used by the CLI in place of a
//! verified bearer token.
//!
//! Configuration is stored at `~/.config/habitrack/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::auth::AuthenticatedUser;
use crate::error::ConfigError;

use super::data_dir;

/// Local operator identity.
///
/// Mirrors the (uid, email, name) triple a token verification would
/// yield; the CLI trusts its own config file instead of an identity
/// provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorProfile {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<&OperatorProfile> for AuthenticatedUser {
    fn from(profile: &OperatorProfile) -> Self {
        AuthenticatedUser::new(&profile.uid, &profile.email, profile.name.clone())
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/habitrack/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profile: Option<OperatorProfile>,
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/habitrack"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing defaults on first run.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(parsed.profile.is_none());
    }

    #[test]
    fn profile_roundtrip() {
        let cfg = Config {
            profile: Some(OperatorProfile {
                uid: "uid-1".to_string(),
                email: "ada@example.com".to_string(),
                name: Some("Ada".to_string()),
            }),
        };
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        let profile = parsed.profile.unwrap();
        assert_eq!(profile.uid, "uid-1");

        let identity = AuthenticatedUser::from(&profile);
        assert_eq!(identity.display_name(), "Ada");
    }
}
