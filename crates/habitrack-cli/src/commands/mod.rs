pub mod habit;
pub mod profile;

use habitrack_core::{AuthenticatedUser, Config};

/// Load the operator identity from the config file.
///
/// Owner-scoped commands need this; listing and completion work for any
/// identity, but we still require a profile so completions are traceable.
pub fn operator() -> Result<AuthenticatedUser, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    match &config.profile {
        Some(profile) => Ok(profile.into()),
        None => Err("no operator profile set; run `habitrack-cli profile set` first".into()),
    }
}
