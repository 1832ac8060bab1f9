//! Operator profile commands for CLI.

use clap::Subcommand;
use habitrack_core::{Config, OperatorProfile};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Set the local operator identity
    Set {
        /// Subject id (defaults to the email)
        #[arg(long)]
        uid: Option<String>,
        /// Email address
        email: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the current operator identity
    Show,
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProfileAction::Set { uid, email, name } => {
            let mut config = Config::load()?;
            let profile = OperatorProfile {
                uid: uid.unwrap_or_else(|| email.clone()),
                email,
                name,
            };
            config.profile = Some(profile);
            config.save()?;
            println!("Profile saved");
        }
        ProfileAction::Show => {
            let config = Config::load()?;
            match config.profile {
                Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
                None => println!("No profile set"),
            }
        }
    }
    Ok(())
}
