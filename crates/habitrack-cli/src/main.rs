use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "habitrack-cli", version, about = "Habitrack CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management and completion tracking
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Local operator profile
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Profile { action } => commands::profile::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
