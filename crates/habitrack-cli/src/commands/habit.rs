//! Habit management commands for CLI.

use clap::Subcommand;
use habitrack_core::{
    CompletionOutcome, Database, Habit, HabitDraft, HabitPatch, HabitService, SystemClock,
};
use uuid::Uuid;

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit owned by the operator
    Add {
        /// Habit title
        title: String,
        /// Habit description
        #[arg(long)]
        description: Option<String>,
        /// Category (default: General)
        #[arg(long)]
        category: Option<String>,
        /// Cover image URL
        #[arg(long)]
        image_url: Option<String>,
    },
    /// List public habits (newest-first, capped)
    List {
        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,
        /// Filter by category ('All' disables the filter)
        #[arg(long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the operator's own habits
    Mine {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single habit
    Show {
        /// Habit ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a habit owned by the operator
    Update {
        /// Habit ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New category
        #[arg(long)]
        category: Option<String>,
        /// New cover image URL
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Delete a habit owned by the operator
    Delete {
        /// Habit ID
        id: String,
    },
    /// Mark a habit completed for today
    Complete {
        /// Habit ID
        id: String,
    },
    /// Show the current streak, recomputed from history
    Streak {
        /// Habit ID
        id: String,
    },
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let clock = SystemClock;
    let service = HabitService::new(&db, &clock);

    match action {
        HabitAction::Add {
            title,
            description,
            category,
            image_url,
        } => {
            let operator = super::operator()?;
            service.register_user(&operator)?;

            let mut draft = HabitDraft::new(title);
            if let Some(description) = description {
                draft.description = description;
            }
            if let Some(category) = category {
                draft.category = category;
            }
            draft.image_url = image_url;

            let habit = service.create_habit(&operator, draft)?;
            println!("Habit created: {}", habit.id);
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List {
            search,
            category,
            json,
        } => {
            let habits = service.list_public(search.as_deref(), category.as_deref())?;
            print_habits(&habits, json)?;
        }
        HabitAction::Mine { json } => {
            let operator = super::operator()?;
            let habits = service.my_habits(&operator.uid)?;
            print_habits(&habits, json)?;
        }
        HabitAction::Show { id, json } => {
            let habit = service.get_habit(parse_id(&id)?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&habit)?);
            } else {
                print_habit_line(&habit);
                println!("  completions: {}", habit.completion_history.len());
            }
        }
        HabitAction::Update {
            id,
            title,
            description,
            category,
            image_url,
        } => {
            let operator = super::operator()?;
            let patch = HabitPatch {
                title,
                description,
                category,
                image_url,
            };
            let habit = service.update_habit(&operator.uid, parse_id(&id)?, patch)?;
            println!("Habit updated: {}", habit.id);
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Delete { id } => {
            let operator = super::operator()?;
            let id = parse_id(&id)?;
            service.delete_habit(&operator.uid, id)?;
            println!("Habit deleted: {id}");
        }
        HabitAction::Complete { id } => {
            // Completion requires an authenticated caller but is not
            // owner-scoped; public habits can be completed by anyone.
            let _ = super::operator()?;
            match service.complete_habit(parse_id(&id)?)? {
                CompletionOutcome::Recorded(habit) => {
                    println!("Completed. Current streak: {}", habit.current_streak);
                }
                CompletionOutcome::AlreadyCompletedToday => {
                    println!("Already completed today");
                }
            }
        }
        HabitAction::Streak { id } => {
            let streak = service.streak_of(parse_id(&id)?)?;
            println!("{streak}");
        }
    }

    Ok(())
}

fn parse_id(id: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    Ok(Uuid::parse_str(id)?)
}

fn print_habits(habits: &[Habit], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(habits)?);
    } else if habits.is_empty() {
        println!("No habits found");
    } else {
        for habit in habits {
            print_habit_line(habit);
        }
    }
    Ok(())
}

fn print_habit_line(habit: &Habit) {
    println!(
        "{}  [{}] {} (streak: {}, by {})",
        habit.id, habit.category, habit.title, habit.current_streak, habit.owner_name
    );
}
