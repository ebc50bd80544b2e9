// src/cli.rs
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan workouts, time sessions and track streaks", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print tabular output as CSV instead
    #[arg(long, global = true)]
    pub export_csv: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodCli {
    Today,
    Week,
    Month,
    All,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeekStartCli {
    Sunday,
    Monday,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show today/week/total counts and the current streak
    Stats,
    /// List built-in and custom exercises
    Exercises {
        /// Only exercises whose name or description contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Only exercises in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one exercise with its instructions and tips
    Show { id: String },
    /// Add a custom exercise to your plan
    AddExercise {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = fitlog_lib::models::CUSTOM_CATEGORY)]
        category: String,
        /// Repetitions per set
        #[arg(short, long, default_value_t = 10)]
        reps: u32,
        /// Number of sets
        #[arg(short, long, default_value_t = 3)]
        sets: u32,
        /// Target duration in seconds; makes the exercise timed
        #[arg(short = 't', long, default_value_t = 0)]
        duration: u32,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Copy a built-in exercise into your plan
    CloneExercise {
        /// Built-in exercise id (e.g. "plank")
        id: String,
        /// Override the name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Edit a custom exercise
    EditExercise {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// New reps (switches to a rep-based target, together with --sets)
        #[arg(short, long, requires = "sets", conflicts_with = "duration")]
        reps: Option<u32>,
        #[arg(short, long, requires = "reps")]
        sets: Option<u32>,
        /// New target duration in seconds (switches to a timed target)
        #[arg(short = 't', long)]
        duration: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a custom exercise (its past records are kept)
    DeleteExercise { id: String },
    /// Time a workout: starts now, completes when you press Enter
    Workout { id: String },
    /// List workout records
    Records {
        #[arg(short, long, value_enum, default_value_t = PeriodCli::Week)]
        period: PeriodCli,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Totals, durations and breakdowns for a period
    Summary {
        #[arg(short, long, value_enum, default_value_t = PeriodCli::Week)]
        period: PeriodCli,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show or change settings
    Settings {
        /// Workouts per day to aim for
        #[arg(long)]
        daily_goal: Option<u32>,
        #[arg(long)]
        reminder: Option<bool>,
        /// Reminder time as HH:MM
        #[arg(long)]
        reminder_time: Option<String>,
        #[arg(long, value_enum)]
        week_start: Option<WeekStartCli>,
    },
    /// Delete all exercises, records and settings
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the paths of the database and config files
    DataPath,
    /// Generate shell completion scripts
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
