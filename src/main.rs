//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdin, stdout, Write};
use tracing_subscriber::EnvFilter;

use fitlog_lib::{
    AppService, CatalogExercise, ExercisePatch, NewExercise, Period, RecordSummary, Target,
    WeekStart, WorkoutRecord, WorkoutStats,
};

fn main() -> Result<()> {
    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args(); // Parse arguments once
    let export_csv = cli_args.export_csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command(); // Get the command structure
        let bin_name = cmd.get_name().to_string(); // Get the binary name

        eprintln!("Generating completion script for {shell}..."); // Print to stderr
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout()); // Print script to stdout
        return Ok(()); // Exit after generating script
    }

    let config_path =
        fitlog_lib::get_config_path_util().context("Failed to determine configuration file path")?;
    let config = fitlog_lib::load_config_util(&config_path)
        .with_context(|| format!("Failed to load config from {config_path:?}"))?;
    init_tracing(&config.log_level);

    let mut service = AppService::open(config, config_path)
        .context("Failed to initialize application service")?;
    let header_color = fitlog_lib::parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green);

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }
        cli::Commands::Stats => {
            let stats = service.get_workout_stats();
            let settings = service.get_settings();
            let progress = service.daily_goal_progress();
            if export_csv {
                print_stats_csv(&stats, settings.daily_goal, progress)?;
            } else {
                print_stats(&stats, settings.daily_goal, progress);
            }
        }
        cli::Commands::Exercises { search, category } => {
            let exercises = service.search_exercises(
                search.as_deref().unwrap_or_default(),
                category.as_deref(),
            );
            if exercises.is_empty() {
                println!("No exercises found.");
            } else if export_csv {
                print_exercise_csv(&exercises)?;
            } else {
                print_exercise_table(&exercises, header_color);
            }
        }
        cli::Commands::Show { id } => match service.find_exercise(&id) {
            Some(exercise) => print_exercise_detail(&exercise),
            None => bail!("Exercise not found: {id}"),
        },
        cli::Commands::AddExercise {
            name,
            description,
            category,
            reps,
            sets,
            duration,
            notes,
        } => {
            let input = NewExercise {
                name,
                description,
                category,
                target: Target::from_defaults(reps, sets, duration),
                notes,
                ..Default::default()
            };
            match service.add_user_exercise(input) {
                Ok(ex) => println!(
                    "Successfully added exercise '{}' ({}) ID: {}",
                    ex.name, ex.target, ex.id
                ),
                Err(e) => bail!("Error adding exercise: {e}"),
            }
        }
        cli::Commands::CloneExercise { id, name } => {
            let overrides = ExercisePatch {
                name,
                ..Default::default()
            };
            match service.clone_builtin_exercise(&id, overrides) {
                Ok(ex) => println!("Added '{}' to your plan. ID: {}", ex.name, ex.id),
                Err(e) => bail!("Error copying exercise '{id}': {e}"),
            }
        }
        cli::Commands::EditExercise {
            id,
            name,
            description,
            category,
            reps,
            sets,
            duration,
            notes,
        } => {
            let target = match (reps, sets, duration) {
                (_, _, Some(seconds)) => Some(Target::Duration { seconds }),
                (Some(reps), Some(sets), None) => Some(Target::Reps { reps, sets }),
                _ => None,
            };
            let patch = ExercisePatch {
                name,
                description,
                category,
                target,
                notes,
            };
            if patch.is_empty() {
                bail!("Nothing to update. Pass at least one field to change.");
            }
            if service.update_user_exercise(&id, patch) {
                println!("Successfully updated exercise '{id}'.");
            } else {
                bail!("Could not update exercise '{id}'. Check the ID with 'fitlog exercises'.");
            }
        }
        cli::Commands::DeleteExercise { id } => {
            if service.delete_user_exercise(&id) {
                println!("Deleted exercise '{id}'. Its past records were kept.");
            } else {
                bail!("Could not delete exercise '{id}': no custom exercise has that ID.");
            }
        }
        cli::Commands::Workout { id } => run_workout(&mut service, &id)?,
        cli::Commands::Records { period, category } => {
            let records = service.filtered_records(cli_period(period), category.as_deref());
            if records.is_empty() {
                println!("No workout records found for the given criteria.");
            } else if export_csv {
                print_records_csv(&records)?;
            } else {
                print_records_table(&records, header_color);
            }
        }
        cli::Commands::Summary { period, category } => {
            let summary = service.record_summary(cli_period(period), category.as_deref());
            if export_csv {
                print_summary_csv(&summary)?;
            } else {
                print_summary(&summary, header_color);
            }
        }
        cli::Commands::Settings {
            daily_goal,
            reminder,
            reminder_time,
            week_start,
        } => {
            let mut settings = service.get_settings();
            let mut changed = false;
            if let Some(goal) = daily_goal {
                settings.daily_goal = goal;
                changed = true;
            }
            if let Some(enabled) = reminder {
                settings.reminder_enabled = enabled;
                changed = true;
            }
            if let Some(time) = reminder_time {
                settings.reminder_time = time;
                changed = true;
            }
            if changed {
                service
                    .save_settings(&settings)
                    .context("Failed to save settings")?;
            }
            if let Some(ws) = week_start {
                let ws = match ws {
                    cli::WeekStartCli::Sunday => WeekStart::Sunday,
                    cli::WeekStartCli::Monday => WeekStart::Monday,
                };
                service
                    .set_week_start(ws)
                    .context("Failed to save config")?;
            }
            println!("Daily goal:    {}", settings.daily_goal);
            println!(
                "Reminder:      {} at {}",
                if settings.reminder_enabled { "on" } else { "off" },
                settings.reminder_time
            );
            println!("Week starts:   {:?}", service.config.week_start);
        }
        cli::Commands::Reset { yes } => {
            if !yes && !confirm("Delete ALL exercises, records and settings?")? {
                println!("Reset cancelled.");
                return Ok(());
            }
            if service.reset() {
                println!("All data cleared.");
            } else {
                bail!("Failed to clear all data. See the log for details.");
            }
        }
        cli::Commands::DataPath => {
            println!("Database: {}", service.get_db_path().display());
            println!("Config:   {}", service.get_config_path().display());
        }
    }

    Ok(())
}

/// Installs the log subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

const fn cli_period(period: cli::PeriodCli) -> Period {
    match period {
        cli::PeriodCli::Today => Period::Today,
        cli::PeriodCli::Week => Period::Week,
        cli::PeriodCli::Month => Period::Month,
        cli::PeriodCli::All => Period::All,
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N]: ");
    stdout().flush()?;
    let mut answer = String::new();
    stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Starts the session, waits for Enter, then completes it.
fn run_workout(service: &mut AppService, id: &str) -> Result<()> {
    let session = service
        .start_workout(id)
        .with_context(|| format!("Could not start workout '{id}'"))?;
    println!("Working out: {}", session.exercise_name);
    match session.target {
        Target::Duration { seconds } => println!("Target: {seconds}s"),
        Target::Reps { reps, sets } => println!("Target: {reps} reps x {sets} sets"),
    }
    print!("Press Enter when you are done...");
    stdout().flush()?;
    let mut line = String::new();
    stdin().read_line(&mut line)?;

    let record = service
        .complete_workout()
        .context("Failed to save the workout")?;
    println!("Workout complete! Time: {}", format_duration(u64::from(record.duration)));

    let stats = service.get_workout_stats();
    if stats.consecutive_days > 1 {
        println!("{} days in a row. Keep it up!", stats.consecutive_days);
    }
    Ok(())
}

fn format_duration(seconds: u64) -> String {
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m {}s", s / 60, s % 60),
        s => format!("{}h {}m", s / 3600, (s % 3600) / 60),
    }
}

fn target_columns(target: &Target) -> (String, String, String) {
    let dash = || "-".to_string();
    (
        target.reps().map_or_else(dash, |v| v.to_string()),
        target.sets().map_or_else(dash, |v| v.to_string()),
        match target.target_duration() {
            0 => dash(),
            s => format!("{s}s"),
        },
    )
}

fn print_stats(stats: &WorkoutStats, daily_goal: u32, progress: u8) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic); // No headers needed for key-value

    let rows = [
        ("Today", format!("{} / {daily_goal} ({progress}%)", stats.today_workouts)),
        ("This Week", stats.week_workouts.to_string()),
        ("Total", stats.total_workouts.to_string()),
        ("Streak", format!("{} days", stats.consecutive_days)),
        (
            "Last Workout",
            stats
                .last_workout_date
                .map_or("N/A".to_string(), |d| d.format("%Y-%m-%d").to_string()),
        ),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    println!("{table}");

    if stats.today_workouts > 0 {
        println!("You've already trained today. Keep it going!");
    } else if stats.consecutive_days > 0 {
        println!("{} days in a row, don't break the chain today!", stats.consecutive_days);
    }
}

fn print_stats_csv(stats: &WorkoutStats, daily_goal: u32, progress: u8) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Statistic", "Value"])?;
    writer.serialize(("Today_Workouts", stats.today_workouts))?;
    writer.serialize(("Daily_Goal", daily_goal))?;
    writer.serialize(("Daily_Goal_Progress_Percent", progress))?;
    writer.serialize(("Week_Workouts", stats.week_workouts))?;
    writer.serialize(("Total_Workouts", stats.total_workouts))?;
    writer.serialize(("Consecutive_Days", stats.consecutive_days))?;
    writer.serialize((
        "Last_Workout_Date",
        stats
            .last_workout_date
            .map_or(String::new(), |d| d.format("%Y-%m-%d").to_string()),
    ))?;
    writer.flush()?;
    Ok(())
}

/// Prints exercises in a formatted table.
fn print_exercise_table(exercises: &[CatalogExercise], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Category").fg(header_color),
            Cell::new("Type").fg(header_color),
            Cell::new("Target").fg(header_color),
            Cell::new("Custom").fg(header_color),
        ]);

    for exercise in exercises {
        table.add_row(vec![
            Cell::new(exercise.id()),
            Cell::new(exercise.name()),
            Cell::new(exercise.category()),
            Cell::new(exercise.kind().to_string()),
            Cell::new(exercise.target().to_string()),
            Cell::new(if exercise.is_custom() { "yes" } else { "" }),
        ]);
    }
    println!("{table}");
}

fn print_exercise_csv(exercises: &[CatalogExercise]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["ID", "Name", "Category", "Type", "Reps", "Sets", "Duration_s", "Custom"])?;
    for exercise in exercises {
        let target = exercise.target();
        writer.write_record([
            exercise.id().to_string(),
            exercise.name().to_string(),
            exercise.category().to_string(),
            exercise.kind().to_string(),
            target.reps().map_or(String::new(), |v| v.to_string()),
            target.sets().map_or(String::new(), |v| v.to_string()),
            target.target_duration().to_string(),
            exercise.is_custom().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_exercise_detail(exercise: &CatalogExercise) {
    println!("\n--- {} ({}) ---", exercise.name(), exercise.id());
    if !exercise.description().is_empty() {
        println!("{}", exercise.description());
    }
    println!("Category: {}", exercise.category());
    println!("Type:     {}", exercise.kind());
    println!("Target:   {}", exercise.target());
    if let CatalogExercise::Custom(custom) = exercise {
        if let Some(notes) = &custom.notes {
            println!("Notes:    {notes}");
        }
        if let Some(original) = &custom.original_id {
            println!("Based on: {original}");
        }
    }
    if !exercise.instructions().is_empty() {
        println!("\nInstructions:");
        for (i, step) in exercise.instructions().iter().enumerate() {
            println!("  {}. {step}", i + 1);
        }
    }
    if !exercise.tips().is_empty() {
        println!("\nTips:");
        for tip in exercise.tips() {
            println!("  - {tip}");
        }
    }
    println!();
}

fn print_records_table(records: &[WorkoutRecord], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date").fg(header_color),
            Cell::new("Time").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Category").fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new("Target").fg(header_color),
            Cell::new("Duration").fg(header_color),
            Cell::new("Notes").fg(header_color),
        ]);

    for record in records {
        let (reps, sets, target) = target_columns(&record.target);
        table.add_row(vec![
            Cell::new(record.date.format("%Y-%m-%d")),
            Cell::new(record.timestamp.format("%H:%M")),
            Cell::new(&record.exercise_name),
            Cell::new(&record.category),
            Cell::new(reps),
            Cell::new(sets),
            Cell::new(target),
            Cell::new(format_duration(u64::from(record.duration))),
            Cell::new(if record.notes.is_empty() { "-" } else { record.notes.as_str() }),
        ]);
    }
    println!("{table}");
}

fn print_records_csv(records: &[WorkoutRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "ID",
        "Date",
        "Timestamp",
        "Exercise_ID",
        "Exercise",
        "Category",
        "Reps",
        "Sets",
        "Target_Duration_s",
        "Duration_s",
        "Notes",
    ])?;
    for record in records {
        writer.write_record([
            record.id.clone(),
            record.date.format("%Y-%m-%d").to_string(),
            record.timestamp.to_rfc3339(),
            record.exercise_id.clone(),
            record.exercise_name.clone(),
            record.category.clone(),
            record.reps().map_or(String::new(), |v| v.to_string()),
            record.sets().map_or(String::new(), |v| v.to_string()),
            record.target_duration().to_string(),
            record.duration.to_string(),
            record.notes.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(summary: &RecordSummary, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    let rows = [
        ("Workouts", summary.total_workouts.to_string()),
        ("Active Days", summary.unique_days.to_string()),
        ("Total Time", format_duration(summary.total_duration)),
        ("Average Time", format_duration(summary.average_duration)),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    println!("{table}");

    if summary.category_stats.is_empty() {
        return;
    }
    println!("\n--- By Category ---");
    let mut by_category = Table::new();
    by_category
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Category").fg(header_color),
            Cell::new("Workouts").fg(header_color),
            Cell::new("Share").fg(header_color),
        ]);
    for (category, count) in &summary.category_stats {
        let share = count * 100 / summary.total_workouts.max(1);
        by_category.add_row(vec![
            Cell::new(category),
            Cell::new(count),
            Cell::new(format!("{share}%")),
        ]);
    }
    println!("{by_category}");
}

fn print_summary_csv(summary: &RecordSummary) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Statistic", "Key", "Value"])?;
    writer.serialize(("Total_Workouts", "", summary.total_workouts))?;
    writer.serialize(("Unique_Days", "", summary.unique_days))?;
    writer.serialize(("Total_Duration_s", "", summary.total_duration))?;
    writer.serialize(("Average_Duration_s", "", summary.average_duration))?;
    for (category, count) in &summary.category_stats {
        writer.serialize(("Category", category, count))?;
    }
    for (date, count) in &summary.date_stats {
        writer.serialize(("Date", date.format("%Y-%m-%d").to_string(), count))?;
    }
    writer.flush()?;
    Ok(())
}
