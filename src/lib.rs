// src/lib.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::rc::Rc;

// --- Declare modules ---
pub mod catalog;
pub mod clock;
mod config;
pub mod db;
mod error;
pub mod models;
pub mod plan;
pub mod records;
mod schema;
pub mod stats;
pub mod storage;

// --- Expose public types ---
pub use catalog::{BuiltinExercise, CatalogExercise, ExerciseCatalog, BUILTIN_EXERCISES};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, Config, ConfigError, StandardColor, Theme,
};
pub use db::{get_db_path as get_db_path_util, SqliteStore};
pub use error::Error;
pub use models::{
    ExercisePatch, ExerciseType, NewExercise, NewRecordInput, Target, UserExercise,
    UserSettings, WorkoutRecord,
};
pub use plan::{ActiveSession, PlanManager};
pub use records::{Period, RecordStore};
pub use schema::CURRENT_VERSION as SCHEMA_VERSION;
pub use stats::{RecordSummary, WeekStart, WorkoutStats};
pub use storage::{Collection, KeyValueStore, MemoryStore, Storage, StorageError};

/// Entry point for front ends. Owns the storage adapter and clock and hands them to
/// the catalog, record store and plan manager.
pub struct AppService {
    pub config: Config,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    storage: Rc<Storage>,
    clock: Rc<dyn Clock>,
    catalog: ExerciseCatalog,
    records: RecordStore,
    plan: PlanManager,
}

impl AppService {
    /// Initializes the application service from the on-disk config and database.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;
        Self::open(config, config_path)
    }

    /// Opens the database for an already loaded config.
    /// # Errors
    /// Returns `anyhow::Error` if the database can't be located or opened.
    pub fn open(config: Config, config_path: PathBuf) -> Result<Self> {
        let db_path = db::get_db_path().context("Failed to determine database path")?;
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;

        let mut service = Self::new(Storage::new(store), Rc::new(SystemClock), config);
        service.config_path = config_path;
        service.db_path = db_path;
        Ok(service)
    }

    /// Wires a service around any storage and clock. Paths are left empty.
    pub fn new(storage: Storage, clock: Rc<dyn Clock>, config: Config) -> Self {
        let storage = Rc::new(storage);
        let catalog = ExerciseCatalog::new(Rc::clone(&storage));
        let records = RecordStore::new(Rc::clone(&storage), Rc::clone(&clock));
        let plan = PlanManager::new(Rc::clone(&storage), Rc::clone(&clock), records.clone());
        Self {
            config,
            config_path: PathBuf::new(),
            db_path: PathBuf::new(),
            storage,
            clock,
            catalog,
            records,
            plan,
        }
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// Sets the first day of the week.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_week_start(&mut self, week_start: WeekStart) -> Result<(), ConfigError> {
        self.config.week_start = week_start;
        self.save_config()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // --- Statistics ---

    /// Dashboard numbers, recomputed from the stored history on every call.
    pub fn get_workout_stats(&self) -> WorkoutStats {
        stats::workout_stats(&self.records.all(), self.today(), self.config.week_start)
    }

    /// Percentage of today's goal met, capped at 100.
    pub fn daily_goal_progress(&self) -> u8 {
        let today = self.get_today_records().len();
        stats::daily_goal_progress(today, self.get_settings().daily_goal)
    }

    /// Aggregates over the records in `period`, optionally limited to one category.
    pub fn record_summary(&self, period: Period, category: Option<&str>) -> RecordSummary {
        stats::summarize(&self.filtered_records(period, category))
    }

    /// History view: records in `period`, optionally limited to one category.
    pub fn filtered_records(&self, period: Period, category: Option<&str>) -> Vec<WorkoutRecord> {
        let in_period = self.records.by_period(period);
        match category {
            Some(c) => records::filter_by_category(&in_period, c),
            None => in_period,
        }
    }

    /// Categories that appear in the history, first-seen order.
    pub fn record_categories(&self) -> Vec<String> {
        stats::category_stats(&self.records.all())
            .into_iter()
            .map(|(category, _)| category)
            .collect()
    }

    // --- Records ---

    pub fn get_workout_records(&self) -> Vec<WorkoutRecord> {
        self.records.all()
    }

    pub fn get_records_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<WorkoutRecord> {
        self.records.by_date_range(start, end)
    }

    pub fn get_today_records(&self) -> Vec<WorkoutRecord> {
        self.records.today()
    }

    /// Appends a record stamped with the current time.
    /// # Errors
    /// `Error::Persistence` if the history can't be read or written.
    pub fn add_workout_record(&self, input: NewRecordInput) -> Result<WorkoutRecord, Error> {
        self.records.append(input)
    }

    // --- Catalog & user exercises ---

    pub fn list_exercises(&self) -> Vec<CatalogExercise> {
        self.catalog.list_all()
    }

    pub fn find_exercise(&self, id: &str) -> Option<CatalogExercise> {
        self.catalog.find_by_id(id)
    }

    pub fn search_exercises(&self, term: &str, category: Option<&str>) -> Vec<CatalogExercise> {
        self.catalog.search(term, category)
    }

    pub fn exercise_categories(&self) -> Vec<String> {
        self.catalog.categories()
    }

    pub fn get_user_exercises(&self) -> Vec<UserExercise> {
        self.catalog.user_exercises()
    }

    /// # Errors
    /// `Error::InvalidInput` for blank names or zero targets, `Error::Persistence` on storage failure.
    pub fn add_user_exercise(&self, input: NewExercise) -> Result<UserExercise, Error> {
        self.plan.create(input)
    }

    /// Copies a built-in into the user's plan. Fields set in `overrides` win.
    /// # Errors
    /// - `Error::NotFound` if `builtin_id` isn't a built-in exercise.
    /// - Same as `add_user_exercise` otherwise.
    pub fn clone_builtin_exercise(
        &self,
        builtin_id: &str,
        overrides: ExercisePatch,
    ) -> Result<UserExercise, Error> {
        let builtin =
            catalog::find_builtin(builtin_id).ok_or_else(|| Error::NotFound(builtin_id.to_string()))?;
        self.plan.create(NewExercise {
            name: overrides.name.unwrap_or_else(|| builtin.name.to_string()),
            description: overrides
                .description
                .unwrap_or_else(|| builtin.description.to_string()),
            category: overrides
                .category
                .unwrap_or_else(|| builtin.category.to_string()),
            kind: ExerciseType::FromLibrary,
            target: overrides.target.unwrap_or(builtin.target),
            notes: overrides.notes,
            original_id: Some(builtin.id.to_string()),
        })
    }

    /// Returns `false` if the id is unknown or the update could not be stored.
    pub fn update_user_exercise(&self, id: &str, updates: ExercisePatch) -> bool {
        self.plan.update(id, updates)
    }

    /// Returns `false` if the id is unknown or the deletion could not be stored.
    pub fn delete_user_exercise(&self, id: &str) -> bool {
        self.plan.delete(id)
    }

    // --- Workout sessions ---

    /// Starts timing the exercise with `exercise_id`.
    /// # Errors
    /// - `Error::NotFound` if no exercise has that id.
    /// - `Error::InvalidStateTransition` if a workout is already in progress.
    pub fn start_workout(&mut self, exercise_id: &str) -> Result<&ActiveSession, Error> {
        let exercise = self
            .catalog
            .find_by_id(exercise_id)
            .ok_or_else(|| Error::NotFound(exercise_id.to_string()))?;
        self.plan.start_workout(&exercise)
    }

    /// Stops the active workout and records it.
    /// # Errors
    /// - `Error::InvalidStateTransition` if nothing is in progress.
    /// - `Error::Persistence` if the record can't be stored (the session stays active).
    pub fn complete_workout(&mut self) -> Result<WorkoutRecord, Error> {
        self.plan.complete_workout()
    }

    pub fn active_session(&self) -> Option<&ActiveSession> {
        self.plan.active_session()
    }

    // --- Settings & reset ---

    pub fn get_settings(&self) -> UserSettings {
        self.storage.read_settings()
    }

    /// # Errors
    /// `Error::InvalidInput` for a malformed reminder time, `Error::Persistence` on storage failure.
    pub fn save_settings(&self, settings: &UserSettings) -> Result<(), Error> {
        settings.validate()?;
        if self.storage.write_settings(settings) {
            Ok(())
        } else {
            Err(Error::Persistence(Collection::UserSettings))
        }
    }

    /// Clears all three collections unconditionally.
    pub fn reset(&self) -> bool {
        self.storage.clear_all()
    }
}
