// src/plan.rs
use chrono::{DateTime, Local};
use std::rc::Rc;
use tracing::{debug, error, warn};

use crate::catalog::CatalogExercise;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::models::{
    generate_id, ExercisePatch, NewExercise, NewRecordInput, Target, UserExercise, WorkoutRecord,
};
use crate::records::RecordStore;
use crate::storage::{Collection, Storage};

/// The one workout currently being timed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub exercise_id: String,
    pub exercise_name: String,
    pub category: String,
    pub target: Target,
    pub started_at: DateTime<Local>,
}

impl ActiveSession {
    /// Whole seconds since the start, rounded to nearest. Never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Local>) -> u32 {
        let millis = (now - self.started_at).num_milliseconds().max(0);
        u32::try_from((millis + 500) / 1000).unwrap_or(u32::MAX)
    }
}

/// User exercise CRUD and the Idle/Active workout session state machine.
pub struct PlanManager {
    storage: Rc<Storage>,
    clock: Rc<dyn Clock>,
    records: RecordStore,
    session: Option<ActiveSession>,
}

impl PlanManager {
    pub fn new(storage: Rc<Storage>, clock: Rc<dyn Clock>, records: RecordStore) -> Self {
        Self {
            storage,
            clock,
            records,
            session: None,
        }
    }

    /// Loads user exercises for a mutation. Unreadable data is reported, not replaced.
    fn load_for_update(&self) -> Result<Vec<UserExercise>> {
        self.storage
            .try_read(Collection::UserExercises)
            .map(Option::unwrap_or_default)
            .map_err(|e| {
                error!(error = %e, "Refusing to modify unreadable user exercises");
                Error::Persistence(Collection::UserExercises)
            })
    }

    /// Creates and persists a user exercise.
    /// # Errors
    /// - `Error::InvalidInput` if the name is blank or the target has a zero count.
    /// - `Error::Persistence` if storage fails.
    pub fn create(&self, input: NewExercise) -> Result<UserExercise> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "Exercise name cannot be empty.".to_string(),
            ));
        }
        input.target.validate()?;

        let mut exercises = self.load_for_update()?;
        let now = self.clock.now();
        let exercise = UserExercise {
            id: generate_id("user", now),
            name: name.to_string(),
            description: input.description.trim().to_string(),
            category: input.category.trim().to_string(),
            kind: input.kind,
            target: input.target,
            is_custom: true,
            created_at: now,
            updated_at: None,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            original_id: input.original_id,
        };
        exercises.push(exercise.clone());

        if !self.storage.write(Collection::UserExercises, &exercises) {
            return Err(Error::Persistence(Collection::UserExercises));
        }
        debug!(id = %exercise.id, name = %exercise.name, "User exercise created");
        Ok(exercise)
    }

    /// Merges `patch` into the exercise and stamps `updated_at`.
    /// Returns `false` if the id is unknown, the patch is invalid or storage fails.
    pub fn update(&self, id: &str, patch: ExercisePatch) -> bool {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            warn!(id, "Rejected exercise update with an empty name");
            return false;
        }
        if let Some(Err(e)) = patch.target.as_ref().map(Target::validate) {
            warn!(id, error = %e, "Rejected exercise update");
            return false;
        }
        let Ok(mut exercises) = self.load_for_update() else {
            return false;
        };
        let Some(exercise) = exercises.iter_mut().find(|ex| ex.id == id) else {
            debug!(id, "Update of unknown exercise ignored");
            return false;
        };

        if let Some(name) = patch.name {
            exercise.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            exercise.description = description;
        }
        if let Some(category) = patch.category {
            exercise.category = category;
        }
        if let Some(target) = patch.target {
            exercise.target = target;
        }
        if let Some(notes) = patch.notes {
            exercise.notes = Some(notes).filter(|n| !n.trim().is_empty());
        }
        exercise.updated_at = Some(self.clock.now());

        self.storage.write(Collection::UserExercises, &exercises)
    }

    /// Removes an exercise. Unknown ids return `false` and leave storage untouched.
    /// Past records referring to it are kept.
    pub fn delete(&self, id: &str) -> bool {
        let Ok(mut exercises) = self.load_for_update() else {
            return false;
        };
        let before = exercises.len();
        exercises.retain(|ex| ex.id != id);
        if exercises.len() == before {
            debug!(id, "Delete of unknown exercise ignored");
            return false;
        }
        self.storage.write(Collection::UserExercises, &exercises)
    }

    pub const fn active_session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    /// Idle -> Active.
    /// # Errors
    /// `Error::InvalidStateTransition` if a session is already active; it is left as is.
    pub fn start_workout(&mut self, exercise: &CatalogExercise) -> Result<&ActiveSession> {
        if let Some(active) = &self.session {
            return Err(Error::InvalidStateTransition(format!(
                "a workout for '{}' is already in progress",
                active.exercise_name
            )));
        }
        let session = ActiveSession {
            exercise_id: exercise.id().to_string(),
            exercise_name: exercise.name().to_string(),
            category: exercise.category().to_string(),
            target: exercise.target(),
            started_at: self.clock.now(),
        };
        debug!(exercise = %session.exercise_id, "Workout started");
        Ok(&*self.session.insert(session))
    }

    /// Active -> Idle, recording the session.
    /// # Errors
    /// - `Error::InvalidStateTransition` if no session is active.
    /// - `Error::Persistence` if the record can't be stored; the session stays active.
    pub fn complete_workout(&mut self) -> Result<WorkoutRecord> {
        let Some(session) = &self.session else {
            return Err(Error::InvalidStateTransition(
                "no workout is in progress".to_string(),
            ));
        };
        let elapsed = session.elapsed_seconds(self.clock.now());
        let input = NewRecordInput {
            exercise_id: session.exercise_id.clone(),
            exercise_name: session.exercise_name.clone(),
            category: session.category.clone(),
            target: session.target,
            duration: elapsed,
            notes: format!("Completed in {elapsed}s"),
        };
        let record = self.records.append(input)?;
        self.session = None;
        Ok(record)
    }
}

impl std::fmt::Debug for PlanManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanManager")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
