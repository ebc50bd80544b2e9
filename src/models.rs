// src/models.rs
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};
use ulid::Ulid;

use crate::error::{Error, Result};

pub const DEFAULT_DAILY_GOAL: u32 = 3;
pub const DEFAULT_REMINDER_TIME: &str = "08:00";
pub const CUSTOM_CATEGORY: &str = "自定义";

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ExerciseType {
    Strength,
    Cardio,
    Core,
    FullBody,
    Flexibility,
    // User-defined entries
    Custom,
    FromLibrary,
}

/// What a session of an exercise aims for: either repetitions over sets, or holding for a time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Target {
    Reps { reps: u32, sets: u32 },
    Duration { seconds: u32 },
}

impl Target {
    /// Builds a target from the flat "reps/sets/duration" triple, where a positive
    /// duration selects a timed target.
    pub const fn from_defaults(reps: u32, sets: u32, duration: u32) -> Self {
        if duration > 0 {
            Self::Duration { seconds: duration }
        } else {
            Self::Reps { reps, sets }
        }
    }

    pub const fn reps(&self) -> Option<u32> {
        match self {
            Self::Reps { reps, .. } => Some(*reps),
            Self::Duration { .. } => None,
        }
    }

    pub const fn sets(&self) -> Option<u32> {
        match self {
            Self::Reps { sets, .. } => Some(*sets),
            Self::Duration { .. } => None,
        }
    }

    /// Planned duration in seconds, 0 for rep-based targets.
    pub const fn target_duration(&self) -> u32 {
        match self {
            Self::Reps { .. } => 0,
            Self::Duration { seconds } => *seconds,
        }
    }

    pub const fn is_timed(&self) -> bool {
        matches!(self, Self::Duration { .. })
    }

    /// # Errors
    /// `Error::InvalidInput` if any count is zero.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Reps { reps, sets } if reps == 0 || sets == 0 => Err(Error::InvalidInput(
                "Reps and sets must both be positive.".to_string(),
            )),
            Self::Duration { seconds: 0 } => Err(Error::InvalidInput(
                "Duration must be positive.".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reps { reps, sets } => write!(f, "{reps} reps x {sets} sets"),
            Self::Duration { seconds } => write!(f, "{seconds}s"),
        }
    }
}

/// A user-defined exercise as persisted in the user exercise collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserExercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: ExerciseType,
    pub target: Target,
    #[serde(default = "always_custom")]
    pub is_custom: bool,
    pub created_at: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    // Informational back-reference to a built-in; not an ownership link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
}

const fn always_custom() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub name: String,
    pub description: String,
    pub category: String,
    pub kind: ExerciseType,
    pub target: Target,
    pub notes: Option<String>,
    pub original_id: Option<String>,
}

impl Default for NewExercise {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: CUSTOM_CATEGORY.to_string(),
            kind: ExerciseType::Custom,
            target: Target::Reps { reps: 10, sets: 3 },
            notes: None,
            original_id: None,
        }
    }
}

/// Partial update for a user exercise. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target: Option<Target>,
    pub notes: Option<String>,
}

impl ExercisePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A completed workout. Immutable once appended to the record store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    // Copied at completion time so later exercise edits leave history alone.
    pub category: String,
    pub target: Target,
    /// Actual elapsed seconds.
    pub duration: u32,
    #[serde(default)]
    pub notes: String,
    pub date: NaiveDate,
    pub timestamp: DateTime<Local>,
}

impl WorkoutRecord {
    /// Finalizes an input. `date` is taken from `timestamp` here and never recomputed.
    pub fn from_input(input: NewRecordInput, timestamp: DateTime<Local>) -> Self {
        Self {
            id: generate_id("record", timestamp),
            exercise_id: input.exercise_id,
            exercise_name: input.exercise_name,
            category: input.category,
            target: input.target,
            duration: input.duration,
            notes: input.notes,
            date: timestamp.date_naive(),
            timestamp,
        }
    }

    pub const fn reps(&self) -> Option<u32> {
        self.target.reps()
    }

    pub const fn sets(&self) -> Option<u32> {
        self.target.sets()
    }

    pub const fn target_duration(&self) -> u32 {
        self.target.target_duration()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecordInput {
    pub exercise_id: String,
    pub exercise_name: String,
    pub category: String,
    pub target: Target,
    pub duration: u32,
    pub notes: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub daily_goal: u32,
    pub reminder_enabled: bool,
    /// `HH:MM`, local time.
    pub reminder_time: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            daily_goal: DEFAULT_DAILY_GOAL,
            reminder_enabled: true,
            reminder_time: DEFAULT_REMINDER_TIME.to_string(),
        }
    }
}

impl UserSettings {
    /// # Errors
    /// `Error::InvalidInput` if `reminder_time` is not a valid `HH:MM` time.
    pub fn validate(&self) -> Result<()> {
        let well_formed = self.reminder_time.len() == 5
            && chrono::NaiveTime::parse_from_str(&self.reminder_time, "%H:%M").is_ok();
        if well_formed {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "Reminder time must be HH:MM, got '{}'.",
                self.reminder_time
            )))
        }
    }
}

/// Unique id whose leading bits encode the creation instant (`<prefix>_<ulid>`).
pub fn generate_id(prefix: &str, at: DateTime<Local>) -> String {
    format!("{prefix}_{}", Ulid::from_datetime(at.into()))
}
