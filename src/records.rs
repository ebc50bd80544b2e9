// src/records.rs
use chrono::{Days, Months, NaiveDate};
use std::rc::Rc;
use tracing::{debug, error};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::models::{NewRecordInput, WorkoutRecord};
use crate::storage::{Collection, Storage};

/// Time windows offered by the record history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Today,
    /// The last seven days plus today.
    #[default]
    Week,
    /// One calendar month back from today.
    Month,
    All,
}

impl Period {
    /// Inclusive date bounds for this period, `None` for `All`.
    pub fn range(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = match self {
            Self::Today => today,
            Self::Week => today.checked_sub_days(Days::new(7))?,
            Self::Month => today.checked_sub_months(Months::new(1))?,
            Self::All => return None,
        };
        Some((start, today))
    }
}

/// Keeps records with `start <= date <= end`, preserving order.
pub fn filter_by_date_range(
    records: &[WorkoutRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<WorkoutRecord> {
    records
        .iter()
        .filter(|r| start <= r.date && r.date <= end)
        .cloned()
        .collect()
}

pub fn filter_by_category(records: &[WorkoutRecord], category: &str) -> Vec<WorkoutRecord> {
    records
        .iter()
        .filter(|r| r.category == category)
        .cloned()
        .collect()
}

/// Append-only workout history, newest first.
#[derive(Clone)]
pub struct RecordStore {
    storage: Rc<Storage>,
    clock: Rc<dyn Clock>,
}

impl RecordStore {
    pub fn new(storage: Rc<Storage>, clock: Rc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Stamps `input` with an id, the current instant and its local date, then
    /// prepends it and rewrites the collection.
    /// # Errors
    /// `Error::Persistence` if the existing history can't be read or the rewrite fails.
    /// Unreadable history is never overwritten.
    pub fn append(&self, input: NewRecordInput) -> Result<WorkoutRecord> {
        let mut records: Vec<WorkoutRecord> = self
            .storage
            .try_read(Collection::WorkoutRecords)
            .map_err(|e| {
                error!(error = %e, "Refusing to append over unreadable workout history");
                Error::Persistence(Collection::WorkoutRecords)
            })?
            .unwrap_or_default();

        let record = WorkoutRecord::from_input(input, self.clock.now());
        records.insert(0, record.clone());

        if !self.storage.write(Collection::WorkoutRecords, &records) {
            return Err(Error::Persistence(Collection::WorkoutRecords));
        }
        debug!(id = %record.id, exercise = %record.exercise_id, "Workout record appended");
        Ok(record)
    }

    pub fn all(&self) -> Vec<WorkoutRecord> {
        self.storage.read(Collection::WorkoutRecords)
    }

    pub fn by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<WorkoutRecord> {
        filter_by_date_range(&self.all(), start, end)
    }

    pub fn by_date(&self, date: NaiveDate) -> Vec<WorkoutRecord> {
        self.all().into_iter().filter(|r| r.date == date).collect()
    }

    pub fn today(&self) -> Vec<WorkoutRecord> {
        self.by_date(self.clock.today())
    }

    pub fn by_period(&self, period: Period) -> Vec<WorkoutRecord> {
        match period.range(self.clock.today()) {
            Some((start, end)) => self.by_date_range(start, end),
            None => self.all(),
        }
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}
