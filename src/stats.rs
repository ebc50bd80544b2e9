// src/stats.rs
//! Dashboard metrics derived from the workout history.
//!
//! Everything here is a pure function of a record slice and "today"; nothing is cached.
//! Callers pass the full history (newest first) or any filtered subset.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

use crate::models::WorkoutRecord;
use crate::records::filter_by_date_range;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
    pub today_workouts: usize,
    pub week_workouts: usize,
    pub total_workouts: usize,
    pub consecutive_days: u32,
    pub last_workout_date: Option<NaiveDate>,
}

/// Aggregates over a (possibly filtered) set of records.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub total_workouts: usize,
    pub total_duration: u64,
    pub average_duration: u64,
    pub category_stats: Vec<(String, usize)>,
    pub date_stats: Vec<(NaiveDate, usize)>,
    pub unique_days: usize,
}

/// First day of the week containing `today`.
pub fn week_start_date(today: NaiveDate, week_start: WeekStart) -> NaiveDate {
    let offset = match week_start {
        WeekStart::Sunday => today.weekday().num_days_from_sunday(),
        WeekStart::Monday => today.weekday().num_days_from_monday(),
    };
    today - Days::new(u64::from(offset))
}

pub fn today_workouts(records: &[WorkoutRecord], today: NaiveDate) -> usize {
    records.iter().filter(|r| r.date == today).count()
}

pub fn week_workouts(records: &[WorkoutRecord], today: NaiveDate, week_start: WeekStart) -> usize {
    filter_by_date_range(records, week_start_date(today, week_start), today).len()
}

/// Number of consecutive calendar days, ending today, that have at least one record.
///
/// Distinct dates are walked newest first and compared against `today - i`; the first
/// mismatch ends the walk. No record today means a streak of 0.
pub fn consecutive_days(records: &[WorkoutRecord], today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let mut streak = 0u32;
    for (i, date) in dates.iter().enumerate() {
        let expected = today.checked_sub_days(Days::new(i as u64));
        if expected != Some(*date) {
            break;
        }
        streak += 1;
    }
    streak
}

/// Date of the head record. Relies on the store's newest-first order.
pub fn last_workout_date(records: &[WorkoutRecord]) -> Option<NaiveDate> {
    records.first().map(|r| r.date)
}

pub fn workout_stats(
    records: &[WorkoutRecord],
    today: NaiveDate,
    week_start: WeekStart,
) -> WorkoutStats {
    WorkoutStats {
        today_workouts: today_workouts(records, today),
        week_workouts: week_workouts(records, today, week_start),
        total_workouts: records.len(),
        consecutive_days: consecutive_days(records, today),
        last_workout_date: last_workout_date(records),
    }
}

/// Counts per key, in first-seen order.
fn count_in_order<K, F>(records: &[WorkoutRecord], key: F) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    F: Fn(&WorkoutRecord) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();
    for record in records {
        let k = key(record);
        match index.get(&k) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(k.clone(), counts.len());
                counts.push((k, 1));
            }
        }
    }
    counts
}

pub fn category_stats(records: &[WorkoutRecord]) -> Vec<(String, usize)> {
    count_in_order(records, |r| r.category.clone())
}

pub fn date_stats(records: &[WorkoutRecord]) -> Vec<(NaiveDate, usize)> {
    count_in_order(records, |r| r.date)
}

pub fn unique_days(records: &[WorkoutRecord]) -> usize {
    date_stats(records).len()
}

pub fn total_duration(records: &[WorkoutRecord]) -> u64 {
    records.iter().map(|r| u64::from(r.duration)).sum()
}

/// Mean of `duration` rounded to the nearest second (halves round up); 0 for no records.
pub fn average_duration(records: &[WorkoutRecord]) -> u64 {
    let count = records.len() as u64;
    if count == 0 {
        return 0;
    }
    (2 * total_duration(records) + count) / (2 * count)
}

pub fn summarize(records: &[WorkoutRecord]) -> RecordSummary {
    let date_stats = date_stats(records);
    RecordSummary {
        total_workouts: records.len(),
        total_duration: total_duration(records),
        average_duration: average_duration(records),
        category_stats: category_stats(records),
        unique_days: date_stats.len(),
        date_stats,
    }
}

/// Share of the daily goal reached today, as a percentage capped at 100.
pub fn daily_goal_progress(today_workouts: usize, daily_goal: u32) -> u8 {
    if daily_goal == 0 {
        return 100;
    }
    let percent = today_workouts.saturating_mul(100) / daily_goal as usize;
    u8::try_from(percent.min(100)).unwrap_or(100)
}
