use chrono::{Local, NaiveDate, TimeZone};

use fitlog_lib::stats::{
    average_duration, category_stats, consecutive_days, daily_goal_progress, date_stats,
    summarize, week_start_date, week_workouts, workout_stats,
};
use fitlog_lib::{Period, Target, WeekStart, WorkoutRecord};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Records are built newest first, the way the store returns them.
fn record(on: NaiveDate, category: &str, duration: u32) -> WorkoutRecord {
    let timestamp = Local
        .from_local_datetime(&on.and_hms_opt(12, 0, 0).unwrap())
        .earliest()
        .unwrap();
    WorkoutRecord {
        id: format!("record_{on}_{category}_{duration}"),
        exercise_id: "squat".to_string(),
        exercise_name: "深蹲".to_string(),
        category: category.to_string(),
        target: Target::Reps { reps: 20, sets: 3 },
        duration,
        notes: String::new(),
        date: on,
        timestamp,
    }
}

fn on_days(days: &[NaiveDate]) -> Vec<WorkoutRecord> {
    days.iter().map(|d| record(*d, "腿部", 30)).collect()
}

#[test]
fn test_streak_counts_consecutive_days_ending_today() {
    let today = date(2024, 5, 15);
    let records = on_days(&[today, date(2024, 5, 14), date(2024, 5, 13)]);
    assert_eq!(consecutive_days(&records, today), 3);
}

#[test]
fn test_streak_stops_at_first_gap() {
    let today = date(2024, 5, 15);
    let records = on_days(&[today, date(2024, 5, 13), date(2024, 5, 12)]);
    assert_eq!(consecutive_days(&records, today), 1);
}

#[test]
fn test_streak_is_zero_without_a_record_today() {
    let today = date(2024, 5, 15);
    let records = on_days(&[date(2024, 5, 14), date(2024, 5, 13)]);
    assert_eq!(consecutive_days(&records, today), 0);
    assert_eq!(consecutive_days(&[], today), 0);
}

#[test]
fn test_streak_ignores_duplicates_and_order() {
    let today = date(2024, 3, 1);
    // Crosses the end of February in a leap year, with repeated and unordered dates
    let records = on_days(&[
        date(2024, 2, 28),
        today,
        date(2024, 2, 29),
        today,
        date(2024, 2, 29),
        date(2024, 2, 26),
    ]);
    assert_eq!(consecutive_days(&records, today), 3);
}

#[test]
fn test_future_dated_record_breaks_streak() {
    let today = date(2024, 5, 15);
    let records = on_days(&[date(2024, 5, 16), today]);
    assert_eq!(consecutive_days(&records, today), 0);
}

#[test]
fn test_workout_stats_on_empty_history() {
    let stats = workout_stats(&[], date(2024, 5, 15), WeekStart::Sunday);
    assert_eq!(stats.total_workouts, 0);
    assert_eq!(stats.today_workouts, 0);
    assert_eq!(stats.week_workouts, 0);
    assert_eq!(stats.consecutive_days, 0);
    assert_eq!(stats.last_workout_date, None);
}

#[test]
fn test_last_workout_date_is_head_record() {
    let records = on_days(&[date(2024, 5, 10), date(2024, 5, 1)]);
    let stats = workout_stats(&records, date(2024, 5, 15), WeekStart::Sunday);
    assert_eq!(stats.last_workout_date, Some(date(2024, 5, 10)));
}

#[test]
fn test_week_start_date() {
    // 2024-05-15 is a Wednesday
    let wednesday = date(2024, 5, 15);
    assert_eq!(week_start_date(wednesday, WeekStart::Sunday), date(2024, 5, 12));
    assert_eq!(week_start_date(wednesday, WeekStart::Monday), date(2024, 5, 13));

    let sunday = date(2024, 5, 12);
    assert_eq!(week_start_date(sunday, WeekStart::Sunday), sunday);
    assert_eq!(week_start_date(sunday, WeekStart::Monday), date(2024, 5, 6));
}

#[test]
fn test_week_workouts_exclude_future_dates() {
    let today = date(2024, 5, 15);
    let records = on_days(&[date(2024, 5, 17), today, date(2024, 5, 12), date(2024, 5, 11)]);
    assert_eq!(week_workouts(&records, today, WeekStart::Sunday), 2);
}

#[test]
fn test_average_duration_rounds_to_nearest() {
    let day = date(2024, 5, 15);
    assert_eq!(average_duration(&[]), 0);
    let halves = vec![record(day, "核心", 1), record(day, "核心", 2)];
    assert_eq!(average_duration(&halves), 2);
    let below_half = vec![
        record(day, "核心", 10),
        record(day, "核心", 10),
        record(day, "核心", 11),
    ];
    assert_eq!(average_duration(&below_half), 10);
}

#[test]
fn test_breakdowns_keep_first_seen_order() {
    let records = vec![
        record(date(2024, 5, 15), "核心", 60),
        record(date(2024, 5, 15), "腿部", 30),
        record(date(2024, 5, 14), "核心", 45),
        record(date(2024, 5, 12), "有氧", 20),
        record(date(2024, 5, 12), "腿部", 40),
    ];
    assert_eq!(
        category_stats(&records),
        vec![
            ("核心".to_string(), 2),
            ("腿部".to_string(), 2),
            ("有氧".to_string(), 1),
        ]
    );
    assert_eq!(
        date_stats(&records),
        vec![
            (date(2024, 5, 15), 2),
            (date(2024, 5, 14), 1),
            (date(2024, 5, 12), 2),
        ]
    );

    let summary = summarize(&records);
    assert_eq!(summary.total_workouts, 5);
    assert_eq!(summary.total_duration, 195);
    assert_eq!(summary.average_duration, 39);
    assert_eq!(summary.unique_days, 3);
}

#[test]
fn test_daily_goal_progress_is_capped() {
    assert_eq!(daily_goal_progress(0, 3), 0);
    assert_eq!(daily_goal_progress(2, 3), 66);
    assert_eq!(daily_goal_progress(3, 3), 100);
    assert_eq!(daily_goal_progress(7, 3), 100);
    assert_eq!(daily_goal_progress(0, 0), 100);
}

#[test]
fn test_period_ranges() {
    let today = date(2024, 3, 31);
    assert_eq!(Period::Today.range(today), Some((today, today)));
    assert_eq!(Period::Week.range(today), Some((date(2024, 3, 24), today)));
    // Shorter month: clamps to its last day
    assert_eq!(Period::Month.range(today), Some((date(2024, 2, 29), today)));
    assert_eq!(Period::All.range(today), None);
}
