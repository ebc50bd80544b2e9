use anyhow::Result;
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use std::rc::Rc;

use fitlog_lib::{
    AppService, CatalogExercise, Config, Error, ExercisePatch, ExerciseType, FixedClock,
    MemoryStore, NewExercise, NewRecordInput, Period, Storage, Target, UserSettings, WeekStart,
};

fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .earliest()
        .expect("valid local time")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Helper function to create a test service with an in-memory store and a controllable clock
fn create_test_service(now: DateTime<Local>) -> (AppService, Rc<FixedClock>) {
    let clock = Rc::new(FixedClock::new(now));
    let service = AppService::new(Storage::in_memory(), clock.clone(), Config::default());
    (service, clock)
}

// Same, but keeps a handle on the backing store so tests can make it fail
fn create_failable_service(now: DateTime<Local>) -> (AppService, Rc<FixedClock>, Rc<MemoryStore>) {
    let clock = Rc::new(FixedClock::new(now));
    let store = Rc::new(MemoryStore::new());
    let service = AppService::new(Storage::new(store.clone()), clock.clone(), Config::default());
    (service, clock, store)
}

fn record_input(exercise_id: &str, category: &str, duration: u32) -> NewRecordInput {
    NewRecordInput {
        exercise_id: exercise_id.to_string(),
        exercise_name: exercise_id.to_uppercase(),
        category: category.to_string(),
        target: Target::Reps { reps: 10, sets: 3 },
        duration,
        notes: String::new(),
    }
}

fn new_exercise(name: &str) -> NewExercise {
    NewExercise {
        name: name.to_string(),
        description: "A custom move".to_string(),
        category: "核心".to_string(),
        target: Target::Reps { reps: 12, sets: 4 },
        ..Default::default()
    }
}

#[test]
fn test_append_then_head_matches_input() -> Result<()> {
    let now = local(2024, 5, 15, 18, 30);
    let (service, _clock) = create_test_service(now);

    service.add_workout_record(record_input("pushup", "胸部", 10))?;
    let input = NewRecordInput {
        exercise_id: "plank".to_string(),
        exercise_name: "平板支撑".to_string(),
        category: "核心".to_string(),
        target: Target::Duration { seconds: 60 },
        duration: 65,
        notes: "felt strong".to_string(),
    };
    let returned = service.add_workout_record(input.clone())?;

    let records = service.get_workout_records();
    assert_eq!(records.len(), 2);
    let head = &records[0];
    assert_eq!(head, &returned);
    assert_eq!(head.exercise_id, input.exercise_id);
    assert_eq!(head.exercise_name, input.exercise_name);
    assert_eq!(head.category, input.category);
    assert_eq!(head.target, input.target);
    assert_eq!(head.duration, input.duration);
    assert_eq!(head.notes, input.notes);
    assert_eq!(head.date, date(2024, 5, 15));
    assert_eq!(head.timestamp, now);
    assert!(head.id.starts_with("record_"));
    assert_eq!(head.reps(), None);
    assert_eq!(head.target_duration(), 60);

    // Newest first
    assert_eq!(records[1].exercise_id, "pushup");
    assert_ne!(records[0].id, records[1].id);
    Ok(())
}

#[test]
fn test_reads_are_idempotent() -> Result<()> {
    let (service, _clock) = create_test_service(local(2024, 5, 15, 9, 0));
    service.add_workout_record(record_input("squat", "腿部", 40))?;
    service.add_workout_record(record_input("squat", "腿部", 42))?;

    assert_eq!(service.get_workout_records(), service.get_workout_records());
    assert_eq!(service.get_workout_stats(), service.get_workout_stats());
    Ok(())
}

#[test]
fn test_streak_over_three_consecutive_days() -> Result<()> {
    let (mut service, clock) = create_test_service(local(2024, 5, 13, 8, 0));

    for _ in 0..3 {
        service.start_workout("pushup")?;
        clock.advance(Duration::seconds(30));
        service.complete_workout()?;
        clock.advance(Duration::days(1));
    }
    // Back to the evening of the third day
    clock.set(local(2024, 5, 15, 20, 0));

    let stats = service.get_workout_stats();
    assert_eq!(stats.consecutive_days, 3);
    assert_eq!(stats.total_workouts, 3);
    assert_eq!(stats.today_workouts, 1);
    assert_eq!(stats.last_workout_date, Some(date(2024, 5, 15)));
    Ok(())
}

#[test]
fn test_streak_broken_by_gap_yesterday() -> Result<()> {
    let (service, clock) = create_test_service(local(2024, 5, 13, 8, 0));
    service.add_workout_record(record_input("squat", "腿部", 30))?;
    clock.set(local(2024, 5, 15, 8, 0));
    service.add_workout_record(record_input("squat", "腿部", 30))?;

    assert_eq!(service.get_workout_stats().consecutive_days, 1);
    Ok(())
}

#[test]
fn test_no_record_today_means_no_streak() -> Result<()> {
    let (service, clock) = create_test_service(local(2024, 5, 10, 8, 0));
    for _ in 0..4 {
        service.add_workout_record(record_input("burpee", "全身", 50))?;
        clock.advance(Duration::days(1));
    }
    // Records on 10..=13, today is the 14th
    let stats = service.get_workout_stats();
    assert_eq!(service.today(), date(2024, 5, 14));
    assert_eq!(stats.consecutive_days, 0);
    assert_eq!(stats.today_workouts, 0);
    assert_eq!(stats.total_workouts, 4);
    assert_eq!(stats.last_workout_date, Some(date(2024, 5, 13)));
    Ok(())
}

#[test]
fn test_same_day_durations_aggregate() -> Result<()> {
    let (service, clock) = create_test_service(local(2024, 5, 15, 7, 0));
    for duration in [30, 45, 60] {
        service.add_workout_record(record_input("plank", "核心", duration))?;
        clock.advance(Duration::minutes(5));
    }

    let stats = service.get_workout_stats();
    assert_eq!(stats.total_workouts, 3);
    assert_eq!(stats.today_workouts, 3);
    assert_eq!(stats.consecutive_days, 1);

    let summary = service.record_summary(Period::All, None);
    assert_eq!(summary.total_workouts, 3);
    assert_eq!(summary.total_duration, 135);
    assert_eq!(summary.average_duration, 45);
    assert_eq!(summary.unique_days, 1);
    assert_eq!(summary.category_stats, vec![("核心".to_string(), 3)]);
    Ok(())
}

#[test]
fn test_date_range_of_single_day_equals_by_date() -> Result<()> {
    let (service, clock) = create_test_service(local(2024, 5, 12, 10, 0));
    for _ in 0..4 {
        service.add_workout_record(record_input("squat", "腿部", 20))?;
        service.add_workout_record(record_input("crunches", "核心", 25))?;
        clock.advance(Duration::days(1));
    }

    for d in [date(2024, 5, 12), date(2024, 5, 14), date(2024, 5, 20)] {
        let by_range = service.get_records_by_date_range(d, d);
        let by_date: Vec<_> = service
            .get_workout_records()
            .into_iter()
            .filter(|r| r.date == d)
            .collect();
        assert_eq!(by_range, by_date);
    }
    assert_eq!(
        service
            .get_records_by_date_range(date(2024, 5, 13), date(2024, 5, 14))
            .len(),
        4
    );
    assert_eq!(service.get_today_records().len(), 0); // clock is on the 16th now
    Ok(())
}

#[test]
fn test_week_workouts_respect_week_start() -> Result<()> {
    // 2024-05-12 is a Sunday, 2024-05-15 a Wednesday
    let (mut service, clock) = create_test_service(local(2024, 5, 11, 9, 0));
    service.add_workout_record(record_input("squat", "腿部", 20))?; // Saturday
    clock.set(local(2024, 5, 12, 9, 0));
    service.add_workout_record(record_input("squat", "腿部", 20))?; // Sunday
    clock.set(local(2024, 5, 15, 9, 0));
    service.add_workout_record(record_input("squat", "腿部", 20))?; // Wednesday

    assert_eq!(service.get_workout_stats().week_workouts, 2);

    service.config.week_start = WeekStart::Monday;
    assert_eq!(service.get_workout_stats().week_workouts, 1);
    Ok(())
}

#[test]
fn test_delete_unknown_exercise_leaves_collection_unchanged() -> Result<()> {
    let (service, _clock) = create_test_service(local(2024, 5, 15, 9, 0));
    service.add_user_exercise(new_exercise("Hollow Hold"))?;
    let before = service.get_user_exercises();

    assert!(!service.delete_user_exercise("user_does_not_exist"));
    assert_eq!(service.get_user_exercises(), before);
    Ok(())
}

#[test]
fn test_second_start_is_rejected() -> Result<()> {
    let (mut service, clock) = create_test_service(local(2024, 5, 15, 9, 0));
    service.start_workout("plank")?;
    clock.advance(Duration::seconds(10));

    let result = service.start_workout("squat");
    assert!(matches!(result, Err(Error::InvalidStateTransition(_))));

    let active = service.active_session().expect("original session still active");
    assert_eq!(active.exercise_id, "plank");
    assert_eq!(active.started_at, local(2024, 5, 15, 9, 0));
    Ok(())
}

#[test]
fn test_complete_without_session_is_rejected() {
    let (mut service, _clock) = create_test_service(local(2024, 5, 15, 9, 0));
    let result = service.complete_workout();
    assert!(matches!(result, Err(Error::InvalidStateTransition(_))));
    assert!(service.get_workout_records().is_empty());
}

#[test]
fn test_start_unknown_exercise_is_not_found() {
    let (mut service, _clock) = create_test_service(local(2024, 5, 15, 9, 0));
    let result = service.start_workout("moonwalk");
    assert_eq!(result.err(), Some(Error::NotFound("moonwalk".to_string())));
    assert!(service.active_session().is_none());
}

#[test]
fn test_complete_workout_records_elapsed_time() -> Result<()> {
    let start = local(2024, 5, 15, 9, 0);
    let (mut service, clock) = create_test_service(start);

    service.start_workout("plank")?;
    clock.advance(Duration::milliseconds(90_600));
    let record = service.complete_workout()?;

    assert_eq!(record.duration, 91);
    assert_eq!(record.exercise_id, "plank");
    assert_eq!(record.exercise_name, "平板支撑");
    assert_eq!(record.category, "核心");
    assert_eq!(record.target, Target::Duration { seconds: 60 });
    assert_eq!(record.notes, "Completed in 91s");
    assert_eq!(record.timestamp, start + Duration::milliseconds(90_600));
    assert!(service.active_session().is_none());

    // Idle again, so a new session may start
    service.start_workout("squat")?;
    Ok(())
}

#[test]
fn test_failed_append_keeps_session_active() -> Result<()> {
    let (mut service, clock, store) = create_failable_service(local(2024, 5, 15, 9, 0));
    service.start_workout("squat")?;
    clock.advance(Duration::seconds(40));

    store.set_failing(true);
    let result = service.complete_workout();
    assert!(matches!(result, Err(Error::Persistence(_))));
    assert!(service.active_session().is_some());

    store.set_failing(false);
    let record = service.complete_workout()?;
    assert_eq!(record.duration, 40);
    assert_eq!(service.get_workout_records().len(), 1);
    Ok(())
}

#[test]
fn test_storage_failure_degrades_gracefully() -> Result<()> {
    let (service, _clock, store) = create_failable_service(local(2024, 5, 15, 9, 0));
    service.add_workout_record(record_input("squat", "腿部", 20))?;
    service.add_user_exercise(new_exercise("Bear Crawl"))?;

    store.set_failing(true);
    assert!(service.get_workout_records().is_empty());
    assert!(service.get_user_exercises().is_empty());
    assert_eq!(service.get_settings(), UserSettings::default());
    assert_eq!(service.get_workout_stats().total_workouts, 0);
    assert!(matches!(
        service.add_workout_record(record_input("squat", "腿部", 20)),
        Err(Error::Persistence(_))
    ));
    assert!(matches!(
        service.add_user_exercise(new_exercise("Another")),
        Err(Error::Persistence(_))
    ));
    assert!(!service.delete_user_exercise("anything"));
    assert!(!service.reset());

    // Nothing was lost while the store was down
    store.set_failing(false);
    assert_eq!(service.get_workout_records().len(), 1);
    assert_eq!(service.get_user_exercises().len(), 1);
    Ok(())
}

#[test]
fn test_create_update_delete_user_exercise() -> Result<()> {
    let (service, clock) = create_test_service(local(2024, 5, 15, 9, 0));
    let created = service.add_user_exercise(new_exercise("  Hollow Hold  "))?;
    assert!(created.id.starts_with("user_"));
    assert_eq!(created.name, "Hollow Hold");
    assert!(created.is_custom);
    assert_eq!(created.kind, ExerciseType::Custom);
    assert_eq!(created.created_at, local(2024, 5, 15, 9, 0));
    assert_eq!(created.updated_at, None);

    clock.advance(Duration::hours(1));
    let patch = ExercisePatch {
        name: Some("Hollow Body Hold".to_string()),
        target: Some(Target::Duration { seconds: 45 }),
        notes: Some("keep lower back down".to_string()),
        ..Default::default()
    };
    assert!(service.update_user_exercise(&created.id, patch));

    let stored = service.get_user_exercises();
    assert_eq!(stored.len(), 1);
    let updated = &stored[0];
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Hollow Body Hold");
    assert_eq!(updated.description, created.description); // untouched
    assert_eq!(updated.target, Target::Duration { seconds: 45 });
    assert_eq!(updated.notes.as_deref(), Some("keep lower back down"));
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.updated_at, Some(local(2024, 5, 15, 10, 0)));

    assert!(service.delete_user_exercise(&created.id));
    assert!(service.get_user_exercises().is_empty());
    assert!(service.find_exercise(&created.id).is_none());
    Ok(())
}

#[test]
fn test_update_unknown_or_invalid_returns_false() -> Result<()> {
    let (service, _clock) = create_test_service(local(2024, 5, 15, 9, 0));
    let created = service.add_user_exercise(new_exercise("Dead Bug"))?;

    let rename = ExercisePatch {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    assert!(!service.update_user_exercise("user_missing", rename));

    let blank = ExercisePatch {
        name: Some("   ".to_string()),
        ..Default::default()
    };
    assert!(!service.update_user_exercise(&created.id, blank));

    let zero = ExercisePatch {
        target: Some(Target::Reps { reps: 0, sets: 3 }),
        ..Default::default()
    };
    assert!(!service.update_user_exercise(&created.id, zero));

    assert_eq!(service.get_user_exercises(), vec![created]);
    Ok(())
}

#[test]
fn test_create_rejects_invalid_input() {
    let (service, _clock) = create_test_service(local(2024, 5, 15, 9, 0));
    assert!(matches!(
        service.add_user_exercise(new_exercise("   ")),
        Err(Error::InvalidInput(_))
    ));
    let zero_target = NewExercise {
        target: Target::Duration { seconds: 0 },
        ..new_exercise("Wall Sit Variant")
    };
    assert!(matches!(
        service.add_user_exercise(zero_target),
        Err(Error::InvalidInput(_))
    ));
    assert!(service.get_user_exercises().is_empty());
}

#[test]
fn test_catalog_lists_builtins_first() -> Result<()> {
    let (service, clock) = create_test_service(local(2024, 5, 15, 9, 0));
    let first = service.add_user_exercise(new_exercise("Alpha"))?;
    clock.advance(Duration::seconds(1));
    let second = service.add_user_exercise(new_exercise("Beta"))?;

    let all = service.list_exercises();
    assert_eq!(all.len(), fitlog_lib::BUILTIN_EXERCISES.len() + 2);
    assert_eq!(all[0].id(), "pushup");
    assert_eq!(all[10].id(), "russian_twist");
    assert!(all[..11].iter().all(|ex| !ex.is_custom()));
    assert_eq!(all[11].id(), first.id);
    assert_eq!(all[12].id(), second.id);

    let plank = service.find_exercise("plank").expect("built-in plank");
    assert_eq!(plank.target(), Target::Duration { seconds: 60 });
    assert_eq!(plank.kind(), ExerciseType::Core);
    assert_eq!(plank.instructions().len(), 4);
    assert!(matches!(
        service.find_exercise(&second.id),
        Some(CatalogExercise::Custom(ex)) if ex.name == "Beta"
    ));
    Ok(())
}

#[test]
fn test_catalog_search_and_categories() -> Result<()> {
    let (service, _clock) = create_test_service(local(2024, 5, 15, 9, 0));
    service.add_user_exercise(NewExercise {
        name: "Farmer Carry".to_string(),
        category: "手臂".to_string(),
        ..Default::default()
    })?;

    let core: Vec<_> = service
        .search_exercises("", Some("核心"))
        .iter()
        .map(|ex| ex.id().to_string())
        .collect();
    assert_eq!(core, vec!["plank", "leg_raises", "crunches", "russian_twist"]);

    let burpee = service.search_exercises("burpee", None);
    assert_eq!(burpee.len(), 1);
    assert_eq!(burpee[0].id(), "burpee");

    // Description match
    assert_eq!(service.search_exercises("心肺", None).len(), 1);
    assert_eq!(service.search_exercises("farmer", Some("手臂")).len(), 1);
    assert!(service.search_exercises("farmer", Some("核心")).is_empty());

    let categories = service.exercise_categories();
    assert_eq!(
        categories,
        vec!["胸部", "腿部", "核心", "有氧", "全身", "手臂"]
    );
    Ok(())
}

#[test]
fn test_clone_builtin_exercise() -> Result<()> {
    let (service, _clock) = create_test_service(local(2024, 5, 15, 9, 0));
    let cloned = service.clone_builtin_exercise("wall_sit", ExercisePatch::default())?;
    assert_eq!(cloned.kind, ExerciseType::FromLibrary);
    assert_eq!(cloned.original_id.as_deref(), Some("wall_sit"));
    assert_eq!(cloned.name, "靠墙静蹲");
    assert_eq!(cloned.target, Target::Duration { seconds: 45 });

    let custom_name = ExercisePatch {
        name: Some("Long wall sit".to_string()),
        target: Some(Target::Duration { seconds: 90 }),
        ..Default::default()
    };
    let second = service.clone_builtin_exercise("wall_sit", custom_name)?;
    assert_eq!(second.name, "Long wall sit");
    assert_eq!(second.target, Target::Duration { seconds: 90 });

    let missing = service.clone_builtin_exercise("moonwalk", ExercisePatch::default());
    assert_eq!(missing.err(), Some(Error::NotFound("moonwalk".to_string())));
    Ok(())
}

#[test]
fn test_history_survives_exercise_edits_and_deletes() -> Result<()> {
    let (mut service, clock) = create_test_service(local(2024, 5, 15, 9, 0));
    let exercise = service.add_user_exercise(new_exercise("Hollow Hold"))?;

    service.start_workout(&exercise.id)?;
    clock.advance(Duration::seconds(20));
    service.complete_workout()?;

    let patch = ExercisePatch {
        name: Some("Renamed".to_string()),
        category: Some("全身".to_string()),
        ..Default::default()
    };
    assert!(service.update_user_exercise(&exercise.id, patch));
    assert!(service.delete_user_exercise(&exercise.id));

    let records = service.get_workout_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].exercise_id, exercise.id);
    assert_eq!(records[0].exercise_name, "Hollow Hold");
    assert_eq!(records[0].category, "核心");
    assert_eq!(records[0].target, Target::Reps { reps: 12, sets: 4 });
    Ok(())
}

#[test]
fn test_filtered_records_and_summary() -> Result<()> {
    let (service, clock) = create_test_service(local(2024, 4, 1, 9, 0));
    service.add_workout_record(record_input("squat", "腿部", 100))?; // more than a month back
    clock.set(local(2024, 5, 3, 9, 0));
    service.add_workout_record(record_input("plank", "核心", 60))?;
    clock.set(local(2024, 5, 12, 9, 0));
    service.add_workout_record(record_input("squat", "腿部", 30))?;
    clock.set(local(2024, 5, 15, 9, 0));
    service.add_workout_record(record_input("plank", "核心", 45))?;
    service.add_workout_record(record_input("squat", "腿部", 50))?;

    assert_eq!(service.filtered_records(Period::Today, None).len(), 2);
    assert_eq!(service.filtered_records(Period::Week, None).len(), 3);
    assert_eq!(service.filtered_records(Period::Month, None).len(), 4);
    assert_eq!(service.filtered_records(Period::All, None).len(), 5);
    assert_eq!(service.filtered_records(Period::All, Some("核心")).len(), 2);

    let week = service.record_summary(Period::Week, Some("腿部"));
    assert_eq!(week.total_workouts, 2);
    assert_eq!(week.total_duration, 80);
    assert_eq!(week.average_duration, 40);
    assert_eq!(
        week.date_stats,
        vec![(date(2024, 5, 15), 1), (date(2024, 5, 12), 1)]
    );

    let all = service.record_summary(Period::All, None);
    // First-seen order over the newest-first history
    assert_eq!(
        all.category_stats,
        vec![("腿部".to_string(), 3), ("核心".to_string(), 2)]
    );
    assert_eq!(all.unique_days, 4);
    assert_eq!(service.record_categories(), vec!["腿部", "核心"]);

    let empty = service.record_summary(Period::Today, Some("有氧"));
    assert_eq!(empty.total_workouts, 0);
    assert_eq!(empty.average_duration, 0);
    Ok(())
}

#[test]
fn test_settings_defaults_and_updates() -> Result<()> {
    let (service, _clock) = create_test_service(local(2024, 5, 15, 9, 0));
    let defaults = service.get_settings();
    assert_eq!(defaults.daily_goal, 3);
    assert!(defaults.reminder_enabled);
    assert_eq!(defaults.reminder_time, "08:00");

    let settings = UserSettings {
        daily_goal: 5,
        reminder_enabled: false,
        reminder_time: "19:30".to_string(),
    };
    service.save_settings(&settings)?;
    assert_eq!(service.get_settings(), settings);

    let bad = UserSettings {
        reminder_time: "7pm".to_string(),
        ..settings.clone()
    };
    assert!(matches!(
        service.save_settings(&bad),
        Err(Error::InvalidInput(_))
    ));
    assert_eq!(service.get_settings(), settings);
    Ok(())
}

#[test]
fn test_daily_goal_progress() -> Result<()> {
    let (service, _clock) = create_test_service(local(2024, 5, 15, 9, 0));
    assert_eq!(service.daily_goal_progress(), 0);
    service.add_workout_record(record_input("squat", "腿部", 20))?;
    assert_eq!(service.daily_goal_progress(), 33);
    service.add_workout_record(record_input("squat", "腿部", 20))?;
    service.add_workout_record(record_input("squat", "腿部", 20))?;
    service.add_workout_record(record_input("squat", "腿部", 20))?;
    assert_eq!(service.daily_goal_progress(), 100);
    Ok(())
}

#[test]
fn test_reset_clears_all_collections() -> Result<()> {
    let (service, _clock) = create_test_service(local(2024, 5, 15, 9, 0));
    service.add_workout_record(record_input("squat", "腿部", 20))?;
    service.add_user_exercise(new_exercise("Hollow Hold"))?;
    service.save_settings(&UserSettings {
        daily_goal: 6,
        ..Default::default()
    })?;

    assert!(service.reset());
    assert!(service.get_workout_records().is_empty());
    assert!(service.get_user_exercises().is_empty());
    assert_eq!(service.get_settings(), UserSettings::default());
    assert_eq!(service.list_exercises().len(), fitlog_lib::BUILTIN_EXERCISES.len());
    Ok(())
}
