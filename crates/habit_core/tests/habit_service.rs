use habit_core::db::open_db_in_memory;
use habit_core::stats::{monthly_percent, streak};
use habit_core::{
    Habit, HabitListQuery, HabitPatch, HabitRepository, HabitService, HabitServiceError,
    HabitUpdate, HabitValidationError, NewHabit, RepoResult, SqliteHabitRepository,
};
use rusqlite::Connection;
use serde_json::json;
use std::cell::Cell;

fn service(conn: &Connection) -> HabitService<SqliteHabitRepository<'_>> {
    HabitService::new(SqliteHabitRepository::try_new(conn).unwrap())
}

fn create_read(svc: &HabitService<SqliteHabitRepository<'_>>) -> Habit {
    svc.create(&NewHabit::new("Read", 20, "Mind")).unwrap()
}

#[test]
fn create_then_get_returns_exact_values() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let created = svc
        .create(&NewHabit::new("  Drink water ", json!("8"), " Health "))
        .unwrap();
    let loaded = svc.get(created.id.as_str()).unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.title, "Drink water");
    assert_eq!(loaded.goal, 8.0);
    assert_eq!(loaded.category, "Health");
    assert!(loaded.logs.is_empty());
    assert_eq!(loaded.created_at, loaded.updated_at);
}

#[test]
fn create_rejects_invalid_input() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    for goal in [json!(0), json!(-1), json!("abc")] {
        let err = svc.create(&NewHabit::new("Read", goal, "Mind")).unwrap_err();
        assert!(matches!(
            err,
            HabitServiceError::Validation(HabitValidationError::InvalidGoal)
        ));
    }

    let err = svc.create(&NewHabit::new("   ", 1, "Mind")).unwrap_err();
    assert!(matches!(
        err,
        HabitServiceError::Validation(HabitValidationError::MissingTitle)
    ));

    let err = svc.create(&NewHabit::new("Read", 1, "")).unwrap_err();
    assert!(matches!(
        err,
        HabitServiceError::Validation(HabitValidationError::MissingCategory)
    ));

    let err = svc.create(&NewHabit::default()).unwrap_err();
    assert!(matches!(
        err,
        HabitServiceError::Validation(HabitValidationError::MissingTitle)
    ));

    assert!(svc.list(&HabitListQuery::default()).unwrap().is_empty());
}

#[test]
fn toggle_twice_restores_logs() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let habit = create_read(&svc);

    let once = svc.toggle_date(habit.id.as_str(), Some("2024-03-10")).unwrap();
    assert!(once.logs.contains("2024-03-10"));
    assert!(once.updated_at >= habit.updated_at);

    let twice = svc.toggle_date(habit.id.as_str(), Some("2024-03-10")).unwrap();
    assert_eq!(twice.logs, habit.logs);
}

#[test]
fn toggle_takes_precedence_over_field_edits() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let habit = create_read(&svc);

    let body = json!({ "toggleDate": "2024-03-10", "title": "Changed" });
    let updated = svc
        .update(habit.id.as_str(), &HabitUpdate::from_json(&body))
        .unwrap();
    assert_eq!(updated.title, "Read");
    assert!(updated.logs.contains("2024-03-10"));
}

#[test]
fn toggle_validates_date_then_existence() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let habit = create_read(&svc);

    let err = svc.toggle_date(habit.id.as_str(), Some("03/10/2024")).unwrap_err();
    assert!(matches!(
        err,
        HabitServiceError::Validation(HabitValidationError::InvalidDate(_))
    ));

    let err = svc.toggle_date(habit.id.as_str(), None).unwrap_err();
    assert!(matches!(err, HabitServiceError::Validation(_)));

    let err = svc
        .update(habit.id.as_str(), &HabitUpdate::toggle("٢٠٢٤-٠١-٠١"))
        .unwrap_err();
    assert!(matches!(
        err,
        HabitServiceError::Validation(HabitValidationError::InvalidDate(_))
    ));
    assert!(svc.get(habit.id.as_str()).unwrap().logs.is_empty());

    svc.delete(habit.id.as_str()).unwrap();
    let err = svc.toggle_date(habit.id.as_str(), Some("2024-03-10")).unwrap_err();
    assert!(matches!(err, HabitServiceError::NotFound(_)));
}

#[test]
fn toggled_month_feeds_statistics() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let habit = create_read(&svc);

    let mut latest = habit;
    for day in ["2024-01-30", "2024-01-31", "2024-02-01"] {
        latest = svc.toggle_date(latest.id.as_str(), Some(day)).unwrap();
    }
    assert_eq!(streak(&latest.logs), 3);
    assert_eq!(monthly_percent(&latest.logs, 2024, 1, 31), 6);
}

#[test]
fn update_applies_non_blank_fields() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let habit = create_read(&svc);

    let patch = HabitPatch {
        title: Some("  ".to_string()),
        goal: Some(json!(30)),
        category: Some(" Study ".to_string()),
    };
    let updated = svc.update_fields(habit.id.as_str(), &patch).unwrap();
    assert_eq!(updated.title, "Read");
    assert_eq!(updated.goal, 30.0);
    assert_eq!(updated.category, "Study");
    assert!(updated.updated_at >= habit.updated_at);
    assert_eq!(updated.created_at, habit.created_at);
}

#[test]
fn update_with_all_blank_payload_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let habit = create_read(&svc);

    let body = json!({ "title": "", "category": "" });
    let err = svc
        .update(habit.id.as_str(), &HabitUpdate::from_json(&body))
        .unwrap_err();
    assert!(matches!(
        err,
        HabitServiceError::Validation(HabitValidationError::EmptyUpdate)
    ));
}

#[test]
fn update_rejects_invalid_goal_and_missing_habit() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let habit = create_read(&svc);

    let patch = HabitPatch {
        goal: Some(json!(-3)),
        ..HabitPatch::default()
    };
    let err = svc.update_fields(habit.id.as_str(), &patch).unwrap_err();
    assert!(matches!(
        err,
        HabitServiceError::Validation(HabitValidationError::InvalidGoal)
    ));

    let patch = HabitPatch {
        title: Some("Write".to_string()),
        ..HabitPatch::default()
    };
    let err = svc
        .update_fields("65a1b2c3d4e5f60718293a4b", &patch)
        .unwrap_err();
    assert!(matches!(err, HabitServiceError::NotFound(_)));
}

#[test]
fn delete_then_get_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let habit = create_read(&svc);

    svc.delete(habit.id.as_str()).unwrap();
    let err = svc.get(habit.id.as_str()).unwrap_err();
    assert!(matches!(err, HabitServiceError::NotFound(id) if id == habit.id));

    let err = svc.delete(habit.id.as_str()).unwrap_err();
    assert!(matches!(err, HabitServiceError::NotFound(_)));
}

/// Repository double that counts every store call.
struct CountingRepository<'a> {
    calls: &'a Cell<u32>,
}

impl CountingRepository<'_> {
    fn touch<T>(&self) -> RepoResult<T> {
        self.calls.set(self.calls.get() + 1);
        Err(habit_core::RepoError::InvalidData("store reached".to_string()))
    }
}

impl HabitRepository for CountingRepository<'_> {
    fn insert_habit(&self, _: &Habit) -> RepoResult<habit_core::HabitId> {
        self.touch()
    }
    fn find_habits(&self, _: &HabitListQuery) -> RepoResult<Vec<Habit>> {
        self.touch()
    }
    fn find_habit(&self, _: &habit_core::HabitId) -> RepoResult<Option<Habit>> {
        self.touch()
    }
    fn set_fields(
        &self,
        _: &habit_core::HabitId,
        _: &habit_core::HabitChanges,
        _: chrono::DateTime<chrono::Utc>,
    ) -> RepoResult<()> {
        self.touch()
    }
    fn add_log(
        &self,
        _: &habit_core::HabitId,
        _: &str,
        _: chrono::DateTime<chrono::Utc>,
    ) -> RepoResult<()> {
        self.touch()
    }
    fn remove_log(
        &self,
        _: &habit_core::HabitId,
        _: &str,
        _: chrono::DateTime<chrono::Utc>,
    ) -> RepoResult<()> {
        self.touch()
    }
    fn delete_habit(&self, _: &habit_core::HabitId) -> RepoResult<()> {
        self.touch()
    }
}

#[test]
fn malformed_id_never_reaches_the_store() {
    let calls = Cell::new(0);
    let svc = HabitService::new(CountingRepository { calls: &calls });

    let err = svc.get("123").unwrap_err();
    assert!(matches!(err, HabitServiceError::InvalidId(raw) if raw == "123"));

    let err = svc
        .update("123", &HabitUpdate::toggle("2024-01-01"))
        .unwrap_err();
    assert!(matches!(err, HabitServiceError::InvalidId(_)));

    let err = svc
        .update_fields(
            "123",
            &HabitPatch {
                title: Some("x".to_string()),
                ..HabitPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, HabitServiceError::InvalidId(_)));

    let err = svc.delete("123").unwrap_err();
    assert!(matches!(err, HabitServiceError::InvalidId(_)));

    let err = svc.create(&NewHabit::new("Read", 0, "Mind")).unwrap_err();
    assert!(matches!(err, HabitServiceError::Validation(_)));
    assert_eq!(calls.get(), 0);

    let err = svc.get("65a1b2c3d4e5f60718293a4b").unwrap_err();
    assert!(matches!(err, HabitServiceError::Store(_)));
    assert_eq!(calls.get(), 1);
}
