//! Habit store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the single-document operations over the `habits` collection:
//!   insert, filtered/sorted find, find-by-id, set-fields, add/remove one
//!   log date, delete-by-id.
//! - Keep SQL details and legacy value coercion inside the storage boundary.
//!
//! # Invariants
//! - Every operation touches exactly one habit and is atomic.
//! - Log add/remove are set operations: adding a present date or removing an
//!   absent one leaves the set unchanged.
//! - Mutations refresh `updated_at`.

use crate::db::DbError;
use crate::model::habit::{
    coerce_legacy_goal, is_iso_date_literal, is_valid_goal, Habit, HabitId, HabitValidationError,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const HABIT_SELECT_SQL: &str = "SELECT
    id,
    title,
    goal,
    category,
    created_at,
    updated_at
FROM habits";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for habit persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(HabitValidationError),
    Db(DbError),
    NotFound(HabitId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted habit data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<HabitValidationError> for RepoError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Creation-time ordering for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parses a `sort` query value: `asc` (any case) is ascending, anything
    /// else, including absence, is descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Query options for listing habits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitListQuery {
    /// Exact, case-sensitive category match.
    pub category: Option<String>,
    pub sort: SortDirection,
}

/// Field values to set on one habit. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitChanges {
    pub title: Option<String>,
    pub goal: Option<f64>,
    pub category: Option<String>,
}

impl HabitChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.goal.is_none() && self.category.is_none()
    }

    fn validate(&self) -> Result<(), HabitValidationError> {
        if self.is_empty() {
            return Err(HabitValidationError::EmptyUpdate);
        }
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(HabitValidationError::MissingTitle);
        }
        if matches!(self.goal, Some(goal) if !is_valid_goal(goal)) {
            return Err(HabitValidationError::InvalidGoal);
        }
        if matches!(&self.category, Some(category) if category.trim().is_empty()) {
            return Err(HabitValidationError::MissingCategory);
        }
        Ok(())
    }
}

/// Store contract for the habit collection.
pub trait HabitRepository {
    fn insert_habit(&self, habit: &Habit) -> RepoResult<HabitId>;
    fn find_habits(&self, query: &HabitListQuery) -> RepoResult<Vec<Habit>>;
    fn find_habit(&self, id: &HabitId) -> RepoResult<Option<Habit>>;
    fn set_fields(
        &self,
        id: &HabitId,
        changes: &HabitChanges,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<()>;
    fn add_log(&self, id: &HabitId, date: &str, updated_at: DateTime<Utc>) -> RepoResult<()>;
    fn remove_log(&self, id: &HabitId, date: &str, updated_at: DateTime<Utc>) -> RepoResult<()>;
    fn delete_habit(&self, id: &HabitId) -> RepoResult<()>;
}

/// SQLite-backed habit repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_habit_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn insert_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO habits (
                id,
                title,
                goal,
                category,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                habit.id.as_str(),
                habit.title.as_str(),
                habit.goal,
                habit.category.as_str(),
                habit.created_at.timestamp_millis(),
                habit.updated_at.timestamp_millis(),
            ],
        )?;
        for date in &habit.logs {
            tx.execute(
                "INSERT OR IGNORE INTO habit_logs (habit_id, log_date) VALUES (?1, ?2);",
                params![habit.id.as_str(), date.as_str()],
            )?;
        }
        tx.commit()?;

        Ok(habit.id.clone())
    }

    fn find_habits(&self, query: &HabitListQuery) -> RepoResult<Vec<Habit>> {
        let mut sql = format!("{HABIT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category) = &query.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.clone()));
        }

        // rowid keeps insertion order for habits created in the same millisecond.
        let direction = query.sort.as_sql();
        sql.push_str(&format!(
            " ORDER BY created_at {direction}, rowid {direction}"
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut habits = Vec::new();

        while let Some(row) = rows.next()? {
            let mut habit = parse_habit_row(row)?;
            habit.logs = load_logs(self.conn, &habit.id)?;
            habits.push(habit);
        }

        Ok(habits)
    }

    fn find_habit(&self, id: &HabitId) -> RepoResult<Option<Habit>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{HABIT_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.as_str()])?;
        if let Some(row) = rows.next()? {
            let mut habit = parse_habit_row(row)?;
            habit.logs = load_logs(self.conn, &habit.id)?;
            return Ok(Some(habit));
        }

        Ok(None)
    }

    fn set_fields(
        &self,
        id: &HabitId,
        changes: &HabitChanges,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<()> {
        changes.validate()?;

        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = &changes.title {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.trim().to_string()));
        }
        if let Some(goal) = changes.goal {
            assignments.push("goal = ?");
            bind_values.push(Value::Real(goal));
        }
        if let Some(category) = &changes.category {
            assignments.push("category = ?");
            bind_values.push(Value::Text(category.trim().to_string()));
        }
        assignments.push("updated_at = ?");
        bind_values.push(Value::Integer(updated_at.timestamp_millis()));
        bind_values.push(Value::Text(id.as_str().to_string()));

        let sql = format!("UPDATE habits SET {} WHERE id = ?;", assignments.join(", "));
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }

        Ok(())
    }

    fn add_log(&self, id: &HabitId, date: &str, updated_at: DateTime<Utc>) -> RepoResult<()> {
        ensure_log_date(date)?;

        let tx = self.conn.unchecked_transaction()?;
        touch_habit(&tx, id, updated_at)?;
        tx.execute(
            "INSERT OR IGNORE INTO habit_logs (habit_id, log_date) VALUES (?1, ?2);",
            params![id.as_str(), date],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn remove_log(&self, id: &HabitId, date: &str, updated_at: DateTime<Utc>) -> RepoResult<()> {
        ensure_log_date(date)?;

        let tx = self.conn.unchecked_transaction()?;
        touch_habit(&tx, id, updated_at)?;
        tx.execute(
            "DELETE FROM habit_logs WHERE habit_id = ?1 AND log_date = ?2;",
            params![id.as_str(), date],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn delete_habit(&self, id: &HabitId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1;", [id.as_str()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }

        Ok(())
    }
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let id_text: String = row.get("id")?;
    let id = HabitId::parse(&id_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid id value `{id_text}` in habits.id"))
    })?;

    let goal = match row.get::<_, Value>("goal")? {
        Value::Integer(value) => value as f64,
        Value::Real(value) => value,
        Value::Text(value) => coerce_legacy_goal(&value),
        Value::Null | Value::Blob(_) => 0.0,
    };

    Ok(Habit {
        id,
        title: row.get("title")?,
        goal,
        category: row.get("category")?,
        logs: BTreeSet::new(),
        created_at: parse_timestamp(row.get("created_at")?, "created_at")?,
        updated_at: parse_timestamp(row.get("updated_at")?, "updated_at")?,
    })
}

fn parse_timestamp(millis: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid timestamp `{millis}` in habits.{column}"))
    })
}

fn load_logs(conn: &Connection, id: &HabitId) -> RepoResult<BTreeSet<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT log_date
         FROM habit_logs
         WHERE habit_id = ?1
         ORDER BY log_date ASC;",
    )?;
    let mut rows = stmt.query([id.as_str()])?;
    let mut logs = BTreeSet::new();
    while let Some(row) = rows.next()? {
        logs.insert(row.get::<_, String>(0)?);
    }
    Ok(logs)
}

fn touch_habit(conn: &Connection, id: &HabitId, updated_at: DateTime<Utc>) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE habits SET updated_at = ?1 WHERE id = ?2;",
        params![updated_at.timestamp_millis(), id.as_str()],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(id.clone()));
    }
    Ok(())
}

fn ensure_log_date(date: &str) -> RepoResult<()> {
    if is_iso_date_literal(date) {
        Ok(())
    } else {
        Err(RepoError::Validation(HabitValidationError::InvalidDate(
            date.to_string(),
        )))
    }
}

fn ensure_habit_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in ["habits", "habit_logs"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
