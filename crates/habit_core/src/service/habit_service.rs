//! Habit use-case service.
//!
//! # Responsibility
//! - Provide list/get/create/update/toggle/delete entry points.
//! - Reject malformed ids and invalid input before touching storage.
//! - Return the stored habit, read back after every mutation.
//!
//! # Invariants
//! - A toggle request never applies field edits.
//! - Blank `title`/`category` in an update are ignored, not rejected.
//! - Service layer remains storage-agnostic.

use crate::db::DbError;
use crate::model::habit::{is_iso_date_literal, Habit, HabitId, HabitValidationError};
use crate::model::input::{parse_goal, HabitPatch, HabitUpdate, NewHabit};
use crate::repo::habit_repo::{HabitChanges, HabitListQuery, HabitRepository, RepoError};
use chrono::Utc;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, HabitServiceError>;

/// Service error for habit use-cases.
#[derive(Debug)]
pub enum HabitServiceError {
    /// Missing or malformed input.
    Validation(HabitValidationError),
    /// Identifier is not 24 lowercase hex characters.
    InvalidId(String),
    /// No habit has this id.
    NotFound(HabitId),
    /// Store failure, including use before the store is connected.
    Store(RepoError),
}

impl Display for HabitServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidId(raw) => write!(f, "invalid id: `{raw}`"),
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HabitServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::InvalidId(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<HabitValidationError> for HabitServiceError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for HabitServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

impl From<DbError> for HabitServiceError {
    fn from(value: DbError) -> Self {
        Self::Store(RepoError::Db(value))
    }
}

/// Habit service facade over repository implementations.
pub struct HabitService<R: HabitRepository> {
    repo: R,
}

impl<R: HabitRepository> HabitService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists habits matching `query`.
    pub fn list(&self, query: &HabitListQuery) -> ServiceResult<Vec<Habit>> {
        Ok(self.repo.find_habits(query)?)
    }

    /// Gets one habit by raw id.
    pub fn get(&self, raw_id: &str) -> ServiceResult<Habit> {
        let id = parse_id(raw_id)?;
        self.read_back(&id)
    }

    /// Creates a habit with empty logs.
    ///
    /// # Errors
    /// - `Validation` for a blank title, a goal that is not a finite
    ///   positive number, or a blank category (checked in that order).
    pub fn create(&self, input: &NewHabit) -> ServiceResult<Habit> {
        let title = non_blank(input.title.as_deref()).ok_or(HabitValidationError::MissingTitle)?;
        let goal = parse_goal(input.goal.as_ref())?;
        let category =
            non_blank(input.category.as_deref()).ok_or(HabitValidationError::MissingCategory)?;

        let habit = Habit::new(title, goal, category, Utc::now());
        let id = self.repo.insert_habit(&habit)?;
        info!("event=habit_create module=service status=ok id={id}");

        self.read_back(&id)
    }

    /// Applies one PUT request: a toggle when `toggleDate` was present,
    /// field edits otherwise.
    pub fn update(&self, raw_id: &str, update: &HabitUpdate) -> ServiceResult<Habit> {
        match update {
            HabitUpdate::Toggle(date) => self.toggle_date(raw_id, date.as_deref()),
            HabitUpdate::Fields(patch) => self.update_fields(raw_id, patch),
        }
    }

    /// Sets the provided non-blank fields and refreshes `updatedAt`.
    ///
    /// # Errors
    /// - `InvalidId` for a malformed id.
    /// - `Validation` for an invalid goal, or when nothing is left to set.
    /// - `NotFound` when no habit matches.
    pub fn update_fields(&self, raw_id: &str, patch: &HabitPatch) -> ServiceResult<Habit> {
        let id = parse_id(raw_id)?;

        let mut changes = HabitChanges {
            title: non_blank(patch.title.as_deref()).map(str::to_string),
            category: non_blank(patch.category.as_deref()).map(str::to_string),
            goal: None,
        };
        if let Some(raw_goal) = &patch.goal {
            changes.goal = Some(parse_goal(Some(raw_goal))?);
        }
        if changes.is_empty() {
            return Err(HabitValidationError::EmptyUpdate.into());
        }

        self.repo.set_fields(&id, &changes, Utc::now())?;
        self.read_back(&id)
    }

    /// Flips completion of one day: removes `date` when logged, adds it
    /// otherwise.
    ///
    /// # Errors
    /// - `InvalidId` for a malformed id.
    /// - `Validation` when the trimmed date is not `YYYY-MM-DD`.
    /// - `NotFound` when no habit matches.
    pub fn toggle_date(&self, raw_id: &str, date: Option<&str>) -> ServiceResult<Habit> {
        let id = parse_id(raw_id)?;
        let date = normalize_toggle_date(date)?;

        let habit = self.read_back(&id)?;
        let now = Utc::now();
        if habit.is_done_on(date) {
            self.repo.remove_log(&id, date, now)?;
        } else {
            self.repo.add_log(&id, date, now)?;
        }

        self.read_back(&id)
    }

    /// Permanently deletes one habit.
    pub fn delete(&self, raw_id: &str) -> ServiceResult<()> {
        let id = parse_id(raw_id)?;
        self.repo.delete_habit(&id)?;
        info!("event=habit_delete module=service status=ok id={id}");
        Ok(())
    }

    fn read_back(&self, id: &HabitId) -> ServiceResult<Habit> {
        self.repo
            .find_habit(id)?
            .ok_or_else(|| HabitServiceError::NotFound(id.clone()))
    }
}

fn parse_id(raw: &str) -> ServiceResult<HabitId> {
    HabitId::parse(raw).ok_or_else(|| HabitServiceError::InvalidId(raw.to_string()))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn normalize_toggle_date(date: Option<&str>) -> Result<&str, HabitValidationError> {
    let raw = date.ok_or_else(|| HabitValidationError::InvalidDate(String::new()))?;
    let trimmed = raw.trim();
    if is_iso_date_literal(trimmed) {
        Ok(trimmed)
    } else {
        Err(HabitValidationError::InvalidDate(raw.to_string()))
    }
}
