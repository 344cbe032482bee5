//! Habit domain record.
//!
//! # Responsibility
//! - Define the canonical habit shape returned to every caller.
//! - Generate and validate store-assigned habit identifiers.
//! - Coerce legacy persisted values into the canonical shape.
//!
//! # Invariants
//! - `HabitId` is exactly 24 lowercase hex characters and never reused.
//! - `goal > 0`; `title` and `category` are non-empty after trimming.
//! - `logs` holds each `YYYY-MM-DD` date at most once.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid iso date regex"));

const HABIT_ID_LEN: usize = 24;

/// Store-assigned habit identifier.
///
/// Layout: 4 bytes of creation seconds followed by 8 random bytes, rendered
/// as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HabitId(String);

impl HabitId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        let seconds = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        let random = Uuid::new_v4();

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..].copy_from_slice(&random.as_bytes()[..8]);

        Self(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Parses a raw identifier, returning `None` when it is not exactly
    /// 24 lowercase hex characters.
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == HABIT_ID_LEN
            && raw
                .bytes()
                .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte));
        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for HabitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HabitId {
    type Error = HabitValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(HabitValidationError::InvalidId(value))
    }
}

impl From<HabitId> for String {
    fn from(value: HabitId) -> Self {
        value.0
    }
}

/// Canonical habit record.
///
/// Serialized with the wire names used by the HTTP API (`_id`,
/// `createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    #[serde(rename = "_id")]
    pub id: HabitId,
    pub title: String,
    pub goal: f64,
    pub category: String,
    /// Completed days as `YYYY-MM-DD`; serialized in ascending order.
    #[serde(default)]
    pub logs: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    /// Creates a habit with a generated id, empty logs and both timestamps
    /// set to `now`.
    ///
    /// Inputs are trimmed but not validated; see `Habit::validate`.
    pub fn new(
        title: impl AsRef<str>,
        goal: f64,
        category: impl AsRef<str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: HabitId::generate(),
            title: title.as_ref().trim().to_string(),
            goal,
            category: category.as_ref().trim().to_string(),
            logs: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the write-side invariants.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.title.trim().is_empty() {
            return Err(HabitValidationError::MissingTitle);
        }
        if !is_valid_goal(self.goal) {
            return Err(HabitValidationError::InvalidGoal);
        }
        if self.category.trim().is_empty() {
            return Err(HabitValidationError::MissingCategory);
        }
        if let Some(bad) = self.logs.iter().find(|log| !is_iso_date_literal(log)) {
            return Err(HabitValidationError::InvalidDate(bad.clone()));
        }
        Ok(())
    }

    /// Returns whether `date` is currently logged as completed.
    pub fn is_done_on(&self, date: &str) -> bool {
        self.logs.contains(date)
    }
}

/// Validation failures for habit input and persisted invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    MissingTitle,
    InvalidGoal,
    MissingCategory,
    /// A toggle or log date is not a `YYYY-MM-DD` literal.
    InvalidDate(String),
    /// An update request carried nothing to apply.
    EmptyUpdate,
    InvalidId(String),
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "missing title"),
            Self::InvalidGoal => write!(f, "goal must be a positive number"),
            Self::MissingCategory => write!(f, "missing category"),
            Self::InvalidDate(_) => write!(f, "toggleDate must be YYYY-MM-DD"),
            Self::EmptyUpdate => write!(f, "provide fields or toggleDate"),
            Self::InvalidId(_) => write!(f, "invalid id"),
        }
    }
}

impl Error for HabitValidationError {}

/// Returns whether `value` matches the strict `YYYY-MM-DD` shape.
///
/// Only the shape is checked; `2024-13-40` passes.
pub fn is_iso_date_literal(value: &str) -> bool {
    ISO_DATE_RE.is_match(value)
}

/// Returns whether `goal` is a finite, strictly positive number.
pub fn is_valid_goal(goal: f64) -> bool {
    goal.is_finite() && goal > 0.0
}

/// Compatibility shim for goals persisted as text by older clients.
///
/// Parses the trimmed text as a number and falls back to `0` when that
/// fails or yields a non-finite value.
pub fn coerce_legacy_goal(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|goal| goal.is_finite())
        .unwrap_or(0.0)
}
