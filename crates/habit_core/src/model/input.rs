//! Request-shaped inputs for habit mutations.
//!
//! # Responsibility
//! - Turn loosely typed JSON payloads into typed create/update requests.
//! - Own goal parsing shared by create and update.
//!
//! # Invariants
//! - A payload carrying `toggleDate` is always a toggle, whatever else it holds.
//! - Non-string `title`/`category` values are treated as absent.

use crate::model::habit::{is_valid_goal, HabitValidationError};
use serde_json::Value;

/// Create request: `{ title, goal, category }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewHabit {
    pub title: Option<String>,
    pub goal: Option<Value>,
    pub category: Option<String>,
}

impl NewHabit {
    pub fn new(title: impl Into<String>, goal: impl Into<Value>, category: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            goal: Some(goal.into()),
            category: Some(category.into()),
        }
    }

    /// Reads a create request from a JSON body. Non-object bodies yield an
    /// empty request.
    pub fn from_json(body: &Value) -> Self {
        Self {
            title: string_field(body, "title"),
            goal: body.get("goal").cloned(),
            category: string_field(body, "category"),
        }
    }
}

/// Field edits: every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitPatch {
    pub title: Option<String>,
    pub goal: Option<Value>,
    pub category: Option<String>,
}

impl HabitPatch {
    pub fn from_json(body: &Value) -> Self {
        Self {
            title: string_field(body, "title"),
            goal: body.get("goal").cloned(),
            category: string_field(body, "category"),
        }
    }
}

/// One PUT request: either a date toggle or field edits, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum HabitUpdate {
    /// Raw `toggleDate` value; `None` when it was present but not a string.
    Toggle(Option<String>),
    Fields(HabitPatch),
}

impl HabitUpdate {
    pub fn toggle(date: impl Into<String>) -> Self {
        Self::Toggle(Some(date.into()))
    }

    pub fn from_json(body: &Value) -> Self {
        match body.get("toggleDate") {
            Some(raw) => Self::Toggle(raw.as_str().map(str::to_string)),
            None => Self::Fields(HabitPatch::from_json(body)),
        }
    }
}

/// Parses a goal given as a JSON number or numeric string.
///
/// # Errors
/// - `InvalidGoal` for missing, non-numeric, non-finite, zero or negative
///   values.
pub fn parse_goal(raw: Option<&Value>) -> Result<f64, HabitValidationError> {
    let goal = match raw {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    goal.filter(|goal| is_valid_goal(*goal))
        .ok_or(HabitValidationError::InvalidGoal)
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}
