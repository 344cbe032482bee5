//! Request-shaped list queries, field projection and title search.
//!
//! # Responsibility
//! - Turn raw `category`/`sort`/`fields` parameters into a list query.
//! - Reduce serialized habits to a requested field set.
//! - Provide the case-insensitive title search used by the search view.
//!
//! # Invariants
//! - `_id` survives every projection.
//! - Category filtering happens in the store, before sort and projection.

use crate::model::habit::Habit;
use crate::repo::habit_repo::{HabitListQuery, SortDirection};
use serde_json::{Map, Value};

/// Number of habits shown when the search box is empty.
pub const RECENT_HABITS_LIMIT: usize = 6;

const ID_FIELD: &str = "_id";

/// Field allow-list for list responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Parses a comma separated `fields` parameter.
    ///
    /// Returns `None` when the parameter is absent or names no field.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let mut fields: Vec<String> = Vec::new();
        for field in raw?.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            if !fields.iter().any(|known| known == field) {
                fields.push(field.to_string());
            }
        }
        if fields.is_empty() {
            return None;
        }
        Some(Self { fields })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn keeps(&self, key: &str) -> bool {
        key == ID_FIELD || self.fields.iter().any(|field| field == key)
    }

    /// Serializes `habit` keeping only `_id` and the allowed fields.
    /// Unknown field names are ignored.
    pub fn apply(&self, habit: &Habit) -> serde_json::Result<Value> {
        let Value::Object(object) = serde_json::to_value(habit)? else {
            return Ok(Value::Object(Map::new()));
        };
        let projected: Map<String, Value> = object
            .into_iter()
            .filter(|(key, _)| self.keeps(key))
            .collect();
        Ok(Value::Object(projected))
    }
}

/// Parsed `GET /api/habits` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitListRequest {
    pub query: HabitListQuery,
    pub projection: Option<Projection>,
}

impl HabitListRequest {
    /// Builds a request from raw query parameters. An empty category means
    /// no filter; the category is matched verbatim otherwise.
    pub fn from_params(category: Option<&str>, sort: Option<&str>, fields: Option<&str>) -> Self {
        Self {
            query: HabitListQuery {
                category: category
                    .filter(|category| !category.is_empty())
                    .map(str::to_string),
                sort: SortDirection::parse(sort),
            },
            projection: Projection::parse(fields),
        }
    }

    /// Renders `habits` as JSON, projected when a field list was given.
    pub fn render(&self, habits: &[Habit]) -> serde_json::Result<Vec<Value>> {
        habits
            .iter()
            .map(|habit| match &self.projection {
                Some(projection) => projection.apply(habit),
                None => serde_json::to_value(habit),
            })
            .collect()
    }
}

/// Filters `habits` by a case-insensitive title substring.
///
/// An empty or blank query returns the first `recent_limit` habits, which
/// are the most recent ones when `habits` is sorted newest first.
pub fn search_habits<'a>(habits: &'a [Habit], query: &str, recent_limit: usize) -> Vec<&'a Habit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return habits.iter().take(recent_limit).collect();
    }
    habits
        .iter()
        .filter(|habit| habit.title.to_lowercase().contains(&needle))
        .collect()
}
