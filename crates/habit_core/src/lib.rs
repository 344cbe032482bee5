//! Core domain logic for the habit tracker.
//! This crate is the single source of truth for habit invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;
pub mod stats;

pub use db::{HabitStore, StoreTarget};
pub use logging::{default_log_level, init_logging, LogLevel, LoggingError};
pub use model::habit::{Habit, HabitId, HabitValidationError};
pub use model::input::{HabitPatch, HabitUpdate, NewHabit};
pub use query::{search_habits, HabitListRequest, Projection, RECENT_HABITS_LIMIT};
pub use repo::habit_repo::{
    HabitChanges, HabitListQuery, HabitRepository, RepoError, RepoResult, SortDirection,
    SqliteHabitRepository,
};
pub use service::habit_service::{HabitService, HabitServiceError, ServiceResult};
pub use stats::{HabitProgress, MonthSummary, TopHabit};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
