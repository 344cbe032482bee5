//! Repository layer: the habit store contract and its SQLite implementation.
//!
//! # Responsibility
//! - Define the single-document operations the service relies on.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Habit::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod habit_repo;
