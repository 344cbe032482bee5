//! Habit domain model.
//!
//! # Responsibility
//! - Define the canonical habit record and its identifier.
//! - Own input validation for create/update/toggle payloads.
//!
//! # Invariants
//! - Every habit is identified by a stable 24-hex-character `HabitId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod habit;
pub mod input;
