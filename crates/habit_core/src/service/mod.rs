//! Core use-case services.
//!
//! # Responsibility
//! - Validate and normalize habit requests before any storage call.
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the HTTP layer decoupled from storage details.

pub mod habit_service;
