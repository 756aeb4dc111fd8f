//! Domain model for projects and their ordered pages.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Provide typed accessors for structured page content.
//!
//! # Invariants
//! - Every page is identified by a stable `PageId` assigned at creation.
//! - A page belongs to exactly one project for its whole lifetime.

pub mod page;
pub mod project;
