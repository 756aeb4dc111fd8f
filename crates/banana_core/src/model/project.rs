//! Project domain model.
//!
//! A project is the container that owns an ordered set of pages. Only the
//! fields needed to anchor pages and track generation progress live here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Project identifier. Kept as text because callers may supply their own ids.
pub type ProjectId = String;

/// Generation progress of a whole project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Draft,
    OutlineGenerated,
    DescriptionsGenerated,
    Completed,
}

/// Canonical project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// How the project was started (`idea`, `outline`, `descriptions`, ...).
    pub creation_type: String,
    pub idea_prompt: Option<String>,
    pub status: ProjectStatus,
}

impl Project {
    /// Creates a draft project with a generated id.
    pub fn new(creation_type: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), creation_type)
    }

    /// Creates a draft project with a caller-provided id.
    pub fn with_id(id: impl Into<ProjectId>, creation_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            creation_type: creation_type.into(),
            idea_prompt: None,
            status: ProjectStatus::Draft,
        }
    }
}
