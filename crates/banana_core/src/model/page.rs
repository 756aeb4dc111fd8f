//! Page domain model.
//!
//! # Responsibility
//! - Define the page record persisted per project.
//! - Expose outline/description content as typed structured values.
//!
//! # Invariants
//! - `id` is stable and never reused for another page.
//! - `order_index` is the position of the page inside its project.
//! - Outline and description content round-trip through JSON unchanged.

use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable page identifier.
pub type PageId = Uuid;

/// Lifecycle state of one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageStatus {
    /// Outline only; nothing generated yet.
    #[default]
    Draft,
    DescriptionGenerated,
    Generating,
    ImageGenerated,
    Failed,
    Completed,
}

/// Structured outline of one page: a title plus bullet points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineContent {
    pub title: String,
    #[serde(default)]
    pub points: Vec<String>,
}

impl OutlineContent {
    pub fn new(title: impl Into<String>, points: Vec<String>) -> Self {
        Self {
            title: title.into(),
            points,
        }
    }
}

/// Free-text description generated for a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionContent {
    pub text: String,
}

impl DescriptionContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One desired page produced by outline generation.
///
/// Titles are not unique; an empty title is a valid literal value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub points: Vec<String>,
    /// Optional section name the page is grouped under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,
}

impl OutlineEntry {
    pub fn new(title: impl Into<String>, points: Vec<String>) -> Self {
        Self {
            title: title.into(),
            points,
            part: None,
        }
    }

    /// Converts the entry into stored outline content.
    pub fn to_outline(&self) -> OutlineContent {
        OutlineContent::new(self.title.clone(), self.points.clone())
    }
}

/// Validation failure for a page record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageValidationError {
    EmptyProjectId,
    EmptyImagePath,
}

impl Display for PageValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyProjectId => write!(f, "page project_id cannot be empty"),
            Self::EmptyImagePath => {
                write!(f, "page generated_image_path cannot be empty when set")
            }
        }
    }
}

impl Error for PageValidationError {}

/// Canonical page record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub project_id: ProjectId,
    pub order_index: u32,
    pub part: Option<String>,
    pub status: PageStatus,
    pub outline_content: Option<OutlineContent>,
    pub description_content: Option<DescriptionContent>,
    /// Opaque reference to the generated slide image.
    pub generated_image_path: Option<String>,
}

impl Page {
    /// Creates a draft page with a generated stable id and no content.
    pub fn new(project_id: impl Into<ProjectId>, order_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            order_index,
            part: None,
            status: PageStatus::Draft,
            outline_content: None,
            description_content: None,
            generated_image_path: None,
        }
    }

    /// Returns the outline title, or `""` when no outline is set.
    pub fn title(&self) -> &str {
        self.outline_content
            .as_ref()
            .map_or("", |outline| outline.title.as_str())
    }

    pub fn outline_content(&self) -> Option<&OutlineContent> {
        self.outline_content.as_ref()
    }

    pub fn set_outline_content(&mut self, outline: OutlineContent) {
        self.outline_content = Some(outline);
    }

    pub fn description_content(&self) -> Option<&DescriptionContent> {
        self.description_content.as_ref()
    }

    pub fn set_description_content(&mut self, description: DescriptionContent) {
        self.description_content = Some(description);
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), PageValidationError> {
        if self.project_id.trim().is_empty() {
            return Err(PageValidationError::EmptyProjectId);
        }
        if matches!(self.generated_image_path.as_deref(), Some(path) if path.trim().is_empty()) {
            return Err(PageValidationError::EmptyImagePath);
        }
        Ok(())
    }
}
