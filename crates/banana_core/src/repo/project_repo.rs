//! Project repository contracts and SQLite implementation.
//!
//! Projects only anchor pages here; the repository keeps to the handful of
//! calls the page workflows and CLI need.

use crate::model::project::{Project, ProjectId, ProjectStatus};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for project records.
pub trait ProjectRepository {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    fn get_project(&self, id: &str) -> RepoResult<Option<Project>>;
    fn update_project_status(&self, id: &str, status: ProjectStatus) -> RepoResult<()>;
    /// Deletes the project; its pages cascade.
    fn delete_project(&self, id: &str) -> RepoResult<()>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        self.conn.execute(
            "INSERT INTO projects (id, creation_type, idea_prompt, status)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                project.id.as_str(),
                project.creation_type.as_str(),
                project.idea_prompt.as_deref(),
                project_status_to_db(project.status),
            ],
        )?;
        Ok(project.id.clone())
    }

    fn get_project(&self, id: &str) -> RepoResult<Option<Project>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, creation_type, idea_prompt, status
                 FROM projects
                 WHERE id = ?1;",
                [id],
                read_project_columns,
            )
            .optional()?;

        row.map(parse_project).transpose()
    }

    fn update_project_status(&self, id: &str, status: ProjectStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                status = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, project_status_to_db(status)],
        )?;
        if changed == 0 {
            return Err(RepoError::ProjectNotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete_project(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::ProjectNotFound(id.to_string()));
        }
        Ok(())
    }
}

type ProjectColumns = (String, String, Option<String>, String);

fn read_project_columns(row: &Row<'_>) -> rusqlite::Result<ProjectColumns> {
    Ok((
        row.get("id")?,
        row.get("creation_type")?,
        row.get("idea_prompt")?,
        row.get("status")?,
    ))
}

fn parse_project(columns: ProjectColumns) -> RepoResult<Project> {
    let (id, creation_type, idea_prompt, status_text) = columns;
    let status = parse_project_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid project status `{status_text}` in projects.status"
        ))
    })?;
    Ok(Project {
        id,
        creation_type,
        idea_prompt,
        status,
    })
}

fn project_status_to_db(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Draft => "DRAFT",
        ProjectStatus::OutlineGenerated => "OUTLINE_GENERATED",
        ProjectStatus::DescriptionsGenerated => "DESCRIPTIONS_GENERATED",
        ProjectStatus::Completed => "COMPLETED",
    }
}

fn parse_project_status(value: &str) -> Option<ProjectStatus> {
    match value {
        "DRAFT" => Some(ProjectStatus::Draft),
        "OUTLINE_GENERATED" => Some(ProjectStatus::OutlineGenerated),
        "DESCRIPTIONS_GENERATED" => Some(ProjectStatus::DescriptionsGenerated),
        "COMPLETED" => Some(ProjectStatus::Completed),
        _ => None,
    }
}
