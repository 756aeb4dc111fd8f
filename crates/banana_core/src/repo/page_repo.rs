//! Page repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `pages` table.
//! - Apply a batch of page updates/inserts/deletes as one unit of work.
//!
//! # Invariants
//! - Project listings are ordered by `order_index ASC` then insertion order.
//! - Outline/description content is stored as JSON text and must parse back
//!   into typed content; unparsable rows are rejected, not masked.
//! - `apply_changes` either commits every write or none of them.

use crate::model::page::{DescriptionContent, OutlineContent, Page, PageId, PageStatus};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

const PAGE_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    order_index,
    part,
    status,
    outline_content,
    description_content,
    generated_image_path
FROM pages";

const PAGE_INSERT_SQL: &str = "INSERT INTO pages (
    id,
    project_id,
    order_index,
    part,
    status,
    outline_content,
    description_content,
    generated_image_path
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);";

const PAGE_UPDATE_SQL: &str = "UPDATE pages
SET
    order_index = ?2,
    part = ?3,
    status = ?4,
    outline_content = ?5,
    description_content = ?6,
    generated_image_path = ?7,
    updated_at = (strftime('%s', 'now') * 1000)
WHERE id = ?1;";

/// Repository interface for page persistence.
pub trait PageRepository {
    /// Inserts one page and returns its stable id.
    fn create_page(&self, page: &Page) -> RepoResult<PageId>;
    /// Overwrites every mutable column of an existing page.
    fn update_page(&self, page: &Page) -> RepoResult<()>;
    /// Hard-deletes one page by id.
    fn delete_page(&self, id: PageId) -> RepoResult<()>;
    fn get_page(&self, id: PageId) -> RepoResult<Option<Page>>;
    /// Lists all pages of one project in their persisted order.
    fn list_pages_for_project(&self, project_id: &str) -> RepoResult<Vec<Page>>;
    fn project_exists(&self, project_id: &str) -> RepoResult<bool>;
    /// Applies deletes, updates and inserts in a single transaction.
    fn apply_changes(
        &mut self,
        updated: &[Page],
        created: &[Page],
        deleted: &[PageId],
    ) -> RepoResult<()>;
}

/// SQLite-backed page repository.
pub struct SqlitePageRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqlitePageRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PageRepository for SqlitePageRepository<'_> {
    fn create_page(&self, page: &Page) -> RepoResult<PageId> {
        insert_page(self.conn, page)
    }

    fn update_page(&self, page: &Page) -> RepoResult<()> {
        update_page(self.conn, page)
    }

    fn delete_page(&self, id: PageId) -> RepoResult<()> {
        delete_page(self.conn, id)
    }

    fn get_page(&self, id: PageId) -> RepoResult<Option<Page>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PAGE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_page_row(row)?));
        }
        Ok(None)
    }

    fn list_pages_for_project(&self, project_id: &str) -> RepoResult<Vec<Page>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PAGE_SELECT_SQL}
             WHERE project_id = ?1
             ORDER BY order_index ASC, seq ASC;"
        ))?;
        let mut rows = stmt.query([project_id])?;
        let mut pages = Vec::new();
        while let Some(row) = rows.next()? {
            pages.push(parse_page_row(row)?);
        }
        Ok(pages)
    }

    fn project_exists(&self, project_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1);",
            [project_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn apply_changes(
        &mut self,
        updated: &[Page],
        created: &[Page],
        deleted: &[PageId],
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        for id in deleted {
            delete_page(&tx, *id)?;
        }
        for page in updated {
            update_page(&tx, page)?;
        }
        for page in created {
            insert_page(&tx, page)?;
        }

        tx.commit()?;
        Ok(())
    }
}

fn insert_page(conn: &Connection, page: &Page) -> RepoResult<PageId> {
    page.validate()?;

    conn.execute(
        PAGE_INSERT_SQL,
        params![
            page.id.to_string(),
            page.project_id.as_str(),
            page.order_index,
            page.part.as_deref(),
            page_status_to_db(page.status),
            encode_content(page.outline_content.as_ref())?,
            encode_content(page.description_content.as_ref())?,
            page.generated_image_path.as_deref(),
        ],
    )?;

    Ok(page.id)
}

fn update_page(conn: &Connection, page: &Page) -> RepoResult<()> {
    page.validate()?;

    let changed = conn.execute(
        PAGE_UPDATE_SQL,
        params![
            page.id.to_string(),
            page.order_index,
            page.part.as_deref(),
            page_status_to_db(page.status),
            encode_content(page.outline_content.as_ref())?,
            encode_content(page.description_content.as_ref())?,
            page.generated_image_path.as_deref(),
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::PageNotFound(page.id));
    }
    Ok(())
}

fn delete_page(conn: &Connection, id: PageId) -> RepoResult<()> {
    let changed = conn.execute("DELETE FROM pages WHERE id = ?1;", [id.to_string()])?;
    if changed == 0 {
        return Err(RepoError::PageNotFound(id));
    }
    Ok(())
}

fn parse_page_row(row: &Row<'_>) -> RepoResult<Page> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{id_text}` in pages.id")))?;

    let status_text: String = row.get("status")?;
    let status = parse_page_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid page status `{status_text}` in pages.status"))
    })?;

    let outline_content: Option<OutlineContent> =
        decode_content(row.get("outline_content")?, "pages.outline_content")?;
    let description_content: Option<DescriptionContent> =
        decode_content(row.get("description_content")?, "pages.description_content")?;

    let page = Page {
        id,
        project_id: row.get("project_id")?,
        order_index: row.get("order_index")?,
        part: row.get("part")?,
        status,
        outline_content,
        description_content,
        generated_image_path: row.get("generated_image_path")?,
    };
    page.validate()?;
    Ok(page)
}

fn encode_content<T: Serialize>(value: Option<&T>) -> RepoResult<Option<String>> {
    value
        .map(|content| {
            serde_json::to_string(content)
                .map_err(|err| RepoError::InvalidData(format!("cannot encode page content: {err}")))
        })
        .transpose()
}

fn decode_content<T: DeserializeOwned>(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<T>> {
    value
        .map(|text| {
            serde_json::from_str(&text)
                .map_err(|err| RepoError::InvalidData(format!("invalid JSON in {column}: {err}")))
        })
        .transpose()
}

fn page_status_to_db(status: PageStatus) -> &'static str {
    match status {
        PageStatus::Draft => "DRAFT",
        PageStatus::DescriptionGenerated => "DESCRIPTION_GENERATED",
        PageStatus::Generating => "GENERATING",
        PageStatus::ImageGenerated => "IMAGE_GENERATED",
        PageStatus::Failed => "FAILED",
        PageStatus::Completed => "COMPLETED",
    }
}

fn parse_page_status(value: &str) -> Option<PageStatus> {
    match value {
        "DRAFT" => Some(PageStatus::Draft),
        "DESCRIPTION_GENERATED" => Some(PageStatus::DescriptionGenerated),
        "GENERATING" => Some(PageStatus::Generating),
        "IMAGE_GENERATED" => Some(PageStatus::ImageGenerated),
        "FAILED" => Some(PageStatus::Failed),
        "COMPLETED" => Some(PageStatus::Completed),
        _ => None,
    }
}
