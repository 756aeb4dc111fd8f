use banana_core::db::open_db_in_memory;
use banana_core::{
    DescriptionContent, OutlineContent, Page, PageRepository, PageStatus, Project,
    ProjectRepository, ProjectStatus, RepoError, SqlitePageRepository, SqliteProjectRepository,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn seed_project(conn: &Connection, id: &str) {
    let repo = SqliteProjectRepository::try_new(conn).unwrap();
    let mut project = Project::with_id(id, "idea");
    project.idea_prompt = Some("test".to_string());
    repo.create_project(&project).unwrap();
}

fn outline_page(project_id: &str, title: &str, order_index: u32) -> Page {
    let mut page = Page::new(project_id, order_index);
    page.set_outline_content(OutlineContent::new(title, vec!["p1".to_string()]));
    page
}

#[test]
fn project_create_get_update_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    seed_project(&conn, "proj");
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    let loaded = repo.get_project("proj").unwrap().unwrap();
    assert_eq!(loaded.creation_type, "idea");
    assert_eq!(loaded.idea_prompt.as_deref(), Some("test"));
    assert_eq!(loaded.status, ProjectStatus::Draft);

    repo.update_project_status("proj", ProjectStatus::OutlineGenerated)
        .unwrap();
    let loaded = repo.get_project("proj").unwrap().unwrap();
    assert_eq!(loaded.status, ProjectStatus::OutlineGenerated);

    assert!(repo.get_project("missing").unwrap().is_none());
    assert!(matches!(
        repo.update_project_status("missing", ProjectStatus::Completed),
        Err(RepoError::ProjectNotFound(id)) if id == "missing"
    ));
}

#[test]
fn page_roundtrip_preserves_structured_content() {
    let mut conn = open_db_in_memory().unwrap();
    seed_project(&conn, "proj");
    let repo = SqlitePageRepository::try_new(&mut conn).unwrap();

    let mut page = outline_page("proj", "Intro", 0);
    page.part = Some("Opening".to_string());
    page.set_description_content(DescriptionContent::new("multi\nline \"quoted\" text"));
    page.generated_image_path = Some("/files/proj/pages/intro.png".to_string());
    page.status = PageStatus::ImageGenerated;
    let id = repo.create_page(&page).unwrap();

    let loaded = repo.get_page(id).unwrap().unwrap();
    assert_eq!(loaded, page);
}

#[test]
fn update_and_delete_missing_page_return_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    seed_project(&conn, "proj");
    let repo = SqlitePageRepository::try_new(&mut conn).unwrap();

    let ghost = outline_page("proj", "Ghost", 0);
    assert!(matches!(
        repo.update_page(&ghost),
        Err(RepoError::PageNotFound(id)) if id == ghost.id
    ));
    let missing = Uuid::new_v4();
    assert!(matches!(
        repo.delete_page(missing),
        Err(RepoError::PageNotFound(id)) if id == missing
    ));
}

#[test]
fn list_pages_orders_by_position_then_insertion() {
    let mut conn = open_db_in_memory().unwrap();
    seed_project(&conn, "proj");
    seed_project(&conn, "other");
    let repo = SqlitePageRepository::try_new(&mut conn).unwrap();

    let third = outline_page("proj", "Third", 2);
    let first = outline_page("proj", "First", 0);
    let tie_a = outline_page("proj", "Tie A", 1);
    let tie_b = outline_page("proj", "Tie B", 1);
    for page in [&third, &first, &tie_a, &tie_b] {
        repo.create_page(page).unwrap();
    }
    repo.create_page(&outline_page("other", "Elsewhere", 0))
        .unwrap();

    let titles: Vec<String> = repo
        .list_pages_for_project("proj")
        .unwrap()
        .iter()
        .map(|page| page.title().to_string())
        .collect();
    assert_eq!(titles, vec!["First", "Tie A", "Tie B", "Third"]);
}

#[test]
fn apply_changes_rolls_back_every_write_on_failure() {
    let mut conn = open_db_in_memory().unwrap();
    seed_project(&conn, "proj");
    let mut repo = SqlitePageRepository::try_new(&mut conn).unwrap();

    let kept = outline_page("proj", "Kept", 0);
    let doomed = outline_page("proj", "Doomed", 1);
    repo.create_page(&kept).unwrap();
    repo.create_page(&doomed).unwrap();

    let mut renamed = kept.clone();
    renamed.set_outline_content(OutlineContent::new("Renamed", vec![]));
    let new_page = outline_page("proj", "New", 1);
    let unknown = outline_page("proj", "Unknown", 2);

    let err = repo
        .apply_changes(&[renamed, unknown.clone()], &[new_page.clone()], &[doomed.id])
        .unwrap_err();
    assert!(matches!(err, RepoError::PageNotFound(id) if id == unknown.id));

    let pages = repo.list_pages_for_project("proj").unwrap();
    assert_eq!(pages, vec![kept, doomed]);
    assert!(repo.get_page(new_page.id).unwrap().is_none());
}

#[test]
fn deleting_project_cascades_to_pages() {
    let mut conn = open_db_in_memory().unwrap();
    seed_project(&conn, "proj");
    let page = outline_page("proj", "Only", 0);
    {
        let repo = SqlitePageRepository::try_new(&mut conn).unwrap();
        repo.create_page(&page).unwrap();
    }

    SqliteProjectRepository::try_new(&conn)
        .unwrap()
        .delete_project("proj")
        .unwrap();

    let remaining: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pages WHERE id = ?1;",
            params![page.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn corrupted_outline_json_is_rejected_on_read() {
    let mut conn = open_db_in_memory().unwrap();
    seed_project(&conn, "proj");
    let page = outline_page("proj", "Broken", 0);
    {
        let repo = SqlitePageRepository::try_new(&mut conn).unwrap();
        repo.create_page(&page).unwrap();
    }
    conn.execute(
        "UPDATE pages SET outline_content = '{not json' WHERE id = ?1;",
        params![page.id.to_string()],
    )
    .unwrap();

    let repo = SqlitePageRepository::try_new(&mut conn).unwrap();
    let err = repo.get_page(page.id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("outline_content")));
}

#[test]
fn page_for_unknown_project_violates_foreign_key() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqlitePageRepository::try_new(&mut conn).unwrap();

    let err = repo
        .create_page(&outline_page("nowhere", "Orphan", 0))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}
