//! Outline-to-pages merge use-case.
//!
//! # Responsibility
//! - Align a freshly generated outline with the pages already stored for a
//!   project, reusing page records whose titles match.
//! - Persist the aligned page list as one unit of work.
//!
//! # Invariants
//! - Result length and titles follow the outline entries, index by index.
//! - A reused page keeps its id, description, image path and status; only
//!   its outline (and part) is overwritten.
//! - Duplicate titles are matched first-seen to first-seen; one existing
//!   page is never handed to two entries.
//! - Existing pages left unmatched are deleted.
//! - `order_index` of every result page equals its position in the result.
//!
//! Concurrent merges for the same project are not guarded against; callers
//! are expected to serialize them per project.

use crate::model::page::{OutlineEntry, Page, PageId};
use crate::repo::page_repo::PageRepository;
use crate::repo::RepoError;
use log::{error, info};
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for page merge use-cases.
#[derive(Debug)]
pub enum PageMergeError {
    /// Target project does not exist.
    ProjectNotFound(String),
    /// Persistence-layer failure; nothing was written.
    Repo(RepoError),
}

impl Display for PageMergeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PageMergeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::ProjectNotFound(_) => None,
        }
    }
}

impl From<RepoError> for PageMergeError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// One page of the merge result and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPage {
    pub page: Page,
    /// `true` when an existing record was reused, `false` for a new record.
    pub reused: bool,
}

/// In-memory outcome of aligning existing pages with outline entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    /// Result pages in outline order, already renumbered.
    pub pages: Vec<PlannedPage>,
    /// Existing pages no entry claimed, in their original order.
    pub deleted: Vec<Page>,
}

impl MergePlan {
    /// Reused pages carrying their new outline and position.
    pub fn updated_pages(&self) -> Vec<Page> {
        self.pages
            .iter()
            .filter(|planned| planned.reused)
            .map(|planned| planned.page.clone())
            .collect()
    }

    /// Pages that do not exist in storage yet.
    pub fn created_pages(&self) -> Vec<Page> {
        self.pages
            .iter()
            .filter(|planned| !planned.reused)
            .map(|planned| planned.page.clone())
            .collect()
    }

    pub fn deleted_ids(&self) -> Vec<PageId> {
        self.deleted.iter().map(|page| page.id).collect()
    }

    /// Consumes the plan and returns the result pages in order.
    pub fn into_pages(self) -> Vec<Page> {
        self.pages.into_iter().map(|planned| planned.page).collect()
    }
}

/// Aligns `existing` pages with `entries` without touching storage.
///
/// Rules:
/// - Existing pages are queued per title in their given order.
/// - Each entry takes the front of its title queue when non-empty and
///   overwrites that page's outline; otherwise a new draft page is created.
/// - Whatever is left in the queues is scheduled for deletion.
/// - Positions are renumbered to the result index.
pub fn plan_page_merge(
    project_id: &str,
    existing: Vec<Page>,
    entries: &[OutlineEntry],
) -> MergePlan {
    let mut by_title: HashMap<String, VecDeque<usize>> = HashMap::new();
    for (index, page) in existing.iter().enumerate() {
        by_title
            .entry(page.title().to_string())
            .or_default()
            .push_back(index);
    }

    let mut slots: Vec<Option<Page>> = existing.into_iter().map(Some).collect();
    let mut pages = Vec::with_capacity(entries.len());

    for (position, entry) in entries.iter().enumerate() {
        let order_index = u32::try_from(position).unwrap_or(u32::MAX);
        let claimed = by_title
            .get_mut(entry.title.as_str())
            .and_then(VecDeque::pop_front)
            .and_then(|index| slots.get_mut(index).and_then(Option::take));

        let planned = match claimed {
            Some(mut page) => {
                page.set_outline_content(entry.to_outline());
                page.part = entry.part.clone();
                page.order_index = order_index;
                PlannedPage { page, reused: true }
            }
            None => {
                let mut page = Page::new(project_id, order_index);
                page.set_outline_content(entry.to_outline());
                page.part = entry.part.clone();
                PlannedPage {
                    page,
                    reused: false,
                }
            }
        };
        pages.push(planned);
    }

    let deleted = slots.into_iter().flatten().collect();
    MergePlan { pages, deleted }
}

/// Page merge service over a page repository.
pub struct PageMergeService<R: PageRepository> {
    repo: R,
}

impl<R: PageRepository> PageMergeService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Merges `entries` into the stored pages of `project_id`.
    ///
    /// Returns the reconciled pages in outline order. Storage errors abort
    /// the whole merge and are returned unchanged; no partial state is left.
    pub fn merge_pages(
        &mut self,
        project_id: &str,
        entries: &[OutlineEntry],
    ) -> Result<Vec<Page>, PageMergeError> {
        let started_at = Instant::now();
        info!(
            "event=page_merge module=service status=start project_id={} entries={}",
            project_id,
            entries.len()
        );

        match self.merge_pages_inner(project_id, entries) {
            Ok((pages, reused, created, deleted)) => {
                info!(
                    "event=page_merge module=service status=ok project_id={} reused={} created={} deleted={} duration_ms={}",
                    project_id,
                    reused,
                    created,
                    deleted,
                    started_at.elapsed().as_millis()
                );
                Ok(pages)
            }
            Err(err) => {
                error!(
                    "event=page_merge module=service status=error project_id={} duration_ms={} error={}",
                    project_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Lists the stored pages of one project in order.
    pub fn list_pages(&self, project_id: &str) -> Result<Vec<Page>, PageMergeError> {
        if !self.repo.project_exists(project_id)? {
            return Err(PageMergeError::ProjectNotFound(project_id.to_string()));
        }
        Ok(self.repo.list_pages_for_project(project_id)?)
    }

    fn merge_pages_inner(
        &mut self,
        project_id: &str,
        entries: &[OutlineEntry],
    ) -> Result<(Vec<Page>, usize, usize, usize), PageMergeError> {
        let existing = self.list_pages(project_id)?;
        let plan = plan_page_merge(project_id, existing, entries);

        let updated = plan.updated_pages();
        let created = plan.created_pages();
        let deleted = plan.deleted_ids();
        self.repo.apply_changes(&updated, &created, &deleted)?;

        Ok((plan.into_pages(), updated.len(), created.len(), deleted.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::{plan_page_merge, PageMergeError, PageMergeService};
    use crate::model::page::{
        DescriptionContent, OutlineContent, OutlineEntry, Page, PageId, PageStatus,
    };
    use crate::repo::page_repo::PageRepository;
    use crate::repo::{RepoError, RepoResult};

    /// Serves fixed pages and fails every batch write.
    struct RejectingRepo {
        pages: Vec<Page>,
        apply_calls: usize,
    }

    impl PageRepository for RejectingRepo {
        fn create_page(&self, page: &Page) -> RepoResult<PageId> {
            Ok(page.id)
        }

        fn update_page(&self, _page: &Page) -> RepoResult<()> {
            Ok(())
        }

        fn delete_page(&self, _id: PageId) -> RepoResult<()> {
            Ok(())
        }

        fn get_page(&self, id: PageId) -> RepoResult<Option<Page>> {
            Ok(self.pages.iter().find(|page| page.id == id).cloned())
        }

        fn list_pages_for_project(&self, _project_id: &str) -> RepoResult<Vec<Page>> {
            Ok(self.pages.clone())
        }

        fn project_exists(&self, project_id: &str) -> RepoResult<bool> {
            Ok(project_id == "proj")
        }

        fn apply_changes(
            &mut self,
            _updated: &[Page],
            _created: &[Page],
            _deleted: &[PageId],
        ) -> RepoResult<()> {
            self.apply_calls += 1;
            Err(RepoError::InvalidData("disk full".to_string()))
        }
    }

    fn page(title: &str, order_index: u32) -> Page {
        let mut page = Page::new("proj", order_index);
        page.set_outline_content(OutlineContent::new(title, vec!["p1".to_string()]));
        page
    }

    fn entry(title: &str) -> OutlineEntry {
        OutlineEntry::new(title, vec![format!("{title} point")])
    }

    #[test]
    fn matched_page_keeps_identity_and_auxiliary_content() {
        let mut old = page("A", 4);
        old.set_description_content(DescriptionContent::new("desc A"));
        old.generated_image_path = Some("/img/a.png".to_string());
        old.status = PageStatus::ImageGenerated;
        let old_id = old.id;

        let plan = plan_page_merge("proj", vec![old], &[entry("A")]);
        assert!(plan.deleted.is_empty());
        assert_eq!(plan.pages.len(), 1);

        let merged = &plan.pages[0];
        assert!(merged.reused);
        assert_eq!(merged.page.id, old_id);
        assert_eq!(merged.page.order_index, 0);
        assert_eq!(merged.page.status, PageStatus::ImageGenerated);
        assert_eq!(merged.page.generated_image_path.as_deref(), Some("/img/a.png"));
        assert_eq!(
            merged.page.description_content().map(|d| d.text.as_str()),
            Some("desc A")
        );
        assert_eq!(
            merged.page.outline_content().map(|o| o.points.clone()),
            Some(vec!["A point".to_string()])
        );
    }

    #[test]
    fn duplicate_titles_match_in_first_seen_order() {
        let first = page("Dup", 0);
        let second = page("Dup", 1);
        let (first_id, second_id) = (first.id, second.id);

        let plan = plan_page_merge("proj", vec![first, second], &[entry("Dup"), entry("Dup")]);
        assert_eq!(plan.pages[0].page.id, first_id);
        assert_eq!(plan.pages[1].page.id, second_id);
        assert!(plan.deleted.is_empty());
    }

    #[test]
    fn extra_duplicate_entry_creates_new_page() {
        let only = page("Dup", 0);
        let only_id = only.id;

        let plan = plan_page_merge("proj", vec![only], &[entry("Dup"), entry("Dup")]);
        assert_eq!(plan.pages[0].page.id, only_id);
        assert!(!plan.pages[1].reused);
        assert_ne!(plan.pages[1].page.id, only_id);
        assert_eq!(plan.pages[1].page.status, PageStatus::Draft);
    }

    #[test]
    fn unclaimed_pages_are_deleted_in_original_order() {
        let keep = page("Keep", 0);
        let gone_a = page("Gone A", 1);
        let gone_b = page("Gone B", 2);
        let expected = vec![gone_a.id, gone_b.id];

        let plan = plan_page_merge("proj", vec![gone_a, keep, gone_b], &[entry("Keep")]);
        assert_eq!(plan.deleted_ids(), expected);
        assert_eq!(plan.updated_pages().len(), 1);
        assert!(plan.created_pages().is_empty());
    }

    #[test]
    fn reordered_entries_renumber_positions() {
        let a = page("A", 0);
        let b = page("B", 1);
        let (a_id, b_id) = (a.id, b.id);

        let plan = plan_page_merge("proj", vec![a, b], &[entry("B"), entry("New"), entry("A")]);
        let pages = plan.into_pages();
        assert_eq!(pages[0].id, b_id);
        assert_eq!(pages[2].id, a_id);
        let positions: Vec<u32> = pages.iter().map(|p| p.order_index).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        let titles: Vec<&str> = pages.iter().map(Page::title).collect();
        assert_eq!(titles, vec!["B", "New", "A"]);
    }

    #[test]
    fn empty_title_is_matched_literally() {
        let blank = page("", 0);
        let blank_id = blank.id;

        let plan = plan_page_merge("proj", vec![blank], &[entry("")]);
        assert_eq!(plan.pages[0].page.id, blank_id);
    }

    #[test]
    fn entry_part_is_applied_to_new_and_reused_pages() {
        let mut reused_entry = entry("A");
        reused_entry.part = Some("Intro".to_string());
        let mut new_entry = entry("B");
        new_entry.part = Some("Body".to_string());

        let plan = plan_page_merge("proj", vec![page("A", 0)], &[reused_entry, new_entry]);
        assert_eq!(plan.pages[0].page.part.as_deref(), Some("Intro"));
        assert_eq!(plan.pages[1].page.part.as_deref(), Some("Body"));
    }

    #[test]
    fn storage_failure_reaches_caller_unchanged() {
        let repo = RejectingRepo {
            pages: vec![page("A", 0), page("B", 1)],
            apply_calls: 0,
        };
        let mut service = PageMergeService::new(repo);

        let err = service
            .merge_pages("proj", &[entry("B"), entry("C")])
            .unwrap_err();
        assert!(matches!(
            &err,
            PageMergeError::Repo(RepoError::InvalidData(message)) if message == "disk full"
        ));
        assert_eq!(err.to_string(), "invalid persisted data: disk full");
        assert_eq!(service.repo.apply_calls, 1);
    }

    #[test]
    fn missing_project_fails_before_any_write() {
        let repo = RejectingRepo {
            pages: Vec::new(),
            apply_calls: 0,
        };
        let mut service = PageMergeService::new(repo);

        let err = service.merge_pages("other", &[entry("A")]).unwrap_err();
        assert!(matches!(err, PageMergeError::ProjectNotFound(id) if id == "other"));
        assert_eq!(service.repo.apply_calls, 0);
    }
}
