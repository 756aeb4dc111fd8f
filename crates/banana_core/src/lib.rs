//! Core domain logic for the banana slide backend.
//! This crate is the single source of truth for page/outline invariants.

pub mod config;
pub mod db;
pub mod env;
pub mod logging;
pub mod model;
pub mod pdf;
pub mod provider_keys;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget, LoggingError,
};
pub use model::page::{
    DescriptionContent, OutlineContent, OutlineEntry, Page, PageId, PageStatus,
    PageValidationError,
};
pub use model::project::{Project, ProjectId, ProjectStatus};
pub use pdf::{split_pdf_to_pages, PdfError};
pub use provider_keys::{
    collect_env_api_keys, ensure_namespace_key, get_api_key, namespace_key_name,
    ALLOWED_VENDORS, DEFAULT_KEY_NAMESPACE,
};
pub use repo::page_repo::{PageRepository, SqlitePageRepository};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::{RepoError, RepoResult};
pub use service::page_merge::{
    plan_page_merge, MergePlan, PageMergeError, PageMergeService, PlannedPage,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
