//! Persistence for projects and the global dashboard.
//!
//! A store keeps [`ProjectRecord`]s keyed by project id plus a single
//! [`GlobalDashboard`]. Column types and profiles are never written; they are
//! re-derived when a project is loaded.
//!
//! Two backends ship with the crate: [`InMemoryStore`] for tests and
//! short-lived sessions, and [`FileStore`], one JSON document per project in a
//! directory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::project::{GlobalDashboard, Project, ProjectSummary};

pub mod file;
pub mod in_memory;

pub use file::FileStore;
pub use in_memory::InMemoryStore;

/// Storage backend for projects.
///
/// # Example
///
/// ```rust
/// use datadeck::project::{Project, ProjectSource};
/// use datadeck::repository::{InMemoryStore, ProjectStore};
/// use datadeck::table::RowSet;
///
/// # async fn example() -> datadeck::error::Result<()> {
/// let store = InMemoryStore::new();
/// let project = Project::new("empty", ProjectSource::Inline, RowSet::empty());
/// store.save(&project).await?;
///
/// let loaded = store.load(project.id()).await?;
/// assert_eq!(loaded.name(), "empty");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Inserts or replaces a project.
    async fn save(&self, project: &Project) -> Result<()>;

    /// Loads a project, re-deriving its column types.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::ProjectNotFound`](crate::error::DeckError::ProjectNotFound)
    /// when no project has this id.
    async fn load(&self, id: Uuid) -> Result<Project>;

    /// Deletes a project.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::ProjectNotFound`](crate::error::DeckError::ProjectNotFound)
    /// when no project has this id.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Summaries of every stored project, most recently updated first.
    async fn list(&self) -> Result<Vec<ProjectSummary>>;

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let summaries = self.list().await?;
        Ok(summaries.iter().any(|summary| summary.id == id))
    }

    async fn save_dashboard(&self, dashboard: &GlobalDashboard) -> Result<()>;

    /// The stored dashboard, or an empty one if none was saved yet.
    async fn load_dashboard(&self) -> Result<GlobalDashboard>;

    /// Loads every stored project.
    async fn load_all(&self) -> Result<Vec<Project>> {
        let mut projects = Vec::new();
        for summary in self.list().await? {
            projects.push(self.load(summary.id).await?);
        }
        Ok(projects)
    }

    async fn metadata(&self) -> Result<StoreMetadata> {
        Ok(StoreMetadata::default())
    }
}

/// Orders summaries most recently updated first, ties broken by id.
pub(crate) fn sort_summaries(summaries: &mut [ProjectSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
}

/// Metadata about a store.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreMetadata {
    /// The backend type (e.g., "in_memory", "file").
    pub backend_type: Option<String>,

    /// Number of stored projects.
    pub project_count: Option<usize>,

    /// Backend-specific settings.
    pub config: HashMap<String, String>,

    /// Last modification timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

impl StoreMetadata {
    pub fn new(backend_type: impl Into<String>) -> Self {
        Self {
            backend_type: Some(backend_type.into()),
            ..Default::default()
        }
    }

    pub fn with_project_count(mut self, count: usize) -> Self {
        self.project_count = Some(count);
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}
