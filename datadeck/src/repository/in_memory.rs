//! In-memory project store for tests and short-lived sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{DeckError, Result};
use crate::project::{GlobalDashboard, Project, ProjectRecord, ProjectSummary};

use super::{sort_summaries, ProjectStore, StoreMetadata};

/// Keeps project records in a map behind a [`tokio::sync::RwLock`].
///
/// Clones share the same storage. Records are stored, not live projects, so a
/// loaded project never aliases one held by another caller.
///
/// # Example
///
/// ```rust
/// use datadeck::repository::{InMemoryStore, ProjectStore};
///
/// # async fn example() -> datadeck::error::Result<()> {
/// let store = InMemoryStore::new();
/// assert!(store.list().await?.is_empty());
/// assert!(store.load_dashboard().await?.tiles().is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    projects: Arc<RwLock<HashMap<Uuid, ProjectRecord>>>,
    dashboard: Arc<RwLock<GlobalDashboard>>,
    last_modified: Arc<RwLock<Option<chrono::DateTime<chrono::Utc>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored projects.
    pub async fn size(&self) -> usize {
        self.projects.read().await.len()
    }

    /// Removes every project and resets the dashboard.
    pub async fn clear(&self) {
        self.projects.write().await.clear();
        *self.dashboard.write().await = GlobalDashboard::default();
        self.touch().await;
    }

    async fn touch(&self) {
        *self.last_modified.write().await = Some(chrono::Utc::now());
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    #[instrument(skip(self, project), fields(project_id = %project.id(), store = "in_memory"))]
    async fn save(&self, project: &Project) -> Result<()> {
        let record = project.to_record();
        self.projects.write().await.insert(record.id, record);
        self.touch().await;
        Ok(())
    }

    #[instrument(skip(self), fields(store = "in_memory"))]
    async fn load(&self, id: Uuid) -> Result<Project> {
        let record = self
            .projects
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DeckError::ProjectNotFound { id: id.to_string() })?;
        Ok(Project::from_record(record))
    }

    #[instrument(skip(self), fields(store = "in_memory"))]
    async fn delete(&self, id: Uuid) -> Result<()> {
        if self.projects.write().await.remove(&id).is_none() {
            return Err(DeckError::ProjectNotFound { id: id.to_string() });
        }
        self.touch().await;
        Ok(())
    }

    #[instrument(skip(self), fields(store = "in_memory"))]
    async fn list(&self) -> Result<Vec<ProjectSummary>> {
        let mut summaries: Vec<_> = self
            .projects
            .read()
            .await
            .values()
            .map(ProjectRecord::summary)
            .collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.projects.read().await.contains_key(&id))
    }

    #[instrument(skip_all, fields(tiles = dashboard.tiles().len(), store = "in_memory"))]
    async fn save_dashboard(&self, dashboard: &GlobalDashboard) -> Result<()> {
        *self.dashboard.write().await = dashboard.clone();
        self.touch().await;
        Ok(())
    }

    async fn load_dashboard(&self) -> Result<GlobalDashboard> {
        Ok(self.dashboard.read().await.clone())
    }

    async fn metadata(&self) -> Result<StoreMetadata> {
        let mut metadata = StoreMetadata::new("in_memory").with_project_count(self.size().await);
        metadata.last_modified = *self.last_modified.read().await;
        Ok(metadata)
    }
}
