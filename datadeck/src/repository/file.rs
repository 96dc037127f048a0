//! Project store backed by a directory of JSON documents.
//!
//! Layout:
//!
//! ```text
//! <dir>/<project uuid>.json   one ProjectRecord each
//! <dir>/dashboard.json        the GlobalDashboard
//! ```
//!
//! Writes go to a temporary file first and are renamed into place, so a crash
//! mid-write leaves the previous document intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{DeckError, Result};
use crate::project::{GlobalDashboard, Project, ProjectRecord, ProjectSummary};

use super::{sort_summaries, ProjectStore, StoreMetadata};

const DASHBOARD_FILE: &str = "dashboard.json";
const EXTENSION: &str = "json";

/// Stores each project as `<uuid>.json` under one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store, creating the directory if needed.
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        debug!("Opened file store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn project_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    fn dashboard_path(&self) -> PathBuf {
        self.dir.join(DASHBOARD_FILE)
    }

    async fn read_record(&self, path: &Path) -> Result<ProjectRecord> {
        let bytes = fs::read(path).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            DeckError::Serialization(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Ids of every project document in the directory.
    async fn project_ids(&self) -> Result<Vec<Uuid>> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| Uuid::parse_str(stem).ok());
            if let Some(id) = id {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

/// Writes `bytes` next to `path` and renames it into place.
///
/// Each call gets its own temporary file, so concurrent writes of the same
/// document never share one. The last rename wins.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = temp_path(path);
    let written = match fs::write(&tmp, bytes).await {
        Ok(()) => fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&tmp).await {
            if cleanup.kind() != ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temporary file");
            }
        }
        return Err(e.into());
    }
    Ok(())
}

/// `.<file name>.<random>.tmp` in the same directory as `path`.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
}

fn not_found(id: Uuid) -> DeckError {
    DeckError::ProjectNotFound { id: id.to_string() }
}

#[async_trait]
impl ProjectStore for FileStore {
    #[instrument(skip(self, project), fields(project_id = %project.id(), store = "file"))]
    async fn save(&self, project: &Project) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&project.to_record())?;
        write_atomic(&self.project_path(project.id()), &bytes).await?;
        debug!(bytes = bytes.len(), "Saved project");
        Ok(())
    }

    #[instrument(skip(self), fields(store = "file"))]
    async fn load(&self, id: Uuid) -> Result<Project> {
        match self.read_record(&self.project_path(id)).await {
            Ok(record) => Ok(Project::from_record(record)),
            Err(DeckError::Io(e)) if e.kind() == ErrorKind::NotFound => Err(not_found(id)),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self), fields(store = "file"))]
    async fn delete(&self, id: Uuid) -> Result<()> {
        match fs::remove_file(self.project_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(store = "file"))]
    async fn list(&self) -> Result<Vec<ProjectSummary>> {
        let mut summaries = Vec::new();
        for id in self.project_ids().await? {
            match self.read_record(&self.project_path(id)).await {
                Ok(record) => summaries.push(record.summary()),
                // Deleted between listing and reading.
                Err(DeckError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                    warn!(project_id = %id, "Project file vanished while listing");
                }
                Err(e) => return Err(e),
            }
        }
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(fs::try_exists(self.project_path(id)).await?)
    }

    #[instrument(skip_all, fields(tiles = dashboard.tiles().len(), store = "file"))]
    async fn save_dashboard(&self, dashboard: &GlobalDashboard) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(dashboard)?;
        write_atomic(&self.dashboard_path(), &bytes).await
    }

    async fn load_dashboard(&self) -> Result<GlobalDashboard> {
        match fs::read(self.dashboard_path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(GlobalDashboard::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn metadata(&self) -> Result<StoreMetadata> {
        Ok(StoreMetadata::new("file")
            .with_project_count(self.project_ids().await?.len())
            .with_config("dir", self.dir.display().to_string()))
    }
}
