//! Dashboard layouts.
//!
//! Each project keeps a [`DashboardLayout`] of its own charts. The
//! [`GlobalDashboard`] pins charts from any number of projects; it only holds
//! references, so a pinned chart can disappear underneath it. Rendering reports
//! such tiles as missing instead of failing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::chart::ChartData;
use super::project::Project;
use crate::analyzers::InsightsPipeline;
use crate::error::{DeckError, Result};

/// Default tile width in grid units.
pub const DEFAULT_TILE_WIDTH: u32 = 6;
/// Default tile height in grid units.
pub const DEFAULT_TILE_HEIGHT: u32 = 4;

/// Position and size of a tile on a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayout {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl TileLayout {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// First grid row below this tile.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    /// A default-sized tile at the start of the row below `layouts`.
    fn next_free<'a>(layouts: impl Iterator<Item = &'a TileLayout>) -> Self {
        let y = layouts.map(TileLayout::bottom).max().unwrap_or(0);
        Self::new(0, y, DEFAULT_TILE_WIDTH, DEFAULT_TILE_HEIGHT)
    }
}

/// A chart placed on a project dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartTile {
    pub chart_id: Uuid,
    pub layout: TileLayout,
}

/// The tiles of one project's dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardLayout {
    tiles: Vec<ChartTile>,
}

impl DashboardLayout {
    pub fn tiles(&self) -> &[ChartTile] {
        &self.tiles
    }

    pub fn tile(&self, chart_id: Uuid) -> Option<&ChartTile> {
        self.tiles.iter().find(|tile| tile.chart_id == chart_id)
    }

    /// Place a chart below every existing tile. Already placed charts keep
    /// their position.
    pub fn place(&mut self, chart_id: Uuid) -> TileLayout {
        if let Some(tile) = self.tile(chart_id) {
            return tile.layout;
        }
        let layout = TileLayout::next_free(self.tiles.iter().map(|tile| &tile.layout));
        self.tiles.push(ChartTile { chart_id, layout });
        layout
    }

    pub fn arrange(&mut self, chart_id: Uuid, layout: TileLayout) -> Result<()> {
        let tile = self
            .tiles
            .iter_mut()
            .find(|tile| tile.chart_id == chart_id)
            .ok_or_else(|| DeckError::ChartNotFound {
                id: chart_id.to_string(),
            })?;
        tile.layout = layout;
        Ok(())
    }

    pub fn remove(&mut self, chart_id: Uuid) -> bool {
        let before = self.tiles.len();
        self.tiles.retain(|tile| tile.chart_id != chart_id);
        self.tiles.len() != before
    }
}

/// A chart from some project pinned to the global dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedTile {
    pub project_id: Uuid,
    pub chart_id: Uuid,
    pub layout: TileLayout,
}

/// Cross-project dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalDashboard {
    tiles: Vec<PinnedTile>,
}

/// Why a pinned tile could not be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingReason {
    ProjectNotFound,
    ChartNotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTile {
    pub project_id: Uuid,
    pub project_name: String,
    pub layout: TileLayout,
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingTile {
    pub project_id: Uuid,
    pub chart_id: Uuid,
    pub reason: MissingReason,
}

/// Result of rendering the global dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardRender {
    pub tiles: Vec<RenderedTile>,
    pub missing: Vec<MissingTile>,
}

impl GlobalDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tiles(&self) -> &[PinnedTile] {
        &self.tiles
    }

    pub fn is_pinned(&self, project_id: Uuid, chart_id: Uuid) -> bool {
        self.position(project_id, chart_id).is_some()
    }

    /// Pin a chart below every existing tile. Pinning twice is a no-op.
    pub fn pin(&mut self, project_id: Uuid, chart_id: Uuid) -> TileLayout {
        if let Some(index) = self.position(project_id, chart_id) {
            return self.tiles[index].layout;
        }
        let layout = TileLayout::next_free(self.tiles.iter().map(|tile| &tile.layout));
        self.tiles.push(PinnedTile {
            project_id,
            chart_id,
            layout,
        });
        layout
    }

    /// Returns whether the chart was pinned.
    pub fn unpin(&mut self, project_id: Uuid, chart_id: Uuid) -> bool {
        match self.position(project_id, chart_id) {
            Some(index) => {
                self.tiles.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn arrange(&mut self, project_id: Uuid, chart_id: Uuid, layout: TileLayout) -> Result<()> {
        let index = self
            .position(project_id, chart_id)
            .ok_or_else(|| DeckError::ChartNotFound {
                id: chart_id.to_string(),
            })?;
        self.tiles[index].layout = layout;
        Ok(())
    }

    /// Drop every tile of a deleted project, returning how many went.
    pub fn prune_project(&mut self, project_id: Uuid) -> usize {
        let before = self.tiles.len();
        self.tiles.retain(|tile| tile.project_id != project_id);
        before - self.tiles.len()
    }

    /// Compute chart data for every tile.
    ///
    /// Tiles whose project is not among `projects`, or whose chart no longer
    /// exists, are listed under `missing`.
    #[instrument(skip_all, fields(tiles = self.tiles.len()))]
    pub fn render<'a>(
        &self,
        pipeline: &InsightsPipeline,
        projects: impl IntoIterator<Item = &'a Project>,
    ) -> DashboardRender {
        let projects: HashMap<Uuid, &Project> = projects.into_iter().map(|p| (p.id(), p)).collect();
        let mut render = DashboardRender::default();

        for tile in &self.tiles {
            let Some(project) = projects.get(&tile.project_id) else {
                warn!(project_id = %tile.project_id, "Pinned tile refers to a missing project");
                render.missing.push(MissingTile {
                    project_id: tile.project_id,
                    chart_id: tile.chart_id,
                    reason: MissingReason::ProjectNotFound,
                });
                continue;
            };

            match project.chart_data(pipeline, tile.chart_id) {
                Ok(data) => render.tiles.push(RenderedTile {
                    project_id: tile.project_id,
                    project_name: project.name().to_string(),
                    layout: tile.layout,
                    data,
                }),
                Err(_) => {
                    warn!(
                        project_id = %tile.project_id,
                        chart_id = %tile.chart_id,
                        "Pinned tile refers to a missing chart"
                    );
                    render.missing.push(MissingTile {
                        project_id: tile.project_id,
                        chart_id: tile.chart_id,
                        reason: MissingReason::ChartNotFound,
                    });
                }
            }
        }

        render
    }

    fn position(&self, project_id: Uuid, chart_id: Uuid) -> Option<usize> {
        self.tiles
            .iter()
            .position(|tile| tile.project_id == project_id && tile.chart_id == chart_id)
    }
}
