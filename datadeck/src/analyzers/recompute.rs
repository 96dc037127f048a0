//! Filter-then-profile, in one place.
//!
//! Chart previews, the insights panel, the analyze view and dashboard tiles
//! all need "the profiles of the rows that survive these filters". They all get
//! it from [`ProfileRecomputer::recompute`].

use tracing::{debug, instrument};

use super::filter::{FilterSpec, RowFilterEngine};
use super::profiler::{ColumnProfiler, ProfileMap};
use super::types::ColumnTypes;
use crate::table::RowSet;

/// Filtered rows and the profiles computed over them.
#[derive(Debug, Clone, PartialEq)]
pub struct Recomputed {
    pub rows: RowSet,
    pub profiles: ProfileMap,
}

/// Re-derives profiles whenever filters change.
#[derive(Debug, Clone, Default)]
pub struct ProfileRecomputer {
    filter: RowFilterEngine,
    profiler: ColumnProfiler,
}

impl ProfileRecomputer {
    pub fn new(profiler: ColumnProfiler) -> Self {
        Self {
            filter: RowFilterEngine::new(),
            profiler,
        }
    }

    pub fn profiler(&self) -> &ColumnProfiler {
        &self.profiler
    }

    /// Apply `spec` to `base`, then profile every base column over the result
    /// using the base column types.
    #[instrument(skip_all, fields(rows = base.len(), filters = spec.len()))]
    pub fn recompute(&self, base: &RowSet, spec: &FilterSpec, base_types: &ColumnTypes) -> Recomputed {
        let rows = self.filter.apply(base, spec, base_types);
        let profiles = self.profiler.profile(&rows, base.columns(), Some(base_types));
        debug!(kept = rows.len(), "Recomputed profiles");
        Recomputed { rows, profiles }
    }

    /// Filter only, for consumers that aggregate rather than profile.
    pub fn filter_rows(&self, base: &RowSet, spec: &FilterSpec, base_types: &ColumnTypes) -> RowSet {
        self.filter.apply(base, spec, base_types)
    }
}
