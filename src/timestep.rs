//! Immutable snapshot of all patches at a specific step number.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{PatchStoreError, Result};
use crate::geokey::GeoKey;
use crate::geometry::Geometry;
use crate::patch::FrozenPatch;
use crate::spatial_index::PatchSpatialIndex;

pub struct TimeStep {
    step: i64,
    patches: HashMap<GeoKey, FrozenPatch>,
    index: OnceLock<PatchSpatialIndex>,
}

impl TimeStep {
    pub fn new(step: i64, patches: HashMap<GeoKey, FrozenPatch>) -> Self {
        Self {
            step,
            patches,
            index: OnceLock::new(),
        }
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Built once on first use; every subsequent call (from any thread)
    /// observes the same, fully constructed index.
    fn index(&self) -> Result<&PatchSpatialIndex> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }
        let built = PatchSpatialIndex::build(&self.patches)?;
        Ok(self.index.get_or_init(|| built))
    }

    /// All patches in this timestep, in unspecified order.
    pub fn get_patches(&self) -> Vec<&FrozenPatch> {
        self.patches.values().collect()
    }

    pub fn get_patches_in(&self, geometry: &Geometry) -> Result<Vec<&FrozenPatch>> {
        let index = self.index()?;
        let candidates = index.query_candidates(geometry);
        let mut result = Vec::with_capacity(candidates.len());
        for key in candidates {
            if let Some(patch) = self.patches.get(&key)
                && let Some(patch_geometry) = patch.geometry()
                && patch_geometry.intersects(geometry)
            {
                result.push(patch);
            }
        }
        Ok(result)
    }

    pub fn get_patches_in_named(&self, geometry: &Geometry, name: &str) -> Result<Vec<&FrozenPatch>> {
        Ok(self
            .get_patches_in(geometry)?
            .into_iter()
            .filter(|p| p.name() == name)
            .collect())
    }

    pub fn get_patch_by_key(&self, key: GeoKey) -> Option<&FrozenPatch> {
        self.patches.get(&key)
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

impl std::fmt::Debug for TimeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeStep")
            .field("step", &self.step)
            .field("patch_count", &self.patches.len())
            .finish()
    }
}
