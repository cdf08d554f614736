//! Lifecycle of current (live) and past (frozen) simulation state, and the
//! entry point for spatial/temporal queries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use dashmap::DashMap;

use crate::error::{PatchStoreError, Result};
use crate::geokey::GeoKey;
use crate::geometry::Geometry;
use crate::patch::{FrozenPatch, LivePatch};
use crate::timestep::TimeStep;

/// Selects a timestep and, optionally, restricts the result to patches
/// intersecting a geometry.
#[derive(Debug, Clone)]
pub struct Query {
    pub step: i64,
    pub geometry: Option<Geometry>,
}

impl Query {
    pub fn all(step: i64) -> Self {
        Self {
            step,
            geometry: None,
        }
    }

    pub fn within(step: i64, geometry: Geometry) -> Self {
        Self {
            step,
            geometry: Some(geometry),
        }
    }
}

/// One Monte Carlo run: the live current state plus a keyed archive of
/// frozen snapshots. Mutating operations (`save_time_step`,
/// `advance_step`, mutation through `current_patches_mut`) assume a
/// single-writer discipline (the simulation loop); read
/// operations (`query`, `get_time_step`) are safe from any number of
/// concurrent threads.
pub struct Replicate {
    current_step: AtomicI64,
    live: RwLock<HashMap<GeoKey, LivePatch>>,
    past: DashMap<i64, Arc<TimeStep>>,
}

impl Replicate {
    pub fn new(initial_step: i64) -> Self {
        Self {
            current_step: AtomicI64::new(initial_step),
            live: RwLock::new(HashMap::new()),
            past: DashMap::new(),
        }
    }

    pub fn current_step(&self) -> i64 {
        self.current_step.load(Ordering::SeqCst)
    }

    /// Advance the current step number without saving. The live map is
    /// untouched; the caller is responsible for whatever reset or
    /// continuation semantics the simulation needs between steps.
    pub fn advance_step(&self) -> i64 {
        self.current_step.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Mutable access to the live patch collection, for the simulation
    /// loop to insert, remove, or mutate patches between saves.
    pub fn current_patches_mut(&self) -> RwLockWriteGuard<'_, HashMap<GeoKey, LivePatch>> {
        self.live.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_patches(&self) -> Vec<LivePatch> {
        self.live
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .cloned()
            .collect()
    }

    /// Freeze every live patch into an immutable snapshot and archive it
    /// under `n`. The live set is left untouched: the simulation may keep
    /// mutating toward the next step.
    pub fn save_time_step(&self, n: i64) -> Result<()> {
        if self.past.contains_key(&n) {
            return Err(PatchStoreError::AlreadyExists(n));
        }

        let live = self.live.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let frozen: HashMap<GeoKey, FrozenPatch> =
            live.iter().map(|(key, patch)| (*key, patch.freeze())).collect();
        drop(live);

        // `entry().or_insert` re-checks under the DashMap's own shard lock,
        // closing the race window between the `contains_key` check above
        // and this insert.
        match self.past.entry(n) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(PatchStoreError::AlreadyExists(n)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::new(TimeStep::new(n, frozen)));
                Ok(())
            }
        }
    }

    pub fn get_time_step(&self, n: i64) -> Option<Arc<TimeStep>> {
        self.past.get(&n).map(|entry| entry.value().clone())
    }

    /// Query a past timestep. `QueryOnCurrent` when `q.step` is the live
    /// step (the current set is never addressable via spatial queries);
    /// `UnknownStep` when `q.step` has not been saved.
    pub fn query(&self, q: Query) -> Result<Vec<FrozenPatch>> {
        if q.step == self.current_step() {
            return Err(PatchStoreError::QueryOnCurrent(q.step));
        }
        let timestep = self
            .get_time_step(q.step)
            .ok_or(PatchStoreError::UnknownStep(q.step))?;

        let patches = match &q.geometry {
            Some(geometry) => timestep.get_patches_in(geometry)?,
            None => timestep.get_patches(),
        };
        Ok(patches.into_iter().cloned().collect())
    }

    /// Key lookup against the *current* step only — past lookups must go
    /// through [`Replicate::query`] instead, keeping the mutable/immutable
    /// boundary clean.
    pub fn get_patch_by_key(&self, key: GeoKey, step: i64) -> Result<Option<LivePatch>> {
        if step != self.current_step() {
            return Err(PatchStoreError::QueryOnPast);
        }
        Ok(self
            .live
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key)
            .cloned())
    }
}
