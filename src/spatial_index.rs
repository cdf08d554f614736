//! Per-timestep 2-D grid accelerator.
//!
//! Built once, lazily, from a timestep's frozen patches; thread-safe for
//! readers afterward. Query methods return a superset of the patches that
//! could intersect the query geometry — the caller ([`crate::timestep`])
//! performs the exact intersection test.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

use crate::decimal::{half_up_div, half_up_round_to_i64};
use crate::error::{PatchStoreError, Result};
use crate::geokey::GeoKey;
use crate::geometry::Geometry;
use crate::patch::FrozenPatch;

const MAX_GRID_DIM: usize = 10_000;

pub struct PatchSpatialIndex {
    cells: Vec<Vec<GeoKey>>,
    grid_width: usize,
    grid_height: usize,
    min_x: BigDecimal,
    min_y: BigDecimal,
    cell_size: BigDecimal,
    /// Every key placed in the grid (i.e. every patch that carries
    /// geometry). Used both as the circle-query fast path and as the
    /// degenerate fallback when no patch carries geometry at all.
    all_keys: Vec<GeoKey>,
    /// `true` when no patch in the timestep carries geometry, or no
    /// placed patch exposes a width to derive a cell size from. Queries
    /// degenerate to returning the full set; [`crate::timestep::TimeStep`]
    /// still performs the exact `intersects` filter afterward.
    degenerate: bool,
}

impl PatchSpatialIndex {
    pub fn build(patches: &HashMap<GeoKey, FrozenPatch>) -> Result<Self> {
        let geometried: Vec<(GeoKey, &Geometry)> = patches
            .iter()
            .filter_map(|(key, patch)| patch.geometry().map(|g| (*key, g)))
            .collect();

        let cell_size = geometried.iter().find_map(|(_, g)| g.width().cloned());

        let Some(cell_size) = cell_size else {
            return Ok(Self::degenerate_index(patches.keys().copied().collect()));
        };

        if cfg!(debug_assertions) {
            for (_, g) in &geometried {
                if let Some(w) = g.width() {
                    debug_assert_eq!(
                        w, &cell_size,
                        "all patches in a timestep must share one cell size"
                    );
                }
            }
        }

        let mut min_x: Option<BigDecimal> = None;
        let mut max_x: Option<BigDecimal> = None;
        let mut min_y: Option<BigDecimal> = None;
        let mut max_y: Option<BigDecimal> = None;

        for (_, g) in &geometried {
            let (cx, cy) = (g.center_x(), g.center_y());
            min_x = Some(min_x.map_or_else(|| cx.clone(), |m: BigDecimal| m.min(cx.clone())));
            max_x = Some(max_x.map_or_else(|| cx.clone(), |m: BigDecimal| m.max(cx.clone())));
            min_y = Some(min_y.map_or_else(|| cy.clone(), |m: BigDecimal| m.min(cy.clone())));
            max_y = Some(max_y.map_or_else(|| cy.clone(), |m: BigDecimal| m.max(cy.clone())));
        }

        let min_x = min_x.expect("non-empty geometried set");
        let max_x = max_x.expect("non-empty geometried set");
        let min_y = min_y.expect("non-empty geometried set");
        let max_y = max_y.expect("non-empty geometried set");

        let grid_width = half_up_round_to_i64(&half_up_div(&(&max_x - &min_x), &cell_size)) + 1;
        let grid_height = half_up_round_to_i64(&half_up_div(&(&max_y - &min_y), &cell_size)) + 1;

        if grid_width as usize > MAX_GRID_DIM {
            return Err(PatchStoreError::GridTooLarge {
                axis: "x",
                dim: grid_width as usize,
            });
        }
        if grid_height as usize > MAX_GRID_DIM {
            return Err(PatchStoreError::GridTooLarge {
                axis: "y",
                dim: grid_height as usize,
            });
        }

        let grid_width = grid_width as usize;
        let grid_height = grid_height as usize;
        let mut cells = vec![Vec::new(); grid_width * grid_height];
        let mut all_keys = Vec::with_capacity(geometried.len());

        for (key, g) in &geometried {
            let (col, row) = Self::world_to_grid_raw(g.center_x(), g.center_y(), &min_x, &min_y, &cell_size);
            let col = col.clamp(0, grid_width as i64 - 1) as usize;
            let row = row.clamp(0, grid_height as i64 - 1) as usize;
            cells[row * grid_width + col].push(*key);
            all_keys.push(*key);
        }

        Ok(Self {
            cells,
            grid_width,
            grid_height,
            min_x,
            min_y,
            cell_size,
            all_keys,
            degenerate: false,
        })
    }

    fn degenerate_index(all_keys: Vec<GeoKey>) -> Self {
        Self {
            cells: Vec::new(),
            grid_width: 0,
            grid_height: 0,
            min_x: BigDecimal::from(0),
            min_y: BigDecimal::from(0),
            cell_size: BigDecimal::from(1),
            all_keys,
            degenerate: true,
        }
    }

    fn world_to_grid_raw(
        cx: &BigDecimal,
        cy: &BigDecimal,
        min_x: &BigDecimal,
        min_y: &BigDecimal,
        cell_size: &BigDecimal,
    ) -> (i64, i64) {
        let col = half_up_round_to_i64(&half_up_div(&(cx - min_x), cell_size));
        let row = half_up_round_to_i64(&half_up_div(&(cy - min_y), cell_size));
        (col, row)
    }

    fn world_to_grid(&self, cx: &BigDecimal, cy: &BigDecimal) -> (i64, i64) {
        Self::world_to_grid_raw(cx, cy, &self.min_x, &self.min_y, &self.cell_size)
    }

    /// Returns a superset of the patches whose geometry could intersect
    /// `query`.
    pub fn query_candidates(&self, query: &Geometry) -> Vec<GeoKey> {
        if self.degenerate {
            return self.all_keys.clone();
        }

        match query {
            Geometry::Circle { width, .. } => self.query_circle(query, width),
            _ => self.query_bbox(query),
        }
    }

    fn query_bbox(&self, query: &Geometry) -> Vec<GeoKey> {
        let half_extent = query
            .width()
            .map(|w| w / BigDecimal::from(2))
            .unwrap_or_else(|| BigDecimal::from(0));

        let (center_col, center_row) = self.world_to_grid(query.center_x(), query.center_y());
        // +1 cell so a placed patch's own half-cell extent (it occupies
        // [center - cellSize/2, center + cellSize/2]) is covered even when
        // the query itself has zero extent and lands exactly on a shared
        // cell boundary.
        let cells_radius = half_up_round_to_i64(&half_up_div(&half_extent, &self.cell_size)).max(0) + 1;

        let min_col = (center_col - cells_radius).clamp(0, self.grid_width as i64 - 1);
        let max_col = (center_col + cells_radius).clamp(0, self.grid_width as i64 - 1);
        let min_row = (center_row - cells_radius).clamp(0, self.grid_height as i64 - 1);
        let max_row = (center_row + cells_radius).clamp(0, self.grid_height as i64 - 1);

        let mut result = Vec::with_capacity(((max_col - min_col + 1) * (max_row - min_row + 1)).max(0) as usize);
        if min_col > max_col || min_row > max_row {
            return result;
        }
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                let idx = row as usize * self.grid_width + col as usize;
                result.extend(self.cells[idx].iter().copied());
            }
        }
        result
    }

    fn query_circle(&self, query: &Geometry, diameter: &BigDecimal) -> Vec<GeoKey> {
        let diameter_f = diameter.to_f64().unwrap_or(0.0);
        let cell_size_f = self.cell_size.to_f64().unwrap_or(1.0);
        let radius_cells = diameter_f / (2.0 * cell_size_f);

        let min_dim = self.grid_width.min(self.grid_height);
        if (radius_cells + std::f64::consts::SQRT_2).ceil() as usize >= min_dim {
            return self.all_keys.clone();
        }

        let offsets = crate::offsets::get_offsets_for_radius(radius_cells);
        let (center_col, center_row) = self.world_to_grid(query.center_x(), query.center_y());

        let mut result = Vec::with_capacity(offsets.len());
        for (dx, dy) in offsets.iter() {
            let col = center_col + *dx as i64;
            let row = center_row + *dy as i64;
            if col < 0 || row < 0 || col >= self.grid_width as i64 || row >= self.grid_height as i64 {
                continue;
            }
            let idx = row as usize * self.grid_width + col as usize;
            result.extend(self.cells[idx].iter().copied());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::LivePatch;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn grid_10x10() -> HashMap<GeoKey, FrozenPatch> {
        let mut map = HashMap::new();
        for x in 0..10 {
            for y in 0..10 {
                let geometry = Geometry::Square {
                    center_x: dec(&x.to_string()),
                    center_y: dec(&y.to_string()),
                    width: dec("1"),
                };
                let live = LivePatch::new(Some(GeoKey::new()), Some(geometry), "cell");
                let frozen = live.freeze();
                map.insert(frozen.key().unwrap(), frozen);
            }
        }
        map
    }

    #[test]
    fn grid_too_large_is_rejected() {
        let mut map = HashMap::new();
        let a = Geometry::Square {
            center_x: dec("0"),
            center_y: dec("0"),
            width: dec("1"),
        };
        let b = Geometry::Square {
            center_x: dec("20000"),
            center_y: dec("0"),
            width: dec("1"),
        };
        for g in [a, b] {
            let live = LivePatch::new(Some(GeoKey::new()), Some(g), "cell");
            let frozen = live.freeze();
            map.insert(frozen.key().unwrap(), frozen);
        }
        let result = PatchSpatialIndex::build(&map);
        assert!(matches!(result, Err(PatchStoreError::GridTooLarge { .. })));
    }

    #[test]
    fn circle_query_over_10x10_grid_is_deterministic_and_bounded() {
        let map = grid_10x10();
        let index = PatchSpatialIndex::build(&map).unwrap();
        let query = Geometry::Circle {
            center_x: dec("5"),
            center_y: dec("5"),
            width: dec("4"),
        };

        let mut first: Vec<GeoKey> = index.query_candidates(&query);
        let mut second: Vec<GeoKey> = index.query_candidates(&query);
        first.sort_by_key(|k| k.to_string());
        second.sort_by_key(|k| k.to_string());
        assert_eq!(first, second);

        let mut unique = first.clone();
        unique.sort_by_key(|k| k.to_string());
        unique.dedup();
        assert_eq!(unique.len(), first.len(), "no duplicate candidates");
        assert!(first.len() >= 9);
    }

    #[test]
    fn degenerate_index_returns_every_key() {
        let mut map = HashMap::new();
        for _ in 0..3 {
            let live = LivePatch::new(Some(GeoKey::new()), None, "no-geometry");
            let frozen = live.freeze();
            map.insert(frozen.key().unwrap(), frozen);
        }
        let index = PatchSpatialIndex::build(&map).unwrap();
        let query = Geometry::Point {
            center_x: dec("0"),
            center_y: dec("0"),
        };
        assert_eq!(index.query_candidates(&query).len(), 3);
    }
}
