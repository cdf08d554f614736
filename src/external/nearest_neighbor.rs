//! Nearest-neighbor seeding strategy and `GeoMapper`.
//!
//! Parallel mode opens one reader per rayon worker via `map_init`, the
//! same "thread-local resource, owned for the worker's batch" shape as
//! `src/commands/aggregate_coverage.rs`'s `par_iter` aggregation, adapted
//! from a fold-reduce accumulator to a per-item mapped output.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use rayon::prelude::*;

use super::{CoordinateTransformer, ExternalDataReader, PatchSet};
use crate::error::Result;
use crate::geokey::GeoKey;
use crate::value::Value;

/// `variableName -> timestep -> GeoKey -> Value`.
pub type SeededAttributes = HashMap<String, HashMap<i64, HashMap<GeoKey, Value>>>;

pub struct NearestNeighborStrategy<T: CoordinateTransformer> {
    transformer: T,
}

impl<T: CoordinateTransformer> NearestNeighborStrategy<T> {
    pub fn new(transformer: T) -> Self {
        Self { transformer }
    }

    fn lookup<R: ExternalDataReader>(
        &self,
        reader: &R,
        variable: &str,
        center_x: &BigDecimal,
        center_y: &BigDecimal,
        timestep: i64,
    ) -> Result<Option<Value>> {
        let (rx, ry) = self.transformer.transform(center_x, center_y);
        reader.read_value_at(variable, &rx, &ry, timestep, None)
    }
}

pub struct GeoMapper<R: ExternalDataReader, T: CoordinateTransformer> {
    strategy: NearestNeighborStrategy<T>,
    // `fn() -> R`, not `R`, so this marker never affects the struct's own
    // Send/Sync auto-trait derivation regardless of R's.
    _reader: std::marker::PhantomData<fn() -> R>,
}

impl<R: ExternalDataReader, T: CoordinateTransformer> GeoMapper<R, T> {
    pub fn new(strategy: NearestNeighborStrategy<T>) -> Self {
        Self {
            strategy,
            _reader: std::marker::PhantomData,
        }
    }

    /// One reader, used sequentially for every patch and every requested
    /// variable/timestep.
    pub fn map_sequential(
        &self,
        patch_set: &PatchSet<'_>,
        reader: &R,
        variables: &[String],
        timesteps: &[i64],
    ) -> Result<SeededAttributes> {
        let mut output: SeededAttributes = HashMap::new();
        for variable in variables {
            for &timestep in timesteps {
                for patch in &patch_set.patches {
                    let Some(key) = patch.key() else { continue };
                    let Some(geometry) = patch.geometry() else { continue };
                    if let Some(value) =
                        self.strategy
                            .lookup(reader, variable, geometry.center_x(), geometry.center_y(), timestep)?
                    {
                        output
                            .entry(variable.clone())
                            .or_default()
                            .entry(timestep)
                            .or_default()
                            .insert(key, value);
                    }
                }
            }
        }
        Ok(output)
    }

    /// Opens one reader per rayon worker (closed when that worker's batch
    /// finishes) rather than sharing a single reader across threads —
    /// required because readers aren't generally safe for concurrent
    /// mutation.
    pub fn map_parallel(
        &self,
        patch_set: &PatchSet<'_>,
        open_reader: impl Fn() -> Result<R> + Sync + Send,
        variables: &[String],
        timesteps: &[i64],
    ) -> Result<SeededAttributes>
    where
        R: Send,
        T: Send,
    {
        let mut output: SeededAttributes = HashMap::new();

        for variable in variables {
            for &timestep in timesteps {
                let rows: Vec<(GeoKey, Value)> = patch_set
                    .patches
                    .par_iter()
                    .map_init(
                        || open_reader(),
                        |reader, patch| -> Option<(GeoKey, Value)> {
                            let reader = reader.as_ref().ok()?;
                            let key = patch.key()?;
                            let geometry = patch.geometry()?;
                            let value = self
                                .strategy
                                .lookup(reader, variable, geometry.center_x(), geometry.center_y(), timestep)
                                .ok()??;
                            Some((key, value))
                        },
                    )
                    .flatten()
                    .collect();

                let slot = output.entry(variable.clone()).or_default().entry(timestep).or_default();
                for (key, value) in rows {
                    slot.insert(key, value);
                }
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{csv_reader::CsvDataReader, IdentityTransformer};
    use crate::geometry::Geometry;
    use crate::patch::LivePatch;
    use std::io::Write;

    fn csv_reader_with(contents: &str) -> CsvDataReader {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        write!(file, "{contents}").unwrap();
        CsvDataReader::open(file.path()).unwrap()
    }

    #[test]
    fn sequential_mapping_seeds_every_patch_with_geometry() {
        let reader = csv_reader_with("x,y,timestep,variable,value\n0,0,0,moisture,1.0\n5,5,0,moisture,2.0\n");

        let a = LivePatch::new(
            Some(GeoKey::new()),
            Some(Geometry::Point {
                center_x: BigDecimal::from(0),
                center_y: BigDecimal::from(0),
            }),
            "soil",
        )
        .freeze();
        let b = LivePatch::new(None, None, "no-geometry").freeze();

        let patch_set = PatchSet {
            patches: vec![&a, &b],
            crs: super::super::GridCrsDefinition {
                name: "test".to_string(),
                base_crs_code: "EPSG:4326".to_string(),
                extents: super::super::GridExtents {
                    top_left_x: BigDecimal::from(0),
                    top_left_y: BigDecimal::from(0),
                    bottom_right_x: BigDecimal::from(10),
                    bottom_right_y: BigDecimal::from(10),
                },
                cell_size: BigDecimal::from(1),
                cell_size_unit: "m".to_string(),
            },
        };

        let strategy = NearestNeighborStrategy::new(IdentityTransformer);
        let mapper: GeoMapper<CsvDataReader, _> = GeoMapper::new(strategy);
        let result = mapper
            .map_sequential(&patch_set, &reader, &["moisture".to_string()], &[0])
            .unwrap();

        let at_t0 = &result["moisture"][&0];
        assert_eq!(at_t0.len(), 1);
        assert!(at_t0.contains_key(&a.key().unwrap()));
    }
}
