//! External-reader contract for seeding patch attributes from rasters and
//! tables.
//!
//! The core ships one concrete, in-scope reader ([`csv_reader::CsvDataReader`]);
//! NetCDF/GeoTIFF/precomputed-grid decoding stays an external collaborator
//! behind the [`ExternalDataReader`] trait, matching the black-box boundary
//! the source draws around file-format decoders. [`grid_resource`] still
//! implements the one piece of that boundary the core itself must interpret:
//! the fixed precomputed-grid header.

pub mod csv_reader;
pub mod grid_resource;
pub mod nearest_neighbor;

use std::path::Path;

use bigdecimal::BigDecimal;

use crate::error::{PatchStoreError, Result};
use crate::patch::FrozenPatch;
use crate::value::Value;

/// Closed set of formats the core recognizes by file extension. Anything
/// else is `UnsupportedFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    NetCdf,
    GeoTiff,
    Csv,
    PrecomputedGrid,
}

pub fn classify_format(path: &Path) -> Result<DataFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("nc") | Some("ncf") | Some("netcdf") | Some("nc4") => Ok(DataFormat::NetCdf),
        Some("tif") | Some("tiff") => Ok(DataFormat::GeoTiff),
        Some("csv") => Ok(DataFormat::Csv),
        Some("jshd") => Ok(DataFormat::PrecomputedGrid),
        _ => Err(PatchStoreError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// `{x, y, timestep}` dimension names plus the declared CRS and the
/// reader's native coordinate axes.
#[derive(Debug, Clone)]
pub struct SpatialDimensions {
    pub name_x: String,
    pub name_y: String,
    pub name_time: Option<String>,
    pub crs: String,
    pub coords_x: Vec<BigDecimal>,
    pub coords_y: Vec<BigDecimal>,
}

/// Uniform capability set every external-reader backend implements.
/// `open` takes ownership of the underlying resource; implementors release
/// it deterministically through `Drop` (the scope-guard pattern the spec
/// calls for).
pub trait ExternalDataReader: Sized {
    fn open(path: &Path) -> Result<Self>;

    fn set_dimensions(&mut self, x: &str, y: &str, time: Option<&str>);

    fn set_crs_code(&mut self, code: &str);

    fn variable_names(&self) -> Vec<String>;

    fn time_dimension_size(&self) -> Option<i32>;

    fn spatial_dimensions(&self) -> &SpatialDimensions;

    /// Nearest-index lookup in `coordsX`/`coordsY`. `Ok(None)` on
    /// out-of-bounds, NaN, or a sentinel fill value (not an error).
    /// `cancel`, when present and reporting `true`, aborts the read with
    /// `Cancelled` before any lookup work happens.
    fn read_value_at(
        &self,
        variable: &str,
        x: &BigDecimal,
        y: &BigDecimal,
        timestep: i64,
        cancel: Option<&dyn Fn() -> bool>,
    ) -> Result<Option<Value>>;
}

/// Opaque coordinate-reference-system transform (spec: "treated as an
/// opaque function"). Implementors bridge grid coordinates to whatever CRS
/// a reader's `coordsX`/`coordsY` are expressed in. `Sync` because
/// `GeoMapper::map_parallel` shares a transformer across worker threads.
pub trait CoordinateTransformer: Sync {
    fn transform(&self, x: &BigDecimal, y: &BigDecimal) -> (BigDecimal, BigDecimal);
}

/// No-op transform for readers already in the patch grid's own CRS.
pub struct IdentityTransformer;

impl CoordinateTransformer for IdentityTransformer {
    fn transform(&self, x: &BigDecimal, y: &BigDecimal) -> (BigDecimal, BigDecimal) {
        (x.clone(), y.clone())
    }
}

#[derive(Debug, Clone)]
pub struct GridExtents {
    pub top_left_x: BigDecimal,
    pub top_left_y: BigDecimal,
    pub bottom_right_x: BigDecimal,
    pub bottom_right_y: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct GridCrsDefinition {
    pub name: String,
    pub base_crs_code: String,
    pub extents: GridExtents,
    pub cell_size: BigDecimal,
    pub cell_size_unit: String,
}

/// Ordered collection of patches plus the grid CRS they were generated
/// against — the input to [`nearest_neighbor::GeoMapper`].
pub struct PatchSet<'a> {
    pub patches: Vec<&'a FrozenPatch>,
    pub crs: GridCrsDefinition,
}

/// Dispatches to whichever concrete reader `classify_format` selected.
/// Used by the inspection CLI, which only knows a path, not a reader type,
/// until it has looked at the extension.
pub enum ClassifiedReader {
    Csv(csv_reader::CsvDataReader),
    PrecomputedGrid(grid_resource::DataGridLayer),
}

impl ClassifiedReader {
    pub fn variable_names(&self) -> Vec<String> {
        match self {
            ClassifiedReader::Csv(reader) => reader.variable_names(),
            // The precomputed grid header carries one implicit value
            // stream per resource, exposed under a single variable name.
            ClassifiedReader::PrecomputedGrid(_) => vec!["value".to_string()],
        }
    }

    pub fn read_value_at(
        &self,
        variable: &str,
        x: &BigDecimal,
        y: &BigDecimal,
        timestep: i64,
    ) -> Result<Option<Value>> {
        match self {
            ClassifiedReader::Csv(reader) => reader.read_value_at(variable, x, y, timestep, None),
            ClassifiedReader::PrecomputedGrid(layer) => {
                let xi = crate::decimal::half_up_round_to_i64(x);
                let yi = crate::decimal::half_up_round_to_i64(y);
                Ok(layer
                    .value_at(xi, yi, timestep)
                    .map(|raw| Value::number(f64_to_bigdecimal(raw)).with_unit(layer.units.clone())))
            }
        }
    }
}

fn f64_to_bigdecimal(v: f64) -> BigDecimal {
    use std::str::FromStr;
    BigDecimal::from_str(&v.to_string()).unwrap_or_else(|_| BigDecimal::from(0))
}
