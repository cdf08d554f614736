//! Precomputed-grid resource format: a fixed, big-endian binary
//! header the core interprets directly, followed by a black-box stream of
//! `f64` values. Grounded on `src/elevation/hgt.rs`'s bounds-checked
//! `from_be_bytes` tile reader, adapted from a single 16-bit elevation
//! raster to this crate's versioned, multi-axis header.

use std::convert::TryInto;

use crate::error::{PatchStoreError, Result};

const MAX_UNITS_LEN: i32 = 200;
const HEADER_FIXED_LEN: usize = 56;
const SUPPORTED_VERSION: i32 = 1;

/// A decoded precomputed grid: bounds over x, y, and timestep, plus the
/// row-major value array (x-major outer, then y, then timestep).
#[derive(Debug, Clone, PartialEq)]
pub struct DataGridLayer {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
    pub min_timestep: i64,
    pub max_timestep: i64,
    pub units: String,
    values: Vec<f64>,
}

impl DataGridLayer {
    pub fn new(
        min_x: i64,
        max_x: i64,
        min_y: i64,
        max_y: i64,
        min_timestep: i64,
        max_timestep: i64,
        units: String,
        values: Vec<f64>,
    ) -> Result<Self> {
        let layer = Self {
            min_x,
            max_x,
            min_y,
            max_y,
            min_timestep,
            max_timestep,
            units,
            values,
        };
        if layer.values.len() != layer.expected_value_count() {
            return Err(PatchStoreError::InvalidCoordinate {
                path: std::path::PathBuf::new(),
                context: "precomputed grid value count".to_string(),
                value: layer.values.len().to_string(),
            });
        }
        Ok(layer)
    }

    fn expected_value_count(&self) -> usize {
        let xs = (self.max_x - self.min_x + 1).max(0) as usize;
        let ys = (self.max_y - self.min_y + 1).max(0) as usize;
        let ts = (self.max_timestep - self.min_timestep + 1).max(0) as usize;
        xs * ys * ts
    }

    /// Bounds-checked lookup by absolute grid coordinates. `None` when out
    /// of the grid's declared extent — the spec's `OutOfBounds` is
    /// "returns empty", not an error.
    pub fn value_at(&self, x: i64, y: i64, timestep: i64) -> Option<f64> {
        if x < self.min_x || x > self.max_x || y < self.min_y || y > self.max_y {
            return None;
        }
        if timestep < self.min_timestep || timestep > self.max_timestep {
            return None;
        }
        let ys = (self.max_y - self.min_y + 1) as usize;
        let ts = (self.max_timestep - self.min_timestep + 1) as usize;
        let xi = (x - self.min_x) as usize;
        let yi = (y - self.min_y) as usize;
        let ti = (timestep - self.min_timestep) as usize;
        let index = (xi * ys + yi) * ts + ti;
        self.values.get(index).copied()
    }

    pub fn decode(path: &std::path::Path, bytes: &[u8]) -> Result<Self> {
        let corrupt = |context: &str| PatchStoreError::InvalidCoordinate {
            path: path.to_path_buf(),
            context: context.to_string(),
            value: format!("{} bytes", bytes.len()),
        };

        if bytes.len() < HEADER_FIXED_LEN {
            return Err(corrupt("header"));
        }

        let version = i32::from_be_bytes(bytes[0..4].try_into().unwrap());
        if version != SUPPORTED_VERSION {
            return Err(corrupt("version"));
        }

        let min_x = i64::from_be_bytes(bytes[4..12].try_into().unwrap());
        let max_x = i64::from_be_bytes(bytes[12..20].try_into().unwrap());
        let min_y = i64::from_be_bytes(bytes[20..28].try_into().unwrap());
        let max_y = i64::from_be_bytes(bytes[28..36].try_into().unwrap());
        let min_timestep = i64::from_be_bytes(bytes[36..44].try_into().unwrap());
        let max_timestep = i64::from_be_bytes(bytes[44..52].try_into().unwrap());
        let units_len = i32::from_be_bytes(bytes[52..56].try_into().unwrap());

        if units_len < 0 || units_len > MAX_UNITS_LEN {
            return Err(corrupt("unitsLen"));
        }
        let units_len = units_len as usize;

        let units_start = HEADER_FIXED_LEN;
        let units_end = units_start + units_len;
        if bytes.len() < units_end {
            return Err(corrupt("units"));
        }
        let units = String::from_utf8(bytes[units_start..units_end].to_vec())
            .map_err(|_| corrupt("units (invalid UTF-8)"))?;

        let values_start = units_end;
        let remaining = &bytes[values_start..];
        if remaining.len() % 8 != 0 {
            return Err(corrupt("value stream (not a multiple of 8 bytes)"));
        }
        let values: Vec<f64> = remaining
            .chunks_exact(8)
            .map(|chunk| f64::from_be_bytes(chunk.try_into().unwrap()))
            .collect();

        let layer = Self {
            min_x,
            max_x,
            min_y,
            max_y,
            min_timestep,
            max_timestep,
            units,
            values,
        };
        if layer.values.len() != layer.expected_value_count() {
            return Err(corrupt("value count does not match declared extent"));
        }
        Ok(layer)
    }

    pub fn encode(&self) -> Vec<u8> {
        let units_bytes = self.units.as_bytes();
        let mut out = Vec::with_capacity(HEADER_FIXED_LEN + units_bytes.len() + self.values.len() * 8);
        out.extend_from_slice(&SUPPORTED_VERSION.to_be_bytes());
        out.extend_from_slice(&self.min_x.to_be_bytes());
        out.extend_from_slice(&self.max_x.to_be_bytes());
        out.extend_from_slice(&self.min_y.to_be_bytes());
        out.extend_from_slice(&self.max_y.to_be_bytes());
        out.extend_from_slice(&self.min_timestep.to_be_bytes());
        out.extend_from_slice(&self.max_timestep.to_be_bytes());
        out.extend_from_slice(&(units_bytes.len() as i32).to_be_bytes());
        out.extend_from_slice(units_bytes);
        for v in &self.values {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn round_trip_preserves_values_and_units() {
        // 3x3x3 grid, one non-zero value, rest zero.
        let mut values = vec![0.0_f64; 27];
        values[13] = 42.5; // x=1,y=1,t=1 -> index (1*3+1)*3+1 = 13
        let layer = DataGridLayer::new(0, 2, 0, 2, 0, 2, "meters".to_string(), values).unwrap();

        let bytes = layer.encode();
        let decoded = DataGridLayer::decode(&PathBuf::from("test.jshd"), &bytes).unwrap();

        assert_eq!(decoded.units, "meters");
        assert_eq!(decoded.value_at(1, 1, 1), Some(42.5));
        assert_eq!(decoded.value_at(0, 0, 0), Some(0.0));
        assert_eq!(decoded.value_at(5, 5, 5), None);
    }

    #[test]
    fn truncated_header_is_reported_as_corrupt() {
        let err = DataGridLayer::decode(&PathBuf::from("bad.jshd"), &[0u8; 10]).unwrap_err();
        assert!(matches!(err, PatchStoreError::InvalidCoordinate { .. }));
    }

    #[test]
    fn mismatched_value_count_is_reported_as_corrupt() {
        let layer = DataGridLayer::new(0, 0, 0, 0, 0, 0, "m".to_string(), vec![1.0]).unwrap();
        let mut bytes = layer.encode();
        bytes.extend_from_slice(&9.0_f64.to_be_bytes()); // extra trailing value
        let err = DataGridLayer::decode(&PathBuf::from("bad.jshd"), &bytes).unwrap_err();
        assert!(matches!(err, PatchStoreError::InvalidCoordinate { .. }));
    }
}
