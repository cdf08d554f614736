//! `ExternalDataReader` over an in-memory CSV table.
//!
//! Rows are `x,y,timestep,variable,value[,unit]`. Malformed rows are
//! skipped with a warning rather than failing the whole load, following
//! `src/commands/load_data/aircraft_types.rs`'s embedded-CSV ingestion
//! pattern.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;
use serde::Deserialize;
use tracing::warn;

use super::{ExternalDataReader, SpatialDimensions};
use crate::error::{PatchStoreError, Result};
use crate::value::Value;

#[derive(Debug, Deserialize)]
struct CsvRow {
    x: String,
    y: String,
    timestep: i64,
    variable: String,
    value: String,
    #[serde(default)]
    unit: Option<String>,
}

/// Key into the row table: string-rendered `(x, y)` so lookups don't rely
/// on `BigDecimal`'s own hashing semantics across differently-scaled but
/// numerically equal values.
type RowKey = (String, String, i64, String);

pub struct CsvDataReader {
    #[allow(dead_code)]
    path: PathBuf,
    spatial: SpatialDimensions,
    variables: HashSet<String>,
    table: HashMap<RowKey, Value>,
}

impl CsvDataReader {
    fn nearest(axis: &[BigDecimal], query: &BigDecimal) -> Option<BigDecimal> {
        let query_f = query.to_f64()?;
        axis.iter()
            .min_by(|a, b| {
                let da = (a.to_f64().unwrap_or(f64::INFINITY) - query_f).abs();
                let db = (b.to_f64().unwrap_or(f64::INFINITY) - query_f).abs();
                da.total_cmp(&db)
            })
            .cloned()
    }
}

impl ExternalDataReader for CsvDataReader {
    fn open(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| PatchStoreError::ReaderIo {
            path: path.to_path_buf(),
            variable: None,
            source,
        })?;

        let mut reader = csv::Reader::from_reader(contents.as_bytes());
        let mut variables = HashSet::new();
        let mut x_set: Vec<BigDecimal> = Vec::new();
        let mut y_set: Vec<BigDecimal> = Vec::new();
        let mut table = HashMap::new();

        for result in reader.deserialize() {
            let row: CsvRow = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!("skipping malformed CSV row in {:?}: {}", path, e);
                    continue;
                }
            };

            let Ok(x) = BigDecimal::from_str(row.x.trim()) else {
                warn!("skipping row with invalid x {:?} in {:?}", row.x, path);
                continue;
            };
            let Ok(y) = BigDecimal::from_str(row.y.trim()) else {
                warn!("skipping row with invalid y {:?} in {:?}", row.y, path);
                continue;
            };
            let Ok(numeric) = BigDecimal::from_str(row.value.trim()) else {
                warn!("skipping row with invalid value {:?} in {:?}", row.value, path);
                continue;
            };

            if !x_set.contains(&x) {
                x_set.push(x.clone());
            }
            if !y_set.contains(&y) {
                y_set.push(y.clone());
            }
            variables.insert(row.variable.clone());

            let mut value = Value::number(numeric);
            if let Some(unit) = row.unit {
                value = value.with_unit(unit);
            }
            table.insert((x.to_string(), y.to_string(), row.timestep, row.variable), value);
        }

        x_set.sort_by(|a, b| a.cmp(b));
        y_set.sort_by(|a, b| a.cmp(b));

        Ok(Self {
            path: path.to_path_buf(),
            spatial: SpatialDimensions {
                name_x: "x".to_string(),
                name_y: "y".to_string(),
                name_time: None,
                crs: String::new(),
                coords_x: x_set,
                coords_y: y_set,
            },
            variables,
            table,
        })
    }

    fn set_dimensions(&mut self, x: &str, y: &str, time: Option<&str>) {
        self.spatial.name_x = x.to_string();
        self.spatial.name_y = y.to_string();
        self.spatial.name_time = time.map(|t| t.to_string());
    }

    fn set_crs_code(&mut self, code: &str) {
        self.spatial.crs = code.to_string();
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.iter().cloned().collect()
    }

    fn time_dimension_size(&self) -> Option<i32> {
        None
    }

    fn spatial_dimensions(&self) -> &SpatialDimensions {
        &self.spatial
    }

    fn read_value_at(
        &self,
        variable: &str,
        x: &BigDecimal,
        y: &BigDecimal,
        timestep: i64,
        cancel: Option<&dyn Fn() -> bool>,
    ) -> Result<Option<Value>> {
        if let Some(cancel) = cancel
            && cancel()
        {
            return Err(PatchStoreError::Cancelled);
        }

        let Some(nearest_x) = Self::nearest(&self.spatial.coords_x, x) else {
            return Ok(None);
        };
        let Some(nearest_y) = Self::nearest(&self.spatial.coords_y, y) else {
            return Ok(None);
        };

        let key = (nearest_x.to_string(), nearest_y.to_string(), timestep, variable.to_string());
        Ok(self.table.get(&key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn reader_from_csv(contents: &str) -> CsvDataReader {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        write!(file, "{contents}").unwrap();
        CsvDataReader::open(file.path()).unwrap()
    }

    #[test]
    fn exact_match_lookup_returns_value() {
        let reader = reader_from_csv("x,y,timestep,variable,value,unit\n0,0,1,moisture,12.5,pct\n");
        let value = reader
            .read_value_at("moisture", &BigDecimal::from(0), &BigDecimal::from(0), 1, None)
            .unwrap()
            .unwrap();
        assert_eq!(value.as_f64(), Some(12.5));
        assert_eq!(value.unit.as_deref(), Some("pct"));
    }

    #[test]
    fn nearest_neighbor_snaps_to_closest_coordinate() {
        let reader = reader_from_csv(
            "x,y,timestep,variable,value\n0,0,0,temp,10\n10,0,0,temp,20\n",
        );
        let value = reader
            .read_value_at("temp", &BigDecimal::from(3), &BigDecimal::from(0), 0, None)
            .unwrap()
            .unwrap();
        assert_eq!(value.as_f64(), Some(10.0));
    }

    #[test]
    fn unknown_variable_returns_none_not_error() {
        let reader = reader_from_csv("x,y,timestep,variable,value\n0,0,0,temp,10\n");
        let result = reader
            .read_value_at("humidity", &BigDecimal::from(0), &BigDecimal::from(0), 0, None)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn cancellation_aborts_the_read() {
        let reader = reader_from_csv("x,y,timestep,variable,value\n0,0,0,temp,10\n");
        let err = reader
            .read_value_at("temp", &BigDecimal::from(0), &BigDecimal::from(0), 0, Some(&|| true))
            .unwrap_err();
        assert!(matches!(err, PatchStoreError::Cancelled));
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let reader = reader_from_csv(
            "x,y,timestep,variable,value\n0,0,0,temp,10\nnot-a-number,0,0,temp,10\n",
        );
        assert_eq!(reader.spatial.coords_x.len(), 1);
    }
}
