//! TOML-loadable configuration for the external-reader seeding workflow.
//! The core store itself takes no config —
//! every constructor takes explicit arguments — this is purely for the
//! `GeoMapper` seeding step, mirroring the snake_case TOML config layer in
//! `src/ingest_config.rs` (load/save via `serde`+`toml`, atomic save via a
//! `.tmp` + rename).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub cell_size: BigDecimal,
    pub crs_code: String,
    #[serde(default = "default_interpolation")]
    pub interpolation: InterpolationStrategy,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationStrategy {
    NearestNeighbor,
}

fn default_interpolation() -> InterpolationStrategy {
    InterpolationStrategy::NearestNeighbor
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    pub variable: String,
    #[serde(default)]
    pub dimension_x: Option<String>,
    #[serde(default)]
    pub dimension_y: Option<String>,
    #[serde(default)]
    pub dimension_time: Option<String>,
}

impl GridConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
        let config: GridConfig = toml::from_str(&contents).with_context(|| format!("failed to parse {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize GridConfig to TOML")?;
        let tmp_path = path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, &contents).with_context(|| format!("failed to write {:?}", tmp_path))?;
        std::fs::rename(&tmp_path, path).with_context(|| format!("failed to rename {:?} to {:?}", tmp_path, path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn config_roundtrips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.toml");

        let config = GridConfig {
            cell_size: BigDecimal::from_str("0.5").unwrap(),
            crs_code: "EPSG:4326".to_string(),
            interpolation: InterpolationStrategy::NearestNeighbor,
            sources: vec![SourceConfig {
                path: PathBuf::from("moisture.csv"),
                variable: "moisture".to_string(),
                dimension_x: Some("x".to_string()),
                dimension_y: Some("y".to_string()),
                dimension_time: None,
            }],
        };

        config.save(&path).unwrap();
        let loaded = GridConfig::load(&path).unwrap();

        assert_eq!(loaded.crs_code, "EPSG:4326");
        assert_eq!(loaded.sources.len(), 1);
        assert_eq!(loaded.sources[0].variable, "moisture");
    }

    #[test]
    fn interpolation_defaults_to_nearest_neighbor_when_absent() {
        let toml_str = "cell_size = \"1\"\ncrs_code = \"EPSG:4326\"\n";
        let config: GridConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.interpolation, InterpolationStrategy::NearestNeighbor);
    }
}
