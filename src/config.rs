use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AtlasError;

/// Runtime configuration for the atlas model.
///
/// Read from a TOML file; every key is optional and falls back to the
/// values in [`AtlasConfig::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AtlasConfig {
    /// Cleaned fares/routes table (parquet or csv)
    pub fares_path: PathBuf,
    /// Geocoded route table used by the map, box and Sankey views
    pub routes_path: PathBuf,
    /// Default tracing directive when RUST_LOG is unset
    pub log_level: String,
    /// Rows shown on the Top-N pages
    pub top_n: usize,
    /// Routes picked for the box plot when nothing is selected
    pub default_route_count: usize,
    /// Marker diameter of the busiest city on the route map
    pub marker_reference_size: f64,
    pub route_line_opacity: f64,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            fares_path: PathBuf::from("datasets/_dataset.parquet"),
            routes_path: PathBuf::from("datasets/routes.parquet"),
            log_level: "info".to_string(),
            top_n: 10,
            default_route_count: 3,
            marker_reference_size: 40.0,
            route_line_opacity: 0.3,
        }
    }
}

impl AtlasConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, AtlasError> {
        let config: AtlasConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AtlasError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), AtlasError> {
        if self.top_n == 0 {
            return Err(AtlasError::InvalidData("top_n must be at least 1".into()));
        }
        if !(self.marker_reference_size > 0.0) {
            return Err(AtlasError::InvalidData(
                "marker_reference_size must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.route_line_opacity) {
            return Err(AtlasError::InvalidData(format!(
                "route_line_opacity must be within [0, 1], got {}",
                self.route_line_opacity
            )));
        }
        Ok(())
    }
}
