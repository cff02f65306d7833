#[cfg(feature = "python")]
use std::path::PathBuf;

#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use pyo3_polars::PyDataFrame;
use tracing::info;

use crate::config::AtlasConfig;
use crate::dashboard::{self, DashboardView};
use crate::dataset::{FaresTable, RoutesTable};
use crate::error::AtlasError;
use crate::filters::FilterSelection;
#[cfg(feature = "python")]
use crate::filters::{MetricMode, Orientation};
use crate::palette::ColorMap;
use crate::pages::{FilterOptions, SummaryPages};

/// Loaded datasets plus everything derived from them once at startup.
///
/// Both tables are read-only after construction; every render allocates
/// its own intermediates.
#[cfg_attr(feature = "python", pyclass)]
pub struct AtlasModel {
    config: AtlasConfig,
    fares: FaresTable,
    routes: RoutesTable,
    colors: ColorMap,
    pages: SummaryPages,
    options: FilterOptions,
}

impl AtlasModel {
    /// Load both datasets named by `config`.
    pub fn open(config: AtlasConfig) -> Result<Self, AtlasError> {
        let fares = FaresTable::load(&config.fares_path)?;
        let routes = RoutesTable::load(&config.routes_path)?;
        Self::from_tables(config, fares, routes)
    }

    pub fn from_tables(
        config: AtlasConfig,
        fares: FaresTable,
        routes: RoutesTable,
    ) -> Result<Self, AtlasError> {
        let colors = dashboard::city_colors(&routes)?;
        let pages = SummaryPages::build(&fares, config.top_n)?;
        let options = FilterOptions::from_table(&routes)?;
        info!(
            fares = fares.height(),
            routes = routes.height(),
            cities = colors.len(),
            "atlas model ready"
        );
        Ok(Self {
            config,
            fares,
            routes,
            colors,
            pages,
            options,
        })
    }

    pub fn render(&self, filters: &FilterSelection) -> Result<DashboardView, AtlasError> {
        dashboard::render(&self.routes, &self.colors, filters, &self.config)
    }

    pub fn pages(&self) -> &SummaryPages {
        &self.pages
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl AtlasModel {
    /// Load the datasets.
    ///
    /// Args:
    ///     config_path: Optional TOML file; missing keys take defaults
    ///     fares_path: Overrides the configured fares table path
    ///     routes_path: Overrides the configured routes table path
    #[new]
    #[pyo3(signature = (config_path=None, fares_path=None, routes_path=None))]
    fn py_new(
        config_path: Option<String>,
        fares_path: Option<String>,
        routes_path: Option<String>,
    ) -> PyResult<Self> {
        let mut config = match config_path {
            Some(path) => AtlasConfig::from_file(path)?,
            None => AtlasConfig::default(),
        };
        if let Some(path) = fares_path {
            config.fares_path = PathBuf::from(path);
        }
        if let Some(path) = routes_path {
            config.routes_path = PathBuf::from(path);
        }
        crate::logging::init(&config.log_level);
        Ok(Self::open(config)?)
    }

    /// Rebuild the map, box and Sankey charts. Returns JSON with keys
    /// `map`, `boxplot` and `sankey`.
    ///
    /// Empty lists mean "no restriction". Unknown `metric` values fall back
    /// to "passengers".
    #[pyo3(name = "render", signature = (
        years = None,
        source_cities = None,
        dest_cities = None,
        routes = None,
        show_source = true,
        metric = "passengers",
    ))]
    fn py_render(
        &self,
        years: Option<Vec<i64>>,
        source_cities: Option<Vec<String>>,
        dest_cities: Option<Vec<String>>,
        routes: Option<Vec<String>>,
        show_source: bool,
        metric: &str,
    ) -> PyResult<String> {
        let filters = FilterSelection {
            years: years.unwrap_or_default(),
            source_cities: source_cities.unwrap_or_default(),
            dest_cities: dest_cities.unwrap_or_default(),
            routes: routes.unwrap_or_default(),
            orientation: Orientation::from_show_source(show_source),
            metric: MetricMode::parse(metric),
        };
        Ok(self.render(&filters)?.to_json()?)
    }

    /// Home, Graphs, Data Summary, Top-10 and Trend Analysis content as JSON.
    fn summary_pages(&self) -> PyResult<String> {
        Ok(serde_json::to_string(&self.pages).map_err(AtlasError::from)?)
    }

    /// Dropdown values as JSON.
    fn filter_options(&self) -> PyResult<String> {
        Ok(serde_json::to_string(&self.options).map_err(AtlasError::from)?)
    }

    #[getter]
    fn fares_df(&self) -> PyDataFrame {
        PyDataFrame(self.fares.df().clone())
    }

    #[getter]
    fn routes_df(&self) -> PyDataFrame {
        PyDataFrame(self.routes.df().clone())
    }
}
