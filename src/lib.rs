pub mod aggregation;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod filters;
pub mod logging;
pub mod model;
pub mod pages;
pub mod palette;
pub mod sankey;
pub mod schema;

pub use config::AtlasConfig;
pub use dashboard::DashboardView;
pub use error::AtlasError;
pub use filters::{FilterSelection, MetricMode, Orientation};
pub use model::AtlasModel;

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;
    use pyo3::types::PyModule;

    use crate::model::AtlasModel;
    use crate::schema;

    /// Export schema constants as Python submodules
    fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Fares
        let fares = PyModule::new(m.py(), "fares")?;
        fares.add("YEAR", schema::fares::YEAR)?;
        fares.add("QUARTER", schema::fares::QUARTER)?;
        fares.add("ORIGIN_CITY", schema::fares::ORIGIN_CITY)?;
        fares.add("DESTINATION_CITY", schema::fares::DESTINATION_CITY)?;
        fares.add("PASSENGER_COUNT", schema::fares::PASSENGER_COUNT)?;
        fares.add("AVERAGE_FARE", schema::fares::AVERAGE_FARE)?;
        fares.add("ROUTE", schema::fares::ROUTE)?;
        fares.add("DISTANCE_BUCKET", schema::fares::DISTANCE_BUCKET)?;
        m.add_submodule(&fares)?;

        // Routes
        let routes = PyModule::new(m.py(), "routes")?;
        routes.add("YEAR", schema::routes::YEAR)?;
        routes.add("CITY1", schema::routes::CITY1)?;
        routes.add("CITY2", schema::routes::CITY2)?;
        routes.add("PASSENGERS", schema::routes::PASSENGERS)?;
        routes.add("FARE", schema::routes::FARE)?;
        routes.add("FARE_LG", schema::routes::FARE_LG)?;
        routes.add("FARE_LOW", schema::routes::FARE_LOW)?;
        routes.add("ROUTE", schema::routes::ROUTE)?;
        m.add_submodule(&routes)?;

        // Metric
        let metric = PyModule::new(m.py(), "metric")?;
        metric.add("PASSENGERS", schema::metric::PASSENGERS)?;
        metric.add("FARE_LARGE_CARRIER", schema::metric::FARE_LARGE_CARRIER)?;
        metric.add("FARE_LOW_CARRIER", schema::metric::FARE_LOW_CARRIER)?;
        m.add_submodule(&metric)?;

        Ok(())
    }

    #[pymodule]
    fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_class::<AtlasModel>()?;
        add_schema_exports(m)?;
        Ok(())
    }
}
