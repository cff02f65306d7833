use serde::Serialize;
use tracing::warn;

use crate::dataset::RoutesTable;
use crate::error::AtlasError;
use crate::schema::{metric, routes};

/// Which numeric column drives the Sankey link magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricMode {
    #[default]
    Passengers,
    FareLargeCarrier,
    FareLowCarrier,
}

impl MetricMode {
    /// Unknown selectors fall back to `Passengers`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            metric::PASSENGERS => Self::Passengers,
            metric::FARE_LARGE_CARRIER | routes::FARE_LG => Self::FareLargeCarrier,
            metric::FARE_LOW_CARRIER | routes::FARE_LOW => Self::FareLowCarrier,
            other => {
                warn!(selector = other, "unknown metric mode, using passengers");
                Self::Passengers
            }
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Passengers => routes::PASSENGERS,
            Self::FareLargeCarrier => routes::FARE_LG,
            Self::FareLowCarrier => routes::FARE_LOW,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Passengers => "Passengers",
            Self::FareLargeCarrier => "Fare (largest carrier)",
            Self::FareLowCarrier => "Fare (lowest-fare carrier)",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passengers => metric::PASSENGERS,
            Self::FareLargeCarrier => metric::FARE_LARGE_CARRIER,
            Self::FareLowCarrier => metric::FARE_LOW_CARRIER,
        }
    }
}

/// Route map emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Source,
    Destination,
}

impl Orientation {
    pub fn from_show_source(show_source: bool) -> Self {
        if show_source {
            Self::Source
        } else {
            Self::Destination
        }
    }
}

/// One user interaction's worth of filter state. Empty lists mean
/// "no restriction".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    pub years: Vec<i64>,
    pub source_cities: Vec<String>,
    pub dest_cities: Vec<String>,
    pub routes: Vec<String>,
    pub orientation: Orientation,
    pub metric: MetricMode,
}

/// Filter state after the default-fill step: every dimension is explicit.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilters {
    pub years: Vec<i64>,
    pub source_cities: Vec<String>,
    pub dest_cities: Vec<String>,
    pub routes: Vec<String>,
    pub orientation: Orientation,
    pub metric: MetricMode,
}

impl FilterSelection {
    /// Replace every empty year/city dimension with all distinct values in
    /// the table. The route list is left as-is; an empty route selection
    /// is resolved later by the top-fare default.
    pub fn resolve(&self, table: &RoutesTable) -> Result<ResolvedFilters, AtlasError> {
        let years = if self.years.is_empty() {
            table.years()?
        } else {
            self.years.clone()
        };
        let source_cities = if self.source_cities.is_empty() {
            table.source_cities()?
        } else {
            self.source_cities.clone()
        };
        let dest_cities = if self.dest_cities.is_empty() {
            table.dest_cities()?
        } else {
            self.dest_cities.clone()
        };

        Ok(ResolvedFilters {
            years,
            source_cities,
            dest_cities,
            routes: self.routes.clone(),
            orientation: self.orientation,
            metric: self.metric,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::sample_routes;

    #[test]
    fn metric_parse_accepts_names_and_columns() {
        assert_eq!(MetricMode::parse("passengers"), MetricMode::Passengers);
        assert_eq!(MetricMode::parse("fare_large_carrier"), MetricMode::FareLargeCarrier);
        assert_eq!(MetricMode::parse("fare_lg"), MetricMode::FareLargeCarrier);
        assert_eq!(MetricMode::parse("fare_low"), MetricMode::FareLowCarrier);
    }

    #[test]
    fn unknown_metric_falls_back_to_passengers() {
        assert_eq!(MetricMode::parse("revenue"), MetricMode::Passengers);
        assert_eq!(MetricMode::parse(""), MetricMode::Passengers);
    }

    #[test]
    fn metric_columns_are_direct_lookups() {
        assert_eq!(MetricMode::Passengers.column(), routes::PASSENGERS);
        assert_eq!(MetricMode::FareLargeCarrier.column(), routes::FARE_LG);
        assert_eq!(MetricMode::FareLowCarrier.column(), routes::FARE_LOW);
    }

    #[test]
    fn empty_dimensions_are_filled_from_the_table() {
        let table = sample_routes();
        let resolved = FilterSelection {
            years: vec![2020],
            ..Default::default()
        }
        .resolve(&table)
        .unwrap();
        assert_eq!(resolved.years, vec![2020]);
        assert_eq!(resolved.source_cities, table.source_cities().unwrap());
        assert_eq!(resolved.dest_cities, table.dest_cities().unwrap());
        assert!(resolved.routes.is_empty());
    }
}
