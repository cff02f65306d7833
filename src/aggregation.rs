use std::collections::{BTreeMap, HashMap};

use polars::prelude::*;
use tracing::debug;

use crate::dataset::RoutesTable;
use crate::error::AtlasError;
use crate::filters::{MetricMode, ResolvedFilters};
use crate::schema::{agg, fares, routes};

/// Per-group reduction applied by [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Sum,
    Mean,
    Count,
    First,
}

impl Reducer {
    fn expr(self, column: &str) -> Expr {
        match self {
            Self::Sum => col(column).sum(),
            Self::Mean => col(column).mean(),
            Self::Count => col(column).count(),
            Self::First => col(column).first(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn descending(self) -> bool {
        matches!(self, Self::Descending)
    }
}

// ── Generic group-by ────────────────────────────────────────────────────────

/// Group `df` by `group_key` and reduce `value_column` into a `value` column.
///
/// One output row per distinct key, in first-seen order.
pub fn aggregate(
    df: &DataFrame,
    group_key: &str,
    value_column: &str,
    reducer: Reducer,
) -> Result<DataFrame, AtlasError> {
    let out = df
        .clone()
        .lazy()
        .group_by_stable([col(group_key)])
        .agg([reducer.expr(value_column).alias(agg::VALUE)])
        .collect()?;
    Ok(out)
}

/// Sort an aggregate by its `value` column. Ties keep their input order.
pub fn sort_by_value(df: &DataFrame, direction: SortDirection) -> Result<DataFrame, AtlasError> {
    let out = df.sort(
        [agg::VALUE],
        SortMultipleOptions::default()
            .with_order_descending(direction.descending())
            .with_maintain_order(true),
    )?;
    Ok(out)
}

/// Sum `value_column` per `group_key` and keep the first `n` groups in the
/// requested order.
pub fn top_n(
    df: &DataFrame,
    group_key: &str,
    value_column: &str,
    n: usize,
    direction: SortDirection,
) -> Result<Vec<(String, f64)>, AtlasError> {
    let grouped = aggregate(df, group_key, value_column, Reducer::Sum)?;
    let sorted = sort_by_value(&grouped, direction)?.head(Some(n));
    key_value_pairs(&sorted, group_key)
}

/// Like [`top_n`] but takes one representative row per distinct key instead
/// of summing. Used for distance rankings where every row of a route carries
/// the same distance.
pub fn top_n_distinct(
    df: &DataFrame,
    group_key: &str,
    value_column: &str,
    n: usize,
    direction: SortDirection,
) -> Result<Vec<(String, f64)>, AtlasError> {
    let grouped = aggregate(df, group_key, value_column, Reducer::First)?;
    let sorted = sort_by_value(&grouped, direction)?.head(Some(n));
    key_value_pairs(&sorted, group_key)
}

/// Read an aggregate back as `(key, value)` pairs.
pub fn key_value_pairs(df: &DataFrame, key: &str) -> Result<Vec<(String, f64)>, AtlasError> {
    let keys = string_values(df, key)?;
    let values = f64_values(df, agg::VALUE)?;
    Ok(keys.into_iter().zip(values).collect())
}

// ── Yearly series ───────────────────────────────────────────────────────────

/// One line of a year-keyed trend chart.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSeries {
    pub key: String,
    pub points: Vec<(i64, f64)>,
}

/// Reduce `value_column` per year, ascending by year.
pub fn yearly_totals(
    df: &DataFrame,
    value_column: &str,
    reducer: Reducer,
) -> Result<Vec<(i64, f64)>, AtlasError> {
    let out = df
        .clone()
        .lazy()
        .group_by([col(fares::YEAR)])
        .agg([reducer.expr(value_column).alias(agg::VALUE)])
        .sort([fares::YEAR], SortMultipleOptions::default())
        .collect()?;
    let years = i64_values(&out, fares::YEAR)?;
    let values = f64_values(&out, agg::VALUE)?;
    Ok(years.into_iter().zip(values).collect())
}

/// Reduce `value_column` per (`series_column`, year). Rows with a null series
/// key are dropped. Series come back keyed by their string form.
pub fn yearly_series(
    df: &DataFrame,
    series_column: &str,
    value_column: &str,
    reducer: Reducer,
) -> Result<BTreeMap<String, YearSeries>, AtlasError> {
    let out = df
        .clone()
        .lazy()
        .filter(col(series_column).is_not_null())
        .group_by([
            col(series_column).cast(DataType::String).alias(agg::SERIES),
            col(fares::YEAR),
        ])
        .agg([reducer.expr(value_column).alias(agg::VALUE)])
        .sort([agg::SERIES, fares::YEAR], SortMultipleOptions::default())
        .collect()?;

    let keys = string_values(&out, agg::SERIES)?;
    let years = i64_values(&out, fares::YEAR)?;
    let values = f64_values(&out, agg::VALUE)?;

    let mut series: BTreeMap<String, YearSeries> = BTreeMap::new();
    for ((key, year), value) in keys.into_iter().zip(years).zip(values) {
        series
            .entry(key.clone())
            .or_insert_with(|| YearSeries {
                key,
                points: Vec::new(),
            })
            .points
            .push((year, value));
    }
    Ok(series)
}

// ── Geo route filtering and grouping ────────────────────────────────────────

/// Which end of a route a city view is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl Side {
    fn columns(self) -> (&'static str, &'static str, &'static str, &'static str) {
        match self {
            Self::Source => (
                routes::CITY1,
                routes::START_LAT,
                routes::START_LON,
                routes::AIRPORT_1,
            ),
            Self::Destination => (
                routes::CITY2,
                routes::END_LAT,
                routes::END_LON,
                routes::AIRPORT_2,
            ),
        }
    }

    fn role_label(self) -> &'static str {
        match self {
            Self::Source => "From",
            Self::Destination => "To",
        }
    }
}

/// A city on the route map.
#[derive(Debug, Clone, PartialEq)]
pub struct CityPoint {
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    pub airport: String,
    pub flights: usize,
    pub mean_passengers: f64,
    pub hover: String,
}

/// One row of the filtered table drawn as a line on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment {
    pub source_city: String,
    pub start: (f64, f64),
    pub end: (f64, f64),
}

/// One row of the filtered table as a Sankey flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRow {
    pub source: String,
    pub target: String,
    pub value: f64,
}

/// Routes shown in the box plot. `is_default` is set when the routes were
/// picked by the top-mean-fare rule rather than by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSelection {
    pub routes: Vec<String>,
    pub is_default: bool,
}

/// Restrict the routes table to the resolved years and cities.
pub fn filter_routes(
    table: &RoutesTable,
    filters: &ResolvedFilters,
) -> Result<DataFrame, AtlasError> {
    let years = Series::new("years".into(), &filters.years);
    let sources = Series::new("source_cities".into(), &filters.source_cities);
    let dests = Series::new("dest_cities".into(), &filters.dest_cities);

    let df = table
        .df()
        .clone()
        .lazy()
        .filter(
            col(routes::YEAR)
                .is_in(lit(years), false)
                .and(col(routes::CITY1).is_in(lit(sources), false))
                .and(col(routes::CITY2).is_in(lit(dests), false)),
        )
        .collect()?;

    if df.height() == 0 {
        debug!("filter combination matched no routes");
    }
    Ok(df)
}

/// Group the filtered routes by city on one side, attaching the mean
/// passenger count, first airport code, flight count and hover text.
pub fn group_cities(filtered: &DataFrame, side: Side) -> Result<Vec<CityPoint>, AtlasError> {
    let (city_col, lat_col, lon_col, airport_col) = side.columns();

    let grouped = filtered
        .clone()
        .lazy()
        .group_by_stable([col(city_col), col(lat_col), col(lon_col)])
        .agg([
            col(routes::PASSENGERS).mean().alias(agg::MEAN_PASSENGERS),
            col(airport_col).first().alias(agg::AIRPORT),
        ])
        .collect()?;

    // Flight count is rows per city, independent of the coordinate split.
    let mut flights: HashMap<String, usize> = HashMap::new();
    for city in string_values(filtered, city_col)? {
        *flights.entry(city).or_insert(0) += 1;
    }

    let cities = string_values(&grouped, city_col)?;
    let lats = f64_values(&grouped, lat_col)?;
    let lons = f64_values(&grouped, lon_col)?;
    let means = f64_values(&grouped, agg::MEAN_PASSENGERS)?;
    let airports = string_values(&grouped, agg::AIRPORT)?;

    let points = cities
        .into_iter()
        .zip(lats)
        .zip(lons)
        .zip(means)
        .zip(airports)
        .map(|((((city, lat), lon), mean_passengers), airport)| {
            let count = flights.get(&city).copied().unwrap_or(0);
            let hover = hover_text(side, &city, count, mean_passengers, &airport);
            CityPoint {
                city,
                lat,
                lon,
                airport,
                flights: count,
                mean_passengers,
                hover,
            }
        })
        .collect();
    Ok(points)
}

fn hover_text(side: Side, city: &str, flights: usize, mean_passengers: f64, airport: &str) -> String {
    format!(
        "{}: {}<br>Total Flights: {}<br>Average Passengers: {}<br>Airport: {}",
        side.role_label(),
        city,
        flights,
        mean_passengers.round(),
        airport
    )
}

/// Every filtered row as an origin → destination segment.
pub fn route_segments(filtered: &DataFrame) -> Result<Vec<RouteSegment>, AtlasError> {
    let cities = string_values(filtered, routes::CITY1)?;
    let start_lat = f64_values(filtered, routes::START_LAT)?;
    let start_lon = f64_values(filtered, routes::START_LON)?;
    let end_lat = f64_values(filtered, routes::END_LAT)?;
    let end_lon = f64_values(filtered, routes::END_LON)?;

    Ok((0..cities.len())
        .map(|i| RouteSegment {
            source_city: cities[i].clone(),
            start: (start_lat[i], start_lon[i]),
            end: (end_lat[i], end_lon[i]),
        })
        .collect())
}

/// Explicit routes win; otherwise the `k` routes with the highest mean fare.
pub fn select_routes(
    filtered: &DataFrame,
    explicit: &[String],
    k: usize,
) -> Result<RouteSelection, AtlasError> {
    if !explicit.is_empty() {
        return Ok(RouteSelection {
            routes: explicit.to_vec(),
            is_default: false,
        });
    }

    let by_fare = aggregate(filtered, routes::ROUTE, routes::FARE, Reducer::Mean)?;
    let top = sort_by_value(&by_fare, SortDirection::Descending)?.head(Some(k));
    Ok(RouteSelection {
        routes: string_values(&top, routes::ROUTE)?,
        is_default: true,
    })
}

/// Fares per selected route, in selection order. Routes with no rows in the
/// filtered table get an empty list.
pub fn route_fares(
    filtered: &DataFrame,
    selection: &RouteSelection,
) -> Result<Vec<(String, Vec<f64>)>, AtlasError> {
    let labels = string_values(filtered, routes::ROUTE)?;
    let fares = f64_values(filtered, routes::FARE)?;

    let mut by_route: HashMap<&str, Vec<f64>> = HashMap::new();
    for (label, fare) in labels.iter().zip(fares) {
        by_route.entry(label.as_str()).or_default().push(fare);
    }

    Ok(selection
        .routes
        .iter()
        .map(|r| (r.clone(), by_route.get(r.as_str()).cloned().unwrap_or_default()))
        .collect())
}

/// One flow per filtered row, valued by the metric's column.
pub fn flow_rows(filtered: &DataFrame, metric: MetricMode) -> Result<Vec<FlowRow>, AtlasError> {
    let sources = string_values(filtered, routes::CITY1)?;
    let targets = string_values(filtered, routes::CITY2)?;
    let values = f64_values(filtered, metric.column())?;

    Ok(sources
        .into_iter()
        .zip(targets)
        .zip(values)
        .map(|((source, target), value)| FlowRow {
            source,
            target,
            value,
        })
        .collect())
}

// ── Column extraction ───────────────────────────────────────────────────────

pub(crate) fn f64_values(df: &DataFrame, column: &str) -> Result<Vec<f64>, AtlasError> {
    let c = df.column(column)?.cast(&DataType::Float64)?;
    Ok(c.f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

pub(crate) fn i64_values(df: &DataFrame, column: &str) -> Result<Vec<i64>, AtlasError> {
    let c = df.column(column)?.cast(&DataType::Int64)?;
    Ok(c.i64()?.into_iter().map(|v| v.unwrap_or(0)).collect())
}

pub(crate) fn string_values(df: &DataFrame, column: &str) -> Result<Vec<String>, AtlasError> {
    let c = df.column(column)?.cast(&DataType::String)?;
    Ok(c.str()?
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect())
}
