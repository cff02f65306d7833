//! Non-interactive dashboard pages, computed once from the fares table.
use std::collections::HashSet;

use polars::prelude::DataFrame;
use serde::Serialize;

use crate::aggregation::{self, Reducer, SortDirection, YearSeries};
use crate::charts::{self, ChartSpec};
use crate::dataset::{distinct_strings, FaresTable, RoutesTable};
use crate::error::AtlasError;
use crate::palette;
use crate::schema::fares;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub column: String,
    pub non_null: usize,
    pub unique: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityCounts {
    pub cities: usize,
    pub airports: usize,
    pub carriers: usize,
    pub routes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTotal {
    /// Year, or "Total" for the closing row
    pub year: String,
    pub passengers: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub columns: Vec<ColumnProfile>,
    pub entities: EntityCounts,
    pub passengers_by_year: Vec<YearTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPages {
    pub home: Vec<ChartSpec>,
    pub graphs: Vec<ChartSpec>,
    pub data_summary: DataSummary,
    pub top10: Vec<ChartSpec>,
    pub trends: Vec<ChartSpec>,
}

/// Dropdown contents for the interactive view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub years: Vec<i64>,
    pub source_cities: Vec<String>,
    pub dest_cities: Vec<String>,
    pub routes: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &RoutesTable) -> Result<Self, AtlasError> {
        Ok(Self {
            years: table.years()?,
            source_cities: table.source_cities()?,
            dest_cities: table.dest_cities()?,
            routes: table.routes()?,
        })
    }
}

impl SummaryPages {
    pub fn build(table: &FaresTable, top_n: usize) -> Result<Self, AtlasError> {
        Ok(Self {
            home: home_page(table)?,
            graphs: graphs_page(table)?,
            data_summary: data_summary(table)?,
            top10: top_page(table, top_n)?,
            trends: trends_page(table)?,
        })
    }
}

fn union_count(df: &DataFrame, a: &str, b: &str) -> Result<usize, AtlasError> {
    let mut all: HashSet<String> = distinct_strings(df, a)?.into_iter().collect();
    all.extend(distinct_strings(df, b)?);
    Ok(all.len())
}

fn home_page(table: &FaresTable) -> Result<Vec<ChartSpec>, AtlasError> {
    let df = table.df();
    let passengers: f64 = aggregation::f64_values(df, fares::PASSENGER_COUNT)?
        .iter()
        .sum();
    let fares_list = aggregation::f64_values(df, fares::AVERAGE_FARE)?;
    let mean_fare = if fares_list.is_empty() {
        0.0
    } else {
        fares_list.iter().sum::<f64>() / fares_list.len() as f64
    };
    let routes = distinct_strings(df, fares::ROUTE)?.len();
    let cities = union_count(df, fares::ORIGIN_CITY, fares::DESTINATION_CITY)?;

    Ok(vec![
        charts::indicator("Total Passengers", passengers),
        charts::indicator("Distinct Routes", routes as f64),
        charts::indicator("Cities Served", cities as f64),
        charts::indicator("Average Fare", mean_fare),
    ])
}

fn graphs_page(table: &FaresTable) -> Result<Vec<ChartSpec>, AtlasError> {
    let df = table.df();
    let passengers = aggregation::yearly_totals(df, fares::PASSENGER_COUNT, Reducer::Sum)?;

    let by_quarter: Vec<YearSeries> =
        aggregation::yearly_series(df, fares::QUARTER, fares::AVERAGE_FARE, Reducer::Mean)?
            .into_values()
            .map(|s| YearSeries {
                key: format!("Q{}", s.key),
                points: s.points,
            })
            .collect();

    let by_bucket: Vec<YearSeries> = aggregation::yearly_series(
        df,
        fares::DISTANCE_BUCKET,
        fares::AVERAGE_FARE,
        Reducer::Mean,
    )?
    .into_values()
    .collect();

    Ok(vec![
        charts::trend_lines(
            "Passenger Count Trends",
            "Year",
            "Passengers",
            &[YearSeries {
                key: "Passengers".to_string(),
                points: passengers,
            }],
            &[("Passengers", palette::QUALITATIVE[0])],
        ),
        charts::trend_lines(
            "Average Fare by Quarter",
            "Year",
            "Average Fare",
            &by_quarter,
            &palette::QUARTER,
        ),
        charts::trend_lines(
            "Average Fare by Distance",
            "Year",
            "Average Fare",
            &by_bucket,
            &palette::DISTANCE_BUCKET,
        ),
    ])
}

fn data_summary(table: &FaresTable) -> Result<DataSummary, AtlasError> {
    let df = table.df();

    let columns = df
        .get_columns()
        .iter()
        .map(|c| {
            Ok(ColumnProfile {
                column: c.name().to_string(),
                non_null: c.len() - c.null_count(),
                unique: c.as_materialized_series().drop_nulls().n_unique()?,
            })
        })
        .collect::<Result<Vec<_>, AtlasError>>()?;

    let entities = EntityCounts {
        cities: union_count(df, fares::ORIGIN_CITY, fares::DESTINATION_CITY)?,
        airports: union_count(df, fares::ORIGIN_AIRPORT_CODE, fares::DESTINATION_AIRPORT_CODE)?,
        carriers: union_count(df, fares::LARGEST_CARRIER_CODE, fares::LOWEST_FARE_CARRIER_CODE)?,
        routes: distinct_strings(df, fares::ROUTE)?.len(),
    };

    let yearly = aggregation::yearly_totals(df, fares::PASSENGER_COUNT, Reducer::Sum)?;
    let total: f64 = yearly.iter().map(|(_, v)| v).sum();
    let mut passengers_by_year: Vec<YearTotal> = yearly
        .into_iter()
        .map(|(year, passengers)| YearTotal {
            year: year.to_string(),
            passengers,
        })
        .collect();
    passengers_by_year.push(YearTotal {
        year: "Total".to_string(),
        passengers: total,
    });

    Ok(DataSummary {
        columns,
        entities,
        passengers_by_year,
    })
}

fn top_page(table: &FaresTable, n: usize) -> Result<Vec<ChartSpec>, AtlasError> {
    let df = table.df();
    let busiest = |key: &str| {
        aggregation::top_n(df, key, fares::PASSENGER_COUNT, n, SortDirection::Descending)
    };
    let by_distance = |direction| {
        aggregation::top_n_distinct(df, fares::ROUTE, fares::ROUTE_DISTANCE_MILES, n, direction)
    };

    Ok(vec![
        charts::horizontal_bar(
            &format!("Top {n} Busiest Routes"),
            "Passengers",
            "Route",
            &busiest(fares::ROUTE)?,
        ),
        charts::horizontal_bar(
            &format!("Top {n} Cities by Departures"),
            "Passengers",
            "City",
            &busiest(fares::ORIGIN_CITY)?,
        ),
        charts::horizontal_bar(
            &format!("Top {n} Cities by Arrivals"),
            "Passengers",
            "City",
            &busiest(fares::DESTINATION_CITY)?,
        ),
        charts::horizontal_bar(
            &format!("Top {n} Airports by Departures"),
            "Passengers",
            "Airport",
            &busiest(fares::ORIGIN_AIRPORT_CODE)?,
        ),
        charts::horizontal_bar(
            &format!("Top {n} Airports by Arrivals"),
            "Passengers",
            "Airport",
            &busiest(fares::DESTINATION_AIRPORT_CODE)?,
        ),
        charts::horizontal_bar(
            &format!("Top {n} Longest Routes"),
            "Distance (miles)",
            "Route",
            &by_distance(SortDirection::Descending)?,
        ),
        charts::horizontal_bar(
            &format!("Top {n} Shortest Routes"),
            "Distance (miles)",
            "Route",
            &by_distance(SortDirection::Ascending)?,
        ),
    ])
}

fn trends_page(table: &FaresTable) -> Result<Vec<ChartSpec>, AtlasError> {
    let df = table.df();
    let passengers = aggregation::yearly_totals(df, fares::PASSENGER_COUNT, Reducer::Sum)?;
    let mean_fare = aggregation::yearly_totals(df, fares::AVERAGE_FARE, Reducer::Mean)?;

    Ok(vec![
        charts::annotated_trend(
            "Passenger Trend",
            "Year",
            "Passengers",
            "Passengers",
            palette::QUALITATIVE[0],
            &passengers,
            true,
        ),
        charts::annotated_trend(
            "Average Fare Trend",
            "Year",
            "Average Fare",
            "Average Fare",
            palette::QUALITATIVE[1],
            &mean_fare,
            true,
        ),
    ])
}
