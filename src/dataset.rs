use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::AtlasError;
use crate::schema::{fares, routes};

const METRO_SUFFIX: &str = "(Metropolitan Area)";
const COORDINATE_SEPARATOR: &str = ", ";

// ── Distance buckets ────────────────────────────────────────────────────────

/// Discretized route distance.
///
/// Bins are right-closed: (0, 500] Short, (500, 1500] Medium,
/// (1500, 3000] Long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceBucket {
    Short,
    Medium,
    Long,
}

impl DistanceBucket {
    pub const BOUNDARIES: [f64; 4] = [0.0, 500.0, 1500.0, 3000.0];
    pub const ALL: [DistanceBucket; 3] = [Self::Short, Self::Medium, Self::Long];

    /// Distances outside (0, 3000] fall in no bucket.
    pub fn classify(miles: f64) -> Option<Self> {
        Self::ALL
            .iter()
            .enumerate()
            .find(|(i, _)| miles > Self::BOUNDARIES[*i] && miles <= Self::BOUNDARIES[i + 1])
            .map(|(_, bucket)| *bucket)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Short => "Short",
            Self::Medium => "Medium",
            Self::Long => "Long",
        }
    }
}

// ── File reading ────────────────────────────────────────────────────────────

/// Read a parquet or csv file into a DataFrame, picking the reader from the
/// file extension.
pub fn read_frame(path: &Path) -> Result<DataFrame, AtlasError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let df = match extension.as_deref() {
        Some("parquet") => ParquetReader::new(File::open(path)?).finish()?,
        Some("csv") => CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        _ => {
            return Err(AtlasError::InvalidData(format!(
                "Unsupported dataset format: {}",
                path.display()
            )))
        }
    };
    debug!(path = %path.display(), rows = df.height(), "read dataset file");
    Ok(df)
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), AtlasError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(AtlasError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

// ── Fares table ─────────────────────────────────────────────────────────────

/// The cleaned fares/routes table. Immutable once built.
#[derive(Debug, Clone)]
pub struct FaresTable {
    df: DataFrame,
}

impl FaresTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AtlasError> {
        let path = path.as_ref();
        let table = Self::from_frame(read_frame(path)?)?;
        info!(path = %path.display(), rows = table.df.height(), "loaded fares table");
        Ok(table)
    }

    /// Validate, cast and derive `Route` and `DistanceBucket`.
    pub fn from_frame(raw: DataFrame) -> Result<Self, AtlasError> {
        require_columns(&raw, &fares::REQUIRED)?;
        let has_route = raw.column(fares::ROUTE).is_ok();

        let mut casts: Vec<Expr> = fares::INT_COLUMNS
            .iter()
            .map(|c| col(*c).cast(DataType::Int64))
            .collect();
        casts.extend(
            fares::FLOAT_COLUMNS
                .iter()
                .map(|c| col(*c).cast(DataType::Float64)),
        );

        let mut lazy = raw.lazy().with_columns(casts);
        if !has_route {
            lazy = lazy.with_columns([concat_str(
                [
                    col(fares::ORIGIN_AIRPORT_CODE),
                    lit("-"),
                    col(fares::DESTINATION_AIRPORT_CODE),
                ],
                "",
                false,
            )
            .alias(fares::ROUTE)]);
        }
        let mut df = lazy.collect()?;

        let buckets: StringChunked = df
            .column(fares::ROUTE_DISTANCE_MILES)?
            .f64()?
            .into_iter()
            .map(|d| d.and_then(DistanceBucket::classify).map(DistanceBucket::label))
            .collect();
        df.with_column(buckets.with_name(fares::DISTANCE_BUCKET.into()).into_series())?;

        Ok(Self { df })
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }
}

// ── Routes table ────────────────────────────────────────────────────────────

/// The geocoded routes table behind the map, box and Sankey views.
#[derive(Debug, Clone)]
pub struct RoutesTable {
    df: DataFrame,
}

impl RoutesTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AtlasError> {
        let path = path.as_ref();
        let table = Self::from_frame(read_frame(path)?)?;
        info!(path = %path.display(), rows = table.df.height(), "loaded routes table");
        Ok(table)
    }

    /// Clean city names, decode the composite coordinate columns and derive
    /// the `route` label. A single malformed coordinate fails the whole table.
    pub fn from_frame(raw: DataFrame) -> Result<Self, AtlasError> {
        require_columns(&raw, &routes::REQUIRED)?;

        let mut casts = vec![col(routes::YEAR).cast(DataType::Int64)];
        casts.extend(
            routes::FLOAT_COLUMNS
                .iter()
                .map(|c| col(*c).cast(DataType::Float64)),
        );
        let df = raw.lazy().with_columns(casts).collect()?;

        let (start_lat, start_lon) = decode_coordinates(&df, routes::GEOCODED_CITY1)?;
        let (end_lat, end_lon) = decode_coordinates(&df, routes::GEOCODED_CITY2)?;

        let city1 = clean_cities(&df, routes::CITY1)?;
        let city2 = clean_cities(&df, routes::CITY2)?;
        let route: Vec<String> = city1
            .iter()
            .zip(city2.iter())
            .map(|(a, b)| format!("{a} - {b}"))
            .collect();

        let df = DataFrame::new(vec![
            df.column(routes::YEAR)?.clone(),
            Column::new(routes::CITY1.into(), &city1),
            Column::new(routes::CITY2.into(), &city2),
            df.column(routes::AIRPORT_1)?.cast(&DataType::String)?,
            df.column(routes::AIRPORT_2)?.cast(&DataType::String)?,
            df.column(routes::PASSENGERS)?.clone(),
            df.column(routes::FARE)?.clone(),
            df.column(routes::FARE_LG)?.clone(),
            df.column(routes::FARE_LOW)?.clone(),
            Column::new(routes::START_LAT.into(), &start_lat),
            Column::new(routes::START_LON.into(), &start_lon),
            Column::new(routes::END_LAT.into(), &end_lat),
            Column::new(routes::END_LON.into(), &end_lon),
            Column::new(routes::ROUTE.into(), &route),
        ])?;

        Ok(Self { df })
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Result<Vec<i64>, AtlasError> {
        let years: BTreeSet<i64> = self
            .df
            .column(routes::YEAR)?
            .i64()?
            .into_iter()
            .flatten()
            .collect();
        Ok(years.into_iter().collect())
    }

    /// Distinct source cities in first-seen order.
    pub fn source_cities(&self) -> Result<Vec<String>, AtlasError> {
        distinct_strings(&self.df, routes::CITY1)
    }

    /// Distinct destination cities in first-seen order.
    pub fn dest_cities(&self) -> Result<Vec<String>, AtlasError> {
        distinct_strings(&self.df, routes::CITY2)
    }

    /// Distinct route labels in first-seen order.
    pub fn routes(&self) -> Result<Vec<String>, AtlasError> {
        distinct_strings(&self.df, routes::ROUTE)
    }
}

/// Distinct non-null values of a string column in first-seen order.
pub fn distinct_strings(df: &DataFrame, column: &str) -> Result<Vec<String>, AtlasError> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in df.column(column)?.str()?.into_iter().flatten() {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    Ok(out)
}

fn clean_cities(df: &DataFrame, column: &str) -> Result<Vec<String>, AtlasError> {
    let ca = df.column(column)?.str()?;
    ca.into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(clean_city)
                .ok_or_else(|| AtlasError::InvalidData(format!("Null '{column}' at row {row}")))
        })
        .collect()
}

/// Strip the "(Metropolitan Area)" marker and surrounding whitespace.
pub fn clean_city(raw: &str) -> String {
    raw.replace(METRO_SUFFIX, "").trim().to_string()
}

/// Split a "lat, lon" string into two floats.
pub fn parse_coordinate(raw: &str) -> Option<(f64, f64)> {
    let mut parts = raw.split(COORDINATE_SEPARATOR);
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    let lon = parts.next()?.trim().parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((lat, lon))
}

fn decode_coordinates(df: &DataFrame, column: &str) -> Result<(Vec<f64>, Vec<f64>), AtlasError> {
    let ca = df.column(column)?.str()?;
    let mut lats = Vec::with_capacity(ca.len());
    let mut lons = Vec::with_capacity(ca.len());
    for (row, value) in ca.into_iter().enumerate() {
        let parsed = value.and_then(parse_coordinate);
        let Some((lat, lon)) = parsed else {
            return Err(AtlasError::Coordinate {
                row,
                column: column.to_string(),
                value: value.unwrap_or("null").to_string(),
            });
        };
        lats.push(lat);
        lons.push(lon);
    }
    Ok((lats, lons))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn sample_fares_frame() -> DataFrame {
        df!(
            fares::YEAR => [2020i64, 2020, 2021, 2021],
            fares::QUARTER => [1i64, 2, 1, 3],
            fares::ORIGIN_CITY => ["Boston, MA", "Boston, MA", "Chicago, IL", "Denver, CO"],
            fares::DESTINATION_CITY => ["Chicago, IL", "Denver, CO", "Denver, CO", "Boston, MA"],
            fares::ORIGIN_AIRPORT_CODE => ["BOS", "BOS", "ORD", "DEN"],
            fares::DESTINATION_AIRPORT_CODE => ["ORD", "DEN", "DEN", "BOS"],
            fares::ROUTE_DISTANCE_MILES => [867.0, 1754.0, 888.0, 1754.0],
            fares::PASSENGER_COUNT => [100i64, 50, 70, 30],
            fares::AVERAGE_FARE => [210.5, 305.0, 180.0, 290.0],
            fares::LARGEST_CARRIER_CODE => ["AA", "UA", "UA", "WN"],
            fares::LARGEST_CARRIER_MARKET_SHARE => [0.5, 0.6, 0.4, 0.7],
            fares::LARGEST_CARRIER_AVERAGE_FARE => [220.0, 310.0, 190.0, 295.0],
            fares::LOWEST_FARE_CARRIER_CODE => ["B6", "WN", "NK", "F9"],
            fares::LOWEST_FARE_MARKET_SHARE => [0.2, 0.3, 0.1, 0.25],
            fares::LOWEST_FARE => [150.0, 240.0, 99.0, 199.0],
        )
        .unwrap()
    }

    pub(crate) fn sample_routes_frame() -> DataFrame {
        df!(
            routes::YEAR => [2020i64, 2020, 2021, 2021, 2020],
            routes::CITY1 => [
                "Boston, MA (Metropolitan Area)",
                "Boston, MA (Metropolitan Area)",
                "Chicago, IL",
                "Denver, CO",
                "Chicago, IL",
            ],
            routes::CITY2 => [
                "Chicago, IL",
                "Denver, CO",
                "Denver, CO",
                "Boston, MA (Metropolitan Area)",
                "Boston, MA (Metropolitan Area)",
            ],
            routes::AIRPORT_1 => ["BOS", "BOS", "ORD", "DEN", "ORD"],
            routes::AIRPORT_2 => ["ORD", "DEN", "DEN", "BOS", "BOS"],
            routes::PASSENGERS => [100.0, 50.0, 70.0, 30.0, 40.0],
            routes::FARE => [210.0, 305.0, 180.0, 290.0, 200.0],
            routes::FARE_LG => [220.0, 310.0, 190.0, 295.0, 205.0],
            routes::FARE_LOW => [150.0, 240.0, 99.0, 199.0, 150.0],
            routes::GEOCODED_CITY1 => [
                "42.36, -71.06",
                "42.36, -71.06",
                "41.88, -87.63",
                "39.74, -104.99",
                "41.88, -87.63",
            ],
            routes::GEOCODED_CITY2 => [
                "41.88, -87.63",
                "39.74, -104.99",
                "39.74, -104.99",
                "42.36, -71.06",
                "42.36, -71.06",
            ],
        )
        .unwrap()
    }

    pub(crate) fn sample_routes() -> RoutesTable {
        RoutesTable::from_frame(sample_routes_frame()).unwrap()
    }

    pub(crate) fn sample_fares() -> FaresTable {
        FaresTable::from_frame(sample_fares_frame()).unwrap()
    }

    #[test]
    fn bucket_boundaries_are_right_closed() {
        assert_eq!(DistanceBucket::classify(500.0), Some(DistanceBucket::Short));
        assert_eq!(DistanceBucket::classify(500.5), Some(DistanceBucket::Medium));
        assert_eq!(DistanceBucket::classify(1500.0), Some(DistanceBucket::Medium));
        assert_eq!(DistanceBucket::classify(3000.0), Some(DistanceBucket::Long));
        assert_eq!(DistanceBucket::classify(0.0), None);
        assert_eq!(DistanceBucket::classify(3200.0), None);
    }

    #[test]
    fn fares_derive_route_and_bucket() {
        let table = sample_fares();
        let df = table.df();
        let route = df.column(fares::ROUTE).unwrap().str().unwrap();
        assert_eq!(route.get(0), Some("BOS-ORD"));
        assert_eq!(route.get(3), Some("DEN-BOS"));
        let bucket = df.column(fares::DISTANCE_BUCKET).unwrap().str().unwrap();
        assert_eq!(bucket.get(0), Some("Medium"));
        assert_eq!(bucket.get(1), Some("Long"));
    }

    #[test]
    fn fares_keep_existing_route_column() {
        let mut raw = sample_fares_frame();
        raw.with_column(Column::new(
            fares::ROUTE.into(),
            ["X-1", "X-2", "X-3", "X-4"],
        ))
        .unwrap();
        let table = FaresTable::from_frame(raw).unwrap();
        let route = table.df().column(fares::ROUTE).unwrap().str().unwrap();
        assert_eq!(route.get(2), Some("X-3"));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let raw = sample_fares_frame().drop(fares::LOWEST_FARE).unwrap();
        let err = FaresTable::from_frame(raw).unwrap_err();
        assert!(matches!(err, AtlasError::MissingColumn(c) if c == fares::LOWEST_FARE));
    }

    #[test]
    fn routes_decode_coordinates_and_clean_cities() {
        let table = sample_routes();
        let df = table.df();
        let city1 = df.column(routes::CITY1).unwrap().str().unwrap();
        assert_eq!(city1.get(0), Some("Boston, MA"));
        let route = df.column(routes::ROUTE).unwrap().str().unwrap();
        assert_eq!(route.get(0), Some("Boston, MA - Chicago, IL"));
        let start_lon = df.column(routes::START_LON).unwrap().f64().unwrap();
        assert_eq!(start_lon.get(2), Some(-87.63));
        let end_lat = df.column(routes::END_LAT).unwrap().f64().unwrap();
        assert_eq!(end_lat.get(1), Some(39.74));
    }

    #[test]
    fn malformed_coordinate_fails_the_load() {
        let mut raw = sample_routes_frame();
        raw.with_column(Column::new(
            routes::GEOCODED_CITY2.into(),
            ["41.88, -87.63", "39.74", "39.74, -104.99", "42.36, -71.06", "42.36, -71.06"],
        ))
        .unwrap();
        let err = RoutesTable::from_frame(raw).unwrap_err();
        match err {
            AtlasError::Coordinate { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, routes::GEOCODED_CITY2);
                assert_eq!(value, "39.74");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn coordinate_parsing_requires_exactly_two_numbers() {
        assert_eq!(parse_coordinate("1.5, -2.25"), Some((1.5, -2.25)));
        assert_eq!(parse_coordinate("1.5,-2.25"), None);
        assert_eq!(parse_coordinate("1.5, -2.25, 3"), None);
        assert_eq!(parse_coordinate("north, south"), None);
    }

    #[test]
    fn distinct_accessors_follow_first_seen_order() {
        let table = sample_routes();
        assert_eq!(table.years().unwrap(), vec![2020, 2021]);
        assert_eq!(
            table.source_cities().unwrap(),
            vec!["Boston, MA", "Chicago, IL", "Denver, CO"]
        );
        assert_eq!(
            table.dest_cities().unwrap(),
            vec!["Chicago, IL", "Denver, CO", "Boston, MA"]
        );
    }

    #[test]
    fn loads_parquet_and_csv_from_disk() {
        let dir = tempfile::tempdir().unwrap();

        let parquet_path = dir.path().join("routes.parquet");
        let mut frame = sample_routes_frame();
        ParquetWriter::new(File::create(&parquet_path).unwrap())
            .finish(&mut frame)
            .unwrap();
        let table = RoutesTable::load(&parquet_path).unwrap();
        assert_eq!(table.height(), 5);

        let csv_path = dir.path().join("fares.csv");
        let mut file = File::create(&csv_path).unwrap();
        writeln!(file, "{}", fares::REQUIRED.join(",")).unwrap();
        writeln!(
            file,
            "2022,4,Miami,Atlanta,MIA,ATL,595,120,150.0,DL,0.8,160.0,NK,0.1,89.0"
        )
        .unwrap();
        drop(file);
        let fares_table = FaresTable::load(&csv_path).unwrap();
        assert_eq!(fares_table.height(), 1);
        let route = fares_table.df().column(fares::ROUTE).unwrap().str().unwrap();
        assert_eq!(route.get(0), Some("MIA-ATL"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = read_frame(Path::new("data/fares.xlsx")).unwrap_err();
        assert!(matches!(err, AtlasError::InvalidData(_)));
    }
}
