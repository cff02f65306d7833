/// Column-name constants for the airfare-atlas tables.
/// Single source of truth - exported to Python via PyO3.

// ── Fares table (cleaned primary dataset) ──────────────────────────────────
pub mod fares {
    pub const YEAR: &str = "Year";
    pub const QUARTER: &str = "Quarter";
    pub const ORIGIN_CITY: &str = "OriginCity";
    pub const DESTINATION_CITY: &str = "DestinationCity";
    pub const ORIGIN_AIRPORT_CODE: &str = "OriginAirportCode";
    pub const DESTINATION_AIRPORT_CODE: &str = "DestinationAirportCode";
    pub const ROUTE_DISTANCE_MILES: &str = "RouteDistanceInMiles";
    pub const PASSENGER_COUNT: &str = "PassengerCount";
    pub const AVERAGE_FARE: &str = "AverageFare";
    pub const LARGEST_CARRIER_CODE: &str = "LargestCarrierCode";
    pub const LARGEST_CARRIER_MARKET_SHARE: &str = "LargestCarrierMarketShare";
    pub const LARGEST_CARRIER_AVERAGE_FARE: &str = "LargestCarrierAverageFare";
    pub const LOWEST_FARE_CARRIER_CODE: &str = "LowestFareCarrierCode";
    pub const LOWEST_FARE_MARKET_SHARE: &str = "LowestFareMarketShare";
    pub const LOWEST_FARE: &str = "LowestFare";
    pub const ROUTE: &str = "Route";

    /// Derived at load time.
    pub const DISTANCE_BUCKET: &str = "DistanceBucket";

    pub const REQUIRED: [&str; 15] = [
        YEAR,
        QUARTER,
        ORIGIN_CITY,
        DESTINATION_CITY,
        ORIGIN_AIRPORT_CODE,
        DESTINATION_AIRPORT_CODE,
        ROUTE_DISTANCE_MILES,
        PASSENGER_COUNT,
        AVERAGE_FARE,
        LARGEST_CARRIER_CODE,
        LARGEST_CARRIER_MARKET_SHARE,
        LARGEST_CARRIER_AVERAGE_FARE,
        LOWEST_FARE_CARRIER_CODE,
        LOWEST_FARE_MARKET_SHARE,
        LOWEST_FARE,
    ];

    pub const INT_COLUMNS: [&str; 3] = [YEAR, QUARTER, PASSENGER_COUNT];

    pub const FLOAT_COLUMNS: [&str; 6] = [
        ROUTE_DISTANCE_MILES,
        AVERAGE_FARE,
        LARGEST_CARRIER_MARKET_SHARE,
        LARGEST_CARRIER_AVERAGE_FARE,
        LOWEST_FARE_MARKET_SHARE,
        LOWEST_FARE,
    ];
}

// ── Routes table (geocoded secondary dataset) ──────────────────────────────
pub mod routes {
    pub const YEAR: &str = "Year";
    pub const CITY1: &str = "city1";
    pub const CITY2: &str = "city2";
    pub const AIRPORT_1: &str = "airport_1";
    pub const AIRPORT_2: &str = "airport_2";
    pub const PASSENGERS: &str = "passengers";
    pub const FARE: &str = "fare";
    pub const FARE_LG: &str = "fare_lg";
    pub const FARE_LOW: &str = "fare_low";
    pub const GEOCODED_CITY1: &str = "Geocoded_City1";
    pub const GEOCODED_CITY2: &str = "Geocoded_City2";

    /// Derived at load time.
    pub const START_LAT: &str = "start_lat";
    pub const START_LON: &str = "start_lon";
    pub const END_LAT: &str = "end_lat";
    pub const END_LON: &str = "end_lon";
    pub const ROUTE: &str = "route";

    pub const REQUIRED: [&str; 11] = [
        YEAR,
        CITY1,
        CITY2,
        AIRPORT_1,
        AIRPORT_2,
        PASSENGERS,
        FARE,
        FARE_LG,
        FARE_LOW,
        GEOCODED_CITY1,
        GEOCODED_CITY2,
    ];

    pub const FLOAT_COLUMNS: [&str; 4] = [PASSENGERS, FARE, FARE_LG, FARE_LOW];
}

// ── Aggregation output columns ─────────────────────────────────────────────
pub mod agg {
    pub const VALUE: &str = "value";
    pub const MEAN_PASSENGERS: &str = "mean_passengers";
    pub const AIRPORT: &str = "airport";
    pub const SERIES: &str = "series";
}

// ── Sankey metric mode values ──────────────────────────────────────────────
pub mod metric {
    pub const PASSENGERS: &str = "passengers";
    pub const FARE_LARGE_CARRIER: &str = "fare_large_carrier";
    pub const FARE_LOW_CARRIER: &str = "fare_low_carrier";
}
