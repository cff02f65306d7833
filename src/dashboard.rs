use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::aggregation::{self, Side};
use crate::charts::{self, ChartSpec};
use crate::config::AtlasConfig;
use crate::dataset::RoutesTable;
use crate::error::AtlasError;
use crate::filters::{FilterSelection, Orientation};
use crate::palette::{self, ColorMap};
use crate::sankey;

/// The three interactive charts, returned together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub map: ChartSpec,
    pub boxplot: ChartSpec,
    pub sankey: ChartSpec,
}

impl DashboardView {
    pub fn to_json(&self) -> Result<String, AtlasError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// City → color mapping over every city in the table, sources first, in
/// first-seen order. Built from the unfiltered table so a city keeps its
/// color however the filters narrow the view.
pub fn city_colors(table: &RoutesTable) -> Result<ColorMap, AtlasError> {
    let mut cities = table.source_cities()?;
    let known: HashSet<String> = cities.iter().cloned().collect();
    cities.extend(
        table
            .dest_cities()?
            .into_iter()
            .filter(|c| !known.contains(c)),
    );
    Ok(palette::assign_colors(&cities, &palette::QUALITATIVE))
}

/// Rebuild the map, box plot and Sankey diagram for one filter state.
///
/// Any failure aborts the whole render; there is no partial view.
pub fn render(
    table: &RoutesTable,
    colors: &ColorMap,
    filters: &FilterSelection,
    config: &AtlasConfig,
) -> Result<DashboardView, AtlasError> {
    let resolved = filters.resolve(table)?;
    debug!(
        years = resolved.years.len(),
        source_cities = resolved.source_cities.len(),
        dest_cities = resolved.dest_cities.len(),
        routes = resolved.routes.len(),
        metric = resolved.metric.as_str(),
        "rendering dashboard"
    );

    let filtered = aggregation::filter_routes(table, &resolved)?;

    let side = match resolved.orientation {
        Orientation::Source => Side::Source,
        Orientation::Destination => Side::Destination,
    };
    let points = aggregation::group_cities(&filtered, side)?;
    let segments = aggregation::route_segments(&filtered)?;
    let map = charts::geo_scatter(
        &points,
        &segments,
        colors,
        resolved.orientation,
        config.marker_reference_size,
        config.route_line_opacity,
    );

    let selection =
        aggregation::select_routes(&filtered, &resolved.routes, config.default_route_count)?;
    let fares = aggregation::route_fares(&filtered, &selection)?;
    let boxplot = charts::fare_box(&selection, &fares);

    let flows = aggregation::flow_rows(&filtered, resolved.metric)?;
    let sankey = sankey::build_sankey(&flows, colors, resolved.metric);

    Ok(DashboardView {
        map,
        boxplot,
        sankey,
    })
}
