//! Declarative chart specifications and the pure builders that produce them.
//!
//! Every spec serializes to JSON for the display layer. Builders never fail:
//! empty input yields a spec with no data rather than an error.
use serde::Serialize;

use crate::aggregation::{CityPoint, RouteSegment, RouteSelection, YearSeries};
use crate::filters::Orientation;
use crate::palette::{self, ColorMap};

/// Marker size used when sizing cannot be normalized.
pub const NEUTRAL_MARKER_SIZE: f64 = 4.0;

/// Continuous color scale for ranked bars.
pub const BAR_COLOR_SCALE: &str = "Blues";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Indicator(IndicatorChart),
    Bar(BarChart),
    Line(LineChart),
    Box(BoxChart),
    GeoScatter(GeoChart),
    Sankey(SankeyChart),
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        match self {
            Self::Indicator(c) => &c.title,
            Self::Bar(c) => &c.title,
            Self::Line(c) => &c.title,
            Self::Box(c) => &c.title,
            Self::GeoScatter(c) => &c.title,
            Self::Sankey(c) => &c.title,
        }
    }
}

// ── Spec types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorChart {
    pub title: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Bottom to top; the largest value is last.
    pub categories: Vec<String>,
    pub values: Vec<f64>,
    pub color_scale: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub color: &'static str,
    pub x: Vec<i64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub x: i64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<LineSeries>,
    pub annotations: Vec<Annotation>,
    pub reference_lines: Vec<ReferenceLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxTrace {
    pub route: String,
    pub color: &'static str,
    pub fares: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub boxes: Vec<BoxTrace>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    pub flights: usize,
    pub size: f64,
    pub color: &'static str,
    pub hover: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoLine {
    pub lat: [f64; 2],
    pub lon: [f64; 2],
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoChart {
    pub title: String,
    pub orientation: Orientation,
    pub points: Vec<GeoPoint>,
    pub lines: Vec<GeoLine>,
    pub line_opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyNode {
    pub label: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyChart {
    pub title: String,
    pub value_label: String,
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
}

// ── Builders ────────────────────────────────────────────────────────────────

pub fn indicator(title: &str, value: f64) -> ChartSpec {
    ChartSpec::Indicator(IndicatorChart {
        title: title.to_string(),
        value,
    })
}

/// Horizontal ranking bar. Rows are re-ordered ascending by value so the
/// largest bar sits at the top.
pub fn horizontal_bar(title: &str, x_label: &str, y_label: &str, rows: &[(String, f64)]) -> ChartSpec {
    let mut ordered: Vec<&(String, f64)> = rows.iter().collect();
    ordered.sort_by(|a, b| a.1.total_cmp(&b.1));

    ChartSpec::Bar(BarChart {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        categories: ordered.iter().map(|(k, _)| k.clone()).collect(),
        values: ordered.iter().map(|(_, v)| *v).collect(),
        color_scale: BAR_COLOR_SCALE,
    })
}

/// Multi-series trend line. Each series takes its color from the fixed
/// `palette`, so a series keeps its color whether or not its siblings are
/// present. Series are emitted in palette order; keys outside the palette
/// follow, in the order given, with the fallback color.
pub fn trend_lines(
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[YearSeries],
    palette: &[(&str, &'static str)],
) -> ChartSpec {
    let rank = |key: &str| {
        palette
            .iter()
            .position(|(k, _)| *k == key)
            .unwrap_or(palette.len())
    };
    let mut ordered: Vec<&YearSeries> = series.iter().collect();
    ordered.sort_by_key(|s| rank(s.key.as_str()));

    ChartSpec::Line(LineChart {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        series: ordered
            .into_iter()
            .map(|s| LineSeries {
                name: s.key.clone(),
                color: palette::fixed_color(palette, &s.key),
                x: s.points.iter().map(|(x, _)| *x).collect(),
                y: s.points.iter().map(|(_, y)| *y).collect(),
            })
            .collect(),
        annotations: Vec::new(),
        reference_lines: Vec::new(),
    })
}

/// Single-series trend with "Min"/"Max" callouts and, optionally, a mean
/// reference line.
pub fn annotated_trend(
    title: &str,
    x_label: &str,
    y_label: &str,
    name: &str,
    color: &'static str,
    points: &[(i64, f64)],
    show_mean: bool,
) -> ChartSpec {
    let mut annotations = Vec::new();
    let mut reference_lines = Vec::new();

    let min = points.iter().min_by(|a, b| a.1.total_cmp(&b.1));
    let max = points.iter().max_by(|a, b| a.1.total_cmp(&b.1));
    if let (Some(&(min_x, min_y)), Some(&(max_x, max_y))) = (min, max) {
        annotations.push(Annotation {
            x: min_x,
            y: min_y,
            text: format!("Min: {}", format_value(min_y)),
        });
        annotations.push(Annotation {
            x: max_x,
            y: max_y,
            text: format!("Max: {}", format_value(max_y)),
        });

        if show_mean {
            let mean = points.iter().map(|(_, y)| y).sum::<f64>() / points.len() as f64;
            reference_lines.push(ReferenceLine {
                y: mean,
                label: format!("Mean: {}", mean.round()),
            });
        }
    }

    ChartSpec::Line(LineChart {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        series: vec![LineSeries {
            name: name.to_string(),
            color,
            x: points.iter().map(|(x, _)| *x).collect(),
            y: points.iter().map(|(_, y)| *y).collect(),
        }],
        annotations,
        reference_lines,
    })
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Marker diameter with area proportional to `flights`; the busiest city
/// gets `reference`.
pub fn marker_size(flights: usize, max_flights: usize, reference: f64) -> f64 {
    if max_flights == 0 {
        return NEUTRAL_MARKER_SIZE;
    }
    reference * (flights as f64 / max_flights as f64).sqrt()
}

/// Route map. Source orientation also draws one line per filtered row in the
/// origin city's color.
pub fn geo_scatter(
    points: &[CityPoint],
    segments: &[RouteSegment],
    colors: &ColorMap,
    orientation: Orientation,
    reference_size: f64,
    line_opacity: f64,
) -> ChartSpec {
    let max_flights = points.iter().map(|p| p.flights).max().unwrap_or(0);

    let geo_points = points
        .iter()
        .map(|p| GeoPoint {
            city: p.city.clone(),
            lat: p.lat,
            lon: p.lon,
            flights: p.flights,
            size: marker_size(p.flights, max_flights, reference_size),
            color: colors.get(&p.city),
            hover: p.hover.clone(),
        })
        .collect();

    let lines = match orientation {
        Orientation::Source => segments
            .iter()
            .map(|s| GeoLine {
                lat: [s.start.0, s.end.0],
                lon: [s.start.1, s.end.1],
                color: colors.get(&s.source_city),
            })
            .collect(),
        Orientation::Destination => Vec::new(),
    };

    let title = match orientation {
        Orientation::Source => "Flights by source city",
        Orientation::Destination => "Flights by destination city",
    };

    ChartSpec::GeoScatter(GeoChart {
        title: title.to_string(),
        orientation,
        points: geo_points,
        lines,
        line_opacity,
    })
}

/// Fare distribution, one box per selected route.
pub fn fare_box(selection: &RouteSelection, fares: &[(String, Vec<f64>)]) -> ChartSpec {
    let title = if selection.is_default {
        "Fare distribution for top route(s)"
    } else {
        "Fare distribution for selected routes"
    };
    let colors = palette::assign_colors(fares.iter().map(|(r, _)| r), &palette::QUALITATIVE);

    ChartSpec::Box(BoxChart {
        title: title.to_string(),
        x_label: "Route".to_string(),
        y_label: "Fare".to_string(),
        boxes: fares
            .iter()
            .map(|(route, values)| BoxTrace {
                route: route.clone(),
                color: colors.get(route),
                fares: values.clone(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(key: &str, points: &[(i64, f64)]) -> YearSeries {
        YearSeries {
            key: key.to_string(),
            points: points.to_vec(),
        }
    }

    #[test]
    fn bars_render_largest_last() {
        let rows = vec![
            ("ATL".to_string(), 900.0),
            ("ORD".to_string(), 300.0),
            ("DEN".to_string(), 600.0),
        ];
        let ChartSpec::Bar(bar) = horizontal_bar("Busiest", "Passengers", "Airport", &rows) else {
            panic!("expected bar chart");
        };
        assert_eq!(bar.categories, ["ORD", "DEN", "ATL"]);
        assert_eq!(bar.values, [300.0, 600.0, 900.0]);
    }

    #[test]
    fn quarter_colors_do_not_depend_on_present_series() {
        let all = trend_lines(
            "Fares",
            "Year",
            "Fare",
            &[series("Q2", &[(2020, 1.0)]), series("Q1", &[(2020, 2.0)])],
            &palette::QUARTER,
        );
        let only_q2 = trend_lines(
            "Fares",
            "Year",
            "Fare",
            &[series("Q2", &[(2020, 1.0)])],
            &palette::QUARTER,
        );
        let (ChartSpec::Line(all), ChartSpec::Line(only_q2)) = (all, only_q2) else {
            panic!("expected line charts");
        };
        assert_eq!(all.series[0].name, "Q1");
        assert_eq!(all.series[1].color, "#ff7f0e");
        assert_eq!(only_q2.series[0].color, "#ff7f0e");
    }

    #[test]
    fn annotated_trend_marks_extremes_and_mean() {
        let points = [(2019, 10.0), (2020, 4.0), (2021, 16.5)];
        let ChartSpec::Line(line) =
            annotated_trend("Passengers", "Year", "Count", "total", "#636efa", &points, true)
        else {
            panic!("expected line chart");
        };
        assert_eq!(line.annotations[0].x, 2020);
        assert_eq!(line.annotations[0].text, "Min: 4");
        assert_eq!(line.annotations[1].x, 2021);
        assert_eq!(line.annotations[1].text, "Max: 16.50");
        assert_eq!(line.reference_lines[0].label, "Mean: 10");
    }

    #[test]
    fn annotated_trend_on_empty_input_has_no_callouts() {
        let ChartSpec::Line(line) = annotated_trend("t", "x", "y", "s", "#000000", &[], true)
        else {
            panic!("expected line chart");
        };
        assert!(line.annotations.is_empty());
        assert!(line.reference_lines.is_empty());
        assert!(line.series[0].x.is_empty());
    }

    #[test]
    fn marker_area_is_proportional_to_flights() {
        assert_eq!(marker_size(4, 4, 40.0), 40.0);
        assert_eq!(marker_size(1, 4, 40.0), 20.0);
        assert_eq!(marker_size(0, 0, 40.0), NEUTRAL_MARKER_SIZE);
    }

    #[test]
    fn destination_map_has_no_route_lines() {
        let points = vec![CityPoint {
            city: "Denver, CO".into(),
            lat: 39.74,
            lon: -104.99,
            airport: "DEN".into(),
            flights: 3,
            mean_passengers: 12.0,
            hover: "To: Denver, CO".into(),
        }];
        let segments = vec![RouteSegment {
            source_city: "Boston, MA".into(),
            start: (42.36, -71.06),
            end: (39.74, -104.99),
        }];
        let colors = palette::assign_colors(["Boston, MA", "Denver, CO"], &palette::QUALITATIVE);

        let ChartSpec::GeoScatter(dest) = geo_scatter(
            &points,
            &segments,
            &colors,
            Orientation::Destination,
            40.0,
            0.3,
        ) else {
            panic!("expected geo chart");
        };
        assert!(dest.lines.is_empty());
        assert_eq!(dest.points[0].color, palette::QUALITATIVE[1]);
        assert_eq!(dest.points[0].size, 40.0);

        let ChartSpec::GeoScatter(src) =
            geo_scatter(&points, &segments, &colors, Orientation::Source, 40.0, 0.3)
        else {
            panic!("expected geo chart");
        };
        assert_eq!(src.lines.len(), 1);
        assert_eq!(src.lines[0].color, palette::QUALITATIVE[0]);
        assert_eq!(src.lines[0].lon, [-71.06, -104.99]);
    }

    #[test]
    fn box_title_follows_selection_origin() {
        let fares = vec![("A - B".to_string(), vec![100.0, 120.0])];
        let default = RouteSelection {
            routes: vec!["A - B".into()],
            is_default: true,
        };
        assert_eq!(
            fare_box(&default, &fares).title(),
            "Fare distribution for top route(s)"
        );
        let chosen = RouteSelection {
            is_default: false,
            ..default
        };
        assert_eq!(
            fare_box(&chosen, &fares).title(),
            "Fare distribution for selected routes"
        );
    }

    #[test]
    fn specs_serialize_with_kind_tag() {
        let json = serde_json::to_string(&indicator("Total Passengers", 42.0)).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"indicator","title":"Total Passengers","value":42.0}"#
        );
    }
}
