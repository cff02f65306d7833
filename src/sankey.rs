use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::aggregation::FlowRow;
use crate::charts::{ChartSpec, SankeyChart, SankeyLink, SankeyNode};
use crate::filters::MetricMode;
use crate::palette::{self, ColorMap};

/// Opacity applied to link colors so overlapping flows stay readable.
pub const LINK_OPACITY: f64 = 0.4;

/// City flow graph behind the Sankey diagram.
///
/// One node per distinct city (sources and targets share the node set), one
/// edge per flow row. Node indices follow first-seen order.
pub struct FlowGraph {
    graph: DiGraph<String, f64>,
    /// Map from city name → NodeIndex for fast lookup.
    node_map: HashMap<String, NodeIndex>,
}

impl FlowGraph {
    pub fn from_flows(rows: &[FlowRow]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();

        let get_or_insert = |map: &mut HashMap<String, NodeIndex>,
                             g: &mut DiGraph<String, f64>,
                             city: &str|
         -> NodeIndex {
            *map.entry(city.to_string())
                .or_insert_with(|| g.add_node(city.to_string()))
        };

        for row in rows {
            let src_idx = get_or_insert(&mut node_map, &mut graph, &row.source);
            let dst_idx = get_or_insert(&mut node_map, &mut graph, &row.target);
            graph.add_edge(src_idx, dst_idx, row.value);
        }

        Self { graph, node_map }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn index_of(&self, city: &str) -> Option<usize> {
        self.node_map.get(city).map(|idx| idx.index())
    }

    /// Cities in node-index order.
    pub fn cities(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_indices().map(|idx| self.graph[idx].as_str())
    }

    /// Render the graph. Node colors come from `colors`; each link takes its
    /// source node's color.
    pub fn to_chart(&self, colors: &ColorMap, metric: MetricMode) -> ChartSpec {
        let nodes = self
            .cities()
            .map(|city| SankeyNode {
                label: city.to_string(),
                color: colors.get(city),
            })
            .collect();

        let links = self
            .graph
            .edge_references()
            .map(|edge| {
                let source_color = colors.get(&self.graph[edge.source()]);
                SankeyLink {
                    source: edge.source().index(),
                    target: edge.target().index(),
                    value: *edge.weight(),
                    color: palette::with_opacity(source_color, LINK_OPACITY),
                }
            })
            .collect();

        ChartSpec::Sankey(SankeyChart {
            title: format!("{} flow between cities", metric.label()),
            value_label: metric.label().to_string(),
            nodes,
            links,
        })
    }
}

/// Build the Sankey chart for already-filtered flows.
pub fn build_sankey(rows: &[FlowRow], colors: &ColorMap, metric: MetricMode) -> ChartSpec {
    FlowGraph::from_flows(rows).to_chart(colors, metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{filter_routes, flow_rows};
    use crate::dataset::tests::sample_routes;
    use crate::filters::FilterSelection;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn flow(source: &str, target: &str, value: f64) -> FlowRow {
        FlowRow {
            source: source.to_string(),
            target: target.to_string(),
            value,
        }
    }

    #[test]
    fn cities_on_both_sides_appear_once() {
        let rows = vec![
            flow("Boston", "Chicago", 100.0),
            flow("Chicago", "Denver", 70.0),
            flow("Denver", "Boston", 30.0),
        ];
        let graph = FlowGraph::from_flows(&rows);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.cities().collect::<Vec<_>>(), ["Boston", "Chicago", "Denver"]);
        assert_eq!(graph.index_of("Denver"), Some(2));
    }

    #[test]
    fn links_use_row_indices_values_and_source_color() {
        let rows = vec![flow("Boston", "Chicago", 100.0), flow("Chicago", "Boston", 40.0)];
        let colors = palette::assign_colors(["Boston", "Chicago"], &palette::QUALITATIVE);
        let ChartSpec::Sankey(chart) = build_sankey(&rows, &colors, MetricMode::Passengers) else {
            panic!("expected sankey");
        };
        assert_eq!(chart.links.len(), 2);
        assert_eq!((chart.links[1].source, chart.links[1].target), (1, 0));
        assert_eq!(chart.links[1].value, 40.0);
        assert_eq!(
            chart.links[1].color,
            palette::with_opacity(palette::QUALITATIVE[1], LINK_OPACITY)
        );
        assert_eq!(chart.nodes[0].color, palette::QUALITATIVE[0]);
    }

    #[test]
    fn empty_flows_give_an_empty_diagram() {
        let ChartSpec::Sankey(chart) =
            build_sankey(&[], &ColorMap::default(), MetricMode::FareLargeCarrier)
        else {
            panic!("expected sankey");
        };
        assert!(chart.nodes.is_empty());
        assert!(chart.links.is_empty());
    }

    // Deviation: the low-carrier-fare mode used to size links by how often
    // each fare value occurred. Every mode now takes the row's own value.
    #[test]
    fn low_fare_links_carry_row_fares_not_frequencies() {
        let table = sample_routes();
        let filters = FilterSelection::default().resolve(&table).unwrap();
        let filtered = filter_routes(&table, &filters).unwrap();
        let rows = flow_rows(&filtered, MetricMode::FareLowCarrier).unwrap();
        let colors = palette::assign_colors(table.source_cities().unwrap(), &palette::QUALITATIVE);

        let ChartSpec::Sankey(chart) = build_sankey(&rows, &colors, MetricMode::FareLowCarrier)
        else {
            panic!("expected sankey");
        };
        let values: Vec<f64> = chart.links.iter().map(|l| l.value).collect();
        // 150.0 occurs twice; a frequency count would have produced 2.0 here.
        assert_eq!(values, vec![150.0, 240.0, 99.0, 199.0, 150.0]);
        assert_eq!(chart.value_label, "Fare (lowest-fare carrier)");
    }

    proptest! {
        #[test]
        fn node_list_has_no_duplicates(
            pairs in prop::collection::vec((0u8..12, 0u8..12, 0.0f64..500.0), 0..50),
        ) {
            let rows: Vec<FlowRow> = pairs
                .iter()
                .map(|(s, t, v)| flow(&format!("c{s}"), &format!("c{t}"), *v))
                .collect();
            let ChartSpec::Sankey(chart) =
                build_sankey(&rows, &ColorMap::default(), MetricMode::Passengers)
            else {
                panic!("expected sankey");
            };

            let labels: HashSet<&str> = chart.nodes.iter().map(|n| n.label.as_str()).collect();
            prop_assert_eq!(labels.len(), chart.nodes.len());

            let expected: HashSet<String> = rows
                .iter()
                .flat_map(|r| [r.source.clone(), r.target.clone()])
                .collect();
            prop_assert_eq!(labels.len(), expected.len());
            prop_assert_eq!(chart.links.len(), rows.len());
        }
    }
}
