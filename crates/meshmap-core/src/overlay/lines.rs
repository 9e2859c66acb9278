// ── Link line generation ──
//
// Pure functions over a topology snapshot. Unresolvable endpoints are
// dropped silently. Output order follows ascending node number.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::geo::LatLng;
use super::link_quality::{LinkQuality, LinkThresholds};
use crate::model::{Node, NodeNeighbors, NodeNum};

/// One colored line between two positioned nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkLine {
    pub from: NodeNum,
    pub to: NodeNum,
    pub start: LatLng,
    pub end: LatLng,
    pub snr: f32,
    pub quality: LinkQuality,
}

impl LinkLine {
    pub fn color(&self) -> &'static str {
        self.quality.color()
    }
}

/// Positions of every node that can be drawn, keyed by number.
pub(crate) fn positioned(nodes: &[Arc<Node>]) -> HashMap<NodeNum, LatLng> {
    nodes
        .iter()
        .filter_map(|n| {
            n.position
                .as_ref()
                .and_then(LatLng::from_position)
                .map(|p| (n.num, p))
        })
        .collect()
}

/// Lines for every edge a node reported in its neighbor table.
///
/// Both the reporter and the neighbor must be positioned nodes.
pub fn neighbor_links(
    nodes: &[Arc<Node>],
    neighbors: &[Arc<NodeNeighbors>],
    thresholds: &LinkThresholds,
) -> Vec<LinkLine> {
    let positions = &positioned(nodes);
    let mut reports: Vec<&NodeNeighbors> = neighbors.iter().map(AsRef::as_ref).collect();
    reports.sort_by_key(|r| r.node);

    reports
        .into_iter()
        .filter_map(|report| positions.get(&report.node).map(|start| (report, *start)))
        .flat_map(|(report, start)| {
            report.neighbors.iter().filter_map(move |edge| {
                let end = positions.get(&edge.node_id)?;
                Some(LinkLine {
                    from: report.node,
                    to: edge.node_id,
                    start,
                    end: *end,
                    snr: edge.snr,
                    quality: thresholds.classify(edge.snr, None),
                })
            })
        })
        .collect()
}

/// Lines from each fresh zero-hop node to the self node.
///
/// Empty when there is no self node or it has no position. Colored by the
/// node's last SNR alone. `now` is epoch seconds; a `last_heard` in the
/// future counts as fresh.
pub fn direct_links(
    nodes: &[Arc<Node>],
    self_node: Option<&Node>,
    thresholds: &LinkThresholds,
    freshness: Duration,
    now: u64,
) -> Vec<LinkLine> {
    let Some(me) = self_node else {
        return Vec::new();
    };
    let Some(end) = me.position.as_ref().and_then(LatLng::from_position) else {
        return Vec::new();
    };
    let window = freshness.as_secs();

    let mut lines: Vec<LinkLine> = nodes
        .iter()
        .filter(|n| n.num != me.num && n.is_direct())
        .filter(|n| now.saturating_sub(u64::from(n.last_heard)) <= window)
        .filter_map(|n| {
            let start = n.position.as_ref().and_then(LatLng::from_position)?;
            Some(LinkLine {
                from: n.num,
                to: me.num,
                start,
                end,
                snr: n.snr,
                quality: thresholds.classify(n.snr, None),
            })
        })
        .collect();
    lines.sort_by_key(|l| l.from);
    lines
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Neighbor, Position};

    fn node(num: u32, lat: i32, lon: i32) -> Arc<Node> {
        let mut node = Node::new(NodeNum(num));
        node.position = Some(Position::fixed(lat, lon));
        Arc::new(node)
    }

    fn report(node: u32, edges: &[(u32, f32)]) -> Arc<NodeNeighbors> {
        Arc::new(NodeNeighbors {
            node: NodeNum(node),
            neighbors: edges
                .iter()
                .map(|&(id, snr)| Neighbor {
                    node_id: NodeNum(id),
                    snr,
                })
                .collect(),
            broadcast_interval_secs: 900,
        })
    }

    fn direct(num: u32, last_heard: u32, snr: f32) -> Arc<Node> {
        let mut n = (*node(num, 10_000_000, 10_000_000)).clone();
        n.hops_away = Some(0);
        n.last_heard = last_heard;
        n.snr = snr;
        Arc::new(n)
    }

    #[test]
    fn unknown_neighbor_is_skipped_others_kept() {
        let nodes = vec![node(1, 100_000_000, 200_000_000), node(2, 110_000_000, 210_000_000)];
        let neighbors = vec![report(1, &[(999, 5.0), (2, -10.0)])];

        let lines = neighbor_links(&nodes, &neighbors, &LinkThresholds::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].from, NodeNum(1));
        assert_eq!(lines[0].to, NodeNum(2));
        assert_eq!(lines[0].quality, LinkQuality::Fair);
        assert_eq!(lines[0].color(), "#ffe600");
    }

    #[test]
    fn unpositioned_endpoints_are_skipped() {
        let mut hidden = Node::new(NodeNum(3));
        hidden.position = Some(Position::fixed(0, 10));
        let nodes = vec![node(1, 1, 1), Arc::new(hidden)];

        let neighbors = vec![report(1, &[(3, 1.0)]), report(3, &[(1, 1.0)])];
        assert!(neighbor_links(&nodes, &neighbors, &LinkThresholds::default()).is_empty());
    }

    #[test]
    fn neighbor_lines_only_reference_known_nodes() {
        let nodes = vec![node(1, 1, 1), node(2, 2, 2), node(3, 3, 3)];
        let neighbors = vec![
            report(3, &[(1, 0.0), (42, 0.0)]),
            report(1, &[(2, 0.0), (3, 0.0), (7, 0.0)]),
            report(8, &[(1, 0.0)]),
        ];

        let lines = neighbor_links(&nodes, &neighbors, &LinkThresholds::default());
        let known = [NodeNum(1), NodeNum(2), NodeNum(3)];
        assert!(lines.iter().all(|l| known.contains(&l.from) && known.contains(&l.to)));
        let pairs: Vec<(u32, u32)> = lines.iter().map(|l| (l.from.0, l.to.0)).collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (3, 1)]);
    }

    #[test]
    fn no_self_node_means_no_direct_links() {
        let nodes = vec![direct(1, 1_000, 0.0), direct(2, 1_000, 0.0)];
        let lines = direct_links(
            &nodes,
            None,
            &LinkThresholds::default(),
            Duration::from_secs(1200),
            1_000,
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn self_without_position_means_no_direct_links() {
        let me = Node::new(NodeNum(9));
        let nodes = vec![direct(1, 1_000, 0.0)];
        let lines = direct_links(
            &nodes,
            Some(&me),
            &LinkThresholds::default(),
            Duration::from_secs(1200),
            1_000,
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn direct_links_respect_hops_and_freshness() {
        let me = node(9, 50_000_000, 50_000_000);
        let mut relayed = (*direct(3, 10_000, 0.0)).clone();
        relayed.hops_away = Some(1);
        let mut unknown_hops = (*direct(4, 10_000, 0.0)).clone();
        unknown_hops.hops_away = None;

        let nodes = vec![
            direct(1, 10_000 - 1_200, -3.0),
            direct(2, 10_000 - 1_201, -3.0),
            Arc::new(relayed),
            Arc::new(unknown_hops),
            direct(5, 20_000, -20.0),
            me.clone(),
        ];

        let lines = direct_links(
            &nodes,
            Some(me.as_ref()),
            &LinkThresholds::default(),
            Duration::from_secs(1200),
            10_000,
        );
        let summary: Vec<(u32, LinkQuality)> =
            lines.iter().map(|l| (l.from.0, l.quality)).collect();
        assert_eq!(summary, vec![(1, LinkQuality::Good), (5, LinkQuality::Bad)]);
        assert!(lines.iter().all(|l| l.to == NodeNum(9)));
    }
}
