// ── Point markers ──

use std::sync::Arc;

use serde::Serialize;

use super::geo::LatLng;
use crate::model::{Node, NodeNum, Waypoint};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMarker {
    pub num: NodeNum,
    /// Short name, falling back to the node number.
    pub label: String,
    pub position: LatLng,
    pub is_self: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaypointMarker {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub icon: u32,
    pub position: LatLng,
}

/// One marker per positioned node, in node-number order.
pub fn node_markers(nodes: &[Arc<Node>], self_num: Option<NodeNum>) -> Vec<NodeMarker> {
    let mut markers: Vec<NodeMarker> = nodes
        .iter()
        .filter_map(|n| {
            let position = n.position.as_ref().and_then(LatLng::from_position)?;
            Some(NodeMarker {
                num: n.num,
                label: n.label(),
                position,
                is_self: self_num == Some(n.num),
            })
        })
        .collect();
    markers.sort_by_key(|m| m.num);
    markers
}

/// Positioned waypoints that have not expired at `now` (epoch seconds).
pub fn waypoint_markers(waypoints: &[Arc<Waypoint>], now: u64) -> Vec<WaypointMarker> {
    let mut markers: Vec<WaypointMarker> = waypoints
        .iter()
        .filter(|w| w.expire == 0 || u64::from(w.expire) > now)
        .filter_map(|w| {
            let position = LatLng::from_waypoint(w)?;
            Some(WaypointMarker {
                id: w.id,
                name: w.name.clone(),
                description: w.description.clone(),
                icon: w.icon,
                position,
            })
        })
        .collect();
    markers.sort_by_key(|m| m.id);
    markers
}
