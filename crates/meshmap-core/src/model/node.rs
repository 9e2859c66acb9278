// ── Node domain types ──

use serde::{Deserialize, Serialize};

use super::node_num::NodeNum;
use super::packet::{DeviceMetrics, NeighborInfo, Neighbor, NodeInfo, PacketMetrics, Position, User};

/// The canonical node record. Built up from NodeInfo, User, Position and
/// raw mesh packets; never deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub num: NodeNum,
    pub user: Option<User>,
    pub position: Option<Position>,
    /// Hops between the local radio and this node. `Some(0)` is direct contact.
    pub hops_away: Option<u32>,
    /// Epoch seconds.
    pub last_heard: u32,
    pub snr: f32,
    pub rssi: Option<i32>,
    pub is_favorite: bool,
    pub via_mqtt: bool,
    pub channel: u32,
    pub device_metrics: Option<DeviceMetrics>,
}

impl Node {
    pub fn new(num: NodeNum) -> Self {
        Self {
            num,
            user: None,
            position: None,
            hops_away: None,
            last_heard: 0,
            snr: 0.0,
            rssi: None,
            is_favorite: false,
            via_mqtt: false,
            channel: 0,
            device_metrics: None,
        }
    }

    /// The node's position if it is usable on the map.
    pub fn valid_position(&self) -> Option<&Position> {
        self.position.as_ref().filter(|p| p.is_valid())
    }

    pub fn is_direct(&self) -> bool {
        self.hops_away == Some(0)
    }

    /// Short display label: the user's short name, or the node number.
    pub fn label(&self) -> String {
        self.user
            .as_ref()
            .map(|u| u.short_name.trim())
            .filter(|s| !s.is_empty())
            .map_or_else(|| self.num.to_string(), str::to_owned)
    }

    /// Merge a NodeInfo record: only the fields it carries overwrite.
    pub fn merge_node_info(&mut self, info: &NodeInfo) {
        if let Some(ref user) = info.user {
            self.user = Some(user.clone());
        }
        if let Some(position) = info.position {
            self.position = Some(position);
        }
        if let Some(snr) = info.snr {
            self.snr = snr;
        }
        if let Some(last_heard) = info.last_heard {
            self.last_heard = last_heard;
        }
        if let Some(metrics) = info.device_metrics {
            self.device_metrics = Some(metrics);
        }
        if let Some(channel) = info.channel {
            self.channel = channel;
        }
        if let Some(via_mqtt) = info.via_mqtt {
            self.via_mqtt = via_mqtt;
        }
        if let Some(hops) = info.hops_away {
            self.hops_away = Some(hops);
        }
        if let Some(favorite) = info.is_favorite {
            self.is_favorite = favorite;
        }
    }

    /// Fold reception metrics from a raw mesh packet into the record.
    ///
    /// A zero time means the radio had no clock; the previous value stays.
    pub fn apply_metrics(&mut self, metrics: &PacketMetrics) {
        self.snr = metrics.snr;
        if metrics.time > 0 {
            self.last_heard = metrics.time;
        }
        if metrics.rssi != 0 {
            self.rssi = Some(metrics.rssi);
        }
    }
}

/// Neighbor table reported by one node, keyed by the reporting node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeNeighbors {
    pub node: NodeNum,
    pub neighbors: Vec<Neighbor>,
    pub broadcast_interval_secs: u32,
}

impl NodeNeighbors {
    pub fn from_report(node: NodeNum, info: NeighborInfo) -> Self {
        Self {
            node,
            neighbors: info.neighbors,
            broadcast_interval_secs: info.node_broadcast_interval_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_overwrites_supplied_fields() {
        let mut node = Node::new(NodeNum(1));
        node.snr = 4.0;
        node.is_favorite = true;
        node.position = Some(Position::fixed(1, 2));

        node.merge_node_info(&NodeInfo {
            num: NodeNum(1),
            hops_away: Some(0),
            last_heard: Some(100),
            ..NodeInfo::default()
        });

        assert_eq!(node.hops_away, Some(0));
        assert_eq!(node.last_heard, 100);
        assert!((node.snr - 4.0).abs() < f32::EPSILON);
        assert!(node.is_favorite);
        assert_eq!(node.position, Some(Position::fixed(1, 2)));
    }

    #[test]
    fn metrics_keep_last_heard_without_clock() {
        let mut node = Node::new(NodeNum(2));
        node.last_heard = 50;
        node.apply_metrics(&PacketMetrics {
            from: NodeNum(2),
            snr: -12.0,
            time: 0,
            rssi: 0,
        });
        assert_eq!(node.last_heard, 50);
        assert!(node.rssi.is_none());
        assert!((node.snr - -12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn label_falls_back_to_number() {
        let mut node = Node::new(NodeNum(0xab));
        assert_eq!(node.label(), "!000000ab");
        node.user = Some(User {
            short_name: "BASE".into(),
            ..User::default()
        });
        assert_eq!(node.label(), "BASE");
    }

    #[test]
    fn invalid_position_is_hidden() {
        let mut node = Node::new(NodeNum(3));
        node.position = Some(Position::fixed(0, 5));
        assert!(node.valid_position().is_none());
    }
}
