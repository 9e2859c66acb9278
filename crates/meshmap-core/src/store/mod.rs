// ── Device state store ──
//
// The dispatcher writes through the `DeviceStateStore` trait; `DataStore`
// is the in-memory implementation with push-based change notification.

mod collection;
mod data_store;
mod log;

use std::sync::Arc;

pub use data_store::DataStore;

use crate::model::{
    Channel, ConfigPacket, DeviceMetadata, DeviceStatus, Message, ModuleConfigPacket, MyNodeInfo,
    NeighborInfo, Node, NodeInfo, NodeNeighbors, NodeNum, PacketMetrics, Position, QueueStatus,
    TraceRoute, User, Waypoint,
};

/// Mutators the dispatcher applies, one per packet rule, named by effect.
///
/// Implementations must publish each call as a single atomic change:
/// readers see either the state before the call or after it.
pub trait DeviceStateStore: Send + Sync {
    fn add_metadata(&self, node: NodeNum, metadata: DeviceMetadata);
    fn set_status(&self, status: DeviceStatus);
    fn add_waypoint(&self, waypoint: Waypoint);
    fn set_hardware(&self, info: MyNodeInfo);
    fn add_user(&self, node: NodeNum, user: User);
    fn add_position(&self, node: NodeNum, position: Position);
    fn add_node_info(&self, info: NodeInfo);
    fn add_channel(&self, channel: Channel);
    fn set_config(&self, config: ConfigPacket);
    fn set_module_config(&self, config: ModuleConfigPacket);
    fn add_message(&self, message: Message);
    fn add_trace_route(&self, route: TraceRoute);
    fn set_pending_settings_changes(&self, pending: bool);
    fn process_packet(&self, metrics: PacketMetrics);
    fn set_queue_status(&self, status: QueueStatus);
    fn set_neighbor_info(&self, node: NodeNum, info: NeighborInfo);

    /// Reclassify messages logged before the session identity was known.
    /// Returns how many entries changed.
    fn resolve_message_states(&self, my_node_num: NodeNum) -> usize;
}

/// Consistent view of what the map overlay needs.
#[derive(Debug, Clone, Default)]
pub struct TopologySnapshot {
    pub nodes: Arc<Vec<Arc<Node>>>,
    pub neighbors: Arc<Vec<Arc<NodeNeighbors>>>,
    pub waypoints: Arc<Vec<Arc<Waypoint>>>,
}
