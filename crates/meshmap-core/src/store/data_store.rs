// ── Central reactive data store ──
//
// Thread-safe storage for everything the dispatcher learns about the mesh.
// Mutations are broadcast to subscribers via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use super::collection::EntityCollection;
use super::log::PacketLog;
use super::{DeviceStateStore, TopologySnapshot};
use crate::model::{
    Channel, ConfigPacket, ConfigSection, DeviceMetadata, DeviceStatus, Message, MessageState,
    ModuleConfigPacket, ModuleConfigSection, MyNodeInfo, NeighborInfo, Node, NodeInfo,
    NodeNeighbors, NodeNum, PacketMetrics, Position, QueueStatus, TraceRoute, User, Waypoint,
};
use crate::stream::{EntityStream, TopologyStream};

/// Central reactive store for mesh state.
///
/// Each mutator touches exactly one collection or watch value, so every
/// packet becomes visible to readers in a single snapshot swap.
pub struct DataStore {
    pub(crate) nodes: EntityCollection<NodeNum, Node>,
    pub(crate) neighbors: EntityCollection<NodeNum, NodeNeighbors>,
    pub(crate) metadata: EntityCollection<NodeNum, DeviceMetadata>,
    pub(crate) waypoints: EntityCollection<u32, Waypoint>,
    pub(crate) channels: EntityCollection<u32, Channel>,
    pub(crate) config: EntityCollection<ConfigSection, ConfigPacket>,
    pub(crate) module_config: EntityCollection<ModuleConfigSection, ModuleConfigPacket>,
    pub(crate) messages: PacketLog<Message>,
    pub(crate) trace_routes: PacketLog<TraceRoute>,
    pub(crate) status: watch::Sender<DeviceStatus>,
    pub(crate) hardware: watch::Sender<Option<MyNodeInfo>>,
    pub(crate) pending_settings: watch::Sender<bool>,
    pub(crate) queue_status: watch::Sender<Option<QueueStatus>>,
    pub(crate) last_packet: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (status, _) = watch::channel(DeviceStatus::default());
        let (hardware, _) = watch::channel(None);
        let (pending_settings, _) = watch::channel(false);
        let (queue_status, _) = watch::channel(None);
        let (last_packet, _) = watch::channel(None);

        Self {
            nodes: EntityCollection::new(),
            neighbors: EntityCollection::new(),
            metadata: EntityCollection::new(),
            waypoints: EntityCollection::new(),
            channels: EntityCollection::new(),
            config: EntityCollection::new(),
            module_config: EntityCollection::new(),
            messages: PacketLog::new(),
            trace_routes: PacketLog::new(),
            status,
            hardware,
            pending_settings,
            queue_status,
            last_packet,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn nodes_snapshot(&self) -> Arc<Vec<Arc<Node>>> {
        self.nodes.snapshot()
    }

    pub fn neighbors_snapshot(&self) -> Arc<Vec<Arc<NodeNeighbors>>> {
        self.neighbors.snapshot()
    }

    pub fn waypoints_snapshot(&self) -> Arc<Vec<Arc<Waypoint>>> {
        self.waypoints.snapshot()
    }

    pub fn channels_snapshot(&self) -> Arc<Vec<Arc<Channel>>> {
        self.channels.snapshot()
    }

    pub fn config_snapshot(&self) -> Arc<Vec<Arc<ConfigPacket>>> {
        self.config.snapshot()
    }

    pub fn module_config_snapshot(&self) -> Arc<Vec<Arc<ModuleConfigPacket>>> {
        self.module_config.snapshot()
    }

    pub fn messages_snapshot(&self) -> Arc<Vec<Arc<Message>>> {
        self.messages.snapshot()
    }

    pub fn trace_routes_snapshot(&self) -> Arc<Vec<Arc<TraceRoute>>> {
        self.trace_routes.snapshot()
    }

    /// Everything the map overlay reads, captured together.
    pub fn topology_snapshot(&self) -> TopologySnapshot {
        TopologySnapshot {
            nodes: self.nodes.snapshot(),
            neighbors: self.neighbors.snapshot(),
            waypoints: self.waypoints.snapshot(),
        }
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn node(&self, num: NodeNum) -> Option<Arc<Node>> {
        self.nodes.get(&num)
    }

    pub fn neighbors_of(&self, num: NodeNum) -> Option<Arc<NodeNeighbors>> {
        self.neighbors.get(&num)
    }

    pub fn metadata_for(&self, num: NodeNum) -> Option<Arc<DeviceMetadata>> {
        self.metadata.get(&num)
    }

    pub fn config_section(&self, section: ConfigSection) -> Option<Arc<ConfigPacket>> {
        self.config.get(&section)
    }

    pub fn module_config_section(
        &self,
        section: ModuleConfigSection,
    ) -> Option<Arc<ModuleConfigPacket>> {
        self.module_config.get(&section)
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn trace_route_count(&self) -> usize {
        self.trace_routes.len()
    }

    /// Combined mutation counter of the collections the overlay reads.
    pub fn topology_version(&self) -> u64 {
        self.nodes.version() + self.neighbors.version() + self.waypoints.version()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_nodes(&self) -> EntityStream<Node> {
        EntityStream::new(self.nodes.subscribe())
    }

    pub fn subscribe_neighbors(&self) -> EntityStream<NodeNeighbors> {
        EntityStream::new(self.neighbors.subscribe())
    }

    pub fn subscribe_waypoints(&self) -> EntityStream<Waypoint> {
        EntityStream::new(self.waypoints.subscribe())
    }

    /// One feed for everything the overlay reads.
    pub fn subscribe_topology(&self) -> TopologyStream {
        TopologyStream::new(
            self.subscribe_nodes(),
            self.subscribe_neighbors(),
            self.subscribe_waypoints(),
        )
    }

    // ── Scalar state ─────────────────────────────────────────────────

    pub fn status(&self) -> DeviceStatus {
        *self.status.borrow()
    }

    pub fn hardware(&self) -> Option<MyNodeInfo> {
        *self.hardware.borrow()
    }

    pub fn pending_settings_changes(&self) -> bool {
        *self.pending_settings.borrow()
    }

    pub fn queue_status(&self) -> Option<QueueStatus> {
        *self.queue_status.borrow()
    }

    /// Wall-clock time of the last raw mesh packet processed.
    pub fn last_packet(&self) -> Option<DateTime<Utc>> {
        *self.last_packet.borrow()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn modify_node(&self, num: NodeNum, update: impl FnOnce(&mut Node)) {
        if self.nodes.get(&num).is_none() {
            debug!(node = %num, "new node discovered");
        }
        self.nodes.modify(num, || Node::new(num), update);
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceStateStore for DataStore {
    fn add_metadata(&self, node: NodeNum, metadata: DeviceMetadata) {
        self.metadata.upsert(node, metadata);
    }

    fn set_status(&self, status: DeviceStatus) {
        self.status.send_replace(status);
    }

    fn add_waypoint(&self, waypoint: Waypoint) {
        self.waypoints.upsert(waypoint.id, waypoint);
    }

    fn set_hardware(&self, info: MyNodeInfo) {
        self.hardware.send_replace(Some(info));
    }

    fn add_user(&self, node: NodeNum, user: User) {
        self.modify_node(node, |n| n.user = Some(user));
    }

    fn add_position(&self, node: NodeNum, position: Position) {
        self.modify_node(node, |n| n.position = Some(position));
    }

    fn add_node_info(&self, info: NodeInfo) {
        self.modify_node(info.num, |n| n.merge_node_info(&info));
    }

    fn add_channel(&self, channel: Channel) {
        self.channels.upsert(channel.index, channel);
    }

    fn set_config(&self, config: ConfigPacket) {
        self.config.upsert(config.section, config);
    }

    fn set_module_config(&self, config: ModuleConfigPacket) {
        self.module_config.upsert(config.section, config);
    }

    fn add_message(&self, message: Message) {
        self.messages.record(message);
    }

    fn add_trace_route(&self, route: TraceRoute) {
        self.trace_routes.record(route);
    }

    fn set_pending_settings_changes(&self, pending: bool) {
        self.pending_settings.send_replace(pending);
    }

    fn process_packet(&self, metrics: PacketMetrics) {
        self.modify_node(metrics.from, |n| n.apply_metrics(&metrics));
        self.last_packet.send_replace(Some(Utc::now()));
    }

    fn set_queue_status(&self, status: QueueStatus) {
        self.queue_status.send_replace(Some(status));
    }

    fn set_neighbor_info(&self, node: NodeNum, info: NeighborInfo) {
        self.neighbors
            .upsert(node, NodeNeighbors::from_report(node, info));
    }

    fn resolve_message_states(&self, my_node_num: NodeNum) -> usize {
        self.messages.update_where(|message| {
            if message.state != MessageState::Unknown {
                return false;
            }
            message.state = MessageState::derive(message.packet.from, my_node_num);
            true
        })
    }
}
