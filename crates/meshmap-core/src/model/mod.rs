// ── Mesh domain model ──
//
// Decoded packet payloads and the records the store builds from them.

pub mod message;
pub mod node;
pub mod node_num;
pub mod packet;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use meshmap_core::model::*` gives you everything.

pub use message::{Message, MessageState, TraceRoute};
pub use node::{Node, NodeNeighbors};
pub use node_num::NodeNum;
pub use packet::{
    Channel, ChannelRole, ChannelSettings, ConfigPacket, ConfigSection, DeviceMetadata,
    DeviceMetrics, DeviceStatus, EnvironmentMetrics, MeshPacketEnvelope, MessageKind,
    MessagePacket, ModuleConfigPacket, ModuleConfigSection, MyNodeInfo, Neighbor, NeighborInfo,
    NodeInfo, Packet, PacketMetrics, Position, QueueStatus, RouteDiscovery, Routing, RoutingError,
    RoutingVariant, Telemetry, TelemetryVariant, User, Waypoint,
};
