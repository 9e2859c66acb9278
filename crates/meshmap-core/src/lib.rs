// meshmap-core: Packet dispatcher, topology store and link-quality overlays
// for radio mesh clients.
//
// Decoded packets flow in through per-kind channels, the dispatcher applies
// one store mutation per packet, and the overlay turns store snapshots into
// colored link geometry plus a camera instruction.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod overlay;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{MeshConfig, OverlaySettings, SelfNodeSource};
pub use dispatch::{
    DispatchEvent, MeshEvent, PacketDispatcher, PacketKind, PacketReceivers, PacketSink,
    QueueMonitor, QueuePressure, RoutingDiagnostic, packet_channels,
};
pub use error::CoreError;
pub use overlay::{
    CameraInstruction, FeatureCollection, FittedCamera, GeoBounds, LatLng, LinkLine, LinkQuality,
    LinkThresholds, MapOverlay, Viewport, classify, fit_camera, watch_overlay,
};
pub use session::{IdentityUpdate, SessionState};
pub use store::{DataStore, DeviceStateStore, TopologySnapshot};
pub use stream::{EntityStream, MessageFilter, NodeFilter, TopologyChange, TopologyStream};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Identity and nodes
    Message, MessageState, Node, NodeNeighbors, NodeNum, TraceRoute,
    // Packet payloads
    Channel, DeviceMetadata, DeviceStatus, MeshPacketEnvelope, MessageKind, MessagePacket,
    MyNodeInfo, Neighbor, NeighborInfo, NodeInfo, Packet, Position, QueueStatus, User, Waypoint,
};
