// ── Packet dispatcher ──
//
// Typed packets arrive on one channel per kind. Each packet is mapped to
// exactly one store mutation; a few also raise a `DispatchEvent`.

mod backpressure;
mod channels;
mod dispatcher;
mod event;
mod handlers;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub use backpressure::{QueueMonitor, QueuePressure};
pub use channels::{PacketReceivers, PacketSink, packet_channels};
pub use dispatcher::PacketDispatcher;
pub use event::{DispatchEvent, MeshEvent, RoutingDiagnostic};

/// Upstream channel names. Packets within one kind are processed in
/// arrival order; different kinds interleave freely.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PacketKind {
    Metadata,
    Routing,
    Telemetry,
    DeviceStatus,
    Waypoint,
    MyNodeInfo,
    User,
    Position,
    NodeInfo,
    Channel,
    Config,
    ModuleConfig,
    Message,
    TraceRoute,
    PendingSettingsChange,
    MeshPacket,
    QueueStatus,
    NeighborInfo,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn kind_names_match_event_tags() {
        assert_eq!(PacketKind::MyNodeInfo.to_string(), "my_node_info");
        assert_eq!(
            "pending_settings_change".parse::<PacketKind>().ok(),
            Some(PacketKind::PendingSettingsChange)
        );
        assert_eq!(PacketKind::iter().count(), 18);
    }
}
