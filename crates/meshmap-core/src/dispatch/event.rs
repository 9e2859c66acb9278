// ── Dispatcher input and output events ──

use std::fmt;

use serde::{Deserialize, Serialize};

use super::PacketKind;
use super::backpressure::QueuePressure;
use crate::model::{
    Channel, ConfigPacket, DeviceMetadata, DeviceStatus, MeshPacketEnvelope, MessagePacket,
    ModuleConfigPacket, MyNodeInfo, NeighborInfo, NodeInfo, NodeNum, Packet, Position,
    QueueStatus, RouteDiscovery, Routing, RoutingError, RoutingVariant, Telemetry, TraceRoute,
    User, Waypoint,
};

/// One decoded packet from the transport, tagged by channel.
///
/// Serialized adjacently tagged: `{"kind": "position", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum MeshEvent {
    Metadata(Packet<DeviceMetadata>),
    Routing(Packet<Routing>),
    Telemetry(Packet<Telemetry>),
    DeviceStatus(DeviceStatus),
    Waypoint(Packet<Waypoint>),
    MyNodeInfo(MyNodeInfo),
    User(Packet<User>),
    Position(Packet<Position>),
    NodeInfo(NodeInfo),
    Channel(Channel),
    Config(ConfigPacket),
    ModuleConfig(ModuleConfigPacket),
    Message(MessagePacket),
    TraceRoute(TraceRoute),
    PendingSettingsChange(bool),
    MeshPacket(MeshPacketEnvelope),
    QueueStatus(QueueStatus),
    NeighborInfo(Packet<NeighborInfo>),
}

impl MeshEvent {
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::Metadata(_) => PacketKind::Metadata,
            Self::Routing(_) => PacketKind::Routing,
            Self::Telemetry(_) => PacketKind::Telemetry,
            Self::DeviceStatus(_) => PacketKind::DeviceStatus,
            Self::Waypoint(_) => PacketKind::Waypoint,
            Self::MyNodeInfo(_) => PacketKind::MyNodeInfo,
            Self::User(_) => PacketKind::User,
            Self::Position(_) => PacketKind::Position,
            Self::NodeInfo(_) => PacketKind::NodeInfo,
            Self::Channel(_) => PacketKind::Channel,
            Self::Config(_) => PacketKind::Config,
            Self::ModuleConfig(_) => PacketKind::ModuleConfig,
            Self::Message(_) => PacketKind::Message,
            Self::TraceRoute(_) => PacketKind::TraceRoute,
            Self::PendingSettingsChange(_) => PacketKind::PendingSettingsChange,
            Self::MeshPacket(_) => PacketKind::MeshPacket,
            Self::QueueStatus(_) => PacketKind::QueueStatus,
            Self::NeighborInfo(_) => PacketKind::NeighborInfo,
        }
    }
}

// ── Routing diagnostics ──────────────────────────────────────────────

/// Informational routing outcome. Never an error for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingDiagnostic {
    Error {
        from: NodeNum,
        id: u32,
        reason: RoutingError,
    },
    RouteReply {
        from: NodeNum,
        id: u32,
        route: RouteDiscovery,
    },
    RouteRequest {
        from: NodeNum,
        id: u32,
        route: RouteDiscovery,
    },
}

impl RoutingDiagnostic {
    /// `None` for the success sentinel, which carries nothing to report.
    pub fn from_packet(packet: &Packet<Routing>) -> Option<Self> {
        let (from, id) = (packet.from, packet.id);
        match &packet.data.variant {
            RoutingVariant::ErrorReason(RoutingError::None) => None,
            RoutingVariant::ErrorReason(reason) => Some(Self::Error {
                from,
                id,
                reason: *reason,
            }),
            RoutingVariant::RouteReply(route) => Some(Self::RouteReply {
                from,
                id,
                route: route.clone(),
            }),
            RoutingVariant::RouteRequest(route) => Some(Self::RouteRequest {
                from,
                id,
                route: route.clone(),
            }),
        }
    }

    pub fn reporter(&self) -> NodeNum {
        match self {
            Self::Error { from, .. }
            | Self::RouteReply { from, .. }
            | Self::RouteRequest { from, .. } => *from,
        }
    }
}

impl fmt::Display for RoutingDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error { from, reason, .. } => write!(f, "routing error {reason} from {from}"),
            Self::RouteReply { from, route, .. } => {
                write!(f, "route reply from {from} ({} hops)", route.route.len())
            }
            Self::RouteRequest { from, route, .. } => {
                write!(f, "route request from {from} ({} hops)", route.route.len())
            }
        }
    }
}

// ── Dispatcher output ────────────────────────────────────────────────

/// Side-channel notifications raised while applying packets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    Routing(RoutingDiagnostic),
    /// The outbound queue crossed the low-water mark in either direction.
    Backpressure { pressure: QueuePressure },
    IdentityResolved { num: NodeNum, reclassified: usize },
    /// A second, different MyNodeInfo arrived and was ignored.
    IdentityConflict { current: NodeNum, reported: NodeNum },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_use_kind_and_payload_tags() {
        let line = r#"{"kind": "position", "payload": {"from": 5, "data": {"latitude_i": 100000000, "longitude_i": 200000000}}}"#;
        let event: MeshEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.kind(), PacketKind::Position);

        let MeshEvent::Position(packet) = event else {
            panic!("expected position");
        };
        assert_eq!(packet.from, NodeNum(5));
        assert!(packet.data.is_valid());
    }

    #[test]
    fn unit_payloads_deserialize() {
        let event: MeshEvent =
            serde_json::from_str(r#"{"kind": "pending_settings_change", "payload": true}"#)
                .unwrap();
        assert_eq!(event, MeshEvent::PendingSettingsChange(true));

        let event: MeshEvent =
            serde_json::from_str(r#"{"kind": "device_status", "payload": "configured"}"#).unwrap();
        assert_eq!(event, MeshEvent::DeviceStatus(DeviceStatus::Configured));
    }

    #[test]
    fn success_sentinel_has_no_diagnostic() {
        let ok = Packet::new(
            NodeNum(1),
            Routing {
                variant: RoutingVariant::ErrorReason(RoutingError::None),
            },
        );
        assert!(RoutingDiagnostic::from_packet(&ok).is_none());

        let failed = Packet::new(
            NodeNum(1),
            Routing {
                variant: RoutingVariant::ErrorReason(RoutingError::Timeout),
            },
        )
        .with_id(9);
        let diagnostic = RoutingDiagnostic::from_packet(&failed).unwrap();
        assert_eq!(diagnostic.reporter(), NodeNum(1));
        assert_eq!(diagnostic.to_string(), "routing error TIMEOUT from !00000001");
    }
}
