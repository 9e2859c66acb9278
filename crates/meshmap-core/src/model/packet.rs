// ── Decoded packet payloads ──
//
// The transport hands the dispatcher already-decoded packets. These types
// are the typed shape of each channel's payload. Deserialization ignores
// unknown fields, and every optional field defaults, so a sparse payload
// is never a failure.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::node_num::NodeNum;

fn broadcast() -> NodeNum {
    NodeNum::BROADCAST
}

/// Envelope fields shared by every packet decoded from the mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet<T> {
    #[serde(default)]
    pub id: u32,
    pub from: NodeNum,
    #[serde(default = "broadcast")]
    pub to: NodeNum,
    #[serde(default)]
    pub channel: u32,
    /// Receive time, epoch seconds.
    #[serde(default)]
    pub rx_time: Option<u32>,
    pub data: T,
}

impl<T> Packet<T> {
    pub fn new(from: NodeNum, data: T) -> Self {
        Self {
            id: 0,
            from,
            to: NodeNum::BROADCAST,
            channel: 0,
            rx_time: None,
            data,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }
}

// ── Metadata ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceMetadata {
    pub firmware_version: String,
    pub device_state_version: u32,
    pub can_shutdown: bool,
    pub has_wifi: bool,
    pub has_bluetooth: bool,
    pub has_ethernet: bool,
    pub role: String,
    pub hw_model: String,
}

// ── Routing ──────────────────────────────────────────────────────────

/// Routing failure reason reported by the firmware.
///
/// `None` is the success sentinel and carries no diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingError {
    None,
    NoRoute,
    GotNak,
    Timeout,
    NoInterface,
    MaxRetransmit,
    NoChannel,
    TooLarge,
    NoResponse,
    DutyCycleLimit,
    BadRequest,
    NotAuthorized,
    PkiFailed,
    PkiUnknownPubkey,
}

/// Hop list of a route discovery, with per-hop SNR (dB × 4 on the wire).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteDiscovery {
    pub route: Vec<NodeNum>,
    pub snr_towards: Vec<i32>,
    pub route_back: Vec<NodeNum>,
    pub snr_back: Vec<i32>,
}

/// The tagged union carried by a routing packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingVariant {
    ErrorReason(RoutingError),
    RouteReply(RouteDiscovery),
    RouteRequest(RouteDiscovery),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routing {
    pub variant: RoutingVariant,
}

// ── Telemetry ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceMetrics {
    pub battery_level: Option<u32>,
    pub voltage: Option<f32>,
    pub channel_utilization: Option<f32>,
    pub air_util_tx: Option<f32>,
    pub uptime_seconds: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentMetrics {
    pub temperature: Option<f32>,
    pub relative_humidity: Option<f32>,
    pub barometric_pressure: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryVariant {
    DeviceMetrics(DeviceMetrics),
    EnvironmentMetrics(EnvironmentMetrics),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    #[serde(default)]
    pub time: u32,
    pub variant: TelemetryVariant,
}

// ── Device status ────────────────────────────────────────────────────

/// Connection lifecycle state as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceStatus {
    Restarting,
    #[default]
    Disconnected,
    Connecting,
    Reconnecting,
    Connected,
    Configuring,
    Configured,
}

// ── Waypoints ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Waypoint {
    pub id: u32,
    pub latitude_i: Option<i32>,
    pub longitude_i: Option<i32>,
    /// Expiry, epoch seconds. Zero means never.
    pub expire: u32,
    pub locked_to: Option<NodeNum>,
    pub name: String,
    pub description: String,
    pub icon: u32,
}

// ── Local node ───────────────────────────────────────────────────────

/// Identity of the radio this client is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyNodeInfo {
    pub my_node_num: NodeNum,
    #[serde(default)]
    pub reboot_count: u32,
    #[serde(default)]
    pub min_app_version: u32,
}

// ── User / position / node info ──────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub long_name: String,
    pub short_name: String,
    pub hw_model: String,
    pub role: String,
    pub is_licensed: bool,
}

/// Fixed-point position: degrees scaled by 1e7.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub latitude_i: Option<i32>,
    pub longitude_i: Option<i32>,
    pub altitude: Option<i32>,
    pub time: u32,
    pub sats_in_view: u32,
    pub precision_bits: u32,
}

impl Position {
    pub fn fixed(latitude_i: i32, longitude_i: i32) -> Self {
        Self {
            latitude_i: Some(latitude_i),
            longitude_i: Some(longitude_i),
            ..Self::default()
        }
    }

    /// A position is usable on the map only when it carries a non-zero
    /// latitude. Firmware reports `0` for "no fix".
    pub fn is_valid(&self) -> bool {
        self.latitude_i.is_some_and(|lat| lat != 0)
    }
}

/// Node record as sent during the initial node database dump.
///
/// Only the fields that are present overwrite the stored node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeInfo {
    pub num: NodeNum,
    pub user: Option<User>,
    pub position: Option<Position>,
    pub snr: Option<f32>,
    pub last_heard: Option<u32>,
    pub device_metrics: Option<DeviceMetrics>,
    pub channel: Option<u32>,
    pub via_mqtt: Option<bool>,
    pub hops_away: Option<u32>,
    pub is_favorite: Option<bool>,
}

// ── Channels / config ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelRole {
    #[default]
    Disabled,
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    pub name: String,
    pub uplink_enabled: bool,
    pub downlink_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub index: u32,
    pub role: ChannelRole,
    pub settings: ChannelSettings,
}

/// Radio config sections. Each packet replaces one section wholesale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfigSection {
    Device,
    Position,
    Power,
    Network,
    Display,
    Lora,
    Bluetooth,
    Security,
}

/// Module config sections. Each packet replaces one section wholesale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModuleConfigSection {
    Mqtt,
    Serial,
    ExternalNotification,
    StoreForward,
    RangeTest,
    Telemetry,
    CannedMessage,
    Audio,
    RemoteHardware,
    NeighborInfo,
    AmbientLighting,
    DetectionSensor,
    Paxcounter,
}

/// The section contents stay opaque: the core never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPacket {
    pub section: ConfigSection,
    #[serde(default)]
    pub values: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfigPacket {
    pub section: ModuleConfigSection,
    #[serde(default)]
    pub values: serde_json::Value,
}

// ── Messages ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    Direct,
    #[default]
    Broadcast,
}

/// Decoded text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePacket {
    #[serde(default)]
    pub id: u32,
    pub from: NodeNum,
    #[serde(default = "broadcast")]
    pub to: NodeNum,
    #[serde(default)]
    pub channel: u32,
    #[serde(default)]
    pub rx_time: Option<u32>,
    #[serde(default)]
    pub kind: MessageKind,
    pub text: String,
}

// ── Mesh envelope / queue / neighbors ────────────────────────────────

/// Raw mesh packet envelope, seen for every packet the radio forwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshPacketEnvelope {
    pub from: NodeNum,
    #[serde(default = "broadcast")]
    pub to: NodeNum,
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub channel: u32,
    #[serde(default)]
    pub rx_time: u32,
    #[serde(default)]
    pub rx_snr: f32,
    #[serde(default)]
    pub rx_rssi: i32,
    #[serde(default)]
    pub hop_limit: u32,
    #[serde(default)]
    pub hop_start: u32,
    #[serde(default)]
    pub via_mqtt: bool,
}

/// Per-packet reception metrics extracted from a [`MeshPacketEnvelope`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacketMetrics {
    pub from: NodeNum,
    pub snr: f32,
    /// Epoch seconds. Zero when the radio had no clock.
    pub time: u32,
    /// Zero means not measured.
    pub rssi: i32,
}

impl From<&MeshPacketEnvelope> for PacketMetrics {
    fn from(packet: &MeshPacketEnvelope) -> Self {
        Self {
            from: packet.from,
            snr: packet.rx_snr,
            time: packet.rx_time,
            rssi: packet.rx_rssi,
        }
    }
}

/// Outbound queue state of the attached radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueStatus {
    pub res: i32,
    pub free: u32,
    pub maxlen: u32,
    pub mesh_packet_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub node_id: NodeNum,
    #[serde(default)]
    pub snr: f32,
}

/// A node's own report of the nodes it hears directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborInfo {
    pub node_id: NodeNum,
    pub last_sent_by_id: NodeNum,
    pub node_broadcast_interval_secs: u32,
    pub neighbors: Vec<Neighbor>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn position_validity_follows_latitude() {
        assert!(Position::fixed(100_000_000, 0).is_valid());
        assert!(!Position::fixed(0, 200_000_000).is_valid());
        assert!(!Position::default().is_valid());
    }

    #[test]
    fn sparse_node_info_deserializes() {
        let info: NodeInfo = serde_json::from_str(r#"{"num": 5, "snr": -3.5, "extra": true}"#).unwrap();
        assert_eq!(info.num, NodeNum(5));
        assert_eq!(info.snr, Some(-3.5));
        assert!(info.user.is_none());
        assert!(info.hops_away.is_none());
    }

    #[test]
    fn routing_variant_uses_protobuf_names() {
        let routing: Routing =
            serde_json::from_str(r#"{"variant": {"error_reason": "NO_ROUTE"}}"#).unwrap();
        assert_eq!(routing.variant, RoutingVariant::ErrorReason(RoutingError::NoRoute));
        assert_eq!(RoutingError::MaxRetransmit.to_string(), "MAX_RETRANSMIT");
    }

    #[test]
    fn packet_defaults_destination_to_broadcast() {
        let packet: Packet<User> =
            serde_json::from_str(r#"{"from": 7, "data": {"short_name": "AB"}}"#).unwrap();
        assert!(packet.to.is_broadcast());
        assert_eq!(packet.data.short_name, "AB");
        assert!(packet.rx_time.is_none());
    }

    #[test]
    fn metrics_come_from_envelope() {
        let envelope = MeshPacketEnvelope {
            from: NodeNum(3),
            to: NodeNum::BROADCAST,
            id: 1,
            channel: 0,
            rx_time: 1_700_000_000,
            rx_snr: -4.25,
            rx_rssi: -90,
            hop_limit: 3,
            hop_start: 3,
            via_mqtt: false,
        };
        let metrics = PacketMetrics::from(&envelope);
        assert_eq!(metrics.from, NodeNum(3));
        assert_eq!(metrics.time, 1_700_000_000);
        assert!((metrics.snr - -4.25).abs() < f32::EPSILON);
    }
}
