// ── Message log types ──

use serde::{Deserialize, Serialize};
use strum::Display;

use super::node_num::NodeNum;
use super::packet::{MessagePacket, Packet, RouteDiscovery};

/// Delivery state of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageState {
    /// Sent by the local node, awaiting delivery confirmation.
    Waiting,
    /// Received from another node.
    Ack,
    /// Arrived before the session identity was known.
    Unknown,
}

impl MessageState {
    /// Pure derivation from the sender and the local node number.
    pub fn derive(from: NodeNum, my_node_num: NodeNum) -> Self {
        if from == my_node_num {
            Self::Waiting
        } else {
            Self::Ack
        }
    }

    /// Derivation when the identity may not be known yet.
    pub fn derive_with(from: NodeNum, my_node_num: Option<NodeNum>) -> Self {
        my_node_num.map_or(Self::Unknown, |me| Self::derive(from, me))
    }
}

/// A text message with its derived state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(flatten)]
    pub packet: MessagePacket,
    pub state: MessageState,
}

impl Message {
    /// Log identity: the same packet replayed maps to the same entry.
    pub fn key(&self) -> (NodeNum, u32) {
        (self.packet.from, self.packet.id)
    }
}

/// A completed trace route.
pub type TraceRoute = Packet<RouteDiscovery>;
