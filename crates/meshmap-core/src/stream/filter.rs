// ── Filter predicates for entity streams ──
//
// Used by the CLI to narrow snapshots without touching the store.

use crate::model::{Message, MessageState, Node, NodeNum};

/// Filter predicate for node snapshots.
#[derive(Debug, Clone, Copy)]
pub enum NodeFilter {
    All,
    Direct,
    Positioned,
    Favorite,
    /// Heard within `window_secs` of `now` (epoch seconds).
    HeardWithin { now: u64, window_secs: u64 },
}

impl NodeFilter {
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Self::All => true,
            Self::Direct => node.is_direct(),
            Self::Positioned => node.valid_position().is_some(),
            Self::Favorite => node.is_favorite,
            Self::HeardWithin { now, window_secs } => {
                now.saturating_sub(u64::from(node.last_heard)) <= *window_secs
            }
        }
    }
}

/// Filter predicate for the message log.
#[derive(Debug, Clone, Copy)]
pub enum MessageFilter {
    From(NodeNum),
    State(MessageState),
    Channel(u32),
}

impl MessageFilter {
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            Self::From(num) => message.packet.from == *num,
            Self::State(state) => message.state == *state,
            Self::Channel(channel) => message.packet.channel == *channel,
        }
    }
}
