// ── Node identity ──
//
// Every node-keyed entity (nodes, neighbor tables, metadata, messages)
// shares this number space. A reference to a number that is not in the
// node set is simply unresolved, never an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Canonical 32-bit node number.
///
/// Displays in the conventional `!xxxxxxxx` form. Parses from that form,
/// from `0x`-prefixed hex, or from plain decimal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeNum(pub u32);

impl NodeNum {
    /// Destination address for packets sent to every node.
    pub const BROADCAST: Self = Self(0xffff_ffff);

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_broadcast(self) -> bool {
        self == Self::BROADCAST
    }
}

impl fmt::Display for NodeNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{:08x}", self.0)
    }
}

impl FromStr for NodeNum {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = if let Some(hex) = trimmed.strip_prefix('!') {
            u32::from_str_radix(hex, 16)
        } else if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            u32::from_str_radix(hex, 16)
        } else {
            trimmed.parse::<u32>()
        };

        parsed.map(Self).map_err(|e| CoreError::InvalidNodeNum {
            input: s.to_owned(),
            reason: e.to_string(),
        })
    }
}

impl From<u32> for NodeNum {
    fn from(n: u32) -> Self {
        Self(n)
    }
}
