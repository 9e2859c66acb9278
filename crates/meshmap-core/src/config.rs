// ── Runtime configuration ──
//
// Tuning for the dispatcher and the overlay. Built by the CLI from the
// config crate; the core never reads files.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;
use crate::overlay::LinkThresholds;

/// Largest fit padding accepted, in pixels.
pub const MAX_FIT_PADDING: u32 = 500;

/// Which node the direct-link overlay treats as "self".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SelfNodeSource {
    /// The first node flagged as favorite.
    #[default]
    Favorite,
    /// The node whose number the radio reported in MyNodeInfo.
    LocalNode,
}

/// Overlay generation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySettings {
    pub thresholds: LinkThresholds,
    /// How recently a direct neighbor must have been heard.
    pub direct_link_freshness: Duration,
    /// Uniform padding around fitted bounds, in pixels.
    pub fit_padding: u32,
    pub self_node: SelfNodeSource,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            thresholds: LinkThresholds::default(),
            direct_link_freshness: Duration::from_secs(60 * 20),
            fit_padding: 10,
            self_node: SelfNodeSource::Favorite,
        }
    }
}

/// Configuration for one dispatcher and its overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshConfig {
    /// Bound of each per-kind packet channel.
    pub channel_capacity: usize,
    /// Bound of the dispatch event broadcast.
    pub event_capacity: usize,
    /// Free outbound slots below which the queue counts as throttled.
    pub queue_low_water: u32,
    pub overlay: OverlaySettings,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            event_capacity: 256,
            queue_low_water: 10,
            overlay: OverlaySettings::default(),
        }
    }
}

impl MeshConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.channel_capacity == 0 {
            return Err(invalid("channel_capacity must be at least 1"));
        }
        if self.event_capacity == 0 {
            return Err(invalid("event_capacity must be at least 1"));
        }

        let t = &self.overlay.thresholds;
        if !(t.good_snr.is_finite() && t.fair_snr.is_finite()) {
            return Err(invalid("SNR thresholds must be finite numbers"));
        }
        if t.fair_snr > t.good_snr {
            return Err(invalid(format!(
                "fair_snr ({}) must not exceed good_snr ({})",
                t.fair_snr, t.good_snr
            )));
        }
        if t.fair_rssi > t.good_rssi {
            return Err(invalid(format!(
                "fair_rssi ({}) must not exceed good_rssi ({})",
                t.fair_rssi, t.good_rssi
            )));
        }
        if self.overlay.fit_padding > MAX_FIT_PADDING {
            return Err(invalid(format!(
                "fit_padding ({}) exceeds {MAX_FIT_PADDING} px",
                self.overlay.fit_padding
            )));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::Config {
        message: message.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MeshConfig::default();
        config.validate().unwrap();
        assert_eq!(config.overlay.direct_link_freshness, Duration::from_secs(1200));
        assert_eq!(config.overlay.fit_padding, 10);
        assert_eq!(config.queue_low_water, 10);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut config = MeshConfig::default();
        config.overlay.thresholds.fair_snr = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fair_snr"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = MeshConfig {
            channel_capacity: 0,
            ..MeshConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn self_node_source_parses() {
        assert_eq!(
            "local-node".parse::<SelfNodeSource>().ok(),
            Some(SelfNodeSource::LocalNode)
        );
        assert_eq!(SelfNodeSource::Favorite.to_string(), "favorite");
    }
}
