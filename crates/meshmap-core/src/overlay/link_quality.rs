// ── Link quality classification ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Quality tier of a radio link. Ordered worst to best.
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
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkQuality {
    Bad,
    Fair,
    Good,
}

impl LinkQuality {
    /// Line color used on the map.
    pub fn color(self) -> &'static str {
        match self {
            Self::Good => "#00ff00",
            Self::Fair => "#ffe600",
            Self::Bad => "#f7931a",
        }
    }
}

/// Tier boundaries. A link must be strictly above a boundary to reach
/// that tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkThresholds {
    pub good_snr: f32,
    pub fair_snr: f32,
    pub good_rssi: i32,
    pub fair_rssi: i32,
}

impl Default for LinkThresholds {
    fn default() -> Self {
        Self {
            good_snr: -7.0,
            fair_snr: -15.0,
            good_rssi: -115,
            fair_rssi: -126,
        }
    }
}

impl LinkThresholds {
    /// First match wins. RSSI, when present, can only hold a link back a
    /// tier; it never lifts one past what SNR alone allows.
    pub fn classify(&self, snr: f32, rssi: Option<i32>) -> LinkQuality {
        let rssi_above = |floor: i32| rssi.is_none_or(|r| r > floor);

        if snr > self.good_snr && rssi_above(self.good_rssi) {
            LinkQuality::Good
        } else if snr > self.fair_snr && rssi_above(self.fair_rssi) {
            LinkQuality::Fair
        } else {
            LinkQuality::Bad
        }
    }
}

/// Classify with the default thresholds.
pub fn classify(snr: f32, rssi: Option<i32>) -> LinkQuality {
    LinkThresholds::default().classify(snr, rssi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snr_only_tiers() {
        assert_eq!(classify(-5.0, None), LinkQuality::Good);
        assert_eq!(classify(-10.0, None), LinkQuality::Fair);
        assert_eq!(classify(-20.0, None), LinkQuality::Bad);
    }

    #[test]
    fn boundaries_are_exclusive() {
        assert_eq!(classify(-7.0, None), LinkQuality::Fair);
        assert_eq!(classify(-15.0, None), LinkQuality::Bad);
    }

    #[test]
    fn rssi_only_downgrades() {
        assert_eq!(classify(-5.0, Some(-100)), LinkQuality::Good);
        assert_eq!(classify(-5.0, Some(-120)), LinkQuality::Fair);
        assert_eq!(classify(-5.0, Some(-130)), LinkQuality::Bad);
        assert_eq!(classify(-20.0, Some(-50)), LinkQuality::Bad);
    }

    #[test]
    fn monotonic_in_snr() {
        for rssi in [None, Some(-100), Some(-120), Some(-130)] {
            let mut previous = LinkQuality::Bad;
            for step in -120_i16..=40 {
                let snr = f32::from(step) * 0.25;
                let tier = classify(snr, rssi);
                assert!(tier >= previous, "tier dropped at snr={snr} rssi={rssi:?}");
                previous = tier;
            }
        }
    }

    #[test]
    fn colors_and_names() {
        assert_eq!(LinkQuality::Good.color(), "#00ff00");
        assert_eq!(LinkQuality::Fair.color(), "#ffe600");
        assert_eq!(LinkQuality::Bad.color(), "#f7931a");
        assert_eq!(LinkQuality::Fair.to_string(), "fair");
    }
}
