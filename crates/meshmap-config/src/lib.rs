//! Shared configuration for meshmap tools.
//!
//! TOML file plus `MESHMAP_*` environment overrides, validated and
//! translated to `meshmap_core::MeshConfig`. Nested keys use a double
//! underscore in env vars: `MESHMAP_OVERLAY__FIT_PADDING=25`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use meshmap_core::{CoreError, LinkThresholds, MeshConfig, OverlaySettings, SelfNodeSource};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<CoreError> for ConfigError {
    fn from(err: CoreError) -> Self {
        let reason = match err {
            CoreError::Config { message } => message,
            other => other.to_string(),
        };
        Self::Validation {
            field: "config".into(),
            reason,
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// CLI presentation defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Packet channel and broadcast sizing.
    #[serde(default)]
    pub dispatch: DispatchSection,

    /// Link classification and map overlay tuning.
    #[serde(default)]
    pub overlay: OverlaySection,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchSection {
    pub channel_capacity: usize,
    pub event_capacity: usize,
    /// Free outbound slots below which the radio queue is throttled.
    pub queue_low_water: u32,
}

impl Default for DispatchSection {
    fn default() -> Self {
        let mesh = MeshConfig::default();
        Self {
            channel_capacity: mesh.channel_capacity,
            event_capacity: mesh.event_capacity,
            queue_low_water: mesh.queue_low_water,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OverlaySection {
    pub good_snr: f32,
    pub fair_snr: f32,
    pub good_rssi: i32,
    pub fair_rssi: i32,
    pub direct_link_freshness_secs: u64,
    pub fit_padding: u32,
    pub self_node: SelfNodeSource,
}

impl Default for OverlaySection {
    fn default() -> Self {
        let overlay = OverlaySettings::default();
        Self {
            good_snr: overlay.thresholds.good_snr,
            fair_snr: overlay.thresholds.fair_snr,
            good_rssi: overlay.thresholds.good_rssi,
            fair_rssi: overlay.thresholds.fair_rssi,
            direct_link_freshness_secs: overlay.direct_link_freshness.as_secs(),
            fit_padding: overlay.fit_padding,
            self_node: overlay.self_node,
        }
    }
}

impl Config {
    /// Translate to the core runtime config, rejecting inconsistent values.
    pub fn to_mesh_config(&self) -> Result<MeshConfig, ConfigError> {
        let overlay = &self.overlay;
        let mesh = MeshConfig {
            channel_capacity: self.dispatch.channel_capacity,
            event_capacity: self.dispatch.event_capacity,
            queue_low_water: self.dispatch.queue_low_water,
            overlay: OverlaySettings {
                thresholds: LinkThresholds {
                    good_snr: overlay.good_snr,
                    fair_snr: overlay.fair_snr,
                    good_rssi: overlay.good_rssi,
                    fair_rssi: overlay.fair_rssi,
                },
                direct_link_freshness: Duration::from_secs(overlay.direct_link_freshness_secs),
                fit_padding: overlay.fit_padding,
                self_node: overlay.self_node,
            },
        };
        mesh.validate()?;
        Ok(mesh)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "meshmap", "meshmap").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("meshmap");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file contributes nothing.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MESHMAP_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    // Loads run inside a jail so env overrides never leak between tests.
    fn load(jail: &Jail, file: &str) -> Result<Config, figment::Error> {
        load_config_from(&jail.directory().join(file)).map_err(|e| e.to_string().into())
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            let config = load(jail, "absent.toml")?;
            assert_eq!(config, Config::default());
            assert_eq!(config.to_mesh_config().unwrap(), MeshConfig::default());
            Ok(())
        });
    }

    #[test]
    fn file_values_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[overlay]\nfit_padding = 40\nself_node = \"local-node\"\n\n[dispatch]\nqueue_low_water = 3\n",
            )?;

            let mesh = load(jail, "config.toml")?.to_mesh_config().unwrap();
            assert_eq!(mesh.overlay.fit_padding, 40);
            assert_eq!(mesh.overlay.self_node, SelfNodeSource::LocalNode);
            assert_eq!(mesh.queue_low_water, 3);
            assert_eq!(mesh.channel_capacity, 64);
            assert_eq!(mesh.overlay.thresholds, LinkThresholds::default());
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[overlay]\nfit_padding = 40\n")?;
            jail.set_env("MESHMAP_OVERLAY__FIT_PADDING", 25);
            jail.set_env("MESHMAP_DISPATCH__CHANNEL_CAPACITY", 8);

            let config = load(jail, "config.toml")?;
            assert_eq!(config.overlay.fit_padding, 25);
            assert_eq!(config.dispatch.channel_capacity, 8);
            Ok(())
        });
    }

    #[test]
    fn inverted_thresholds_fail_validation() {
        let mut config = Config::default();
        config.overlay.fair_rssi = -100;
        let err = config.to_mesh_config().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(err.to_string().contains("fair_rssi"));
    }

    #[test]
    fn malformed_toml_is_a_load_error() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[overlay\nfit_padding = ")?;
            let path = jail.directory().join("config.toml");
            assert!(matches!(
                load_config_from(&path),
                Err(ConfigError::Figment(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn saved_config_loads_back() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("nested").join("config.toml");
            let mut config = Config::default();
            config.overlay.direct_link_freshness_secs = 600;
            config.defaults.output = "json".into();

            save_config_to(&config, &path).unwrap();
            let text = std::fs::read_to_string(&path).unwrap();
            assert!(text.contains("direct_link_freshness_secs = 600"));
            assert_eq!(load(jail, "nested/config.toml")?, config);
            Ok(())
        });
    }
}
