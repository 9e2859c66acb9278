//! Shared helpers for command handlers.

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};

use meshmap_core::{Position, Viewport};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file in effect: `--config`, else the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(meshmap_config::config_path)
}

/// `--now` as a timestamp, defaulting to the wall clock.
pub fn resolve_now(now: Option<i64>) -> Result<DateTime<Utc>, CliError> {
    let Some(secs) = now else {
        return Ok(Utc::now());
    };
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| CliError::Validation {
            field: "now".into(),
            reason: format!("{secs} is not a representable epoch second"),
        })
}

/// Epoch seconds clamped into the unsigned range the model uses.
pub fn epoch_secs(now: DateTime<Utc>) -> u64 {
    u64::try_from(now.timestamp()).unwrap_or(0)
}

/// Parse `WIDTHxHEIGHT`, e.g. `1280x720`.
pub fn parse_viewport(raw: &str) -> Result<Viewport, CliError> {
    let invalid = |reason: &str| CliError::Validation {
        field: "viewport".into(),
        reason: format!("'{raw}': {reason}"),
    };

    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| invalid("expected WIDTHxHEIGHT"))?;
    let width: u32 = w.trim().parse().map_err(|_| invalid("width is not a number"))?;
    let height: u32 = h.trim().parse().map_err(|_| invalid("height is not a number"))?;
    if width == 0 || height == 0 {
        return Err(invalid("dimensions must be positive"));
    }
    Ok(Viewport { width, height })
}

/// Epoch seconds as RFC 3339, or `-` when unset.
pub fn format_epoch(secs: u32) -> String {
    if secs == 0 {
        return "-".into();
    }
    Utc.timestamp_opt(i64::from(secs), 0)
        .single()
        .map_or_else(|| secs.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// `lat, lon` in degrees for usable positions, `-` otherwise.
pub fn format_position(position: Option<&Position>) -> String {
    position
        .filter(|p| p.is_valid())
        .map_or_else(
            || "-".into(),
            |p| {
                let deg = |fixed: Option<i32>| f64::from(fixed.unwrap_or(0)) / 1e7;
                format!("{:.5}, {:.5}", deg(p.latitude_i), deg(p.longitude_i))
            },
        )
}
