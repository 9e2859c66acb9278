//! Command handlers: capture -> dispatcher -> output formatting.

pub mod camera;
pub mod classify;
pub mod config_cmd;
pub mod messages;
pub mod nodes;
pub mod overlay;
pub mod replay;
pub mod util;

use meshmap_core::MeshConfig;

use crate::cli::OutputFormat;

/// Resolved settings shared by every capture-backed command.
#[derive(Debug, Clone)]
pub struct Context {
    pub output: OutputFormat,
    /// Whether table output may use ANSI colors.
    pub color: bool,
    pub quiet: bool,
    pub mesh: MeshConfig,
}
