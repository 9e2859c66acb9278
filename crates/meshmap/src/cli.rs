//! Clap derive structures for the `meshmap` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// meshmap -- replay mesh packet captures and render link-quality maps
#[derive(Debug, Parser)]
#[command(
    name = "meshmap",
    version,
    about = "Replay radio mesh packet captures and render link-quality maps",
    long_about = "Feeds decoded mesh packets (one JSON event per line) through the packet\n\
        dispatcher, then prints the resulting node table, message log, GeoJSON\n\
        link overlays, or map camera.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "MESHMAP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "MESHMAP_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a capture through the packet dispatcher and summarize
    #[command(alias = "r")]
    Replay(ReplayArgs),

    /// List nodes seen in a capture
    #[command(alias = "n")]
    Nodes(NodesArgs),

    /// List text messages with their delivery state
    #[command(alias = "msg")]
    Messages(MessagesArgs),

    /// Render map overlays as GeoJSON
    Overlay(OverlayArgs),

    /// Show where the map camera would move
    Camera(CameraArgs),

    /// Classify a link from its SNR and RSSI
    Classify(ClassifyArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Capture Arguments ─────────────────────────────────────────

/// Every capture-backed command takes the file and an optional clock.
#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Capture file: one JSON mesh event per line ('-' for stdin)
    pub file: PathBuf,

    /// Evaluate freshness at this epoch second instead of the current time
    #[arg(long)]
    pub now: Option<i64>,
}

// ── Replay ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub capture: CaptureArgs,
}

// ── Nodes ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NodesArgs {
    #[command(flatten)]
    pub capture: CaptureArgs,

    /// Which nodes to show
    #[arg(long, short = 'f', default_value = "all")]
    pub filter: NodeView,

    /// Only nodes heard within this many seconds of --now
    #[arg(long)]
    pub heard_within: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NodeView {
    /// Every node
    All,
    /// Nodes heard with zero hops
    Direct,
    /// Nodes with a usable position
    Positioned,
    /// Nodes flagged as favorite
    Favorite,
}

// ── Messages ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MessagesArgs {
    #[command(flatten)]
    pub capture: CaptureArgs,

    /// Only messages in this state
    #[arg(long, short = 's')]
    pub state: Option<StateFilter>,

    /// Only messages from this node (!hex, 0xhex or decimal)
    #[arg(long)]
    pub from: Option<String>,

    /// Only messages on this channel index
    #[arg(long)]
    pub channel: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateFilter {
    Waiting,
    Ack,
    Unknown,
}

// ── Overlay ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OverlayArgs {
    #[command(flatten)]
    pub capture: CaptureArgs,

    /// Which layer to render
    #[arg(long, short = 'l', default_value = "all")]
    pub layer: Layer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layer {
    /// Links from reported neighbor tables
    Neighbor,
    /// Links between the self node and direct neighbors
    Direct,
    /// Node and waypoint points
    Markers,
    /// Everything merged into one collection
    All,
}

// ── Camera ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CameraArgs {
    #[command(flatten)]
    pub capture: CaptureArgs,

    /// Viewport size in pixels (e.g. 1280x720) to compute center and zoom
    #[arg(long)]
    pub viewport: Option<String>,
}

// ── Classify ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Signal-to-noise ratio in dB
    #[arg(long, allow_hyphen_values = true)]
    pub snr: f32,

    /// Received signal strength in dBm
    #[arg(long, allow_hyphen_values = true)]
    pub rssi: Option<i32>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
