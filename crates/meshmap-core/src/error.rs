// ── Core error types ──
//
// Packet handling and overlay generation are total and never produce
// these. They cover the edges of the crate: identifier parsing, config
// validation, and delivering packets into a dispatcher that has stopped.

use thiserror::Error;

use crate::dispatch::PacketKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Identity errors ──────────────────────────────────────────────
    #[error("Invalid node number '{input}': {reason}")]
    InvalidNodeNum { input: String, reason: String },

    // ── Dispatcher errors ────────────────────────────────────────────
    #[error("Dispatcher stopped: {kind} channel is closed")]
    DispatcherStopped { kind: PacketKind },

    #[error("Dispatcher {kind} channel is full ({capacity} packets queued)")]
    ChannelFull { kind: PacketKind, capacity: usize },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}
