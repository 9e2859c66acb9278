//! Replay handler.
//!
//! Drives a capture through the spawned dispatcher: one task per packet
//! channel, exactly as a live connection would. Packets of different kinds
//! may therefore apply out of file order; message states still settle
//! because identity resolution reclassifies earlier messages.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use meshmap_core::{
    CameraInstruction, DataStore, DispatchEvent, LinkQuality, MapOverlay, MeshConfig, MeshEvent,
    MessageState, NodeNum, PacketDispatcher, PacketKind, QueuePressure, RoutingDiagnostic,
    packet_channels,
};

use crate::capture;
use crate::cli::ReplayArgs;
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Summary ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
struct MessageCounts {
    total: usize,
    waiting: usize,
    ack: usize,
    unknown: usize,
}

#[derive(Debug, Default, Serialize)]
struct LinkCounts {
    neighbor: usize,
    direct: usize,
    good: usize,
    fair: usize,
    bad: usize,
}

#[derive(Debug, Serialize)]
struct ReplaySummary {
    packets: usize,
    processed: BTreeMap<PacketKind, u64>,
    my_node: Option<NodeNum>,
    nodes: usize,
    positioned_nodes: usize,
    waypoints: usize,
    channels: usize,
    trace_routes: usize,
    messages: MessageCounts,
    reclassified: usize,
    links: LinkCounts,
    diagnostics: Vec<RoutingDiagnostic>,
    identity_conflicts: Vec<String>,
    backpressure: Vec<QueuePressure>,
    queue: QueuePressure,
    dropped_events: u64,
    camera: Option<CameraInstruction>,
}

/// Dispatch events observed while the capture drained.
#[derive(Debug, Default)]
struct Collected {
    diagnostics: Vec<RoutingDiagnostic>,
    backpressure: Vec<QueuePressure>,
    conflicts: Vec<String>,
    reclassified: usize,
    dropped: u64,
}

async fn collect_events(mut rx: broadcast::Receiver<DispatchEvent>) -> Collected {
    let mut collected = Collected::default();
    loop {
        match rx.recv().await {
            Ok(DispatchEvent::Routing(diagnostic)) => collected.diagnostics.push(diagnostic),
            Ok(DispatchEvent::Backpressure { pressure }) => collected.backpressure.push(pressure),
            Ok(DispatchEvent::IdentityResolved { reclassified, .. }) => {
                collected.reclassified += reclassified;
            }
            Ok(DispatchEvent::IdentityConflict { current, reported }) => collected
                .conflicts
                .push(format!("kept {current}, ignored {reported}")),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "dispatch event collector lagged");
                collected.dropped += skipped;
            }
            Err(RecvError::Closed) => break,
        }
    }
    collected
}

// ── Replay ──────────────────────────────────────────────────────────

struct Outcome {
    store: Arc<DataStore>,
    processed: Vec<(PacketKind, u64)>,
    my_node: Option<NodeNum>,
    queue: QueuePressure,
    collected: Collected,
}

/// Feed every event through per-kind channels and wait for them to drain.
async fn run_replay(events: Vec<MeshEvent>, config: &MeshConfig) -> Result<Outcome, CliError> {
    let store = Arc::new(DataStore::new());
    let dispatcher = Arc::new(PacketDispatcher::new(store.clone(), config));
    let collector = tokio::spawn(collect_events(dispatcher.events()));

    let (sink, receivers) = packet_channels(config.channel_capacity);
    let cancel = CancellationToken::new();
    let handles = dispatcher.spawn(receivers, &cancel);

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping packet channels");
            interrupt.cancel();
        }
    });

    for event in events {
        sink.deliver(event).await?;
    }
    // Closing the sink lets every channel task drain and exit.
    drop(sink);
    for handle in handles {
        handle.await?;
    }

    let processed = dispatcher.processed();
    let my_node = dispatcher.session().my_node_num();
    let queue = dispatcher.queue().current();
    // Last dispatcher reference: dropping it closes the event broadcast.
    drop(dispatcher);
    let collected = collector.await?;

    Ok(Outcome {
        store,
        processed,
        my_node,
        queue,
        collected,
    })
}

fn summarize(
    packets: usize,
    outcome: Outcome,
    config: &MeshConfig,
    now: DateTime<Utc>,
) -> ReplaySummary {
    let store = &outcome.store;
    let snapshot = store.topology_snapshot();
    let overlay = MapOverlay::generate(&snapshot, &config.overlay, now, outcome.my_node);

    let mut messages = MessageCounts::default();
    for message in store.messages_snapshot().iter() {
        messages.total += 1;
        match message.state {
            MessageState::Waiting => messages.waiting += 1,
            MessageState::Ack => messages.ack += 1,
            MessageState::Unknown => messages.unknown += 1,
        }
    }

    let mut links = LinkCounts {
        neighbor: overlay.neighbor_links.len(),
        direct: overlay.direct_links.len(),
        ..LinkCounts::default()
    };
    for line in overlay.neighbor_links.iter().chain(&overlay.direct_links) {
        match line.quality {
            LinkQuality::Good => links.good += 1,
            LinkQuality::Fair => links.fair += 1,
            LinkQuality::Bad => links.bad += 1,
        }
    }

    ReplaySummary {
        packets,
        processed: outcome.processed.into_iter().collect(),
        my_node: outcome.my_node,
        nodes: snapshot.nodes.len(),
        positioned_nodes: overlay.node_markers.len(),
        waypoints: snapshot.waypoints.len(),
        channels: store.channels_snapshot().len(),
        trace_routes: store.trace_route_count(),
        messages,
        reclassified: outcome.collected.reclassified,
        links,
        diagnostics: outcome.collected.diagnostics,
        identity_conflicts: outcome.collected.conflicts,
        backpressure: outcome.collected.backpressure,
        queue: outcome.queue,
        dropped_events: outcome.collected.dropped,
        camera: overlay.camera,
    }
}

// ── Rendering ───────────────────────────────────────────────────────

fn pressure_label(pressure: QueuePressure) -> String {
    match pressure {
        QueuePressure::Normal => "normal".into(),
        QueuePressure::Throttled { free } => format!("throttled ({free} free)"),
    }
}

fn detail(s: &ReplaySummary) -> String {
    let kinds = s
        .processed
        .iter()
        .map(|(kind, count)| format!("{kind} {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    let camera = match s.camera {
        None => "none".to_owned(),
        Some(CameraInstruction::CenterOn { .. }) => "center on single node".to_owned(),
        Some(CameraInstruction::FitBounds { padding, .. }) => format!("fit bounds ({padding}px)"),
    };

    let mut lines = vec![
        format!("Packets:      {} ({kinds})", s.packets),
        format!(
            "Identity:     {}",
            s.my_node.map_or_else(|| "unknown".into(), |n| n.to_string())
        ),
        format!("Nodes:        {} ({} positioned)", s.nodes, s.positioned_nodes),
        format!("Waypoints:    {}", s.waypoints),
        format!("Channels:     {}", s.channels),
        format!(
            "Messages:     {} (waiting {}, ack {}, unknown {})",
            s.messages.total, s.messages.waiting, s.messages.ack, s.messages.unknown
        ),
        format!("Trace routes: {}", s.trace_routes),
        format!(
            "Links:        neighbor {}, direct {} (good {}, fair {}, bad {})",
            s.links.neighbor, s.links.direct, s.links.good, s.links.fair, s.links.bad
        ),
        format!("Queue:        {}", pressure_label(s.queue)),
        format!("Camera:       {camera}"),
    ];
    if s.reclassified > 0 {
        lines.push(format!("Reclassified: {}", s.reclassified));
    }
    if !s.backpressure.is_empty() {
        let crossings: Vec<String> = s.backpressure.iter().copied().map(pressure_label).collect();
        lines.push(format!("Backpressure: {}", crossings.join(" -> ")));
    }
    for conflict in &s.identity_conflicts {
        lines.push(format!("Conflict:     {conflict}"));
    }
    if !s.diagnostics.is_empty() {
        lines.push("Diagnostics:".into());
        lines.extend(s.diagnostics.iter().map(|d| format!("  {d}")));
    }
    if s.dropped_events > 0 {
        lines.push(format!("Dropped:      {} events", s.dropped_events));
    }
    lines.join("\n")
}

fn plain(s: &ReplaySummary) -> String {
    format!(
        "packets={} nodes={} messages={} neighbor_links={} direct_links={}",
        s.packets, s.nodes, s.messages.total, s.links.neighbor, s.links.direct
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ReplayArgs, ctx: &Context) -> Result<(), CliError> {
    let now = util::resolve_now(args.capture.now)?;
    let events = capture::load(&args.capture.file)?;
    let packets = events.len();

    let outcome = run_replay(events, &ctx.mesh).await?;
    info!(
        packets,
        nodes = outcome.store.node_count(),
        messages = outcome.store.message_count(),
        "replay complete"
    );

    let summary = summarize(packets, outcome, &ctx.mesh, now);
    let out = output::render_single(ctx.output, &summary, detail, plain)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    const CAPTURE: &str = r#"
{"kind": "message", "payload": {"id": 1, "from": 7, "text": "outbound before identity"}}
{"kind": "message", "payload": {"id": 2, "from": 9, "text": "hello"}}
{"kind": "my_node_info", "payload": {"my_node_num": 7}}
{"kind": "my_node_info", "payload": {"my_node_num": 8}}
{"kind": "node_info", "payload": {"num": 9, "position": {"latitude_i": 100000000, "longitude_i": 200000000}, "hops_away": 0, "snr": 6.5, "last_heard": 1000}}
{"kind": "routing", "payload": {"from": 4, "id": 3, "data": {"variant": {"error_reason": "NO_ROUTE"}}}}
{"kind": "routing", "payload": {"from": 4, "id": 4, "data": {"variant": {"error_reason": "NONE"}}}}
{"kind": "queue_status", "payload": {"free": 2, "maxlen": 16}}
{"kind": "queue_status", "payload": {"free": 2, "maxlen": 16}}
{"kind": "channel", "payload": {"index": 0, "role": "PRIMARY", "settings": {"name": "LongFast"}}}
"#;

    async fn replayed() -> ReplaySummary {
        let events = capture::parse("test", CAPTURE).unwrap();
        let packets = events.len();
        let config = MeshConfig::default();
        let outcome = run_replay(events, &config).await.unwrap();
        let now = Utc.timestamp_opt(1_100, 0).single().unwrap();
        summarize(packets, outcome, &config, now)
    }

    #[tokio::test]
    async fn spawned_replay_settles_message_states() {
        let summary = replayed().await;
        assert_eq!(summary.packets, 10);
        assert_eq!(summary.channels, 1);
        assert_eq!(summary.my_node, Some(NodeNum(7)));
        assert_eq!(summary.messages.total, 2);
        assert_eq!(summary.messages.unknown, 0);
        assert_eq!(summary.messages.waiting, 1);
        assert_eq!(summary.messages.ack, 1);
        assert_eq!(summary.identity_conflicts, vec!["kept !00000007, ignored !00000008"]);
    }

    #[tokio::test]
    async fn diagnostics_and_backpressure_are_collected() {
        let summary = replayed().await;
        assert_eq!(summary.diagnostics.len(), 1);
        assert_eq!(
            summary.diagnostics[0].to_string(),
            "routing error NO_ROUTE from !00000004"
        );
        assert_eq!(
            summary.backpressure,
            vec![QueuePressure::Throttled { free: 2 }]
        );
        assert!(summary.queue.is_throttled());
        assert_eq!(summary.processed.get(&PacketKind::Routing), Some(&2));
    }

    #[tokio::test]
    async fn single_positioned_node_centers_camera() {
        let summary = replayed().await;
        assert_eq!(summary.positioned_nodes, 1);
        assert!(matches!(
            summary.camera,
            Some(CameraInstruction::CenterOn { .. })
        ));
        assert!(detail(&summary).contains("Messages:     2 (waiting 1, ack 1, unknown 0)"));
    }
}
