// ── Dispatcher lifecycle ──
//
// Owns the session identity and the event broadcast, applies packets to a
// `DeviceStateStore`, and runs one task per packet channel.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::PacketKind;
use super::backpressure::QueueMonitor;
use super::channels::PacketReceivers;
use super::event::{DispatchEvent, MeshEvent};
use super::handlers::{self, HandlerContext};
use crate::config::MeshConfig;
use crate::session::SessionState;
use crate::store::DeviceStateStore;

/// Routes typed packets into store mutations.
///
/// One dispatcher per connection: the session identity it owns is only
/// meaningful for a single radio.
pub struct PacketDispatcher {
    store: Arc<dyn DeviceStateStore>,
    session: Arc<SessionState>,
    events: broadcast::Sender<DispatchEvent>,
    queue: QueueMonitor,
    processed: DashMap<PacketKind, u64>,
}

impl PacketDispatcher {
    pub fn new(store: Arc<dyn DeviceStateStore>, config: &MeshConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            store,
            session: Arc::new(SessionState::new()),
            events,
            queue: QueueMonitor::new(config.queue_low_water),
            processed: DashMap::new(),
        }
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn queue(&self) -> &QueueMonitor {
        &self.queue
    }

    /// Subscribe to diagnostics, backpressure crossings and identity events.
    pub fn events(&self) -> broadcast::Receiver<DispatchEvent> {
        self.events.subscribe()
    }

    /// Apply one packet. Total: never fails, never blocks.
    pub fn dispatch(&self, event: MeshEvent) {
        let kind = event.kind();
        trace!(%kind, "dispatching packet");
        *self.processed.entry(kind).or_insert(0) += 1;

        let ctx = HandlerContext {
            store: self.store.as_ref(),
            session: &self.session,
            events: &self.events,
            queue: &self.queue,
        };
        handlers::apply(&ctx, event);
    }

    /// Packets applied so far, per kind, in kind order.
    pub fn processed(&self) -> Vec<(PacketKind, u64)> {
        let mut counts: Vec<(PacketKind, u64)> =
            self.processed.iter().map(|r| (*r.key(), *r.value())).collect();
        counts.sort_by_key(|(kind, _)| *kind);
        counts
    }

    /// Spawn one task per channel. Each task drains its channel in order
    /// and exits when the channel closes or `cancel` fires.
    pub fn spawn(
        self: &Arc<Self>,
        receivers: PacketReceivers,
        cancel: &CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        receivers
            .into_iter()
            .map(|(kind, rx)| {
                tokio::spawn(channel_task(Arc::clone(self), kind, rx, cancel.clone()))
            })
            .collect()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn channel_task(
    dispatcher: Arc<PacketDispatcher>,
    kind: PacketKind,
    mut rx: mpsc::Receiver<MeshEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = rx.recv() => {
                let Some(event) = event else { break };
                dispatcher.dispatch(event);
            }
        }
    }
    debug!(%kind, "packet channel stopped");
}
