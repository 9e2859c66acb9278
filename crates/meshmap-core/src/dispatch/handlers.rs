// ── Per-kind packet handlers ──
//
// One rule per packet kind. Handlers never await, never fail, and receive
// everything they touch through `HandlerContext`.

use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use super::backpressure::{QueueMonitor, QueuePressure};
use super::event::{DispatchEvent, MeshEvent, RoutingDiagnostic};
use crate::model::{
    Message, MessagePacket, MessageState, MyNodeInfo, Packet, PacketMetrics, QueueStatus, Routing,
};
use crate::session::{IdentityUpdate, SessionState};
use crate::store::DeviceStateStore;

pub(super) struct HandlerContext<'a> {
    pub store: &'a dyn DeviceStateStore,
    pub session: &'a SessionState,
    pub events: &'a broadcast::Sender<DispatchEvent>,
    pub queue: &'a QueueMonitor,
}

impl HandlerContext<'_> {
    fn emit(&self, event: DispatchEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.events.send(event);
    }
}

/// Apply the single rule for `event`.
pub(super) fn apply(ctx: &HandlerContext<'_>, event: MeshEvent) {
    match event {
        MeshEvent::Metadata(packet) => ctx.store.add_metadata(packet.from, packet.data),
        MeshEvent::Routing(packet) => handle_routing(ctx, &packet),
        MeshEvent::Telemetry(packet) => {
            trace!(from = %packet.from, time = packet.data.time, "telemetry received");
        }
        MeshEvent::DeviceStatus(status) => {
            debug!(%status, "device status");
            ctx.store.set_status(status);
        }
        MeshEvent::Waypoint(packet) => ctx.store.add_waypoint(packet.data),
        MeshEvent::MyNodeInfo(info) => handle_my_node_info(ctx, info),
        MeshEvent::User(packet) => ctx.store.add_user(packet.from, packet.data),
        MeshEvent::Position(packet) => ctx.store.add_position(packet.from, packet.data),
        MeshEvent::NodeInfo(info) => ctx.store.add_node_info(info),
        MeshEvent::Channel(channel) => ctx.store.add_channel(channel),
        MeshEvent::Config(config) => ctx.store.set_config(config),
        MeshEvent::ModuleConfig(config) => ctx.store.set_module_config(config),
        MeshEvent::Message(packet) => handle_message(ctx, packet),
        MeshEvent::TraceRoute(route) => ctx.store.add_trace_route(route),
        MeshEvent::PendingSettingsChange(pending) => {
            ctx.store.set_pending_settings_changes(pending);
        }
        MeshEvent::MeshPacket(envelope) => ctx.store.process_packet(PacketMetrics::from(&envelope)),
        MeshEvent::QueueStatus(status) => handle_queue_status(ctx, status),
        MeshEvent::NeighborInfo(packet) => ctx.store.set_neighbor_info(packet.from, packet.data),
    }
}

// ── Rules with side effects ──────────────────────────────────────────

fn handle_routing(ctx: &HandlerContext<'_>, packet: &Packet<Routing>) {
    let Some(diagnostic) = RoutingDiagnostic::from_packet(packet) else {
        trace!(from = %packet.from, id = packet.id, "routing ack");
        return;
    };
    info!(from = %diagnostic.reporter(), id = packet.id, %diagnostic, "routing diagnostic");
    ctx.emit(DispatchEvent::Routing(diagnostic));
}

fn handle_my_node_info(ctx: &HandlerContext<'_>, info: MyNodeInfo) {
    let num = info.my_node_num;
    match ctx.session.set_identity(num) {
        IdentityUpdate::Set => {
            ctx.store.set_hardware(info);
            let reclassified = ctx.store.resolve_message_states(num);
            info!(node = %num, reclassified, "session identity resolved");
            ctx.emit(DispatchEvent::IdentityResolved { num, reclassified });
        }
        IdentityUpdate::Unchanged => {
            debug!(node = %num, "identity re-announced");
            ctx.store.set_hardware(info);
        }
        IdentityUpdate::Conflict { previous } => {
            warn!(current = %previous, reported = %num, "conflicting node identity ignored");
            ctx.emit(DispatchEvent::IdentityConflict {
                current: previous,
                reported: num,
            });
        }
    }
}

fn handle_message(ctx: &HandlerContext<'_>, packet: MessagePacket) {
    // Derive and append under the identity guard so a concurrent
    // MyNodeInfo either happens first or reclassifies this entry.
    ctx.session.with_identity(|me| {
        let state = MessageState::derive_with(packet.from, me);
        debug!(from = %packet.from, id = packet.id, %state, "message");
        ctx.store.add_message(Message { packet, state });
    });
}

fn handle_queue_status(ctx: &HandlerContext<'_>, status: QueueStatus) {
    ctx.store.set_queue_status(status);
    match ctx.queue.observe(&status) {
        Some(pressure @ QueuePressure::Throttled { free }) => {
            warn!(free, low_water = ctx.queue.low_water(), "outbound queue throttled");
            ctx.emit(DispatchEvent::Backpressure { pressure });
        }
        Some(pressure @ QueuePressure::Normal) => {
            info!(free = status.free, "outbound queue recovered");
            ctx.emit(DispatchEvent::Backpressure { pressure });
        }
        None => {}
    }
}
