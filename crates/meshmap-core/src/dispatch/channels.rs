// ── Per-kind packet channels ──
//
// One bounded mpsc channel per packet kind. Ordering holds within a
// channel only.

use std::collections::HashMap;

use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::PacketKind;
use super::event::MeshEvent;
use crate::error::CoreError;

/// Build a sink and the matching receivers, one channel per kind.
pub fn packet_channels(capacity: usize) -> (PacketSink, PacketReceivers) {
    let capacity = capacity.max(1);
    let mut senders = HashMap::new();
    let mut receivers = Vec::new();

    for kind in PacketKind::iter() {
        let (tx, rx) = mpsc::channel(capacity);
        senders.insert(kind, tx);
        receivers.push((kind, rx));
    }

    (PacketSink { senders, capacity }, PacketReceivers { receivers })
}

/// Transport-facing end: routes each event onto its kind's channel.
#[derive(Clone)]
pub struct PacketSink {
    senders: HashMap<PacketKind, mpsc::Sender<MeshEvent>>,
    capacity: usize,
}

impl PacketSink {
    /// Queue an event, waiting for room on its channel.
    pub async fn deliver(&self, event: MeshEvent) -> Result<(), CoreError> {
        let kind = event.kind();
        let sender = self.sender(kind)?;
        sender
            .send(event)
            .await
            .map_err(|_| CoreError::DispatcherStopped { kind })
    }

    /// Queue an event without waiting.
    pub fn try_deliver(&self, event: MeshEvent) -> Result<(), CoreError> {
        let kind = event.kind();
        let sender = self.sender(kind)?;
        sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => CoreError::ChannelFull {
                kind,
                capacity: self.capacity,
            },
            TrySendError::Closed(_) => CoreError::DispatcherStopped { kind },
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn sender(&self, kind: PacketKind) -> Result<&mpsc::Sender<MeshEvent>, CoreError> {
        self.senders
            .get(&kind)
            .ok_or(CoreError::DispatcherStopped { kind })
    }
}

/// Dispatcher-facing end, consumed by [`PacketDispatcher::spawn`](super::PacketDispatcher::spawn).
pub struct PacketReceivers {
    receivers: Vec<(PacketKind, mpsc::Receiver<MeshEvent>)>,
}

impl PacketReceivers {
    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}

impl IntoIterator for PacketReceivers {
    type Item = (PacketKind, mpsc::Receiver<MeshEvent>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.receivers.into_iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::QueueStatus;

    #[tokio::test]
    async fn events_land_on_their_kind() {
        let (sink, receivers) = packet_channels(4);
        assert_eq!(receivers.len(), 18);

        sink.deliver(MeshEvent::PendingSettingsChange(true))
            .await
            .unwrap();

        for (kind, mut rx) in receivers {
            if kind == PacketKind::PendingSettingsChange {
                assert_eq!(rx.recv().await, Some(MeshEvent::PendingSettingsChange(true)));
            } else {
                assert!(rx.try_recv().is_err());
            }
        }
    }

    #[test]
    fn full_and_closed_channels_are_errors() {
        let (sink, receivers) = packet_channels(1);
        sink.try_deliver(MeshEvent::PendingSettingsChange(true))
            .unwrap();

        let err = sink
            .try_deliver(MeshEvent::PendingSettingsChange(false))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ChannelFull {
                kind: PacketKind::PendingSettingsChange,
                capacity: 1
            }
        ));

        drop(receivers);
        let err = sink
            .try_deliver(MeshEvent::PendingSettingsChange(false))
            .unwrap_err();
        assert!(matches!(err, CoreError::DispatcherStopped { .. }));
    }

    #[test]
    fn deliver_waits_for_room() {
        let (sink, receivers) = packet_channels(1);
        let status = MeshEvent::QueueStatus(QueueStatus::default());
        sink.try_deliver(status.clone()).unwrap();

        let mut pending = tokio_test::task::spawn(sink.deliver(status));
        tokio_test::assert_pending!(pending.poll());

        let (_, mut rx) = receivers
            .into_iter()
            .find(|(kind, _)| *kind == PacketKind::QueueStatus)
            .unwrap();
        assert!(rx.try_recv().is_ok());
        assert!(pending.is_woken());
        tokio_test::assert_ready_ok!(pending.poll());
    }
}
