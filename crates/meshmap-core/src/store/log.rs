// ── Append-only packet logs ──
//
// Ordered logs for messages and trace routes. Replaying a packet replaces
// its existing entry instead of appending a duplicate.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{Message, NodeNum, TraceRoute};

/// Identity of a log entry. `None` entries are never de-duplicated.
pub(crate) trait LogEntry: Clone + Send + Sync + 'static {
    fn log_key(&self) -> Option<(NodeNum, u32)>;
}

impl LogEntry for Message {
    fn log_key(&self) -> Option<(NodeNum, u32)> {
        let (from, id) = self.key();
        (id != 0).then_some((from, id))
    }
}

impl LogEntry for TraceRoute {
    fn log_key(&self) -> Option<(NodeNum, u32)> {
        (self.id != 0).then_some((self.from, self.id))
    }
}

pub(crate) struct PacketLog<T: LogEntry> {
    entries: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: LogEntry> PacketLog<T> {
    pub(crate) fn new() -> Self {
        let (entries, _) = watch::channel(Arc::new(Vec::new()));
        Self { entries }
    }

    /// Append, or replace the entry with the same key in place.
    pub(crate) fn record(&self, entry: T) {
        self.entries.send_modify(|log| {
            let log = Arc::make_mut(log);
            let key = entry.log_key();
            let existing = key.and_then(|k| log.iter().position(|e| e.log_key() == Some(k)));
            match existing {
                Some(idx) => {
                    if let Some(slot) = log.get_mut(idx) {
                        *slot = Arc::new(entry);
                    }
                }
                None => log.push(Arc::new(entry)),
            }
        });
    }

    /// Rewrite matching entries in one publish. Returns how many changed.
    pub(crate) fn update_where(&self, mut update: impl FnMut(&mut T) -> bool) -> usize {
        let mut changed = 0;
        self.entries.send_if_modified(|log| {
            let log = Arc::make_mut(log);
            for slot in log.iter_mut() {
                let mut entry = (**slot).clone();
                if update(&mut entry) {
                    *slot = Arc::new(entry);
                    changed += 1;
                }
            }
            changed > 0
        });
        changed
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.entries.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.entries.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MessageKind, MessagePacket, MessageState};

    fn message(from: u32, id: u32, text: &str) -> Message {
        Message {
            packet: MessagePacket {
                id,
                from: NodeNum(from),
                to: NodeNum::BROADCAST,
                channel: 0,
                rx_time: None,
                kind: MessageKind::Broadcast,
                text: text.into(),
            },
            state: MessageState::Unknown,
        }
    }

    #[test]
    fn replay_replaces_instead_of_appending() {
        let log = PacketLog::new();
        log.record(message(1, 5, "first"));
        log.record(message(2, 5, "other sender"));
        log.record(message(1, 5, "replayed"));

        let snap = log.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].packet.text, "replayed");
    }

    #[test]
    fn zero_ids_always_append() {
        let log = PacketLog::new();
        log.record(message(1, 0, "a"));
        log.record(message(1, 0, "b"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn update_where_counts_changes() {
        let log = PacketLog::new();
        log.record(message(1, 1, "a"));
        log.record(message(2, 2, "b"));

        let changed = log.update_where(|m| {
            if m.packet.from == NodeNum(2) {
                m.state = MessageState::Ack;
                true
            } else {
                false
            }
        });

        assert_eq!(changed, 1);
        assert_eq!(log.snapshot()[1].state, MessageState::Ack);
        assert_eq!(log.snapshot()[0].state, MessageState::Unknown);
    }
}
