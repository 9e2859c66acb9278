// ── Outbound queue backpressure ──
//
// The dispatcher only reports crossings of the low-water mark. What a
// caller does about a throttled queue is up to the caller.

use serde::Serialize;
use tokio::sync::watch;

use crate::model::QueueStatus;

/// Pressure on the radio's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QueuePressure {
    #[default]
    Normal,
    /// Fewer than the low-water mark of slots are free.
    Throttled { free: u32 },
}

impl QueuePressure {
    pub fn is_throttled(self) -> bool {
        matches!(self, Self::Throttled { .. })
    }
}

/// Tracks queue pressure and reports only state changes.
#[derive(Debug)]
pub struct QueueMonitor {
    low_water: u32,
    pressure: watch::Sender<QueuePressure>,
}

impl QueueMonitor {
    pub fn new(low_water: u32) -> Self {
        let (pressure, _) = watch::channel(QueuePressure::Normal);
        Self {
            low_water,
            pressure,
        }
    }

    /// Fold a queue status in. Returns the new pressure when the status
    /// crossed the low-water mark.
    pub fn observe(&self, status: &QueueStatus) -> Option<QueuePressure> {
        let next = if status.free < self.low_water {
            QueuePressure::Throttled { free: status.free }
        } else {
            QueuePressure::Normal
        };

        let crossed = self.pressure.send_if_modified(|current| {
            let changed = current.is_throttled() != next.is_throttled();
            // Keep the free count current while throttled, but only a
            // crossing counts as a change.
            *current = next;
            changed
        });
        crossed.then_some(next)
    }

    pub fn current(&self) -> QueuePressure {
        *self.pressure.borrow()
    }

    pub fn low_water(&self) -> u32 {
        self.low_water
    }

    pub fn subscribe(&self) -> watch::Receiver<QueuePressure> {
        self.pressure.subscribe()
    }
}
