// ── Store subscriptions ──
//
// Change feeds over store snapshots. The overlay watcher follows the three
// topology collections through one merged `TopologyStream`.

mod filter;

use std::pin::Pin;
use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

pub use filter::{MessageFilter, NodeFilter};

use crate::model::{Node, NodeNeighbors, Waypoint};

type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// Subscription to one store collection.
pub struct EntityStream<T> {
    receiver: watch::Receiver<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot<T>>) -> Self {
        Self { receiver }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next mutation. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Mutations after this point, each reported as `tag`.
    fn tagged<K: Copy + Send + 'static>(self, tag: K) -> impl Stream<Item = K> + Send {
        WatchStream::from_changes(self.receiver).map(move |_| tag)
    }
}

/// Which topology collection moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyChange {
    Nodes,
    Neighbors,
    Waypoints,
}

/// Merged change feed over nodes, neighbor tables and waypoints.
///
/// Bursts coalesce: several mutations between polls of one collection
/// surface as a single change.
pub struct TopologyStream {
    inner: Pin<Box<dyn Stream<Item = TopologyChange> + Send>>,
}

impl TopologyStream {
    pub(crate) fn new(
        nodes: EntityStream<Node>,
        neighbors: EntityStream<NodeNeighbors>,
        waypoints: EntityStream<Waypoint>,
    ) -> Self {
        let merged = nodes
            .tagged(TopologyChange::Nodes)
            .merge(neighbors.tagged(TopologyChange::Neighbors))
            .merge(waypoints.tagged(TopologyChange::Waypoints));
        Self {
            inner: Box::pin(merged),
        }
    }

    /// Next change. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<TopologyChange> {
        self.inner.next().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{NeighborInfo, NodeNum, Position, Waypoint};
    use crate::store::{DataStore, DeviceStateStore};

    #[tokio::test]
    async fn changed_returns_the_new_snapshot() {
        let store = DataStore::new();
        let mut nodes = store.subscribe_nodes();
        assert!(nodes.snapshot().is_empty());

        store.add_position(NodeNum(1), Position::fixed(10, 10));
        let snap = nodes.changed().await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(nodes.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn topology_stream_names_the_collection() {
        let store = DataStore::new();
        store.add_position(NodeNum(1), Position::fixed(10, 10));
        let mut topology = store.subscribe_topology();

        store.set_neighbor_info(NodeNum(1), NeighborInfo::default());
        assert_eq!(topology.next().await, Some(TopologyChange::Neighbors));

        store.add_waypoint(Waypoint {
            id: 3,
            ..Waypoint::default()
        });
        assert_eq!(topology.next().await, Some(TopologyChange::Waypoints));
    }

    #[tokio::test]
    async fn unrelated_mutations_are_silent() {
        let store = DataStore::new();
        let mut topology = store.subscribe_topology();

        store.set_pending_settings_changes(true);
        store.add_position(NodeNum(2), Position::fixed(10, 10));
        assert_eq!(topology.next().await, Some(TopologyChange::Nodes));
    }
}
