// ── Map overlay generation ──
//
// Pure recomputation over a `TopologySnapshot`. Generating twice from the
// same snapshot yields identical output.

mod bounds;
mod features;
mod geo;
mod lines;
mod link_quality;
mod markers;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use bounds::{
    CameraInstruction, FittedCamera, MAX_ZOOM, MIN_ZOOM, TILE_SIZE, Viewport, camera_for,
    fit_camera,
};
pub use features::{Feature, FeatureCollection, Geometry};
pub use geo::{GeoBounds, LatLng};
pub use lines::{LinkLine, direct_links, neighbor_links};
pub use link_quality::{LinkQuality, LinkThresholds, classify};
pub use markers::{NodeMarker, WaypointMarker, node_markers, waypoint_markers};

use crate::config::{OverlaySettings, SelfNodeSource};
use crate::model::{Node, NodeNum};
use crate::store::{DataStore, TopologySnapshot};
use crate::stream::TopologyStream;

/// How often the watcher recomputes without store changes, so direct
/// links age out of the freshness window.
const FRESHNESS_RECHECK: Duration = Duration::from_secs(30);

/// Everything the render layer draws.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapOverlay {
    pub neighbor_links: Vec<LinkLine>,
    pub direct_links: Vec<LinkLine>,
    pub node_markers: Vec<NodeMarker>,
    pub waypoint_markers: Vec<WaypointMarker>,
    pub camera: Option<CameraInstruction>,
}

impl MapOverlay {
    /// Build the overlay. `local` is the session's own node number, used
    /// when the self node comes from MyNodeInfo and to flag markers.
    pub fn generate(
        snapshot: &TopologySnapshot,
        settings: &OverlaySettings,
        now: DateTime<Utc>,
        local: Option<NodeNum>,
    ) -> Self {
        let now_secs = u64::try_from(now.timestamp()).unwrap_or(0);
        let nodes = snapshot.nodes.as_slice();
        let me = self_node(nodes, settings.self_node, local);

        Self {
            neighbor_links: neighbor_links(nodes, &snapshot.neighbors, &settings.thresholds),
            direct_links: direct_links(
                nodes,
                me,
                &settings.thresholds,
                settings.direct_link_freshness,
                now_secs,
            ),
            node_markers: node_markers(nodes, me.map(|n| n.num)),
            waypoint_markers: waypoint_markers(&snapshot.waypoints, now_secs),
            camera: camera_for(nodes, settings.fit_padding),
        }
    }

    pub fn neighbor_collection(&self) -> FeatureCollection {
        FeatureCollection::from_links(&self.neighbor_links)
    }

    pub fn direct_collection(&self) -> FeatureCollection {
        FeatureCollection::from_links(&self.direct_links)
    }

    pub fn marker_collection(&self) -> FeatureCollection {
        FeatureCollection::merge([
            FeatureCollection::from_node_markers(&self.node_markers),
            FeatureCollection::from_waypoint_markers(&self.waypoint_markers),
        ])
    }
}

/// Resolve the node the direct-link overlay anchors on.
///
/// Favorites without a usable position are passed over.
pub fn self_node(
    nodes: &[Arc<Node>],
    source: SelfNodeSource,
    local: Option<NodeNum>,
) -> Option<&Node> {
    let found = match source {
        SelfNodeSource::Favorite => nodes
            .iter()
            .filter(|n| n.is_favorite && n.valid_position().is_some())
            .min_by_key(|n| n.num),
        SelfNodeSource::LocalNode => {
            let local = local?;
            nodes.iter().find(|n| n.num == local)
        }
    };
    found.map(AsRef::as_ref)
}

// ── Live overlay ─────────────────────────────────────────────────────

/// Keep an overlay current as the store changes.
///
/// Recomputes when nodes, neighbor tables, waypoints or the session
/// identity change, and periodically so stale direct links drop out.
pub fn watch_overlay(
    store: Arc<DataStore>,
    identity: watch::Receiver<Option<NodeNum>>,
    settings: OverlaySettings,
    cancel: CancellationToken,
) -> (watch::Receiver<Arc<MapOverlay>>, JoinHandle<()>) {
    // Subscribe before the first snapshot so no change slips between them.
    let sources = OverlaySources {
        topology: store.subscribe_topology(),
        identity,
    };
    let initial = MapOverlay::generate(
        &store.topology_snapshot(),
        &settings,
        Utc::now(),
        *sources.identity.borrow(),
    );
    let (tx, rx) = watch::channel(Arc::new(initial));
    let handle = tokio::spawn(overlay_task(store, sources, settings, tx, cancel));
    (rx, handle)
}

struct OverlaySources {
    topology: TopologyStream,
    identity: watch::Receiver<Option<NodeNum>>,
}

async fn overlay_task(
    store: Arc<DataStore>,
    mut sources: OverlaySources,
    settings: OverlaySettings,
    tx: watch::Sender<Arc<MapOverlay>>,
    cancel: CancellationToken,
) {
    let mut recheck = tokio::time::interval(FRESHNESS_RECHECK);
    recheck.tick().await;
    // The session may end before the store does; keep the last identity.
    let mut identity_open = true;

    loop {
        let open = tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            changed = sources.topology.next() => changed.is_some(),
            changed = sources.identity.changed(), if identity_open => {
                if changed.is_err() {
                    debug!("session identity closed, overlay keeps running");
                    identity_open = false;
                }
                true
            }
            _ = recheck.tick() => true,
        };
        if !open {
            break;
        }

        let overlay = MapOverlay::generate(
            &store.topology_snapshot(),
            &settings,
            Utc::now(),
            *sources.identity.borrow(),
        );
        // Skip the publish when nothing visible moved.
        tx.send_if_modified(|current| {
            if **current == overlay {
                false
            } else {
                *current = Arc::new(overlay);
                true
            }
        });
    }
    debug!("overlay watcher stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Neighbor, NeighborInfo, NodeInfo, Position};
    use crate::session::SessionState;
    use crate::store::DeviceStateStore;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn info(num: u32, lat: i32, lon: i32) -> NodeInfo {
        NodeInfo {
            num: NodeNum(num),
            position: Some(Position::fixed(lat, lon)),
            last_heard: Some(1_000),
            hops_away: Some(0),
            snr: Some(-5.0),
            ..NodeInfo::default()
        }
    }

    fn mesh() -> DataStore {
        let store = DataStore::new();
        store.add_node_info(info(1, 100_000_000, 200_000_000));
        store.add_node_info(info(2, 300_000_000, 400_000_000));
        store.add_node_info(info(3, 110_000_000, 210_000_000));
        store.set_neighbor_info(
            NodeNum(1),
            NeighborInfo {
                neighbors: vec![
                    Neighbor {
                        node_id: NodeNum(999),
                        snr: 5.0,
                    },
                    Neighbor {
                        node_id: NodeNum(2),
                        snr: -20.0,
                    },
                ],
                ..NeighborInfo::default()
            },
        );
        store
    }

    #[test]
    fn no_favorite_means_empty_direct_collection() {
        let store = mesh();
        let overlay = MapOverlay::generate(
            &store.topology_snapshot(),
            &OverlaySettings::default(),
            at(1_000),
            None,
        );

        assert!(overlay.direct_links.is_empty());
        assert!(overlay.direct_collection().is_empty());
        assert_eq!(overlay.neighbor_links.len(), 1);
        assert_eq!(overlay.neighbor_links[0].quality, LinkQuality::Bad);
        assert!(matches!(
            overlay.camera,
            Some(CameraInstruction::FitBounds { padding: 10, .. })
        ));
    }

    #[test]
    fn favorite_anchors_direct_links() {
        let store = mesh();
        store.add_node_info(NodeInfo {
            num: NodeNum(2),
            is_favorite: Some(true),
            ..NodeInfo::default()
        });

        let overlay = MapOverlay::generate(
            &store.topology_snapshot(),
            &OverlaySettings::default(),
            at(1_000),
            None,
        );
        let froms: Vec<u32> = overlay.direct_links.iter().map(|l| l.from.0).collect();
        assert_eq!(froms, vec![1, 3]);
        assert!(overlay.direct_links.iter().all(|l| l.to == NodeNum(2)));
        assert!(overlay.node_markers.iter().any(|m| m.is_self && m.num == NodeNum(2)));
    }

    #[test]
    fn unpositioned_favorite_is_passed_over() {
        let store = DataStore::new();
        store.add_node_info(NodeInfo {
            num: NodeNum(1),
            is_favorite: Some(true),
            ..NodeInfo::default()
        });
        store.add_node_info(NodeInfo {
            is_favorite: Some(true),
            ..info(5, 100_000_000, 200_000_000)
        });
        store.add_node_info(info(9, 110_000_000, 210_000_000));

        let overlay = MapOverlay::generate(
            &store.topology_snapshot(),
            &OverlaySettings::default(),
            at(1_000),
            None,
        );
        assert_eq!(overlay.direct_links.len(), 1);
        assert_eq!(overlay.direct_links[0].from, NodeNum(9));
        assert_eq!(overlay.direct_links[0].to, NodeNum(5));
    }

    #[test]
    fn local_node_source_uses_session_identity() {
        let store = mesh();
        let settings = OverlaySettings {
            self_node: SelfNodeSource::LocalNode,
            ..OverlaySettings::default()
        };

        let without = MapOverlay::generate(&store.topology_snapshot(), &settings, at(1_000), None);
        assert!(without.direct_links.is_empty());

        let with = MapOverlay::generate(
            &store.topology_snapshot(),
            &settings,
            at(1_000),
            Some(NodeNum(3)),
        );
        let froms: Vec<u32> = with.direct_links.iter().map(|l| l.from.0).collect();
        assert_eq!(froms, vec![1, 2]);
    }

    #[test]
    fn generation_is_deterministic() {
        let store = mesh();
        store.add_node_info(NodeInfo {
            num: NodeNum(1),
            is_favorite: Some(true),
            ..NodeInfo::default()
        });
        let snapshot = store.topology_snapshot();
        let settings = OverlaySettings::default();

        let first = MapOverlay::generate(&snapshot, &settings, at(1_500), None);
        let second = MapOverlay::generate(&snapshot, &settings, at(1_500), None);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.neighbor_collection()).unwrap(),
            serde_json::to_string(&second.neighbor_collection()).unwrap()
        );
    }

    #[test]
    fn empty_store_has_no_camera() {
        let overlay = MapOverlay::generate(
            &TopologySnapshot::default(),
            &OverlaySettings::default(),
            at(0),
            None,
        );
        assert_eq!(overlay, MapOverlay::default());
    }

    #[tokio::test]
    async fn watcher_publishes_on_change() {
        let store = Arc::new(DataStore::new());
        let (_identity_tx, identity) = watch::channel(None);
        let cancel = CancellationToken::new();
        let (mut rx, handle) = watch_overlay(
            Arc::clone(&store),
            identity,
            OverlaySettings::default(),
            cancel.clone(),
        );
        assert!(rx.borrow().camera.is_none());

        store.add_position(NodeNum(5), Position::fixed(100_000_000, 100_000_000));
        rx.changed().await.unwrap();
        assert!(matches!(
            rx.borrow().camera,
            Some(CameraInstruction::CenterOn { .. })
        ));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn watcher_outlives_the_session() {
        let store = Arc::new(DataStore::new());
        let session = SessionState::new();
        let cancel = CancellationToken::new();
        let (mut rx, handle) = watch_overlay(
            Arc::clone(&store),
            session.subscribe(),
            OverlaySettings::default(),
            cancel.clone(),
        );

        drop(session);
        store.add_position(NodeNum(5), Position::fixed(100_000_000, 100_000_000));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().node_markers.len(), 1);
        assert!(!handle.is_finished());

        store.add_position(NodeNum(6), Position::fixed(110_000_000, 110_000_000));
        rx.changed().await.unwrap();
        assert!(matches!(
            rx.borrow().camera,
            Some(CameraInstruction::FitBounds { .. })
        ));

        cancel.cancel();
        handle.await.unwrap();
    }
}
