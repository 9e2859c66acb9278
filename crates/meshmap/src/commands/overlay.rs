//! GeoJSON overlay handler.

use tabled::Tabled;

use meshmap_core::{FeatureCollection, LatLng, LinkLine, MapOverlay};

use crate::capture;
use crate::cli::{Layer, OverlayArgs};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct OverlayRow {
    #[tabled(rename = "Layer")]
    layer: &'static str,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Quality")]
    quality: String,
    #[tabled(rename = "SNR")]
    snr: String,
    #[tabled(rename = "Coordinates")]
    coordinates: String,
}

fn point(p: LatLng) -> String {
    format!("{:.5}, {:.5}", p.latitude, p.longitude)
}

fn link_rows(layer: &'static str, lines: &[LinkLine], color: bool) -> Vec<OverlayRow> {
    lines
        .iter()
        .map(|l| OverlayRow {
            layer,
            subject: format!("{} -> {}", l.from, l.to),
            quality: output::paint_quality(l.quality, color),
            snr: format!("{:.1}", l.snr),
            coordinates: format!("{} -> {}", point(l.start), point(l.end)),
        })
        .collect()
}

fn rows(overlay: &MapOverlay, layer: Layer, color: bool) -> Vec<OverlayRow> {
    let mut rows = Vec::new();
    if matches!(layer, Layer::Neighbor | Layer::All) {
        rows.extend(link_rows("neighbor", &overlay.neighbor_links, color));
    }
    if matches!(layer, Layer::Direct | Layer::All) {
        rows.extend(link_rows("direct", &overlay.direct_links, color));
    }
    if matches!(layer, Layer::Markers | Layer::All) {
        rows.extend(overlay.node_markers.iter().map(|m| OverlayRow {
            layer: "node",
            subject: if m.is_self {
                format!("{} (self)", m.label)
            } else {
                m.label.clone()
            },
            quality: String::new(),
            snr: String::new(),
            coordinates: point(m.position),
        }));
        rows.extend(overlay.waypoint_markers.iter().map(|w| OverlayRow {
            layer: "waypoint",
            subject: w.name.clone(),
            quality: String::new(),
            snr: String::new(),
            coordinates: point(w.position),
        }));
    }
    rows
}

/// The GeoJSON for one layer, or all of them merged.
pub fn collection(overlay: &MapOverlay, layer: Layer) -> FeatureCollection {
    match layer {
        Layer::Neighbor => overlay.neighbor_collection(),
        Layer::Direct => overlay.direct_collection(),
        Layer::Markers => overlay.marker_collection(),
        Layer::All => FeatureCollection::merge([
            overlay.neighbor_collection(),
            overlay.direct_collection(),
            overlay.marker_collection(),
        ]),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: OverlayArgs, ctx: &Context) -> Result<(), CliError> {
    let now = util::resolve_now(args.capture.now)?;
    let replayed = capture::replay(capture::load(&args.capture.file)?, &ctx.mesh);
    let overlay = MapOverlay::generate(
        &replayed.store.topology_snapshot(),
        &ctx.mesh.overlay,
        now,
        replayed.dispatcher.session().my_node_num(),
    );

    let features = collection(&overlay, args.layer);
    let out = output::render_single(
        ctx.output,
        &features,
        |_| output::render_table(&rows(&overlay, args.layer, ctx.color)),
        |fc| {
            fc.features
                .iter()
                .filter_map(|f| {
                    let get = |key: &str| f.properties.get(key).and_then(|v| v.as_str());
                    match (get("from"), get("to")) {
                        (Some(from), Some(to)) => Some(format!("{from} {to}")),
                        _ => get("id").map(str::to_owned),
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use meshmap_core::OverlaySettings;

    use super::*;

    const CAPTURE: &str = r#"
{"kind": "node_info", "payload": {"num": 1, "position": {"latitude_i": 100000000, "longitude_i": 200000000}, "hops_away": 0, "snr": 6.0, "last_heard": 1000, "is_favorite": true}}
{"kind": "node_info", "payload": {"num": 2, "position": {"latitude_i": 300000000, "longitude_i": 400000000}, "hops_away": 0, "snr": -10.0, "last_heard": 1000}}
{"kind": "neighbor_info", "payload": {"from": 2, "data": {"neighbors": [{"node_id": 1, "snr": 3.0}]}}}
"#;

    fn overlay() -> MapOverlay {
        let events = capture::parse("test", CAPTURE).unwrap();
        let replayed = capture::replay(events, &meshmap_core::MeshConfig::default());
        MapOverlay::generate(
            &replayed.store.topology_snapshot(),
            &OverlaySettings::default(),
            Utc.timestamp_opt(1_100, 0).single().unwrap(),
            None,
        )
    }

    #[test]
    fn all_layer_merges_every_collection() {
        let overlay = overlay();
        assert_eq!(collection(&overlay, Layer::Neighbor).len(), 1);
        assert_eq!(collection(&overlay, Layer::Direct).len(), 1);
        assert_eq!(collection(&overlay, Layer::Markers).len(), 2);
        assert_eq!(collection(&overlay, Layer::All).len(), 4);
    }

    #[test]
    fn table_rows_follow_layer() {
        let overlay = overlay();
        let layers: Vec<&str> = rows(&overlay, Layer::All, false)
            .iter()
            .map(|r| r.layer)
            .collect();
        assert_eq!(layers, vec!["neighbor", "direct", "node", "node"]);
        assert_eq!(rows(&overlay, Layer::Direct, false)[0].quality, "fair");
    }
}
