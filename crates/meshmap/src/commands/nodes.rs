//! Node table handler.

use std::sync::Arc;

use tabled::Tabled;

use meshmap_core::{LinkThresholds, Node, NodeFilter, NodeNum};

use crate::capture;
use crate::cli::{NodeView, NodesArgs};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Long Name")]
    long_name: String,
    #[tabled(rename = "Hops")]
    hops: String,
    #[tabled(rename = "SNR")]
    snr: String,
    #[tabled(rename = "RSSI")]
    rssi: String,
    #[tabled(rename = "Link")]
    link: String,
    #[tabled(rename = "Last Heard")]
    last_heard: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Fav")]
    favorite: String,
}

impl NodeRow {
    fn build(n: &Node, thresholds: &LinkThresholds, me: Option<NodeNum>, color: bool) -> Self {
        let id = if me == Some(n.num) {
            format!("{} (me)", n.num)
        } else {
            n.num.to_string()
        };
        // Only direct contacts have a link of their own to grade.
        let link = if n.is_direct() {
            output::paint_quality(thresholds.classify(n.snr, n.rssi), color)
        } else {
            "-".into()
        };

        Self {
            id,
            name: n.label(),
            long_name: n
                .user
                .as_ref()
                .map_or_else(|| "-".into(), |u| u.long_name.clone()),
            hops: n.hops_away.map_or_else(|| "?".into(), |h| h.to_string()),
            snr: format!("{:.1}", n.snr),
            rssi: n.rssi.map_or_else(|| "-".into(), |r| r.to_string()),
            link,
            last_heard: util::format_epoch(n.last_heard),
            position: util::format_position(n.position.as_ref()),
            favorite: if n.is_favorite { "*".into() } else { String::new() },
        }
    }
}

fn view_filter(view: NodeView) -> NodeFilter {
    match view {
        NodeView::All => NodeFilter::All,
        NodeView::Direct => NodeFilter::Direct,
        NodeView::Positioned => NodeFilter::Positioned,
        NodeView::Favorite => NodeFilter::Favorite,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: NodesArgs, ctx: &Context) -> Result<(), CliError> {
    let now = util::resolve_now(args.capture.now)?;
    let replayed = capture::replay(capture::load(&args.capture.file)?, &ctx.mesh);

    let view = view_filter(args.filter);
    let recency = args.heard_within.map(|window_secs| NodeFilter::HeardWithin {
        now: util::epoch_secs(now),
        window_secs,
    });
    let nodes: Vec<Arc<Node>> = replayed
        .store
        .nodes_snapshot()
        .iter()
        .filter(|n| view.matches(n) && recency.as_ref().is_none_or(|f| f.matches(n)))
        .cloned()
        .collect();

    let thresholds = ctx.mesh.overlay.thresholds;
    let me = replayed.dispatcher.session().my_node_num();
    let out = output::render_list(
        ctx.output,
        &nodes,
        |n| NodeRow::build(n, &thresholds, me, ctx.color),
        |n| n.num.to_string(),
    )?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
