//! Camera handler.

use serde::Serialize;

use meshmap_core::overlay::camera_for;
use meshmap_core::{CameraInstruction, FittedCamera, fit_camera};

use crate::capture;
use crate::cli::CameraArgs;
use crate::error::CliError;
use crate::output;

use super::{Context, util};

/// What the map widget is told, and where it settles for a known viewport.
#[derive(Debug, Serialize)]
struct CameraView {
    instruction: Option<CameraInstruction>,
    fitted: Option<FittedCamera>,
}

fn detail(view: &CameraView) -> String {
    let mut lines = Vec::new();
    match view.instruction {
        None => lines.push("Instruction: none (no positioned nodes)".to_owned()),
        Some(CameraInstruction::CenterOn { center }) => {
            lines.push("Instruction: center".to_owned());
            lines.push(format!(
                "Center:      {:.5}, {:.5}",
                center.latitude, center.longitude
            ));
        }
        Some(CameraInstruction::FitBounds { bounds, padding }) => {
            lines.push("Instruction: fit bounds".to_owned());
            lines.push(format!(
                "South-West:  {:.5}, {:.5}",
                bounds.south_west.latitude, bounds.south_west.longitude
            ));
            lines.push(format!(
                "North-East:  {:.5}, {:.5}",
                bounds.north_east.latitude, bounds.north_east.longitude
            ));
            lines.push(format!("Padding:     {padding}px"));
        }
    }
    if let Some(fitted) = view.fitted {
        lines.push(format!(
            "Fitted:      {:.5}, {:.5} @ zoom {:.2}",
            fitted.center.latitude, fitted.center.longitude, fitted.zoom
        ));
    }
    lines.join("\n")
}

fn plain(view: &CameraView) -> String {
    match view.instruction {
        None => "none".into(),
        Some(CameraInstruction::CenterOn { .. }) => "center".into(),
        Some(CameraInstruction::FitBounds { .. }) => "fit".into(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: CameraArgs, ctx: &Context) -> Result<(), CliError> {
    let viewport = args
        .viewport
        .as_deref()
        .map(util::parse_viewport)
        .transpose()?;
    let replayed = capture::replay(capture::load(&args.capture.file)?, &ctx.mesh);

    let instruction = camera_for(&replayed.store.nodes_snapshot(), ctx.mesh.overlay.fit_padding);
    // A center instruction keeps the current zoom, so only a fit has a
    // viewport-dependent result.
    let fitted = match (instruction, viewport) {
        (Some(CameraInstruction::FitBounds { bounds, padding }), Some(viewport)) => {
            Some(fit_camera(&bounds, viewport, padding))
        }
        _ => None,
    };

    let view = CameraView {
        instruction,
        fitted,
    };
    let out = output::render_single(ctx.output, &view, detail, plain)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
