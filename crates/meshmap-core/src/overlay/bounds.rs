// ── Camera bounds ──
//
// Decides how the map viewport should move for the positioned nodes, and
// how a Web Mercator map widget would fit a bounding box.

use std::f64::consts::PI;
use std::sync::Arc;

use serde::Serialize;

use super::geo::{GeoBounds, LatLng};
use crate::model::Node;

/// Tile edge in pixels used by vector map renderers.
pub const TILE_SIZE: f64 = 512.0;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;

/// Web Mercator latitude limit.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Viewport change requested from the render layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraInstruction {
    /// Recenter, keeping the current zoom.
    CenterOn { center: LatLng },
    /// Fit the box with uniform padding; the renderer picks the zoom.
    FitBounds { bounds: GeoBounds, padding: u32 },
}

/// `None` when no node has a valid position.
pub fn camera_for(nodes: &[Arc<Node>], padding: u32) -> Option<CameraInstruction> {
    let points: Vec<LatLng> = nodes
        .iter()
        .filter_map(|n| n.position.as_ref().and_then(LatLng::from_position))
        .collect();

    match points.as_slice() {
        [] => None,
        [only] => Some(CameraInstruction::CenterOn { center: *only }),
        _ => GeoBounds::from_points(points)
            .map(|bounds| CameraInstruction::FitBounds { bounds, padding }),
    }
}

// ── Fitting ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Center and zoom a map widget settles on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FittedCamera {
    pub center: LatLng,
    pub zoom: f64,
}

/// Fit `bounds` inside `viewport` minus `padding` on every side.
///
/// Zoom is the largest that shows the whole box, clamped to 0..=22. A
/// degenerate box (one point) gets the maximum zoom.
pub fn fit_camera(bounds: &GeoBounds, viewport: Viewport, padding: u32) -> FittedCamera {
    let inner = |side: u32| f64::from(side.saturating_sub(padding.saturating_mul(2)).max(1));
    let (width, height) = (inner(viewport.width), inner(viewport.height));

    let (west, north) = project(bounds.north_east.latitude, bounds.south_west.longitude);
    let (east, south) = project(bounds.south_west.latitude, bounds.north_east.longitude);
    let span_x = (east - west).abs();
    let span_y = (south - north).abs();

    let zoom_for = |pixels: f64, span: f64| {
        if span <= f64::EPSILON {
            MAX_ZOOM
        } else {
            (pixels / (TILE_SIZE * span)).log2()
        }
    };
    let zoom = zoom_for(width, span_x)
        .min(zoom_for(height, span_y))
        .clamp(MIN_ZOOM, MAX_ZOOM);

    let center = unproject(f64::midpoint(west, east), f64::midpoint(north, south));
    FittedCamera { center, zoom }
}

/// Normalized Web Mercator: x and y both in 0..=1, y growing southward.
fn project(latitude: f64, longitude: f64) -> (f64, f64) {
    let lat_rad = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (longitude + 180.0) / 360.0;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0;
    (x, y)
}

fn unproject(x: f64, y: f64) -> LatLng {
    let latitude = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    let longitude = x * 360.0 - 180.0;
    LatLng::new(latitude, longitude)
}
