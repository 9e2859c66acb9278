// ── Geographic points and bounds ──
//
// Internally every point is a named `LatLng`. Only GeoJSON output uses
// positional `[longitude, latitude]` pairs.

use serde::Serialize;

use crate::model::{Position, Waypoint};

/// Fixed-point scale of mesh coordinates.
const FIXED_POINT_SCALE: f64 = 1e7;

/// A point in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Convert degrees scaled by 1e7.
    pub fn from_fixed(latitude_i: i32, longitude_i: i32) -> Self {
        Self {
            latitude: f64::from(latitude_i) / FIXED_POINT_SCALE,
            longitude: f64::from(longitude_i) / FIXED_POINT_SCALE,
        }
    }

    /// `None` unless the position is usable on the map.
    pub fn from_position(position: &Position) -> Option<Self> {
        if !position.is_valid() {
            return None;
        }
        let latitude_i = position.latitude_i?;
        Some(Self::from_fixed(latitude_i, position.longitude_i.unwrap_or(0)))
    }

    /// Waypoints follow the same rule as node positions.
    pub fn from_waypoint(waypoint: &Waypoint) -> Option<Self> {
        let latitude_i = waypoint.latitude_i.filter(|&lat| lat != 0)?;
        Some(Self::from_fixed(latitude_i, waypoint.longitude_i.unwrap_or(0)))
    }

    /// GeoJSON position: `[longitude, latitude]`.
    pub fn to_geojson(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl GeoBounds {
    /// Smallest box covering every point, or `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        points.into_iter().fold(None, |bounds, p| {
            Some(match bounds {
                None => Self {
                    south_west: p,
                    north_east: p,
                },
                Some(b) => b.extend(p),
            })
        })
    }

    pub fn extend(self, point: LatLng) -> Self {
        Self {
            south_west: LatLng::new(
                self.south_west.latitude.min(point.latitude),
                self.south_west.longitude.min(point.longitude),
            ),
            north_east: LatLng::new(
                self.north_east.latitude.max(point.latitude),
                self.north_east.longitude.max(point.longitude),
            ),
        }
    }

    pub fn contains(&self, point: LatLng) -> bool {
        (self.south_west.latitude..=self.north_east.latitude).contains(&point.latitude)
            && (self.south_west.longitude..=self.north_east.longitude).contains(&point.longitude)
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            f64::midpoint(self.south_west.latitude, self.north_east.latitude),
            f64::midpoint(self.south_west.longitude, self.north_east.longitude),
        )
    }

    /// GeoJSON bbox: `[west, south, east, north]`.
    pub fn to_bbox(&self) -> [f64; 4] {
        [
            self.south_west.longitude,
            self.south_west.latitude,
            self.north_east.longitude,
            self.north_east.latitude,
        ]
    }
}
