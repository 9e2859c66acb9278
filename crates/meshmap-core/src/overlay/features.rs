// ── GeoJSON rendering ──
//
// The render boundary speaks GeoJSON. Coordinates are `[longitude, latitude]`.

use serde::{Deserialize, Serialize};

use super::lines::LinkLine;
use super::markers::{NodeMarker, WaypointMarker};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn from_links(lines: &[LinkLine]) -> Self {
        Self {
            features: lines.iter().map(link_feature).collect(),
        }
    }

    pub fn from_node_markers(markers: &[NodeMarker]) -> Self {
        Self {
            features: markers
                .iter()
                .map(|m| Feature {
                    geometry: Geometry::Point {
                        coordinates: m.position.to_geojson(),
                    },
                    properties: properties([
                        ("num", m.num.get().into()),
                        ("id", m.num.to_string().into()),
                        ("label", m.label.clone().into()),
                        ("self", m.is_self.into()),
                    ]),
                })
                .collect(),
        }
    }

    pub fn from_waypoint_markers(markers: &[WaypointMarker]) -> Self {
        Self {
            features: markers
                .iter()
                .map(|m| Feature {
                    geometry: Geometry::Point {
                        coordinates: m.position.to_geojson(),
                    },
                    properties: properties([
                        ("id", m.id.into()),
                        ("name", m.name.clone().into()),
                        ("description", m.description.clone().into()),
                        ("icon", m.icon.into()),
                    ]),
                })
                .collect(),
        }
    }

    /// Concatenate collections into one.
    pub fn merge(collections: impl IntoIterator<Item = Self>) -> Self {
        Self {
            features: collections.into_iter().flat_map(|c| c.features).collect(),
        }
    }
}

fn link_feature(line: &LinkLine) -> Feature {
    Feature {
        geometry: Geometry::LineString {
            coordinates: vec![line.start.to_geojson(), line.end.to_geojson()],
        },
        properties: properties([
            ("from", line.from.to_string().into()),
            ("to", line.to.to_string().into()),
            ("snr", f64::from(line.snr).into()),
            ("quality", line.quality.to_string().into()),
            ("color", line.color().into()),
        ]),
    }
}

fn properties<const N: usize>(
    entries: [(&str, serde_json::Value); N],
) -> serde_json::Map<String, serde_json::Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::NodeNum;
    use crate::overlay::{LatLng, LinkQuality};

    #[test]
    fn link_lines_render_lon_lat() {
        let line = LinkLine {
            from: NodeNum(1),
            to: NodeNum(2),
            start: LatLng::new(10.0, 20.0),
            end: LatLng::new(30.0, 40.0),
            snr: -5.0,
            quality: LinkQuality::Good,
        };

        let value = serde_json::to_value(FeatureCollection::from_links(&[line])).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[20.0, 10.0], [40.0, 30.0]]
                    },
                    "properties": {
                        "from": "!00000001",
                        "to": "!00000002",
                        "snr": -5.0,
                        "quality": "good",
                        "color": "#00ff00"
                    }
                }]
            })
        );
    }

    #[test]
    fn empty_collection_is_still_a_collection() {
        let value = serde_json::to_value(FeatureCollection::default()).unwrap();
        assert_eq!(value, json!({"type": "FeatureCollection", "features": []}));
    }
}
