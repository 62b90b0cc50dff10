//! Test helpers for composing route files and layer directories.

use camino::Utf8Path;
use haulway_core::Layer;
use serde_json::{Value, json};

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directory");
    }
    std::fs::write(path, contents).expect("write test file");
}

/// Eastbound route of 21 points along latitude 55.0.
pub(super) fn eastbound_route() -> Value {
    let coordinates: Vec<[f64; 2]> = (0..=20)
        .map(|i| [37.0 + f64::from(i) * 0.001, 55.0])
        .collect();
    json!({
        "type": "Feature",
        "properties": {"name": "test route"},
        "geometry": {"type": "LineString", "coordinates": coordinates}
    })
}

/// One frame 33 m north of the route and one far away.
pub(super) fn frames_layer() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": 1, "properties": {"name": "Near gate"},
             "geometry": {"type": "Point", "coordinates": [37.01, 55.0003]}},
            {"type": "Feature", "id": 2, "properties": {"name": "Far gate"},
             "geometry": {"type": "Point", "coordinates": [37.5, 55.1]}}
        ]
    })
}

/// Single rectangular zone spanning the given bounds.
pub(super) fn zone_layer(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": 1, "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[
                [min_lon, min_lat], [max_lon, min_lat], [max_lon, max_lat],
                [min_lon, max_lat], [min_lon, min_lat]
             ]]}}
        ]
    })
}

pub(super) fn write_layer(dir: &Utf8Path, layer: Layer, document: &Value) {
    let payload = serde_json::to_vec_pretty(document).expect("serialize layer");
    write_utf8(&dir.join(layer.file_name()), &payload);
}
