use foundation::bounds::LngLatBounds;
use serde_json::Value;

use crate::collection::BoundaryCollection;

/// Bounding box of all features whose region code matches `state_fips`.
///
/// Returns `None` when nothing matches or no coordinates were found; the
/// caller decides what a degenerate (point/line) box means.
pub fn state_bounds(collection: &BoundaryCollection, state_fips: &str) -> Option<LngLatBounds> {
    let mut bounds = LngLatBounds::empty();
    for feature in collection.features() {
        if feature.state_fips == state_fips {
            extend_from_geometry(&mut bounds, &feature.geometry);
        }
    }
    if bounds.is_empty() { None } else { Some(bounds) }
}

fn extend_from_geometry(bounds: &mut LngLatBounds, geometry: &Value) {
    // GeometryCollection nests whole geometries rather than coordinate
    // arrays; those are not produced by the boundary pipeline and are
    // skipped rather than guessed at.
    match geometry.get("type").and_then(|v| v.as_str()) {
        Some("GeometryCollection") | None => return,
        Some(_) => {}
    }
    if let Some(coordinates) = geometry.get("coordinates") {
        extend_from_coords(bounds, coordinates);
    }
}

/// Walks arbitrarily nested coordinate arrays.
///
/// A node whose first element is a number is treated as one position
/// (`[lng, lat, ...]`); anything else recurses. This covers Polygon,
/// MultiPolygon, and any deeper nesting without per-type code.
fn extend_from_coords(bounds: &mut LngLatBounds, node: &Value) {
    let Some(items) = node.as_array() else {
        return;
    };
    match items.first() {
        Some(first) if first.is_number() => {
            if items.len() >= 2
                && let (Some(lng), Some(lat)) = (items[0].as_f64(), items[1].as_f64())
            {
                bounds.extend(lng, lat);
            }
        }
        _ => {
            for item in items {
                extend_from_coords(bounds, item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::state_bounds;
    use crate::collection::BoundaryCollection;
    use serde_json::json;

    fn collection(features: Vec<serde_json::Value>) -> BoundaryCollection {
        BoundaryCollection::from_geojson_value(json!({
            "type": "FeatureCollection",
            "features": features
        }))
        .unwrap()
    }

    fn feature(geoid: &str, state: &str, geometry: serde_json::Value) -> serde_json::Value {
        json!({
            "type": "Feature",
            "properties": {"GEOID": geoid, "NAME": "", "STATE": state},
            "geometry": geometry
        })
    }

    #[test]
    fn polygon_bounds_cover_all_rings() {
        let c = collection(vec![feature(
            "48201",
            "48",
            json!({"type": "Polygon", "coordinates": [
                [[-95.8, 29.5], [-94.9, 29.5], [-94.9, 30.2], [-95.8, 29.5]],
                [[-95.5, 29.7], [-95.4, 29.7], [-95.4, 29.8], [-95.5, 29.7]]
            ]}),
        )]);
        let b = state_bounds(&c, "48").unwrap();
        assert_eq!(b.min, [-95.8, 29.5]);
        assert_eq!(b.max, [-94.9, 30.2]);
    }

    #[test]
    fn multipolygon_nesting_is_walked() {
        let c = collection(vec![feature(
            "12011",
            "12",
            json!({"type": "MultiPolygon", "coordinates": [
                [[[-80.5, 25.9], [-80.1, 25.9], [-80.1, 26.4], [-80.5, 25.9]]],
                [[[-80.9, 26.0], [-80.8, 26.0], [-80.8, 26.1], [-80.9, 26.0]]]
            ]}),
        )]);
        let b = state_bounds(&c, "12").unwrap();
        assert_eq!(b.min, [-80.9, 25.9]);
        assert_eq!(b.max, [-80.1, 26.4]);
    }

    #[test]
    fn only_matching_region_codes_contribute() {
        let c = collection(vec![
            feature(
                "48201",
                "48",
                json!({"type": "Polygon", "coordinates": [[[-95.0, 29.0], [-94.0, 29.0], [-94.0, 30.0], [-95.0, 29.0]]]}),
            ),
            feature(
                "12011",
                "12",
                json!({"type": "Polygon", "coordinates": [[[-80.0, 26.0], [-79.0, 26.0], [-79.0, 27.0], [-80.0, 26.0]]]}),
            ),
        ]);
        let b = state_bounds(&c, "48").unwrap();
        assert_eq!(b.max, [-94.0, 30.0]);
        assert!(state_bounds(&c, "56").is_none());
    }

    #[test]
    fn geometry_collections_are_skipped() {
        let c = collection(vec![feature(
            "48201",
            "48",
            json!({"type": "GeometryCollection", "geometries": [
                {"type": "Point", "coordinates": [-95.0, 29.0]}
            ]}),
        )]);
        assert!(state_bounds(&c, "48").is_none());
    }

    #[test]
    fn single_point_yields_a_degenerate_box() {
        let c = collection(vec![feature(
            "48201",
            "48",
            json!({"type": "Point", "coordinates": [-95.0, 29.0]}),
        )]);
        let b = state_bounds(&c, "48").unwrap();
        assert!(b.is_degenerate());
    }
}
