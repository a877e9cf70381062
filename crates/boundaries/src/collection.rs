use serde_json::Value;

/// Feature property carrying the county FIPS join key.
pub const JOIN_KEY_PROP: &str = "GEOID";
/// Feature property carrying the display name.
pub const NAME_PROP: &str = "NAME";
/// Feature property carrying the two-digit state FIPS region code.
pub const STATE_PROP: &str = "STATE";

#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryShapeError {
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for BoundaryShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryShapeError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            BoundaryShapeError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for BoundaryShapeError {}

/// One validated county boundary feature.
///
/// The geometry stays a raw JSON value: the engine consumes it verbatim and
/// the bbox walker only needs to traverse it, so re-modelling every geometry
/// variant would buy nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub join_key: String,
    pub name: String,
    pub state_fips: String,
    pub geometry: Value,
}

/// Validated county boundary geometry, cached for the whole session.
///
/// The original payload is retained so the engine source can be registered
/// without re-serializing, and so a restyle (which destroys engine-side
/// sources and layers) re-attaches from memory instead of the network.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCollection {
    features: Vec<BoundaryFeature>,
    raw: Value,
}

impl BoundaryCollection {
    pub fn from_geojson_str(payload: &str) -> Result<Self, BoundaryShapeError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| BoundaryShapeError::InvalidFeature {
                index: 0,
                reason: format!("JSON parse error: {e}"),
            })?;
        Self::from_geojson_value(value)
    }

    pub fn from_geojson_value(value: Value) -> Result<Self, BoundaryShapeError> {
        let obj = value
            .as_object()
            .ok_or(BoundaryShapeError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(BoundaryShapeError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(BoundaryShapeError::NotAFeatureCollection);
        }
        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(BoundaryShapeError::NotAFeatureCollection)?;

        // An empty-but-well-formed collection is valid.
        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            features.push(parse_feature(index, feat_val)?);
        }

        Ok(Self {
            features,
            raw: value,
        })
    }

    pub fn features(&self) -> &[BoundaryFeature] {
        &self.features
    }

    /// The validated payload, suitable for `add_source` verbatim.
    pub fn as_source_value(&self) -> &Value {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn parse_feature(index: usize, value: &Value) -> Result<BoundaryFeature, BoundaryShapeError> {
    let invalid = |reason: String| BoundaryShapeError::InvalidFeature { index, reason };

    let obj = value
        .as_object()
        .ok_or_else(|| invalid("feature must be an object".to_string()))?;

    let properties = obj
        .get("properties")
        .and_then(|v| v.as_object())
        .ok_or_else(|| invalid("feature missing properties".to_string()))?;

    let join_key = properties
        .get(JOIN_KEY_PROP)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid(format!("feature missing {JOIN_KEY_PROP} property")))?
        .to_string();

    let name = properties
        .get(NAME_PROP)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let state_fips = properties
        .get(STATE_PROP)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let geometry = obj
        .get("geometry")
        .filter(|g| g.is_object())
        .ok_or_else(|| invalid("feature missing geometry".to_string()))?;
    if geometry.get("type").and_then(|v| v.as_str()).is_none() {
        return Err(invalid("geometry missing type".to_string()));
    }

    Ok(BoundaryFeature {
        join_key,
        name,
        state_fips,
        geometry: geometry.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::{BoundaryCollection, BoundaryShapeError};
    use serde_json::json;

    fn county(geoid: &str, state: &str) -> serde_json::Value {
        json!({
            "type": "Feature",
            "properties": {"GEOID": geoid, "NAME": "Somewhere", "STATE": state},
            "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}
        })
    }

    #[test]
    fn parses_a_minimal_collection() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [county("48201", "48")]
        });
        let collection = BoundaryCollection::from_geojson_value(payload).unwrap();
        assert_eq!(collection.len(), 1);
        let feature = &collection.features()[0];
        assert_eq!(feature.join_key, "48201");
        assert_eq!(feature.state_fips, "48");
    }

    #[test]
    fn empty_collection_is_valid() {
        let payload = json!({"type": "FeatureCollection", "features": []});
        let collection = BoundaryCollection::from_geojson_value(payload).unwrap();
        assert!(collection.is_empty());
    }

    #[test]
    fn rejects_non_collections() {
        for payload in [
            json!(42),
            json!({"type": "Feature"}),
            json!({"type": "FeatureCollection"}),
            json!({"type": "FeatureCollection", "features": "nope"}),
        ] {
            assert_eq!(
                BoundaryCollection::from_geojson_value(payload).unwrap_err(),
                BoundaryShapeError::NotAFeatureCollection
            );
        }
    }

    #[test]
    fn rejects_features_without_join_key_or_geometry() {
        let missing_key = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"NAME": "Nowhere"},
                "geometry": {"type": "Polygon", "coordinates": []}
            }]
        });
        assert!(matches!(
            BoundaryCollection::from_geojson_value(missing_key).unwrap_err(),
            BoundaryShapeError::InvalidFeature { index: 0, .. }
        ));

        let missing_geometry = json!({
            "type": "FeatureCollection",
            "features": [
                county("48201", "48"),
                {"type": "Feature", "properties": {"GEOID": "12011"}}
            ]
        });
        assert!(matches!(
            BoundaryCollection::from_geojson_value(missing_geometry).unwrap_err(),
            BoundaryShapeError::InvalidFeature { index: 1, .. }
        ));
    }

    #[test]
    fn malformed_json_text_is_a_shape_error() {
        assert!(BoundaryCollection::from_geojson_str("{not json").is_err());
    }
}
