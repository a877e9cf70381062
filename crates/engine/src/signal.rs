use serde_json::{Map, Value};

/// A rendered feature resolved under a pointer event.
///
/// Only the properties bag crosses the boundary; geometry stays engine-side.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureHit {
    pub properties: Map<String, Value>,
}

impl FeatureHit {
    pub fn from_properties(properties: Map<String, Value>) -> Self {
        FeatureHit { properties }
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}

/// Signals the engine delivers back to the application.
///
/// The host adapter registers the underlying listeners and forwards each one
/// as a value of this enum; the orchestration layer never touches the
/// engine's own listener API.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSignal {
    /// Initial load completed; sources and layers may now be added.
    Loaded,
    /// A style swap completed and the engine scene was rebuilt empty.
    StyleLoaded,
    Click {
        lng_lat: [f64; 2],
        feature: Option<FeatureHit>,
    },
    PointerMove {
        point: [f64; 2],
        feature: Option<FeatureHit>,
    },
    PointerLeave,
}

#[cfg(test)]
mod tests {
    use super::FeatureHit;
    use serde_json::json;

    #[test]
    fn property_str_reads_only_strings() {
        let mut props = serde_json::Map::new();
        props.insert("GEOID".to_string(), json!("48201"));
        props.insert("ALAND".to_string(), json!(42));
        let hit = FeatureHit::from_properties(props);
        assert_eq!(hit.property_str("GEOID"), Some("48201"));
        assert_eq!(hit.property_str("ALAND"), None);
        assert_eq!(hit.property_str("missing"), None);
    }
}
