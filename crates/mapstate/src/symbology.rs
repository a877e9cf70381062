use datasets::model::{ScoreMetric, ScoreSet};
use foundation::color::ColorScale;
use serde_json::{Value, json};

use boundaries::collection::JOIN_KEY_PROP;

pub const SOURCE_ID: &str = "county-boundaries";
pub const FILL_LAYER_ID: &str = "county-fill";
pub const OUTLINE_LAYER_ID: &str = "county-outline";

/// Flat fill when no score set is loaded for the current selection.
pub const NO_DATA_FILL: &str = "#d1d5db";

const FILL_OPACITY: f64 = 0.75;
const OUTLINE_COLOR: &str = "#6b7280";
const OUTLINE_WIDTH: f64 = 0.4;

/// Builds the fill-color paint expression for the current scores.
///
/// The primary score metric is already 0-100; every other metric is min-max
/// scaled onto that range first. A degenerate metric (all values equal)
/// forces the divisor to one so every entry normalizes to 0 (uniform
/// minimum-color output) instead of NaN. Counties absent from `scores` fall
/// through the match table to 0. With no scores at all the whole layer gets
/// the flat no-data fill.
pub fn fill_color_expression(scores: Option<&ScoreSet>, metric: ScoreMetric) -> Value {
    let Some(scores) = scores.filter(|s| !s.is_empty()) else {
        return json!(NO_DATA_FILL);
    };

    let mut match_expr = vec![json!("match"), json!(["get", JOIN_KEY_PROP])];
    for (fips, value) in normalized_metric_values(scores, metric) {
        match_expr.push(json!(fips));
        match_expr.push(json!(value));
    }
    match_expr.push(json!(0.0));

    let scale = ColorScale::score_default();
    let mut interpolate = vec![json!("interpolate"), json!(["linear"]), Value::Array(match_expr)];
    for stop in scale.stops() {
        interpolate.push(json!(stop.value));
        interpolate.push(json!(stop.color.to_hex()));
    }
    Value::Array(interpolate)
}

/// Join-key -> encoded value table, in deterministic key order.
pub fn normalized_metric_values(scores: &ScoreSet, metric: ScoreMetric) -> Vec<(String, f64)> {
    if metric.is_primary() {
        return scores
            .iter()
            .map(|(fips, entry)| (fips.clone(), metric.value_of(entry)))
            .collect();
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for entry in scores.values() {
        let v = metric.value_of(entry);
        min = min.min(v);
        max = max.max(v);
    }
    if max == min {
        max = min + 1.0;
    }
    let range = max - min;

    scores
        .iter()
        .map(|(fips, entry)| {
            let normalized = (metric.value_of(entry) - min) / range * 100.0;
            (fips.clone(), normalized)
        })
        .collect()
}

/// Descriptor for the choropleth fill layer.
pub fn fill_layer_descriptor() -> Value {
    json!({
        "id": FILL_LAYER_ID,
        "type": "fill",
        "source": SOURCE_ID,
        "paint": {
            "fill-color": NO_DATA_FILL,
            "fill-opacity": FILL_OPACITY
        }
    })
}

/// Descriptor for the county outline layer drawn above the fill.
pub fn outline_layer_descriptor() -> Value {
    json!({
        "id": OUTLINE_LAYER_ID,
        "type": "line",
        "source": SOURCE_ID,
        "paint": {
            "line-color": OUTLINE_COLOR,
            "line-width": OUTLINE_WIDTH
        }
    })
}
