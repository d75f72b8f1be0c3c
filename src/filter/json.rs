//! JSON series payloads (`/api/v1/series`).
//!
//! The payload is fully materialized; every field other than the metric
//! name is carried through untouched, in its original key order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::PrefixFilter;

/// Top-level `/api/v1/series` document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsPayload {
    pub series: Vec<MetricSeries>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One series record; only `metric` is inspected.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricSeries {
    pub metric: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Drop series whose name matches the filter, preserving order.
///
/// Returns the re-serialized payload and the number of dropped series.
pub fn filter_series(
    payload: &[u8],
    filter: &PrefixFilter,
) -> Result<(Vec<u8>, i64), serde_json::Error> {
    let mut decoded: MetricsPayload = serde_json::from_slice(payload)?;

    let before = decoded.series.len();
    decoded
        .series
        .retain(|series| !filter.matches(series.metric.as_bytes()));
    let dropped = (before - decoded.series.len()) as i64;

    Ok((serde_json::to_vec(&decoded)?, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(names: &[&str]) -> Value {
        let series: Vec<Value> = names
            .iter()
            .map(|name| {
                json!({
                    "metric": name,
                    "type": "gauge",
                    "points": [[1231231231232.0, 1.0]],
                    "tags": ["test:ExampleSubmitmetricsreturnsPayloadacceptedresponse"],
                })
            })
            .collect();
        json!({ "series": series })
    }

    fn run(input: &Value, prefix: &str) -> (Value, i64) {
        let body = serde_json::to_vec(input).unwrap();
        let (out, dropped) = filter_series(&body, &PrefixFilter::new(prefix)).unwrap();
        (serde_json::from_slice(&out).unwrap(), dropped)
    }

    #[test]
    fn test_filter_matching_series() {
        let input = payload(&["metric.one", "some.metric.load", "metric.two"]);
        let (out, dropped) = run(&input, "some.metric");
        assert_eq!(out, payload(&["metric.one", "metric.two"]));
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_filter_no_matches() {
        let input = payload(&["metric.one", "metric.two"]);
        let (out, dropped) = run(&input, "some.metric");
        assert_eq!(out, input);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_empty_prefix_keeps_everything() {
        let input = payload(&["metric.one", "some.metric.load"]);
        let (out, dropped) = run(&input, "");
        assert_eq!(out, input);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_unknown_fields_survive() {
        let input = json!({
            "series": [
                {"metric": "keep.me", "interval": 10, "resources": [{"name": "host-a", "type": "host"}]},
                {"metric": "drop.me"},
            ],
            "extra_top_level": {"nested": true},
        });
        let (out, dropped) = run(&input, "drop.");
        assert_eq!(dropped, 1);
        assert_eq!(
            out,
            json!({
                "series": [
                    {"metric": "keep.me", "interval": 10, "resources": [{"name": "host-a", "type": "host"}]},
                ],
                "extra_top_level": {"nested": true},
            })
        );
    }

    #[test]
    fn test_record_field_order_preserved() {
        let body = br#"{"series":[{"metric":"a","zeta":1,"alpha":2}]}"#;
        let (out, _) = filter_series(body, &PrefixFilter::new("b")).unwrap();
        assert_eq!(out, br#"{"series":[{"metric":"a","zeta":1,"alpha":2}]}"#);
    }

    #[test]
    fn test_malformed_json() {
        assert!(filter_series(b"{not json", &PrefixFilter::new("x")).is_err());
    }

    #[test]
    fn test_series_without_metric_is_rejected() {
        let err = filter_series(br#"{"series":[{"type":"gauge"}]}"#, &PrefixFilter::new("x"))
            .unwrap_err();
        assert!(err.to_string().contains("metric"));
    }

    #[test]
    fn test_missing_series_is_rejected() {
        assert!(filter_series(br#"{"other":[]}"#, &PrefixFilter::new("x")).is_err());
    }
}
