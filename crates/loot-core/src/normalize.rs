use crate::error::LootError;
use crate::model::{CanonicalPayload, EventsPayload, RunsPayload, DEFAULT_RECORDER};
use serde_json::{Map, Value};

const SCHEMA_TAG_KEY: &str = "schemaTag";

/// Parse export text and normalize it.
pub fn parse_payload(text: &str) -> Result<CanonicalPayload, LootError> {
    let raw: Value = serde_json::from_str(text)?;
    normalize(&raw)
}

/// Detect which export format `raw` is and convert it to its canonical form.
///
/// The events format is tried first; a document that looks like both is an
/// events export.
pub fn normalize(raw: &Value) -> Result<CanonicalPayload, LootError> {
    let root = raw
        .as_object()
        .ok_or_else(|| LootError::validation("payload root must be a JSON object"))?;

    if is_events_shape(root) {
        if field_text(root, "realm").is_none() {
            return Err(LootError::validation("events export is missing realm"));
        }
        let mut payload: EventsPayload = serde_json::from_value(raw.clone())
            .map_err(|err| LootError::validation(format!("events export is malformed: {err}")))?;
        if payload.recorder.trim().is_empty() {
            payload.recorder = DEFAULT_RECORDER.to_string();
        }
        payload.extra.remove(SCHEMA_TAG_KEY);
        return Ok(CanonicalPayload::Events(payload));
    }

    if is_runs_shape(root) {
        let mut payload: RunsPayload = serde_json::from_value(raw.clone())
            .map_err(|err| LootError::validation(format!("runs export is malformed: {err}")))?;
        payload.extra.remove(SCHEMA_TAG_KEY);
        return Ok(CanonicalPayload::Runs(payload));
    }

    Err(LootError::validation(
        "unrecognized payload format; expected {\"schema\": 1, \"events\": [...]} or {\"player\", \"realm\", \"runs\": [...]}",
    ))
}

fn is_events_shape(root: &Map<String, Value>) -> bool {
    let schema_one = root
        .get("schema")
        .and_then(Value::as_f64)
        .is_some_and(|schema| schema == 1.0);
    schema_one && root.get("events").is_some_and(Value::is_array)
}

fn is_runs_shape(root: &Map<String, Value>) -> bool {
    field_text(root, "player").is_some()
        && field_text(root, "realm").is_some()
        && root.get("runs").is_some_and(Value::is_array)
}

fn field_text<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    root.get(key).filter(|value| match value {
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(_) => true,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SchemaTag;
    use serde_json::json;

    #[test]
    fn events_export_normalizes_with_defaults() {
        let raw = json!({
            "schema": 1,
            "realm": "Thunderstrike",
            "events": [{"time_human": "2024-01-01", "item": "Ring"}]
        });
        let payload = normalize(&raw).expect("normalize");
        assert_eq!(payload.schema_tag(), SchemaTag::EventsV1);
        let CanonicalPayload::Events(events) = payload else {
            panic!("expected events payload");
        };
        assert_eq!(events.recorder, DEFAULT_RECORDER);
        assert_eq!(events.exported_at, "");
        assert_eq!(events.events.len(), 1);
    }

    #[test]
    fn events_export_requires_realm() {
        let raw = json!({"schema": 1, "realm": "", "events": []});
        let err = normalize(&raw).expect_err("missing realm");
        assert!(err.is_validation());
    }

    #[test]
    fn events_shape_wins_over_runs_shape() {
        let raw = json!({
            "schema": 1,
            "realm": "Thunderstrike",
            "player": "Alice",
            "events": [],
            "runs": []
        });
        let payload = normalize(&raw).expect("normalize");
        assert_eq!(payload.schema_tag(), SchemaTag::EventsV1);
    }

    #[test]
    fn float_schema_one_is_an_events_export() {
        let payload = parse_payload(
            r#"{"schema": 1.0, "realm": "Thunderstrike", "events": [{"item": "Ring"}]}"#,
        )
        .expect("normalize");
        let CanonicalPayload::Events(events) = payload else {
            panic!("expected events payload");
        };
        assert_eq!(events.schema, 1);
        assert_eq!(events.events.len(), 1);
    }

    #[test]
    fn schema_other_than_one_falls_through_to_runs() {
        let raw = json!({
            "schema": 2,
            "player": "Alice",
            "realm": "Thunderstrike",
            "events": [],
            "runs": []
        });
        let payload = normalize(&raw).expect("normalize");
        assert_eq!(payload.schema_tag(), SchemaTag::RunsV1);
    }

    #[test]
    fn runs_export_preserves_unknown_fields() {
        let raw = json!({
            "player": "Alice",
            "realm": "Thunderstrike",
            "addon_version": "1.4.2",
            "runs": []
        });
        let CanonicalPayload::Runs(runs) = normalize(&raw).expect("normalize") else {
            panic!("expected runs payload");
        };
        assert_eq!(runs.extra.get("addon_version"), Some(&json!("1.4.2")));
    }

    #[test]
    fn runs_export_requires_player_realm_and_runs() {
        for raw in [
            json!({"realm": "Thunderstrike", "runs": []}),
            json!({"player": "Alice", "runs": []}),
            json!({"player": "Alice", "realm": "Thunderstrike", "runs": {}}),
        ] {
            let err = normalize(&raw).expect_err("incomplete runs export");
            assert!(err.is_validation());
        }
    }

    #[test]
    fn non_object_roots_are_rejected() {
        for raw in [json!([]), json!("text"), json!(null), json!(3)] {
            assert!(normalize(&raw).expect_err("not an object").is_validation());
        }
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        let err = parse_payload("{not json").expect_err("bad json");
        assert!(err.is_parse());
    }

    #[test]
    fn reimported_canonical_payload_keeps_single_tag() {
        let raw = json!({
            "schemaTag": "runs_v1",
            "player": "Alice",
            "realm": "Thunderstrike",
            "runs": []
        });
        let payload = normalize(&raw).expect("normalize");
        let text = serde_json::to_string(&payload).expect("serialize");
        assert_eq!(text.matches("schemaTag").count(), 1);
    }
}
