use crate::model::{text_of, CanonicalPayload};
use std::fmt;

/// Provenance-and-size fingerprint of a payload. Equal signatures mean the
/// same export was imported twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PayloadSignature(String);

impl PayloadSignature {
    pub fn of(payload: &CanonicalPayload) -> Self {
        let parts = match payload {
            CanonicalPayload::Events(events) => {
                let last_time = text_of(events.events.last().and_then(|ev| ev.time.as_ref()));
                vec![
                    payload.schema_tag().as_str().to_string(),
                    events.realm.clone(),
                    events.exported_at.clone(),
                    events.events.len().to_string(),
                    last_time,
                ]
            }
            CanonicalPayload::Runs(runs) => vec![
                payload.schema_tag().as_str().to_string(),
                runs.realm.clone(),
                runs.player.clone(),
                runs.date.clone().unwrap_or_default(),
                text_of(runs.started_at.as_ref()),
                runs.runs.len().to_string(),
            ],
        };
        Self(parts.join("|"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PayloadSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    #[test]
    fn events_signature_uses_count_and_last_time() {
        let payload = normalize(&json!({
            "schema": 1,
            "realm": "Thunderstrike",
            "exported_at": "2024-01-02T10:00:00Z",
            "events": [{"time": 1704100000}, {"time": 1704103600}]
        }))
        .expect("normalize");
        assert_eq!(
            PayloadSignature::of(&payload).as_str(),
            "events_v1|Thunderstrike|2024-01-02T10:00:00Z|2|1704103600"
        );
    }

    #[test]
    fn runs_signature_uses_player_date_start_and_run_count() {
        let payload = normalize(&json!({
            "player": "Alice",
            "realm": "Thunderstrike",
            "date": "2024-01-01",
            "started_at": 1704100000,
            "runs": [{"instance": "BFD"}]
        }))
        .expect("normalize");
        assert_eq!(
            PayloadSignature::of(&payload).to_string(),
            "runs_v1|Thunderstrike|Alice|2024-01-01|1704100000|1"
        );
    }

    #[test]
    fn signature_changes_when_export_grows() {
        let small = normalize(&json!({
            "schema": 1, "realm": "Thunderstrike", "exported_at": "x", "events": [{"time": 1}]
        }))
        .expect("normalize");
        let grown = normalize(&json!({
            "schema": 1, "realm": "Thunderstrike", "exported_at": "x", "events": [{"time": 1}, {"time": 2}]
        }))
        .expect("normalize");
        assert_ne!(PayloadSignature::of(&small), PayloadSignature::of(&grown));
    }
}
