use crate::model::CanonicalPayload;
use serde::Serialize;
use std::collections::BTreeMap;

/// A character that has contributed at least one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: String,
    pub realm: String,
    pub player: String,
    pub payloads: usize,
    pub loots: usize,
}

pub fn profile_id(realm: &str, player: &str) -> String {
    format!("{realm}|{player}")
}

/// Distinct realm/player pairs across the store, ordered by id.
pub fn profiles(payloads: &[CanonicalPayload]) -> Vec<Profile> {
    let mut by_id: BTreeMap<String, Profile> = BTreeMap::new();
    for payload in payloads {
        let id = profile_id(payload.realm(), payload.player());
        let entry = by_id.entry(id.clone()).or_insert_with(|| Profile {
            id,
            realm: payload.realm().to_string(),
            player: payload.player().to_string(),
            payloads: 0,
            loots: 0,
        });
        entry.payloads += 1;
        entry.loots += payload.loot_count();
    }
    by_id.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    #[test]
    fn groups_payloads_by_realm_and_player() {
        let payloads = vec![
            normalize(&json!({"player": "Zed", "realm": "Thunderstrike", "runs": []})).expect("runs"),
            normalize(&json!({
                "schema": 1, "realm": "Thunderstrike", "recorder": "Alice",
                "events": [{"item": "Ring"}, {"item": "Cloak"}]
            }))
            .expect("events"),
            normalize(&json!({
                "schema": 1, "realm": "Thunderstrike", "recorder": "Alice",
                "events": [{"item": "Cog"}]
            }))
            .expect("events"),
        ];

        let found = profiles(&payloads);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "Thunderstrike|Alice");
        assert_eq!(found[0].payloads, 2);
        assert_eq!(found[0].loots, 3);
        assert_eq!(found[1].player, "Zed");
    }
}
