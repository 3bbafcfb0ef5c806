use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Placeholder recorder name for events exports that do not name one.
pub const DEFAULT_RECORDER: &str = "Recorder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaTag {
    EventsV1,
    RunsV1,
}

impl SchemaTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaTag::EventsV1 => "events_v1",
            SchemaTag::RunsV1 => "runs_v1",
        }
    }
}

impl fmt::Display for SchemaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loot export in its canonical, persisted form.
///
/// The discriminant is written as `schemaTag` next to the original fields, so a
/// stored payload still reads like the export it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schemaTag")]
pub enum CanonicalPayload {
    #[serde(rename = "events_v1")]
    Events(EventsPayload),
    #[serde(rename = "runs_v1")]
    Runs(RunsPayload),
}

impl CanonicalPayload {
    pub fn schema_tag(&self) -> SchemaTag {
        match self {
            CanonicalPayload::Events(_) => SchemaTag::EventsV1,
            CanonicalPayload::Runs(_) => SchemaTag::RunsV1,
        }
    }

    pub fn realm(&self) -> &str {
        match self {
            CanonicalPayload::Events(payload) => &payload.realm,
            CanonicalPayload::Runs(payload) => &payload.realm,
        }
    }

    /// Character the export belongs to: the recorder for events exports.
    pub fn player(&self) -> &str {
        match self {
            CanonicalPayload::Events(payload) => &payload.recorder,
            CanonicalPayload::Runs(payload) => &payload.player,
        }
    }

    /// Number of loot records carried, before any quality threshold.
    pub fn loot_count(&self) -> usize {
        match self {
            CanonicalPayload::Events(payload) => payload.events.len(),
            CanonicalPayload::Runs(payload) => payload
                .runs
                .iter()
                .flat_map(|run| run.bosses.iter())
                .map(|boss| boss.loots.len())
                .sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsPayload {
    #[serde(deserialize_with = "deserialize_schema")]
    pub schema: u32,
    #[serde(deserialize_with = "deserialize_text")]
    pub realm: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub recorder: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub exported_at: String,
    pub events: Vec<LootEvent>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LootEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_human: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub instance: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub boss: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub winner: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub item: Option<String>,
    #[serde(default, rename = "itemID", skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub quality_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_roll: Option<Value>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunsPayload {
    #[serde(deserialize_with = "deserialize_text")]
    pub player: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub realm: String,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_quality: Option<Value>,
    pub runs: Vec<Run>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub instance: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub instance_override: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at_human: Option<String>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub bosses: Vec<Boss>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub loots: Vec<Loot>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Loot {
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub player: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub item: Option<String>,
    #[serde(default, rename = "itemID", skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub quality_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rand: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_human: Option<String>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// Numeric reading of a loosely typed export field.
///
/// Numbers pass through, numeric strings are parsed, anything else is `None`.
pub fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// Textual reading of a loosely typed export field, used for signatures.
pub fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `Some` only for text that is not blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn text_from_value<E: serde::de::Error>(val: Value) -> Result<Option<String>, E> {
    match val {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Err(E::custom("expected string or number")),
    }
}

/// Deserialize a text field that exports sometimes write as a number.
fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    text_from_value(val)
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    Ok(text_from_value(val)?.unwrap_or_default())
}

/// Schema version written as `1` or `1.0`.
fn deserialize_schema<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    number_of(&val)
        .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid schema version {val}")))
}

/// A list that may be absent or `null`.
fn deserialize_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default())
}
