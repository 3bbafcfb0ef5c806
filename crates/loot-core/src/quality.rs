use serde_json::Value;

use crate::model::number_of;

pub const QUALITY_LABELS: [&str; 6] = ["Poor", "Common", "Uncommon", "Rare", "Epic", "Legendary"];

/// Highest quality tier with a label.
pub const MAX_QUALITY: i64 = 5;

/// Label for a quality tier; values outside the table render as themselves.
pub fn quality_label(quality: i64) -> String {
    usize::try_from(quality)
        .ok()
        .and_then(|idx| QUALITY_LABELS.get(idx))
        .map(|label| label.to_string())
        .unwrap_or_else(|| quality.to_string())
}

/// Style class for a quality tier, e.g. `q3`.
pub fn quality_class(quality: i64) -> String {
    format!("q{quality}")
}

/// Quality of a raw field; absent or non-numeric reads as 0.
pub fn quality_of(value: Option<&Value>) -> i64 {
    value.and_then(number_of).map(|q| q.trunc() as i64).unwrap_or(0)
}
