use crate::model::{non_blank, number_of, CanonicalPayload, EventsPayload, RunsPayload};
use crate::quality::{quality_class, quality_label, quality_of};
use serde::Serialize;
use serde_json::Value;

/// Placeholder shown for a missing roll.
pub const NO_ROLL: &str = "—";

/// One item drop, flattened and ready to display. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub date: String,
    pub instance: String,
    pub boss: String,
    pub winner: String,
    pub item: String,
    #[serde(rename = "itemID")]
    pub item_id: Option<u64>,
    pub quality: i64,
    #[serde(rename = "qualityName")]
    pub quality_name: String,
    pub roll: Option<i64>,
}

impl DisplayRow {
    /// Item database link, only for rows with a usable item id.
    pub fn item_link(&self, base: &str) -> Option<String> {
        self.item_id.map(|id| format!("{base}{id}"))
    }

    pub fn roll_label(&self) -> String {
        self.roll
            .map(|roll| roll.to_string())
            .unwrap_or_else(|| NO_ROLL.to_string())
    }

    pub fn quality_class(&self) -> String {
        quality_class(self.quality)
    }
}

/// Flatten one payload into display rows, in export order.
///
/// With `respect_min_quality`, runs exports drop loot below their own
/// `min_quality`. Events exports carry no threshold and are never filtered here.
pub fn extract_rows(payload: &CanonicalPayload, respect_min_quality: bool) -> Vec<DisplayRow> {
    match payload {
        CanonicalPayload::Events(events) => extract_events(events),
        CanonicalPayload::Runs(runs) => extract_runs(runs, respect_min_quality),
    }
}

/// Rows of every payload, concatenated in store order.
pub fn extract_all(payloads: &[CanonicalPayload], respect_min_quality: bool) -> Vec<DisplayRow> {
    payloads
        .iter()
        .flat_map(|payload| extract_rows(payload, respect_min_quality))
        .collect()
}

fn extract_events(payload: &EventsPayload) -> Vec<DisplayRow> {
    payload
        .events
        .iter()
        .map(|ev| {
            let quality = quality_of(ev.quality.as_ref());
            DisplayRow {
                date: ev.time_human.clone().unwrap_or_default(),
                instance: ev.instance.clone().unwrap_or_default(),
                boss: ev.boss.clone().unwrap_or_default(),
                winner: ev.winner.clone().unwrap_or_default(),
                item: ev.item.clone().unwrap_or_default(),
                item_id: item_id_of(ev.item_id.as_ref()),
                quality,
                quality_name: label_or_default(ev.quality_name.as_deref(), quality),
                roll: roll_of(ev.winning_roll.as_ref()),
            }
        })
        .collect()
}

fn extract_runs(payload: &RunsPayload, respect_min_quality: bool) -> Vec<DisplayRow> {
    let min_quality = quality_of(payload.min_quality.as_ref());
    let mut rows = Vec::new();

    for run in &payload.runs {
        let instance = non_blank(run.instance_override.as_deref())
            .or(run.instance.as_deref())
            .unwrap_or_default();
        for boss in &run.bosses {
            for loot in &boss.loots {
                let quality = quality_of(loot.quality.as_ref());
                if respect_min_quality && quality < min_quality {
                    continue;
                }

                let date = non_blank(loot.time_human.as_deref())
                    .or_else(|| non_blank(run.started_at_human.as_deref()))
                    .or_else(|| non_blank(payload.date.as_deref()))
                    .unwrap_or_default();
                let winner = non_blank(loot.player.as_deref()).unwrap_or(&payload.player);

                rows.push(DisplayRow {
                    date: date.to_string(),
                    instance: instance.to_string(),
                    boss: boss.name.clone().unwrap_or_default(),
                    winner: winner.to_string(),
                    item: loot.item.clone().unwrap_or_default(),
                    item_id: item_id_of(loot.item_id.as_ref()),
                    quality,
                    quality_name: label_or_default(loot.quality_name.as_deref(), quality),
                    roll: roll_of(loot.rand.as_ref()),
                });
            }
        }
    }

    rows
}

fn label_or_default(label: Option<&str>, quality: i64) -> String {
    non_blank(label)
        .map(str::to_string)
        .unwrap_or_else(|| quality_label(quality))
}

/// Zero, negative, fractional or unparsable ids mean "no link".
fn item_id_of(value: Option<&Value>) -> Option<u64> {
    let id = value.and_then(number_of)?;
    if id >= 1.0 && id.fract() == 0.0 && id <= u64::MAX as f64 {
        Some(id as u64)
    } else {
        None
    }
}

fn roll_of(value: Option<&Value>) -> Option<i64> {
    value.and_then(number_of).map(|roll| roll.trunc() as i64)
}
