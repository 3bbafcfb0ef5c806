use crate::rows::DisplayRow;
use serde::{Deserialize, Serialize};

/// User-chosen predicates; every present criterion must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub item_substring: Option<String>,
    #[serde(default)]
    pub min_quality: Option<i64>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        active(&self.winner).is_none()
            && active(&self.instance).is_none()
            && active(&self.item_substring).is_none()
            && self.min_quality.is_none()
    }

    pub fn matches(&self, row: &DisplayRow) -> bool {
        if let Some(winner) = active(&self.winner) {
            if row.winner != winner {
                return false;
            }
        }
        if let Some(instance) = active(&self.instance) {
            if row.instance != instance {
                return false;
            }
        }
        if let Some(needle) = active(&self.item_substring) {
            if !row.item.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(min_quality) = self.min_quality {
            if row.quality < min_quality {
                return false;
            }
        }
        true
    }
}

/// Filter rows, then order them newest first by their date text.
///
/// Dates compare as plain strings; rows with equal dates keep their relative
/// order.
pub fn apply_filters(rows: &[DisplayRow], criteria: &FilterCriteria) -> Vec<DisplayRow> {
    let mut kept: Vec<DisplayRow> = rows
        .iter()
        .filter(|row| criteria.matches(row))
        .cloned()
        .collect();
    kept.sort_by(|a, b| b.date.cmp(&a.date));
    kept
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
