use crate::filter::{apply_filters, FilterCriteria};
use crate::model::CanonicalPayload;
use crate::options::{build_options, is_any, retain_selection, OptionField, ANY_OPTION};
use crate::rows::{extract_all, DisplayRow};

/// Rows and filter controls derived from the stored payloads.
///
/// Owned by whichever front end renders it; every rebuild starts from the
/// payloads it is given, nothing is cached across owners.
#[derive(Debug, Clone, Default)]
pub struct LootView {
    pub respect_min_quality: bool,
    pub criteria: FilterCriteria,
    rows: Vec<DisplayRow>,
    winners: Vec<String>,
    instances: Vec<String>,
}

impl LootView {
    pub fn new(respect_min_quality: bool) -> Self {
        Self {
            respect_min_quality,
            winners: vec![ANY_OPTION.to_string()],
            instances: vec![ANY_OPTION.to_string()],
            ..Self::default()
        }
    }

    /// Re-extract rows and refresh the option lists. A selected winner or
    /// instance that no longer exists resets to "any".
    pub fn rebuild(&mut self, payloads: &[CanonicalPayload]) {
        self.rows = extract_all(payloads, self.respect_min_quality);
        self.winners = build_options(&self.rows, OptionField::Winner);
        self.instances = build_options(&self.rows, OptionField::Instance);

        let winner = retain_selection(&self.winners, self.selected(OptionField::Winner));
        let instance = retain_selection(&self.instances, self.selected(OptionField::Instance));
        self.select(OptionField::Winner, &winner);
        self.select(OptionField::Instance, &instance);
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn options(&self, field: OptionField) -> &[String] {
        match field {
            OptionField::Winner => &self.winners,
            OptionField::Instance => &self.instances,
        }
    }

    /// Filtered, date-sorted rows.
    pub fn visible(&self) -> Vec<DisplayRow> {
        apply_filters(&self.rows, &self.criteria)
    }

    pub fn selected(&self, field: OptionField) -> &str {
        let value = match field {
            OptionField::Winner => self.criteria.winner.as_deref(),
            OptionField::Instance => self.criteria.instance.as_deref(),
        };
        value.unwrap_or(ANY_OPTION)
    }

    pub fn select(&mut self, field: OptionField, value: &str) {
        let choice = if is_any(value) {
            None
        } else {
            Some(value.to_string())
        };
        match field {
            OptionField::Winner => self.criteria.winner = choice,
            OptionField::Instance => self.criteria.instance = choice,
        }
    }

    /// Step through the option list, wrapping at both ends.
    pub fn cycle(&mut self, field: OptionField, delta: isize) {
        let options = self.options(field);
        if options.is_empty() {
            return;
        }
        let current = options
            .iter()
            .position(|option| option == self.selected(field))
            .unwrap_or(0) as isize;
        let len = options.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        let value = options[next].clone();
        self.select(field, &value);
    }

    pub fn set_item_substring(&mut self, needle: &str) {
        let trimmed = needle.trim();
        self.criteria.item_substring = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn set_min_quality(&mut self, min_quality: Option<i64>) {
        self.criteria.min_quality = min_quality;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    fn payload(winners: &[&str]) -> CanonicalPayload {
        let events: Vec<_> = winners
            .iter()
            .enumerate()
            .map(|(idx, winner)| {
                json!({
                    "time_human": format!("2024-01-0{}", idx + 1),
                    "instance": "BFD",
                    "winner": winner,
                    "item": "Ring",
                    "quality": idx
                })
            })
            .collect();
        normalize(&json!({"schema": 1, "realm": "Thunderstrike", "events": events}))
            .expect("normalize")
    }

    #[test]
    fn rebuild_fills_options() {
        let mut view = LootView::new(false);
        view.rebuild(&[payload(&["Bob", "Alice"])]);
        assert_eq!(view.rows().len(), 2);
        assert_eq!(view.options(OptionField::Winner), &[ANY_OPTION, "Alice", "Bob"]);
        assert_eq!(view.options(OptionField::Instance), &[ANY_OPTION, "BFD"]);
    }

    #[test]
    fn vanished_selection_resets_to_any() {
        let mut view = LootView::new(false);
        view.rebuild(&[payload(&["Bob", "Alice"])]);
        view.select(OptionField::Winner, "Bob");
        assert_eq!(view.visible().len(), 1);

        view.rebuild(&[payload(&["Bob", "Carol"])]);
        assert_eq!(view.selected(OptionField::Winner), "Bob");

        view.rebuild(&[payload(&["Carol"])]);
        assert_eq!(view.selected(OptionField::Winner), ANY_OPTION);
        assert_eq!(view.criteria.winner, None);
    }

    #[test]
    fn cycle_wraps_through_sentinel() {
        let mut view = LootView::new(false);
        view.rebuild(&[payload(&["Alice", "Bob"])]);
        view.cycle(OptionField::Winner, 1);
        assert_eq!(view.selected(OptionField::Winner), "Alice");
        view.cycle(OptionField::Winner, 1);
        view.cycle(OptionField::Winner, 1);
        assert_eq!(view.selected(OptionField::Winner), ANY_OPTION);
        view.cycle(OptionField::Winner, -1);
        assert_eq!(view.selected(OptionField::Winner), "Bob");
    }

    #[test]
    fn text_and_quality_filters_compose() {
        let mut view = LootView::new(false);
        view.rebuild(&[payload(&["Alice", "Bob", "Carol"])]);
        view.set_item_substring("  ring ");
        view.set_min_quality(Some(1));
        let visible = view.visible();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].winner, "Carol");
    }
}
