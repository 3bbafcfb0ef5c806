use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use loot_core::{quality::MAX_QUALITY, CanonicalPayload, DisplayRow, LootView, OptionField};
use loot_storage::{
    ImportMode, ImportOutcome, ImportReport, KvStore, PayloadStore, SharedSource, TrackerConfig,
};
use ratatui::{layout::Rect, widgets::TableState};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusMode {
    #[default]
    List,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    ItemSearch,
    ImportPath(ImportMode),
    ConfirmClear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Ok,
    Warn,
}

#[derive(Debug, Clone)]
pub struct StatusLine {
    pub message: String,
    pub kind: StatusKind,
    pub at: DateTime<Local>,
}

impl StatusLine {
    fn new(message: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            message: message.into(),
            kind,
            at: Local::now(),
        }
    }
}

/// Body of a shared-export fetch, delivered back to the event loop.
#[derive(Debug)]
pub struct FetchResult {
    pub source: SharedSource,
    pub body: Result<String, String>,
}

pub struct App<S: KvStore> {
    pub store: PayloadStore<S>,
    pub config: TrackerConfig,
    pub db_path: PathBuf,
    pub payloads: Vec<CanonicalPayload>,
    pub view: LootView,
    pub visible: Vec<DisplayRow>,
    pub table_state: TableState,
    pub focus: FocusMode,
    pub input: InputMode,
    pub input_buffer: String,
    pub search_backup: Option<String>,
    pub show_detail: bool,
    pub show_help: bool,
    pub status: Option<StatusLine>,
    pub shared_status: Option<StatusLine>,
    pub fetch_in_flight: bool,
    fetch_requested: bool,
    pub list_area: Option<Rect>,
    pub details_area: Option<Rect>,
    pub details_scroll: u16,
    pub details_max_scroll: u16,
    pub dirty: bool,
    should_quit: bool,
}

impl<S: KvStore> App<S> {
    pub fn new(store: PayloadStore<S>, config: TrackerConfig, db_path: PathBuf) -> Self {
        let view = LootView::new(config.respect_min_quality);
        Self {
            store,
            config,
            db_path,
            payloads: Vec::new(),
            view,
            visible: Vec::new(),
            table_state: TableState::default(),
            focus: FocusMode::List,
            input: InputMode::Normal,
            input_buffer: String::new(),
            search_backup: None,
            show_detail: false,
            show_help: false,
            status: None,
            shared_status: None,
            fetch_in_flight: false,
            fetch_requested: false,
            list_area: None,
            details_area: None,
            details_scroll: 0,
            details_max_scroll: 0,
            dirty: false,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Reload payloads from the store and rebuild every derived row.
    pub fn reload(&mut self) {
        match self.store.load_payloads() {
            Ok(payloads) => self.payloads = payloads,
            Err(err) => {
                warn!(error = %err, "failed to load stored payloads");
                self.set_status(format!("Failed to read store: {err}"), StatusKind::Warn);
            }
        }
        self.view.rebuild(&self.payloads);
        self.recalc_visible();
    }

    pub fn recalc_visible(&mut self) {
        self.visible = self.view.visible();
        self.mark_dirty();
        if self.visible.is_empty() {
            self.table_state.select(None);
            return;
        }
        match self.table_state.selected() {
            Some(selected) if selected >= self.visible.len() => {
                self.table_state
                    .select(Some(self.visible.len().saturating_sub(1)));
            }
            None => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn selected_row(&self) -> Option<&DisplayRow> {
        self.table_state
            .selected()
            .and_then(|idx| self.visible.get(idx))
    }

    pub fn set_status(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusLine::new(message, kind));
        self.mark_dirty();
    }

    fn set_shared_status(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.shared_status = Some(StatusLine::new(message, kind));
        self.mark_dirty();
    }

    /// Ask the event loop to fetch the shared export.
    pub fn request_fetch(&mut self) {
        if self.fetch_in_flight {
            self.set_shared_status("Shared export is already loading", StatusKind::Info);
            return;
        }
        if self.config.shared_source().is_none() {
            self.set_shared_status("No shared source configured", StatusKind::Warn);
            return;
        }
        self.fetch_requested = true;
    }

    pub fn take_fetch_request(&mut self) -> Option<SharedSource> {
        if !self.fetch_requested {
            return None;
        }
        self.fetch_requested = false;
        let source = self.config.shared_source()?;
        self.fetch_in_flight = true;
        self.set_shared_status(format!("Loading {source}..."), StatusKind::Info);
        Some(source)
    }

    /// Merge a finished fetch into the store. Failures change nothing.
    pub fn apply_fetch(&mut self, result: FetchResult) {
        self.fetch_in_flight = false;
        let body = match result.body {
            Ok(body) => body,
            Err(err) => {
                warn!(source = %result.source, error = %err, "shared export fetch failed");
                self.set_shared_status(
                    format!("Shared export unavailable: {err}"),
                    StatusKind::Warn,
                );
                return;
            }
        };

        match self.store.import_text(&body, ImportMode::Merge) {
            Ok(report) => {
                self.set_shared_status("Shared export loaded", StatusKind::Ok);
                self.finish_import(&report, "Shared import");
            }
            Err(err) => {
                warn!(source = %result.source, error = %err, "shared export rejected");
                self.set_shared_status(format!("Shared export invalid: {err}"), StatusKind::Warn);
            }
        }
    }

    pub fn import_path(&mut self, path: &str, mode: ImportMode) {
        let path = path.trim();
        if path.is_empty() {
            self.set_status("No file given", StatusKind::Warn);
            return;
        }
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                self.set_status(format!("Failed to read {path}: {err}"), StatusKind::Warn);
                return;
            }
        };
        match self.store.import_text(&text, mode) {
            Ok(report) => self.finish_import(&report, "Import"),
            Err(err) => self.set_status(format!("Import failed: {err}"), StatusKind::Warn),
        }
    }

    fn finish_import(&mut self, report: &ImportReport, label: &str) {
        info!(signature = %report.signature, outcome = ?report.outcome, "import applied");
        let message = match report.outcome {
            ImportOutcome::Added => format!(
                "{label}: {} loot(s) from {} ({})",
                report.loots, report.player, report.realm
            ),
            ImportOutcome::Duplicate => format!("{label}: already stored, nothing changed"),
            ImportOutcome::Replaced => format!(
                "{label}: store replaced with {} ({})",
                report.player, report.realm
            ),
        };
        self.set_status(message, StatusKind::Ok);
        self.payloads = report.payloads.clone();
        self.view.rebuild(&self.payloads);
        self.recalc_visible();
    }

    fn clear_store(&mut self) {
        match self.store.clear() {
            Ok(()) => {
                self.set_status("All stored exports deleted", StatusKind::Ok);
                self.payloads.clear();
                self.view.rebuild(&self.payloads);
                self.recalc_visible();
            }
            Err(err) => self.set_status(format!("Clear failed: {err}"), StatusKind::Warn),
        }
    }

    fn cycle_option(&mut self, field: OptionField, delta: isize) {
        self.view.cycle(field, delta);
        self.recalc_visible();
    }

    fn cycle_min_quality(&mut self) {
        let next = match self.view.criteria.min_quality {
            None => Some(0),
            Some(q) if q >= MAX_QUALITY => None,
            Some(q) => Some(q + 1),
        };
        self.view.set_min_quality(next);
        self.recalc_visible();
    }

    fn toggle_respect_min_quality(&mut self) {
        self.view.respect_min_quality = !self.view.respect_min_quality;
        self.view.rebuild(&self.payloads);
        self.recalc_visible();
    }

    fn reset_filters(&mut self) {
        self.view.criteria = Default::default();
        self.recalc_visible();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.input {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::ItemSearch => self.handle_search_key(key),
            InputMode::ImportPath(mode) => self.handle_import_key(key, mode),
            InputMode::ConfirmClear => {
                self.input = InputMode::Normal;
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                    self.clear_store();
                } else {
                    self.set_status("Clear cancelled", StatusKind::Info);
                }
            }
        }
        self.mark_dirty();
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Esc => {
                if self.show_help {
                    self.show_help = false;
                } else if self.show_detail {
                    self.show_detail = false;
                    self.details_scroll = 0;
                }
                self.focus = if self.show_detail {
                    FocusMode::Details
                } else {
                    FocusMode::List
                };
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Char('w') => self.cycle_option(OptionField::Winner, 1),
            KeyCode::Char('W') => self.cycle_option(OptionField::Winner, -1),
            KeyCode::Char('i') => self.cycle_option(OptionField::Instance, 1),
            KeyCode::Char('I') => self.cycle_option(OptionField::Instance, -1),
            KeyCode::Char('m') => self.cycle_min_quality(),
            KeyCode::Char('M') => self.toggle_respect_min_quality(),
            KeyCode::Char('c') => self.reset_filters(),
            KeyCode::Char('/') => {
                self.search_backup = self.view.criteria.item_substring.clone();
                self.input_buffer = self.search_backup.clone().unwrap_or_default();
                self.input = InputMode::ItemSearch;
            }
            KeyCode::Char('o') => self.start_import(ImportMode::Merge),
            KeyCode::Char('O') => self.start_import(ImportMode::Replace),
            KeyCode::Char('X') => {
                self.input = InputMode::ConfirmClear;
                self.set_status(
                    "Delete all stored exports? Press y to confirm",
                    StatusKind::Warn,
                );
            }
            KeyCode::Char('r') => {
                self.reload();
                self.set_status("Rebuilt from store", StatusKind::Info);
            }
            KeyCode::Char('R') => self.request_fetch(),
            KeyCode::Enter => {
                self.show_help = false;
                self.show_detail = !self.show_detail;
                self.details_scroll = 0;
                self.focus = if self.show_detail {
                    FocusMode::Details
                } else {
                    FocusMode::List
                };
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
                self.focus = if self.show_help || self.show_detail {
                    FocusMode::Details
                } else {
                    FocusMode::List
                };
            }
            KeyCode::Tab => {
                if self.show_detail || self.show_help {
                    self.focus = match self.focus {
                        FocusMode::List => FocusMode::Details,
                        FocusMode::Details => FocusMode::List,
                    };
                }
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                let backup = self.search_backup.take();
                self.view.set_item_substring(backup.as_deref().unwrap_or_default());
                self.input_buffer.clear();
                self.input = InputMode::Normal;
            }
            KeyCode::Enter => {
                self.search_backup = None;
                self.input_buffer.clear();
                self.input = InputMode::Normal;
                return;
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
                let needle = self.input_buffer.clone();
                self.view.set_item_substring(&needle);
            }
            KeyCode::Char(ch) => {
                self.input_buffer.push(ch);
                let needle = self.input_buffer.clone();
                self.view.set_item_substring(&needle);
            }
            _ => return,
        }
        self.recalc_visible();
    }

    fn start_import(&mut self, mode: ImportMode) {
        self.input_buffer.clear();
        self.input = InputMode::ImportPath(mode);
    }

    fn handle_import_key(&mut self, key: KeyEvent, mode: ImportMode) {
        match key.code {
            KeyCode::Esc => {
                self.input_buffer.clear();
                self.input = InputMode::Normal;
            }
            KeyCode::Enter => {
                let path = std::mem::take(&mut self.input_buffer);
                self.input = InputMode::Normal;
                self.import_path(&path, mode);
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Char(ch) => self.input_buffer.push(ch),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.handle_left_click(event.column, event.row);
            }
            MouseEventKind::ScrollUp => self.handle_scroll(-1),
            MouseEventKind::ScrollDown => self.handle_scroll(1),
            _ => {}
        }
        self.mark_dirty();
    }

    pub fn update_layout(&mut self, list_area: Rect, details_area: Option<Rect>) {
        self.list_area = Some(list_area);
        self.details_area = details_area;
        if details_area.is_none() {
            self.details_scroll = 0;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let len = self.visible.len() as isize;
        let next = (current + delta).rem_euclid(len);
        self.table_state.select(Some(next as usize));
        self.details_scroll = 0;
    }

    fn handle_left_click(&mut self, column: u16, row: u16) {
        if let Some(area) = self.list_area {
            if contains(area, column, row) {
                self.focus = FocusMode::List;
                if let Some(idx) = self.row_from_coords(area, row) {
                    if idx < self.visible.len() {
                        self.table_state.select(Some(idx));
                        self.details_scroll = 0;
                    }
                }
                return;
            }
        }
        if let Some(area) = self.details_area {
            if contains(area, column, row) {
                self.focus = FocusMode::Details;
            }
        }
    }

    fn handle_scroll(&mut self, delta: i16) {
        if self.show_detail && self.focus == FocusMode::Details {
            self.details_scroll = if delta < 0 {
                self.details_scroll.saturating_sub(1)
            } else {
                self.details_scroll.saturating_add(1)
            };
            return;
        }
        self.move_selection(if delta < 0 { -1 } else { 1 });
    }

    fn row_from_coords(&self, area: Rect, row: u16) -> Option<usize> {
        // Border plus header line.
        let header_height = 2u16;
        if area.height <= header_height + 1 {
            return None;
        }
        let data_start = area.y.saturating_add(header_height);
        let data_end = area.y.saturating_add(area.height.saturating_sub(1));
        if row < data_start || row >= data_end {
            return None;
        }
        Some(self.table_state.offset() + (row - data_start) as usize)
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use loot_core::ANY_OPTION;
    use loot_storage::MemoryStore;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn export() -> String {
        r#"{
            "player": "Alice",
            "realm": "Thunderstrike",
            "date": "2024-01-01",
            "min_quality": 2,
            "runs": [{
                "instance": "BFD",
                "bosses": [{
                    "name": "Gelihast",
                    "loots": [
                        {"player": "Bob", "item": "Cloak", "itemID": 6906, "quality": 2, "rand": 77, "time_human": "2024-01-01 20:31"},
                        {"player": "Carol", "item": "Linen Cloth", "quality": 1, "time_human": "2024-01-01 20:35"},
                        {"item": "Tidal Charm", "itemID": 1490, "quality": 3, "rand": 12, "time_human": "2024-01-01 20:50"}
                    ]
                }]
            }]
        }"#
        .to_string()
    }

    fn app() -> App<MemoryStore> {
        let mut store = PayloadStore::new(MemoryStore::new());
        store
            .import_text(&export(), ImportMode::Merge)
            .expect("seed store");
        let mut app = App::new(store, TrackerConfig::default(), PathBuf::from("memory"));
        app.reload();
        app
    }

    #[test]
    fn reload_shows_newest_first() {
        let app = app();
        assert_eq!(app.visible.len(), 3);
        assert_eq!(app.visible[0].item, "Tidal Charm");
        assert_eq!(app.selected_row().map(|r| r.item.as_str()), Some("Tidal Charm"));
    }

    #[test]
    fn winner_key_cycles_options() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('w')));
        assert_eq!(app.view.selected(OptionField::Winner), "Alice");
        assert_eq!(app.visible.len(), 1);
        app.handle_key(key(KeyCode::Char('W')));
        assert_eq!(app.view.selected(OptionField::Winner), ANY_OPTION);
        assert_eq!(app.visible.len(), 3);
    }

    #[test]
    fn search_filters_live_and_escape_restores() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('/')));
        for ch in "cl".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        assert_eq!(app.visible.len(), 2);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.input, InputMode::Normal);
        assert_eq!(app.visible.len(), 3);

        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Char('t')));
        app.handle_key(key(KeyCode::Char('i')));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.view.criteria.item_substring.as_deref(), Some("ti"));
        assert_eq!(app.visible.len(), 1);
    }

    #[test]
    fn min_quality_keys_compose_with_export_threshold() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('M')));
        assert!(app.view.respect_min_quality);
        assert_eq!(app.visible.len(), 2);

        for _ in 0..4 {
            app.handle_key(key(KeyCode::Char('m')));
        }
        assert_eq!(app.view.criteria.min_quality, Some(3));
        assert_eq!(app.visible.len(), 1);
    }

    #[test]
    fn clear_needs_confirmation() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('X')));
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.visible.len(), 3);

        app.handle_key(key(KeyCode::Char('X')));
        app.handle_key(key(KeyCode::Char('y')));
        assert!(app.visible.is_empty());
        assert!(app.store.load_payloads().expect("load").is_empty());
    }

    #[test]
    fn failed_fetch_keeps_rows() {
        let mut app = app();
        app.apply_fetch(FetchResult {
            source: SharedSource::Url("https://example.org/loot.json".to_string()),
            body: Err("unexpected status 404".to_string()),
        });
        assert_eq!(app.visible.len(), 3);
        let status = app.shared_status.as_ref().expect("shared status");
        assert_eq!(status.kind, StatusKind::Warn);

        app.apply_fetch(FetchResult {
            source: SharedSource::Url("https://example.org/loot.json".to_string()),
            body: Ok("{not json".to_string()),
        });
        assert_eq!(app.payloads.len(), 1);
        assert!(!app.fetch_in_flight);
    }

    #[test]
    fn duplicate_fetch_is_a_no_op() {
        let mut app = app();
        app.apply_fetch(FetchResult {
            source: SharedSource::Path(PathBuf::from("shared.json")),
            body: Ok(export()),
        });
        assert_eq!(app.payloads.len(), 1);
        assert_eq!(app.visible.len(), 3);
    }

    #[test]
    fn fetch_request_needs_a_source() {
        let mut app = app();
        app.request_fetch();
        assert!(app.take_fetch_request().is_none());

        app.config.shared_source = Some("https://example.org/loot.json".to_string());
        app.request_fetch();
        assert!(app.take_fetch_request().is_some());
        assert!(app.fetch_in_flight);
        app.request_fetch();
        assert!(app.take_fetch_request().is_none());
    }
}
