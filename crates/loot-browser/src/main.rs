mod state;
mod theme;
mod ui;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use loot_storage::{fetch_shared, open_payload_store, SharedSource, SqliteStore, TrackerConfig};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::{backend::CrosstermBackend, Terminal};
use state::{App, FetchResult};
use std::{
    fs::OpenOptions,
    io,
    path::Path,
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Duration,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_logging();

    let config = TrackerConfig::load();
    let db_path = config.resolved_db_path();
    let store = open_payload_store(&db_path)
        .with_context(|| format!("Failed to open {}", db_path.display()))?;
    info!(path = %db_path.display(), "loot browser starting");

    let fetch_on_start = config.fetch_on_start;
    let mut app = App::new(store, config, db_path);
    app.reload();
    if fetch_on_start && app.config.shared_source.is_some() {
        app.request_fetch();
    }

    let (watcher, watch_rx) = match app.db_path.parent() {
        Some(dir) => setup_watcher(dir),
        None => (None, None),
    };
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, watch_rx);
    restore_terminal(&mut terminal)?;
    drop(watcher);

    exit_status(result)
}

/// The event loop's outcome, reported once the terminal is restored.
fn exit_status(result: Result<()>) -> Result<()> {
    result.context("loot-browser event loop failed")
}

fn init_logging() {
    let level = std::env::var("LOOT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // The terminal belongs to the UI; logs only go somewhere when a file is named.
    let Ok(path) = std::env::var("LOOT_LOG_FILE") else {
        return;
    };
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init();
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<SqliteStore>,
    watch_rx: Option<Receiver<()>>,
) -> Result<()> {
    let input_poll = Duration::from_millis(100);
    let (fetch_tx, fetch_rx) = mpsc::channel::<FetchResult>();
    app.mark_dirty();

    loop {
        if app.dirty {
            terminal.draw(|f| ui::render(f, app))?;
            app.dirty = false;
        }

        if event::poll(input_poll)? {
            match event::read()? {
                Event::Key(key) => {
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                        app.handle_key(key);
                    }
                }
                Event::Mouse(mouse) => {
                    app.handle_mouse(mouse);
                }
                Event::Resize(_, _) => {
                    app.mark_dirty();
                }
                _ => {}
            }
        }

        if let Some(source) = app.take_fetch_request() {
            spawn_fetch(source, fetch_tx.clone());
        }
        while let Ok(result) = fetch_rx.try_recv() {
            app.apply_fetch(result);
        }

        if let Some(rx) = &watch_rx {
            let mut changed = false;
            while rx.try_recv().is_ok() {
                changed = true;
            }
            if changed {
                debug!("store directory changed, reloading");
                app.reload();
            }
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

fn spawn_fetch(source: SharedSource, tx: Sender<FetchResult>) {
    thread::spawn(move || {
        let body = fetch_shared(&source).map_err(|err| err.to_string());
        let _ = tx.send(FetchResult { source, body });
    });
}

fn setup_watcher(dir: &Path) -> (Option<RecommendedWatcher>, Option<Receiver<()>>) {
    let (tx, rx) = mpsc::sync_channel(1);
    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if res.is_ok() {
                let _ = tx.try_send(());
            }
        },
        Config::default(),
    ) {
        Ok(watcher) => watcher,
        Err(_) => return (None, None),
    };

    if watcher.watch(dir, RecursiveMode::NonRecursive).is_err() {
        return (None, None);
    }

    (Some(watcher), Some(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_loop_failure_is_returned() {
        let err = exit_status(Err(anyhow::anyhow!("terminal went away"))).expect_err("failure");
        assert_eq!(err.to_string(), "loot-browser event loop failed");
        assert_eq!(err.root_cause().to_string(), "terminal went away");
        assert!(exit_status(Ok(())).is_ok());
    }
}
