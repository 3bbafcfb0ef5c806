use crate::state::{App, FocusMode, InputMode, StatusLine};
use crate::theme;
use loot_core::{option_label, quality_label, OptionField};
use loot_storage::{ImportMode, KvStore};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

pub fn render<S: KvStore>(f: &mut Frame, app: &mut App<S>) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.size());

    render_filters(f, app, outer[0]);
    render_status(f, app, outer[2]);

    let area = outer[1];
    if app.show_help || app.show_detail {
        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        app.update_layout(main[0], Some(main[1]));
        render_main(f, app, main[0]);

        if app.show_help {
            render_help(f, main[1]);
        } else {
            render_details(f, app, main[1]);
        }
    } else {
        app.update_layout(area, None);
        render_main(f, app, area);
    }
}

fn render_filters<S: KvStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Filters");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let line = match app.input {
        InputMode::ImportPath(mode) => {
            let label = match mode {
                ImportMode::Merge => "Import file (merge): ",
                ImportMode::Replace => "Import file (replace all): ",
            };
            Line::from(vec![
                Span::styled(label, Style::default().fg(Color::Yellow)),
                Span::raw(format!("{}_", app.input_buffer)),
            ])
        }
        _ => {
            let item = if app.input == InputMode::ItemSearch {
                format!("{}_", app.input_buffer)
            } else {
                app.view
                    .criteria
                    .item_substring
                    .clone()
                    .unwrap_or_else(|| "any".to_string())
            };
            let min_quality = app
                .view
                .criteria
                .min_quality
                .map(quality_label)
                .unwrap_or_else(|| "any".to_string());
            let export_min = if app.view.respect_min_quality {
                "on"
            } else {
                "off"
            };
            Line::from(vec![
                Span::styled("Winner ", theme::LABEL_STYLE),
                Span::raw(option_label(app.view.selected(OptionField::Winner))),
                Span::styled("  Instance ", theme::LABEL_STYLE),
                Span::raw(option_label(app.view.selected(OptionField::Instance))),
                Span::styled("  Item ", theme::LABEL_STYLE),
                Span::raw(item),
                Span::styled("  Min quality ", theme::LABEL_STYLE),
                Span::raw(min_quality),
                Span::styled("  Export threshold ", theme::LABEL_STYLE),
                Span::raw(export_min),
            ])
        }
    };
    f.render_widget(Paragraph::new(line), inner);
}

fn status_span(status: &StatusLine) -> Span<'static> {
    Span::styled(
        format!("[{}] {}", status.at.format("%H:%M:%S"), status.message),
        Style::default().fg(theme::status_color(status.kind)),
    )
}

fn render_status<S: KvStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let left = match &app.status {
        Some(status) => Line::from(status_span(status)),
        None => Line::from(Span::styled("? for help", theme::LABEL_STYLE)),
    };
    f.render_widget(Paragraph::new(left), halves[0]);

    if let Some(shared) = &app.shared_status {
        let right = Paragraph::new(Line::from(status_span(shared)))
            .alignment(ratatui::layout::Alignment::Right);
        f.render_widget(right, halves[1]);
    }
}

fn render_help(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Yellow));
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let keys = [
        ("j / Down", "Next row"),
        ("k / Up", "Previous row"),
        ("w / W", "Next / previous winner"),
        ("i / I", "Next / previous instance"),
        ("/", "Search item names"),
        ("m", "Cycle minimum quality"),
        ("M", "Toggle export threshold"),
        ("c", "Reset filters"),
        ("o", "Import file (merge)"),
        ("O", "Import file (replace all)"),
        ("R", "Load shared export"),
        ("r", "Rebuild from store"),
        ("X", "Delete stored exports"),
        ("Enter", "Toggle details pane"),
        ("Tab", "Switch focus"),
        ("?", "Toggle help"),
        ("q", "Quit"),
    ];

    let mut text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    text.extend(keys.iter().map(|(key, action)| {
        Line::from(vec![
            Span::styled(format!("{key:<11}"), Color::Cyan),
            Span::raw(*action),
        ])
    }));

    let p = Paragraph::new(text).wrap(Wrap { trim: true });
    f.render_widget(p, inner_area);
}

fn render_main<S: KvStore>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    let border_style = if app.focus == FocusMode::List {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    if app.visible.is_empty() {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Loot")
            .border_style(border_style);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let message = if app.payloads.is_empty() {
            "No exports stored"
        } else {
            "No loot matches the current filters"
        };
        let text = vec![
            Line::from(Span::styled(message, Color::Yellow)),
            Line::from(""),
            Line::from(format!("store: {}", app.db_path.display())),
            Line::from(""),
            Line::from("Press o to import, R to load the shared export, q to quit."),
        ];
        let p = Paragraph::new(text).wrap(Wrap { trim: true });
        f.render_widget(p, inner);
        return;
    }

    let rows: Vec<Row> = app
        .visible
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let color = theme::quality_color(row.quality);
            Row::new(vec![
                Cell::from(row.date.as_str()),
                Cell::from(row.instance.as_str()),
                Cell::from(row.boss.as_str()),
                Cell::from(row.winner.as_str()),
                Cell::from(Span::styled(row.item.as_str(), Style::default().fg(color))),
                Cell::from(Span::styled(
                    row.quality_name.as_str(),
                    Style::default().fg(color),
                )),
                Cell::from(row.roll_label()),
            ])
            .style(theme::zebra_row_style(idx))
        })
        .collect();

    let widths = [
        Constraint::Length(16),
        Constraint::Length(14),
        Constraint::Length(16),
        Constraint::Length(12),
        Constraint::Min(16),
        Constraint::Length(10),
        Constraint::Length(5),
    ];

    let title = format!("Loot ({}/{})", app.visible.len(), app.view.rows().len());
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec![
                "Date", "Instance", "Boss", "Winner", "Item", "Quality", "Roll",
            ])
            .style(theme::HEADER_STYLE),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        )
        .highlight_style(theme::SELECTED_STYLE);

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_details<S: KvStore>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    let border_style = if app.focus == FocusMode::Details {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Details")
        .border_style(border_style);
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let Some(row) = app.selected_row() else {
        return;
    };

    let field = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, theme::LABEL_STYLE), Span::raw(value)])
    };

    let mut lines = vec![
        Line::from(Span::styled(
            row.item.clone(),
            Style::default()
                .fg(theme::quality_color(row.quality))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{} ({})", row.quality_name, row.quality_class()),
            theme::LABEL_STYLE,
        )),
        Line::from(""),
        field("Winner: ", row.winner.clone()),
        field("Roll: ", row.roll_label()),
        field("Boss: ", row.boss.clone()),
        field("Instance: ", row.instance.clone()),
        field("Date: ", row.date.clone()),
        Line::from(""),
    ];

    match row.item_link(&app.config.item_link_base) {
        Some(link) => {
            lines.push(Line::from(Span::styled(
                "Link:",
                Style::default().fg(Color::Blue),
            )));
            lines.push(Line::from(link));
        }
        None => lines.push(Line::from(Span::styled(
            "No item id recorded.",
            theme::LABEL_STYLE,
        ))),
    }

    let total_height = wrapped_height(&lines, inner_area.width);
    app.details_max_scroll = total_height.saturating_sub(inner_area.height);
    if app.details_scroll > app.details_max_scroll {
        app.details_scroll = app.details_max_scroll;
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .scroll((app.details_scroll, 0));
    f.render_widget(p, inner_area);
}

fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let mut total: usize = 0;
    for line in lines {
        let line_width = line.width();
        if line_width == 0 {
            total += 1;
        } else {
            total += (line_width + width - 1) / width;
        }
    }
    total as u16
}
