use crate::state::StatusKind;
use ratatui::style::{Color, Modifier, Style};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(142, 192, 124))
    .add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(131, 165, 152))
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const LABEL_STYLE: Style = Style::new().fg(Color::DarkGray);

pub fn zebra_row_style(index: usize) -> Style {
    let bg = if index % 2 == 0 {
        Color::Rgb(18, 20, 26)
    } else {
        Color::Rgb(24, 27, 34)
    };
    Style::new().bg(bg)
}

/// Item colour by quality tier, Poor through Legendary.
pub fn quality_color(quality: i64) -> Color {
    match quality {
        0 => Color::Rgb(157, 157, 157),
        1 => Color::Rgb(235, 219, 178),
        2 => Color::Rgb(30, 255, 0),
        3 => Color::Rgb(0, 112, 221),
        4 => Color::Rgb(163, 53, 238),
        5 => Color::Rgb(255, 128, 0),
        _ => Color::Rgb(146, 131, 116),
    }
}

pub fn status_color(kind: StatusKind) -> Color {
    match kind {
        StatusKind::Info => Color::Rgb(131, 165, 152),
        StatusKind::Ok => Color::Rgb(184, 187, 38),
        StatusKind::Warn => Color::Rgb(254, 128, 25),
    }
}
