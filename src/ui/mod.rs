mod detail;
mod home;
mod login;

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Block;
use ratatui::Frame;

use crate::app::{App, Screen};
use crate::session::Theme;

/// Colors resolved from the active theme, passed down to every widget.
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub dim: Color,
    pub accent: Color,
    pub error: Color,
    pub highlight_bg: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Palette {
                bg: Color::Black,
                fg: Color::White,
                dim: Color::DarkGray,
                accent: Color::Yellow,
                error: Color::Red,
                highlight_bg: Color::DarkGray,
            },
            Theme::Light => Palette {
                bg: Color::White,
                fg: Color::Black,
                dim: Color::Gray,
                accent: Color::Blue,
                error: Color::LightRed,
                highlight_bg: Color::LightBlue,
            },
        }
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    let palette = Palette::for_theme(app.theme);

    let background = Block::default().style(Style::default().bg(palette.bg).fg(palette.fg));
    frame.render_widget(background, frame.size());

    match app.screen {
        Screen::Login => login::render(frame, app, &palette),
        Screen::Home => home::render(frame, app, &palette),
        Screen::Detail => detail::render(frame, app, &palette),
    }
}

/// Centered sub-rectangle, sized as a percentage of the parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    use ratatui::layout::{Constraint, Direction, Layout};

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
