use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::{centered_rect, Palette};
use crate::app::{App, LoginField};

pub fn render(frame: &mut Frame, app: &App, palette: &Palette) {
    let area = centered_rect(50, 60, frame.size());

    let outer = Block::default()
        .title(" reelgrid login ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // spacer
            Constraint::Length(3), // username
            Constraint::Length(3), // password
            Constraint::Length(1), // status
            Constraint::Min(1),    // hint
        ])
        .split(inner);

    let field_style = |focused: bool| {
        if focused {
            Style::default().fg(palette.accent)
        } else {
            Style::default().fg(palette.dim)
        }
    };

    let username_focused = app.login.field == LoginField::Username;
    let username = Paragraph::new(app.login.username.as_str()).block(
        Block::default()
            .title("Username")
            .borders(Borders::ALL)
            .border_style(field_style(username_focused)),
    );
    frame.render_widget(username, chunks[1]);

    let masked = "•".repeat(app.login.password.chars().count());
    let password = Paragraph::new(masked.as_str()).block(
        Block::default()
            .title("Password")
            .borders(Borders::ALL)
            .border_style(field_style(!username_focused)),
    );
    frame.render_widget(password, chunks[2]);

    if username_focused {
        frame.set_cursor(
            chunks[1].x + 1 + app.login.username.chars().count() as u16,
            chunks[1].y + 1,
        );
    } else {
        frame.set_cursor(
            chunks[2].x + 1 + masked.chars().count() as u16,
            chunks[2].y + 1,
        );
    }

    let status = if app.login.submitting {
        Line::from(Span::styled(
            "Signing in...",
            Style::default().fg(palette.dim),
        ))
    } else if let Some(error) = &app.login.error {
        Line::from(Span::styled(
            error.as_str(),
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from("")
    };
    frame.render_widget(
        Paragraph::new(status).alignment(Alignment::Center),
        chunks[3],
    );

    let hint = Paragraph::new(Text::styled(
        "(Tab) switch field, (Enter) sign in, (Esc) quit",
        Style::default().fg(palette.dim),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(hint, chunks[4]);
}
