use chrono::Utc;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use super::Palette;
use crate::app::App;
use crate::detail::{DetailPhase, MovieView};

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn render(frame: &mut Frame, app: &App, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(frame.size());

    match app.detail.phase() {
        DetailPhase::Loading => render_loading(frame, palette, chunks[0]),
        DetailPhase::Error(message) => render_error(frame, palette, chunks[0], message),
        DetailPhase::Loaded(view) => render_view(frame, palette, chunks[0], view),
        DetailPhase::Idle => {}
    }

    let footer = Paragraph::new(Span::styled(
        "(Esc) back, (t) theme, (q) quit",
        Style::default().fg(palette.dim),
    ))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[1]);
}

fn render_loading(frame: &mut Frame, palette: &Palette, area: Rect) {
    let idx = (Utc::now().timestamp_millis() / 100) as usize % SPINNER.len();
    let text = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} Fetching movie details...", SPINNER[idx]),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    let paragraph = Paragraph::new(text)
        .block(Block::default().title("Movie Details").borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_error(frame: &mut Frame, palette: &Palette, area: Rect, message: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(palette.error),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "(Esc) to go back",
            Style::default().fg(palette.dim),
        )),
    ];
    let paragraph = Paragraph::new(text)
        .block(Block::default().title("Movie Details").borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_view(frame: &mut Frame, palette: &Palette, area: Rect, view: &MovieView) {
    let outer = Block::default()
        .title(format!(" {} ", view.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // facts
            Constraint::Min(3),    // overview
            Constraint::Length(4), // cast
            Constraint::Length(2), // links
        ])
        .split(inner);

    render_facts(frame, palette, chunks[0], view);
    render_overview(frame, palette, chunks[1], view);
    render_cast(frame, palette, chunks[2], view);
    render_links(frame, palette, chunks[3], view);
}

fn fact_line<'a>(label: &'a str, value: String, palette: &Palette) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("{label:<10}"),
            Style::default()
                .fg(palette.dim)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn render_facts(frame: &mut Frame, palette: &Palette, area: Rect, view: &MovieView) {
    let runtime = view
        .runtime
        .map(|minutes| format!("{minutes} min"))
        .unwrap_or_else(|| "unknown".to_string());

    let lines = vec![
        fact_line("Released", view.release_date.clone(), palette),
        fact_line("Runtime", runtime, palette),
        fact_line("Genres", view.genres.clone(), palette),
        fact_line("Rating", format!("★ {}", view.rating), palette),
        fact_line("Director", view.director.clone(), palette),
        fact_line("Writers", view.writers.clone(), palette),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_overview(frame: &mut Frame, palette: &Palette, area: Rect, view: &MovieView) {
    let overview = if view.overview.is_empty() {
        Span::styled("No overview available.", Style::default().fg(palette.dim))
    } else {
        Span::raw(view.overview.as_str())
    };
    let paragraph = Paragraph::new(Line::from(overview))
        .block(Block::default().title("Overview").borders(Borders::TOP))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_cast(frame: &mut Frame, palette: &Palette, area: Rect, view: &MovieView) {
    let names = if view.cast.is_empty() {
        Span::styled("No cast information.", Style::default().fg(palette.dim))
    } else {
        Span::raw(
            view.cast
                .iter()
                .map(|member| member.name.as_str())
                .collect::<Vec<_>>()
                .join(" · "),
        )
    };
    let paragraph = Paragraph::new(Line::from(names))
        .block(Block::default().title("Cast").borders(Borders::TOP))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_links(frame: &mut Frame, palette: &Palette, area: Rect, view: &MovieView) {
    let trailer = match &view.trailer_url {
        Some(url) => Line::from(vec![
            Span::styled("Trailer   ", Style::default().fg(palette.dim)),
            Span::styled(url.as_str(), Style::default().fg(palette.accent)),
        ]),
        None => Line::from(Span::styled(
            "No trailer available",
            Style::default().fg(palette.dim),
        )),
    };
    let poster = Line::from(vec![
        Span::styled("Poster    ", Style::default().fg(palette.dim)),
        Span::styled(view.poster.as_str(), Style::default().fg(palette.dim)),
    ]);
    frame.render_widget(Paragraph::new(vec![trailer, poster]), area);
}
