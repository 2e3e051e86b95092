use chrono::Datelike;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::Palette;
use crate::app::{App, InputMode};
use crate::listing::{ListingPhase, QueryMode};
use crate::tmdb::MovieSummary;

pub fn render(frame: &mut Frame, app: &App, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // search bar
            Constraint::Min(1),    // movie list
            Constraint::Length(3), // footer
        ])
        .split(frame.size());

    render_search_bar(frame, app, palette, chunks[0]);
    render_movie_list(frame, app, palette, chunks[1]);
    render_footer(frame, app, palette, chunks[2]);

    if app.input_mode == InputMode::Editing
        && app.show_suggestions
        && !app.suggest.suggestions().is_empty()
    {
        render_suggestions(frame, app, palette, chunks[0]);
    }
}

fn render_search_bar(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border = if editing {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.dim)
    };

    let search = Paragraph::new(app.search_input.as_str()).block(
        Block::default()
            .title("Search")
            .borders(Borders::ALL)
            .border_style(border),
    );
    frame.render_widget(search, area);

    if editing {
        frame.set_cursor(
            area.x + 1 + app.search_input.chars().count() as u16,
            area.y + 1,
        );
    }
}

/// Dropdown anchored below the search bar, drawn over the list.
fn render_suggestions(frame: &mut Frame, app: &App, palette: &Palette, search_area: Rect) {
    let suggestions = app.suggest.suggestions();
    let height = suggestions.len() as u16 + 2;
    let area = Rect {
        x: search_area.x + 2,
        y: search_area.y + search_area.height,
        width: search_area.width.saturating_sub(4),
        height: height.min(frame.size().height.saturating_sub(search_area.bottom())),
    };

    let items: Vec<ListItem> = suggestions
        .iter()
        .map(|movie| ListItem::new(Line::from(movie.title.as_str())))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .style(Style::default().bg(palette.bg).fg(palette.fg)),
        )
        .highlight_style(
            Style::default()
                .bg(palette.highlight_bg)
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("› ");

    let mut state = ListState::default();
    state.select(app.suggestion_cursor);

    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut state);
}

fn movie_item<'a>(movie: &'a MovieSummary, palette: &Palette) -> ListItem<'a> {
    let rating = movie
        .vote_average
        .map(|v| format!("★ {v:.1}"))
        .unwrap_or_else(|| "★ –".to_string());
    let year = movie
        .release_date
        .as_deref()
        .and_then(|date| chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .map(|date| date.year().to_string())
        .unwrap_or_default();

    ListItem::new(vec![
        Line::from(Span::styled(
            movie.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("  {rating}  {year}"),
            Style::default().fg(palette.dim),
        )),
    ])
}

fn render_movie_list(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let title = match app.listing.mode() {
        QueryMode::Trending => format!("Trending ({})", app.listing.movies().len()),
        QueryMode::Search(term) => {
            format!("Results for \"{}\" ({})", term, app.listing.movies().len())
        }
    };

    if app.listing.movies().is_empty() {
        let text = match app.listing.phase() {
            ListingPhase::Loading(_) => "Loading movies...",
            ListingPhase::Error(_) => "Could not load movies",
            _ => "No movies found",
        };
        let empty = Paragraph::new(Text::styled(text, Style::default().fg(palette.dim)))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .listing
        .movies()
        .iter()
        .map(|movie| movie_item(movie, palette))
        .collect();

    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(palette.highlight_bg)
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(Some(app.list_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_footer(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let line = if let Some(error) = app.listing.error_message() {
        Line::from(Span::styled(
            format!("{error} - scroll to retry"),
            Style::default().fg(palette.error),
        ))
    } else if let ListingPhase::Loading(page) = app.listing.phase() {
        Line::from(Span::styled(
            format!("Loading page {page}..."),
            Style::default().fg(palette.dim),
        ))
    } else if app.input_mode == InputMode::Editing {
        Line::from(Span::styled(
            "(Enter) search, (↑↓) pick suggestion, (Esc) close",
            Style::default().fg(palette.dim),
        ))
    } else {
        let clear_hint = if app.listing.is_searching() {
            ", (c) clear search"
        } else {
            ""
        };
        Line::from(Span::styled(
            format!("(↑↓/jk) scroll, (Enter) details, (/) search{clear_hint}, (t) theme, (q) quit"),
            Style::default().fg(palette.dim),
        ))
    };

    let footer = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
