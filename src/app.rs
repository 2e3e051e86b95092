use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::warn;

use crate::detail::{DetailController, DetailRequest};
use crate::error::FetchError;
use crate::listing::{ListingController, PageRequest};
use crate::session::{Theme, ThemeStore};
use crate::suggest::{SuggestionEngine, SuggestionRequest};
use crate::tmdb::{MovieDetail, MoviePage};

/// How close to the bottom of the list the selection must be before the next
/// page is requested.
const SCROLL_FETCH_MARGIN: usize = 5;

/// Commands sent from the event loop to the async worker.
#[derive(Debug)]
pub enum AppCommand {
    Login { username: String, password: String },
    FetchPage(PageRequest),
    FetchSuggestions(SuggestionRequest),
    FetchDetail(DetailRequest),
}

/// Results sent from the async worker back to the event loop, each carrying
/// the tag its request was issued with.
#[derive(Debug)]
pub enum AppMessage {
    LoginResult(bool),
    PageLoaded(PageRequest, Result<MoviePage, FetchError>),
    SuggestionsLoaded(SuggestionRequest, Result<MoviePage, FetchError>),
    DetailLoaded(DetailRequest, Result<MovieDetail, FetchError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Home,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub field: LoginField,
    pub error: Option<String>,
    pub submitting: bool,
}

/// Shell state: screen stack, input routing, and the three core
/// controllers. All mutation happens on the event loop; network work is
/// delegated to the worker through `AppCommand`s.
pub struct App {
    pub screen: Screen,
    pub nav_stack: Vec<Screen>,
    pub running: bool,
    pub input_mode: InputMode,
    pub authenticated: bool,
    pub login: LoginForm,
    pub theme: Theme,
    pub search_input: String,
    pub show_suggestions: bool,
    pub suggestion_cursor: Option<usize>,
    pub list_cursor: usize,
    pub listing: ListingController,
    pub suggest: SuggestionEngine,
    pub detail: DetailController,
    theme_store: ThemeStore,
    cmd_tx: mpsc::UnboundedSender<AppCommand>,
}

impl App {
    /// Construct with a live command channel; the caller drives the worker
    /// from the receiving end.
    pub fn with_channels(theme_store: ThemeStore) -> (Self, mpsc::UnboundedReceiver<AppCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let theme = theme_store.load();
        let app = Self {
            screen: Screen::Login,
            nav_stack: Vec::new(),
            running: true,
            input_mode: InputMode::Editing,
            authenticated: false,
            login: LoginForm::default(),
            theme,
            search_input: String::new(),
            show_suggestions: false,
            suggestion_cursor: None,
            list_cursor: 0,
            listing: ListingController::new(),
            suggest: SuggestionEngine::new(),
            detail: DetailController::new(),
            theme_store,
            cmd_tx,
        };
        (app, cmd_rx)
    }

    fn send(&self, cmd: AppCommand) {
        let _ = self.cmd_tx.send(cmd);
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    fn navigate(&mut self, screen: Screen) {
        if self.screen != screen {
            self.nav_stack.push(self.screen);
            self.screen = screen;
        }
        self.input_mode = InputMode::Normal;
    }

    fn back(&mut self) {
        if let Some(previous) = self.nav_stack.pop() {
            self.screen = previous;
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        if let Err(err) = self.theme_store.save(self.theme) {
            warn!(%err, "failed to persist theme preference");
        }
    }

    fn open_detail(&mut self, id: u64) {
        if let Some(req) = self.detail.load(id) {
            self.send(AppCommand::FetchDetail(req));
        }
        self.navigate(Screen::Detail);
    }

    /// Request the next page when the selection has scrolled within the
    /// fetch margin of the bottom. The listing controller enforces the
    /// single-in-flight and `has_more` guards.
    fn maybe_fetch_next_page(&mut self) {
        let len = self.listing.movies().len();
        if len == 0 {
            return;
        }
        let remaining = len.saturating_sub(self.list_cursor + 1);
        if remaining <= SCROLL_FETCH_MARGIN {
            if let Some(req) = self.listing.request_next_page() {
                self.send(AppCommand::FetchPage(req));
            }
        }
    }

    fn commit_search(&mut self) {
        let req = self.listing.submit_search(&self.search_input.clone());
        self.send(AppCommand::FetchPage(req));
        self.suggest.dismiss();
        self.show_suggestions = false;
        self.suggestion_cursor = None;
        self.list_cursor = 0;
        self.input_mode = InputMode::Normal;
    }

    fn clear_search(&mut self) {
        self.search_input.clear();
        self.suggest.dismiss();
        self.show_suggestions = false;
        self.suggestion_cursor = None;
        self.list_cursor = 0;
        let req = self.listing.clear_search();
        self.send(AppCommand::FetchPage(req));
    }

    /// Drive the suggestion debounce from the event-loop tick.
    pub fn tick(&mut self, now: Instant) {
        if let Some(req) = self.suggest.poll(now) {
            self.send(AppCommand::FetchSuggestions(req));
        }
    }

    pub fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::LoginResult(accepted) => {
                self.login.submitting = false;
                if accepted {
                    self.authenticated = true;
                    self.login.error = None;
                    self.screen = Screen::Home;
                    self.input_mode = InputMode::Normal;
                    let req = self.listing.start();
                    self.send(AppCommand::FetchPage(req));
                } else {
                    self.login.error = Some("Invalid credentials".to_string());
                    self.login.password.clear();
                }
            }
            AppMessage::PageLoaded(req, result) => {
                self.listing.apply(&req, result);
                let len = self.listing.movies().len();
                if len == 0 {
                    self.list_cursor = 0;
                } else if self.list_cursor >= len {
                    self.list_cursor = len - 1;
                }
            }
            AppMessage::SuggestionsLoaded(req, result) => {
                self.suggest.apply(&req, result);
                let len = self.suggest.suggestions().len();
                match self.suggestion_cursor {
                    Some(i) if len == 0 || i >= len => self.suggestion_cursor = None,
                    _ => {}
                }
            }
            AppMessage::DetailLoaded(req, result) => {
                self.detail.apply(&req, result);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }
        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Home => match self.input_mode {
                InputMode::Editing => self.handle_search_editing_key(key, now),
                InputMode::Normal => self.handle_home_key(key),
            },
            Screen::Detail => self.handle_detail_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.quit(),
            KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
                self.login.field = match self.login.field {
                    LoginField::Username => LoginField::Password,
                    LoginField::Password => LoginField::Username,
                };
            }
            KeyCode::Enter => {
                if !self.login.submitting {
                    self.login.submitting = true;
                    self.login.error = None;
                    self.send(AppCommand::Login {
                        username: self.login.username.clone(),
                        password: self.login.password.clone(),
                    });
                }
            }
            KeyCode::Char(c) => match self.login.field {
                LoginField::Username => self.login.username.push(c),
                LoginField::Password => self.login.password.push(c),
            },
            KeyCode::Backspace => {
                match self.login.field {
                    LoginField::Username => self.login.username.pop(),
                    LoginField::Password => self.login.password.pop(),
                };
            }
            _ => {}
        }
    }

    fn handle_search_editing_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Esc => {
                self.suggest.dismiss();
                self.show_suggestions = false;
                self.suggestion_cursor = None;
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                let selected = self
                    .suggestion_cursor
                    .and_then(|i| self.suggest.suggestions().get(i))
                    .map(|movie| movie.id);
                if let Some(id) = selected {
                    self.suggest.dismiss();
                    self.show_suggestions = false;
                    self.suggestion_cursor = None;
                    self.open_detail(id);
                } else {
                    self.commit_search();
                }
            }
            KeyCode::Down => {
                let len = self.suggest.suggestions().len();
                if self.show_suggestions && len > 0 {
                    self.suggestion_cursor = Some(match self.suggestion_cursor {
                        Some(i) if i + 1 < len => i + 1,
                        Some(i) => i,
                        None => 0,
                    });
                }
            }
            KeyCode::Up => {
                if let Some(i) = self.suggestion_cursor {
                    self.suggestion_cursor = if i == 0 { None } else { Some(i - 1) };
                }
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
                self.show_suggestions = true;
                self.suggestion_cursor = None;
                self.suggest.on_input(&self.search_input.clone(), now);
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                self.suggestion_cursor = None;
                self.suggest.on_input(&self.search_input.clone(), now);
            }
            _ => {}
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('/') | KeyCode::Char('s') => {
                self.input_mode = InputMode::Editing;
                self.show_suggestions = true;
            }
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Char('c') => {
                if self.listing.is_searching() {
                    self.clear_search();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.listing.movies().len();
                if len > 0 && self.list_cursor + 1 < len {
                    self.list_cursor += 1;
                }
                self.maybe_fetch_next_page();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.list_cursor = self.list_cursor.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(movie) = self.listing.movies().get(self.list_cursor) {
                    let id = movie.id;
                    self.open_detail(id);
                }
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => {
                self.detail.reset();
                self.back();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::QueryMode;
    use crate::tmdb::MovieSummary;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppCommand>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = ThemeStore::new(dir.path().join("theme.json"));
        let (app, cmd_rx) = App::with_channels(store);
        (app, cmd_rx, dir)
    }

    fn logged_in_app() -> (App, mpsc::UnboundedReceiver<AppCommand>, tempfile::TempDir) {
        let (mut app, mut cmd_rx, dir) = test_app();
        app.handle_message(AppMessage::LoginResult(true));
        // Drain the initial page-1 fetch.
        let cmd = cmd_rx.try_recv().unwrap();
        let AppCommand::FetchPage(req) = cmd else {
            panic!("expected initial page fetch");
        };
        let movies = (1..=20)
            .map(|i| MovieSummary {
                id: i,
                title: format!("m{i}"),
                poster_path: None,
                release_date: None,
                vote_average: Some(7.0),
            })
            .collect();
        app.handle_message(AppMessage::PageLoaded(
            req,
            Ok(MoviePage {
                results: movies,
                total_pages: 3,
            }),
        ));
        (app, cmd_rx, dir)
    }

    #[test]
    fn successful_login_lands_on_home_and_fetches_page_one() {
        let (mut app, mut cmd_rx, _dir) = test_app();
        assert_eq!(app.screen, Screen::Login);

        app.login.username = "admin".into();
        app.login.password = "1234".into();
        app.handle_key(key(KeyCode::Enter), Instant::now());
        assert!(matches!(cmd_rx.try_recv().unwrap(), AppCommand::Login { .. }));

        app.handle_message(AppMessage::LoginResult(true));
        assert_eq!(app.screen, Screen::Home);
        assert!(app.authenticated);

        match cmd_rx.try_recv().unwrap() {
            AppCommand::FetchPage(req) => {
                assert_eq!(req.page, 1);
                assert_eq!(req.mode, QueryMode::Trending);
            }
            other => panic!("expected page fetch, got {other:?}"),
        }
    }

    #[test]
    fn failed_login_stays_on_login_with_error() {
        let (mut app, _cmd_rx, _dir) = test_app();
        app.handle_message(AppMessage::LoginResult(false));

        assert_eq!(app.screen, Screen::Login);
        assert!(!app.authenticated);
        assert_eq!(app.login.error.as_deref(), Some("Invalid credentials"));
        assert!(app.login.password.is_empty());
    }

    #[test]
    fn typing_and_enter_commits_search() {
        let (mut app, mut cmd_rx, _dir) = logged_in_app();
        let t0 = Instant::now();

        app.handle_key(key(KeyCode::Char('/')), t0);
        assert_eq!(app.input_mode, InputMode::Editing);

        for c in "batman".chars() {
            app.handle_key(key(KeyCode::Char(c)), t0);
        }
        app.handle_key(key(KeyCode::Enter), t0);

        match cmd_rx.try_recv().unwrap() {
            AppCommand::FetchPage(req) => {
                assert_eq!(req.page, 1);
                assert_eq!(req.mode, QueryMode::Search("batman".to_string()));
            }
            other => panic!("expected search fetch, got {other:?}"),
        }
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn debounced_suggestions_fire_once_via_tick() {
        let (mut app, mut cmd_rx, _dir) = logged_in_app();
        let t0 = Instant::now();

        app.handle_key(key(KeyCode::Char('/')), t0);
        app.handle_key(key(KeyCode::Char('b')), t0);
        app.handle_key(key(KeyCode::Char('a')), t0 + Duration::from_millis(50));
        app.handle_key(key(KeyCode::Char('t')), t0 + Duration::from_millis(100));

        // Inside the debounce window: nothing fires.
        app.tick(t0 + Duration::from_millis(200));
        assert!(cmd_rx.try_recv().is_err());

        app.tick(t0 + Duration::from_millis(450));
        match cmd_rx.try_recv().unwrap() {
            AppCommand::FetchSuggestions(req) => assert_eq!(req.term, "bat"),
            other => panic!("expected suggestion fetch, got {other:?}"),
        }

        // Only one request per quiescent interval.
        app.tick(t0 + Duration::from_secs(5));
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn scroll_near_bottom_fetches_next_page_at_most_once() {
        let (mut app, mut cmd_rx, _dir) = logged_in_app();

        // Walk the cursor toward the bottom of the 20-item list.
        for _ in 0..16 {
            app.handle_key(key(KeyCode::Down), Instant::now());
        }
        match cmd_rx.try_recv().unwrap() {
            AppCommand::FetchPage(req) => assert_eq!(req.page, 2),
            other => panic!("expected page-2 fetch, got {other:?}"),
        }

        // Further scrolling while the fetch is in flight issues nothing.
        for _ in 0..3 {
            app.handle_key(key(KeyCode::Down), Instant::now());
        }
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn selecting_movie_opens_detail_and_back_returns_home() {
        let (mut app, mut cmd_rx, _dir) = logged_in_app();

        app.handle_key(key(KeyCode::Enter), Instant::now());
        assert_eq!(app.screen, Screen::Detail);
        match cmd_rx.try_recv().unwrap() {
            AppCommand::FetchDetail(req) => assert_eq!(req.id, 1),
            other => panic!("expected detail fetch, got {other:?}"),
        }

        app.handle_key(key(KeyCode::Esc), Instant::now());
        assert_eq!(app.screen, Screen::Home);
    }

    #[test]
    fn selecting_suggestion_opens_its_detail() {
        let (mut app, mut cmd_rx, _dir) = logged_in_app();
        let t0 = Instant::now();

        app.handle_key(key(KeyCode::Char('/')), t0);
        app.handle_key(key(KeyCode::Char('b')), t0);
        app.tick(t0 + Duration::from_millis(350));
        let AppCommand::FetchSuggestions(req) = cmd_rx.try_recv().unwrap() else {
            panic!("expected suggestion fetch");
        };
        app.handle_message(AppMessage::SuggestionsLoaded(
            req,
            Ok(MoviePage {
                results: vec![MovieSummary {
                    id: 414906,
                    title: "The Batman".into(),
                    poster_path: None,
                    release_date: None,
                    vote_average: Some(7.7),
                }],
                total_pages: 1,
            }),
        ));

        app.handle_key(key(KeyCode::Down), t0);
        app.handle_key(key(KeyCode::Enter), t0);

        assert_eq!(app.screen, Screen::Detail);
        match cmd_rx.try_recv().unwrap() {
            AppCommand::FetchDetail(req) => assert_eq!(req.id, 414906),
            other => panic!("expected detail fetch, got {other:?}"),
        }
        assert!(app.suggest.suggestions().is_empty());
    }

    #[test]
    fn clear_key_reverts_committed_search_to_trending() {
        let (mut app, mut cmd_rx, _dir) = logged_in_app();
        let t0 = Instant::now();

        app.handle_key(key(KeyCode::Char('/')), t0);
        app.handle_key(key(KeyCode::Char('x')), t0);
        app.handle_key(key(KeyCode::Enter), t0);
        let _search = cmd_rx.try_recv().unwrap();
        assert!(app.listing.is_searching());

        app.handle_key(key(KeyCode::Char('c')), t0);
        match cmd_rx.try_recv().unwrap() {
            AppCommand::FetchPage(req) => {
                assert_eq!(req.mode, QueryMode::Trending);
                assert_eq!(req.page, 1);
            }
            other => panic!("expected trending fetch, got {other:?}"),
        }
        assert!(app.search_input.is_empty());
    }

    #[test]
    fn theme_toggle_persists_across_app_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThemeStore::new(dir.path().join("theme.json"));
        let (mut app, _cmd_rx) = App::with_channels(store.clone());
        app.handle_message(AppMessage::LoginResult(true));
        assert_eq!(app.theme, Theme::Light);

        app.handle_key(key(KeyCode::Char('t')), Instant::now());
        assert_eq!(app.theme, Theme::Dark);

        let (reloaded, _rx) = App::with_channels(store);
        assert_eq!(reloaded.theme, Theme::Dark);
    }

    #[test]
    fn ctrl_c_quits_from_any_screen() {
        let (mut app, _cmd_rx, _dir) = test_app();
        assert!(app.running);
        app.handle_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Instant::now(),
        );
        assert!(!app.running);
    }
}
