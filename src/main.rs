use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod detail;
mod error;
mod listing;
mod session;
mod suggest;
mod tmdb;
mod ui;

use crate::app::{App, AppCommand, AppMessage};
use crate::config::Config;
use crate::error::FetchError;
use crate::session::{CredentialVerifier, StaticCredentials, ThemeStore};
use crate::tmdb::TmdbClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The terminal owns stdout, so logs go to a file.
    let log_path = std::env::temp_dir().join("reelgrid.log");
    let log_file = std::fs::File::create(&log_path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();

    info!("Starting reelgrid...");

    let config = Config::new()?;
    info!("Configuration loaded");

    let client = TmdbClient::new(&config.tmdb_api_key)?;
    let verifier: Arc<dyn CredentialVerifier> = Arc::new(StaticCredentials::new(
        config.login_username.clone(),
        config.login_password.clone(),
    ));
    let theme_store = ThemeStore::new(config.theme_path.clone());

    let (mut app, cmd_rx) = App::with_channels(theme_store);
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_worker(cmd_rx, msg_tx, client, verifier));

    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut msg_rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stderr>>,
    app: &mut App,
    msg_rx: &mut mpsc::UnboundedReceiver<AppMessage>,
) -> anyhow::Result<()> {
    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        while let Ok(msg) = msg_rx.try_recv() {
            app.handle_message(msg);
        }

        app.tick(Instant::now());

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                app.handle_key(key, Instant::now());
            }
        }
    }
    Ok(())
}

/// Executes commands off the event loop. Each fetch runs as its own task so
/// a slow page never blocks suggestions or the detail load; responses carry
/// their request tags back for staleness checks.
async fn run_worker(
    mut cmd_rx: mpsc::UnboundedReceiver<AppCommand>,
    msg_tx: mpsc::UnboundedSender<AppMessage>,
    client: TmdbClient,
    verifier: Arc<dyn CredentialVerifier>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        let client = client.clone();
        let verifier = Arc::clone(&verifier);
        let msg_tx = msg_tx.clone();
        tokio::spawn(async move {
            let msg = match cmd {
                AppCommand::Login { username, password } => {
                    let accepted = verifier.verify(&username, &password).await;
                    info!(%username, accepted, "login attempt");
                    AppMessage::LoginResult(accepted)
                }
                AppCommand::FetchPage(req) => {
                    let result = match &req.mode {
                        crate::listing::QueryMode::Trending => client.list_trending(req.page).await,
                        crate::listing::QueryMode::Search(term) => {
                            client.search_movies(term, req.page).await
                        }
                    };
                    note_failure(&result);
                    AppMessage::PageLoaded(req, result)
                }
                AppCommand::FetchSuggestions(req) => {
                    let result = client.suggest_movies(&req.term).await;
                    note_failure(&result);
                    AppMessage::SuggestionsLoaded(req, result)
                }
                AppCommand::FetchDetail(req) => {
                    let result = client.movie_detail(req.id).await;
                    note_failure(&result);
                    AppMessage::DetailLoaded(req, result)
                }
            };
            let _ = msg_tx.send(msg);
        });
    }
}

fn note_failure<T>(result: &Result<T, FetchError>) {
    if let Err(err) = result {
        warn!(op = %err.op(), error = %err, "fetch failed");
    }
}
