mod api;
mod app;
mod form;
mod models;
mod session;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{ListingSource, PropertyApi};
use app::{ApiEvent, App, Command};
use session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    // The TUI owns the terminal, so logs go to a file
    let file_appender = tracing_appender::rolling::never(".", "listing-scout.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    info!("🏠 Listing Scout - property browser");

    let api = Arc::new(PropertyApi::from_env()?);
    let session = Session::from_env();
    if session.is_none() {
        info!("No session configured; favorites disabled");
    }

    let mut app = App::new(session);
    let (tx, mut rx) = mpsc::unbounded_channel();
    for command in app.startup_commands() {
        execute_command(command, api.clone(), tx.clone());
    }

    run(&mut app, &api, &tx, &mut rx)?;

    info!("👋 Shutting down");
    Ok(())
}

/// Cooperative single-threaded UI loop: draw, drain completed network
/// calls, feed the next input event to the app, run whatever side effect
/// it asked for
fn run(
    app: &mut App,
    api: &Arc<PropertyApi>,
    tx: &mpsc::UnboundedSender<ApiEvent>,
    rx: &mut mpsc::UnboundedReceiver<ApiEvent>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut result = Ok(());
    loop {
        app.tick(Instant::now());

        if let Err(error) = terminal.draw(|frame| app.render(frame)) {
            result = Err(error).context("draw frame");
            break;
        }

        while let Ok(completed) = rx.try_recv() {
            app.apply(completed);
        }

        let has_event = event::poll(Duration::from_millis(50)).context("poll event")?;
        if has_event {
            let now = Instant::now();
            let command = match event::read().context("read event")? {
                Event::Key(key) => app.handle_key(key, now),
                Event::Mouse(mouse) => app.handle_mouse(&mouse, now),
                _ => None,
            };
            if let Some(command) = command {
                execute_command(command, api.clone(), tx.clone());
            }
        }

        if app.should_quit() {
            break;
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)
        .context("leave alternate screen")?;
    result
}

/// Run one side effect on the runtime and post its completion back to
/// the UI loop
fn execute_command(command: Command, api: Arc<PropertyApi>, tx: mpsc::UnboundedSender<ApiEvent>) {
    tokio::spawn(async move {
        match command {
            Command::FetchPage { token, request } => {
                let result = api
                    .fetch_page(&request)
                    .await
                    .map_err(|error| error.to_string());
                let _ = tx.send(ApiEvent::Page { token, result });
            }
            Command::FetchLocations => {
                let result = api.locations().await.map_err(|error| error.to_string());
                let _ = tx.send(ApiEvent::Locations(result));
            }
            Command::FetchFavorites { user_id } => {
                let result = api
                    .favorites(&user_id)
                    .await
                    .map_err(|error| error.to_string());
                let _ = tx.send(ApiEvent::Favorites(result));
            }
            Command::FetchDetail { id } => {
                let result = api
                    .get_listing(&id)
                    .await
                    .map_err(|error| error.to_string());
                let _ = tx.send(ApiEvent::Detail(result));
            }
            Command::AddFavorite {
                user_id,
                property_id,
            } => {
                let result = api
                    .add_favorite(&user_id, &property_id)
                    .await
                    .map_err(|error| error.to_string());
                let _ = tx.send(ApiEvent::FavoriteSaved {
                    property_id,
                    added: true,
                    result,
                });
            }
            Command::RemoveFavorite {
                user_id,
                property_id,
            } => {
                let result = api
                    .remove_favorite(&user_id, &property_id)
                    .await
                    .map_err(|error| error.to_string());
                let _ = tx.send(ApiEvent::FavoriteSaved {
                    property_id,
                    added: false,
                    result,
                });
            }
        }
    });
}
