mod app;
mod backend;
mod cli;
mod config;
mod domain;
mod filter;
mod handlers;
mod infra;
mod logging;
mod paths;
mod terminal;
mod tree;
mod ui;

use crate::app::{App, BackendEvent, LoadRequest};
use crate::backend::{send_task, worker_loop};
use crate::cli::{Cli, CliCommand};
use crate::config::AppConfig;
use crate::handlers::{handle_backend_event, handle_key_event};
use crate::infra::{HistoryStore, JsonlHistoryStore};
use crate::terminal::Tui;
use crate::ui::Theme;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match AppConfig::load_or_default() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load config, using defaults: {err:#}");
            AppConfig::default()
        }
    };
    if cli.history_file.is_some() {
        config.history_file = cli.history_file.clone();
    }
    if cli.tree {
        config.default_view = "tree".to_string();
    }

    let _log_guard = match logging::init(&config) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("logging disabled: {err:#}");
            None
        }
    };

    let history_path = config.history_path()?;
    let store = Arc::new(
        JsonlHistoryStore::open(&history_path)
            .with_context(|| format!("failed to open history: {}", history_path.display()))?,
    );
    info!(path = %store.path().display(), "history store opened");

    let result = match &cli.command {
        Some(CliCommand::Record(args)) => cli::run_record(store.as_ref(), args),
        Some(CliCommand::Search(args)) => cli::run_search(store.as_ref(), args, &mut io::stdout()),
        None => browse(&cli, &config, store.clone()).await,
    };

    if let Err(err) = store.close() {
        error!("failed to close history store: {err:#}");
    }
    if let Err(err) = result {
        error!("{err:#}");
        eprintln!("{err:#}");
        std::process::exit(1);
    }

    Ok(())
}

async fn browse(cli: &Cli, config: &AppConfig, store: Arc<JsonlHistoryStore>) -> Result<()> {
    let initial_dir = cli::resolve_dir(cli.dir.as_ref())?;
    let mut app = App::new(config, initial_dir);
    let theme = Theme::from_config(&config.theme);

    let mut terminal = terminal::init()?;
    let run_result = run_app(&mut terminal, &mut app, &theme, store).await;
    terminal::restore(&mut terminal)?;
    run_result?;

    if let Some(entry) = app.selected_command {
        println!("{}", entry.command);
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    theme: &Theme,
    store: Arc<JsonlHistoryStore>,
) -> Result<()> {
    let size = terminal.size().context("failed to read terminal size")?;
    app.resize(size.width, size.height);

    let store: Arc<dyn HistoryStore> = store;
    let (task_tx, task_rx) = mpsc::unbounded_channel::<LoadRequest>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<BackendEvent>();

    tokio::spawn(worker_loop(store, task_rx, event_tx));

    for request in app.startup_requests() {
        send_task(app, &task_tx, request)?;
    }

    while !app.should_quit {
        while let Ok(event) = event_rx.try_recv() {
            handle_backend_event(app, event);
        }

        terminal.draw(|frame| ui::draw(frame, app, theme))?;

        if event::poll(Duration::from_millis(100)).context("event poll failed")? {
            match event::read().context("event read failed")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key_event(app, key, &task_tx)?;
                }
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }
    }

    Ok(())
}
