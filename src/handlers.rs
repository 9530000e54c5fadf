use crate::app::{App, BackendEvent, LoadRequest};
use crate::backend::send_task;
use crate::domain::ViewMode;
use crate::filter::DatePreset;
use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

pub(crate) fn handle_backend_event(app: &mut App, event: BackendEvent) {
    if app.should_quit {
        return;
    }

    match event {
        BackendEvent::HistoryLoaded {
            directory,
            commands,
        } => {
            debug!(%directory, count = commands.len(), "history loaded");
            app.apply_history_loaded(&directory, commands);
        }
        BackendEvent::TreeLoaded { stats } => {
            debug!(count = stats.len(), "directory stats loaded");
            app.apply_tree_loaded(stats);
        }
        BackendEvent::Error { context, message } => app.apply_load_error(&context, message),
    }
}

pub(crate) fn handle_key_event(
    app: &mut App,
    key: KeyEvent,
    task_tx: &UnboundedSender<LoadRequest>,
) -> Result<()> {
    if let Some(request) = apply_key(app, key, Local::now()) {
        send_task(app, task_tx, request)?;
    }
    Ok(())
}

pub(crate) fn apply_key(
    app: &mut App,
    key: KeyEvent,
    now: DateTime<Local>,
) -> Option<LoadRequest> {
    if app.should_quit {
        return None;
    }
    if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
        app.quit();
        return None;
    }

    if app.is_blocked_by_error() {
        return handle_error_key(app, key);
    }
    if app.search_mode {
        handle_search_key(app, key);
        return None;
    }
    handle_browse_key(app, key, now)
}

fn handle_error_key(app: &mut App, key: KeyEvent) -> Option<LoadRequest> {
    match key.code {
        KeyCode::Char('q') => {
            app.quit();
            None
        }
        KeyCode::Char('r') => Some(app.refresh()),
        _ => None,
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.commit_search(),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Down => app.select_next(),
        KeyCode::Up => app.select_prev(),
        KeyCode::Char(c)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT)
                && !key.modifiers.contains(KeyModifiers::SUPER) =>
        {
            app.push_search_char(c);
        }
        _ => {}
    }
}

fn handle_browse_key(app: &mut App, key: KeyEvent, now: DateTime<Local>) -> Option<LoadRequest> {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::PageDown => {
            for _ in 0..app.visible_lines() {
                app.select_next();
            }
        }
        KeyCode::PageUp => {
            for _ in 0..app.visible_lines() {
                app.select_prev();
            }
        }
        KeyCode::Enter => return app.activate_selected(),
        KeyCode::Char(' ') => app.toggle_preview(),
        KeyCode::Tab => return app.cycle_view(),
        KeyCode::Char('t') => return app.switch_view(ViewMode::Tree),
        KeyCode::Char('h') => return app.switch_view(ViewMode::History),
        KeyCode::Char('/') => app.enter_search(),
        KeyCode::Esc if app.view == ViewMode::Search => app.cancel_search(),
        KeyCode::Char('f') => app.toggle_filter_panel(),
        KeyCode::Char('d') if app.show_filters => app.toggle_date_filter(now),
        KeyCode::Char('D') if app.show_filters => app.cycle_date_preset(now),
        KeyCode::Char('s') if app.show_filters => app.cycle_shell_filter(),
        KeyCode::Char(digit @ '1'..='6') => {
            if let Some(preset) = DatePreset::from_digit(digit) {
                app.select_date_preset(preset, now);
            }
        }
        KeyCode::Char('c') if key.modifiers.is_empty() => app.clear_filters(),
        KeyCode::Backspace | KeyCode::Left => return app.go_back(),
        KeyCode::Right | KeyCode::Char('l') => return app.expand_selected(),
        KeyCode::Char('r') => return Some(app.refresh()),
        _ => {}
    }
    None
}
