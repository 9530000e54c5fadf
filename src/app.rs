use crate::config::AppConfig;
use crate::domain::{CommandEntry, DirectoryStat, ViewMode};
use crate::filter::{DatePreset, FilterState, apply_filters};
use crate::paths;
use crate::tree::{ExpansionMemory, TreeRow, build_tree};
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

pub const CHROME_ROWS: usize = 5;
pub const FILTER_PANEL_ROWS: usize = 3;

const DEFAULT_VIEWPORT: (u16, u16) = (80, 24);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    History { directory: String },
    Tree,
}

#[derive(Debug, Clone)]
pub enum BackendEvent {
    HistoryLoaded {
        directory: String,
        commands: Vec<CommandEntry>,
    },
    TreeLoaded {
        stats: Vec<DirectoryStat>,
    },
    Error {
        context: String,
        message: String,
    },
}

pub struct App {
    pub view: ViewMode,
    pub current_dir: String,
    pub commands: Vec<CommandEntry>,
    pub filtered: Vec<CommandEntry>,
    pub dir_stats: Vec<DirectoryStat>,
    pub selected_index: usize,
    scroll_offset: usize,
    pub viewport_width: u16,
    pub viewport_height: u16,
    pub breadcrumbs: Vec<String>,
    expansion: ExpansionMemory,
    filter: FilterState,
    tree_rows: Vec<TreeRow>,
    pub search_mode: bool,
    pub show_filters: bool,
    pub show_preview: bool,
    pub busy: bool,
    pub should_quit: bool,
    pub last_error: Option<String>,
    pub selected_command: Option<CommandEntry>,
}

impl App {
    pub fn new(config: &AppConfig, initial_dir: impl Into<String>) -> Self {
        let current_dir = initial_dir.into();
        Self {
            view: config.initial_view(),
            breadcrumbs: paths::breadcrumbs(&current_dir),
            current_dir,
            commands: Vec::new(),
            filtered: Vec::new(),
            dir_stats: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            viewport_width: DEFAULT_VIEWPORT.0,
            viewport_height: DEFAULT_VIEWPORT.1,
            expansion: ExpansionMemory::default(),
            filter: FilterState::default(),
            tree_rows: Vec::new(),
            search_mode: false,
            show_filters: config.show_filters,
            show_preview: config.show_preview,
            busy: false,
            should_quit: false,
            last_error: None,
            selected_command: None,
        }
    }

    pub fn startup_requests(&self) -> Vec<LoadRequest> {
        let mut requests = vec![LoadRequest::History {
            directory: self.current_dir.clone(),
        }];
        if self.view == ViewMode::Tree {
            requests.push(LoadRequest::Tree);
        }
        requests
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn expansion(&self) -> &ExpansionMemory {
        &self.expansion
    }

    pub fn tree_rows(&self) -> &[TreeRow] {
        &self.tree_rows
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn visible_len(&self) -> usize {
        match self.view {
            ViewMode::Tree => self.tree_rows.len(),
            ViewMode::History | ViewMode::Search => self.filtered.len(),
        }
    }

    pub fn visible_lines(&self) -> usize {
        let mut chrome = CHROME_ROWS;
        if self.show_filters {
            chrome += FILTER_PANEL_ROWS;
        }
        usize::from(self.viewport_height)
            .saturating_sub(chrome)
            .max(1)
    }

    pub fn selected_entry(&self) -> Option<&CommandEntry> {
        match self.view {
            ViewMode::Tree => None,
            ViewMode::History | ViewMode::Search => self.filtered.get(self.selected_index),
        }
    }

    pub fn selected_row(&self) -> Option<&TreeRow> {
        match self.view {
            ViewMode::Tree => self.tree_rows.get(self.selected_index),
            ViewMode::History | ViewMode::Search => None,
        }
    }

    pub fn is_blocked_by_error(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn select_next(&mut self) {
        let len = self.visible_len();
        if len == 0 || self.selected_index + 1 >= len {
            return;
        }
        self.selected_index += 1;
        self.follow_selection();
    }

    pub fn select_prev(&mut self) {
        if self.selected_index == 0 {
            return;
        }
        self.selected_index -= 1;
        self.follow_selection();
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.viewport_width = width;
        self.viewport_height = height;
        self.follow_selection();
    }

    fn follow_selection(&mut self) {
        let rows = self.visible_lines();
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + rows {
            self.scroll_offset = self.selected_index + 1 - rows;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            self.selected_index = 0;
            self.scroll_offset = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
        self.follow_selection();
    }

    fn reset_position(&mut self) {
        self.selected_index = 0;
        self.scroll_offset = 0;
    }

    fn refilter(&mut self) {
        self.filtered = apply_filters(&self.commands, &self.filter);
        if self.view != ViewMode::Tree {
            self.reset_position();
        }
    }

    pub fn enter_search(&mut self) {
        self.view = ViewMode::Search;
        self.search_mode = true;
        self.filter.set_query("");
        self.refilter();
    }

    pub fn push_search_char(&mut self, c: char) {
        if !self.search_mode {
            return;
        }
        let mut query = self.filter.query().to_string();
        query.push(c);
        self.filter.set_query(query);
        self.refilter();
    }

    pub fn pop_search_char(&mut self) {
        if !self.search_mode || self.filter.query().is_empty() {
            return;
        }
        let mut query = self.filter.query().to_string();
        query.pop();
        self.filter.set_query(query);
        self.refilter();
    }

    pub fn commit_search(&mut self) {
        self.search_mode = false;
    }

    pub fn cancel_search(&mut self) {
        self.search_mode = false;
        self.view = ViewMode::History;
        self.filter.set_query("");
        self.refilter();
    }

    pub fn toggle_filter_panel(&mut self) {
        self.show_filters = !self.show_filters;
        self.follow_selection();
    }

    pub fn toggle_preview(&mut self) {
        self.show_preview = !self.show_preview;
    }

    pub fn toggle_date_filter(&mut self, now: DateTime<Local>) {
        if self.filter.date().enabled {
            self.filter.disable_date();
        } else {
            self.filter.enable_date(now);
        }
        self.refilter();
    }

    pub fn cycle_date_preset(&mut self, now: DateTime<Local>) {
        if !self.filter.date().enabled {
            return;
        }
        self.filter.cycle_date_preset(now);
        self.refilter();
    }

    pub fn select_date_preset(&mut self, preset: DatePreset, now: DateTime<Local>) {
        if !self.filter.date().enabled {
            return;
        }
        self.filter.select_date_preset(preset, now);
        self.refilter();
    }

    pub fn cycle_shell_filter(&mut self) {
        self.filter.cycle_shell();
        self.refilter();
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.refilter();
    }

    pub fn cycle_view(&mut self) -> Option<LoadRequest> {
        self.switch_view(self.view.next())
    }

    pub fn switch_view(&mut self, view: ViewMode) -> Option<LoadRequest> {
        if self.view == view {
            return None;
        }
        self.view = view;
        self.search_mode = false;
        self.reset_position();

        if view == ViewMode::Tree {
            let current = self.current_dir.clone();
            self.rebuild_tree(Some(current));
            return Some(LoadRequest::Tree);
        }
        None
    }

    pub fn navigate_to(&mut self, directory: impl Into<String>) -> LoadRequest {
        let directory = directory.into();
        info!(from = %self.current_dir, to = %directory, "changing directory");
        self.current_dir = directory.clone();
        self.breadcrumbs = paths::breadcrumbs(&directory);
        self.commands.clear();
        self.filtered.clear();
        self.reset_position();
        LoadRequest::History { directory }
    }

    pub fn go_to_parent(&mut self) -> Option<LoadRequest> {
        let parent = paths::parent(&self.current_dir);
        if parent.is_empty() {
            return None;
        }
        Some(self.navigate_to(parent))
    }

    pub fn activate_selected(&mut self) -> Option<LoadRequest> {
        match self.view {
            ViewMode::Tree => self.enter_selected_node(),
            ViewMode::History | ViewMode::Search => {
                if let Some(entry) = self.filtered.get(self.selected_index).cloned() {
                    info!(id = %entry.id, "command selected");
                    self.selected_command = Some(entry);
                    self.should_quit = true;
                }
                None
            }
        }
    }

    fn enter_selected_node(&mut self) -> Option<LoadRequest> {
        let row = self.tree_rows.get(self.selected_index)?.clone();
        let path = row.stat.path;
        let request = self.navigate_to(path.clone());

        if row.has_children {
            self.expansion.set(&path, true);
            self.rebuild_tree(Some(path));
        } else {
            self.view = ViewMode::History;
        }
        Some(request)
    }

    pub fn expand_selected(&mut self) -> Option<LoadRequest> {
        let row = self.selected_row()?.clone();
        if !row.has_children {
            return self.enter_selected_node();
        }
        if !row.expanded {
            self.expansion.toggle(&row.stat.path);
            self.rebuild_tree(Some(row.stat.path));
        }
        None
    }

    pub fn collapse_selected_or_parent(&mut self) -> bool {
        let Some(row) = self.selected_row().cloned() else {
            return false;
        };

        if row.has_children && row.expanded {
            self.expansion.toggle(&row.stat.path);
            self.rebuild_tree(Some(row.stat.path));
            return true;
        }

        let parent = paths::normalize(&paths::parent(&row.stat.path));
        if let Some(idx) = self
            .tree_rows
            .iter()
            .position(|r| paths::normalize(&r.stat.path) == parent)
        {
            self.selected_index = idx;
            self.follow_selection();
            return true;
        }
        false
    }

    pub fn go_back(&mut self) -> Option<LoadRequest> {
        match self.view {
            ViewMode::Tree => {
                self.collapse_selected_or_parent();
                None
            }
            ViewMode::History | ViewMode::Search => self.go_to_parent(),
        }
    }

    pub fn refresh(&mut self) -> LoadRequest {
        match self.view {
            ViewMode::Tree => LoadRequest::Tree,
            ViewMode::History | ViewMode::Search => LoadRequest::History {
                directory: self.current_dir.clone(),
            },
        }
    }

    /// Applies a history result. Responses are never matched against the
    /// request that produced them: the latest one to arrive wins.
    pub fn apply_history_loaded(&mut self, directory: &str, commands: Vec<CommandEntry>) {
        if directory != self.current_dir {
            debug!(%directory, current = %self.current_dir, "applying history for another directory");
        }
        self.busy = false;
        self.last_error = None;
        self.commands = commands;
        self.refilter();
    }

    pub fn apply_tree_loaded(&mut self, stats: Vec<DirectoryStat>) {
        self.busy = false;
        self.last_error = None;
        self.dir_stats = stats;
        let current = self.current_dir.clone();
        self.rebuild_tree(Some(current));
    }

    pub fn apply_load_error(&mut self, context: &str, message: String) {
        warn!(%context, %message, "load failed");
        self.busy = false;
        self.last_error = Some(format!("{context}: {message}"));
    }

    fn rebuild_tree(&mut self, preferred: Option<String>) {
        self.tree_rows = build_tree(&self.dir_stats, &mut self.expansion, &self.current_dir);
        if self.view != ViewMode::Tree {
            return;
        }

        if let Some(target) = preferred
            && let Some(idx) = self.tree_rows.iter().position(|r| r.stat.path == target)
        {
            self.selected_index = idx;
        }
        self.clamp_selection();
    }
}
