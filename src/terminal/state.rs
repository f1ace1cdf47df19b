use chrono::Local;
use log::error;
use ratatui::widgets::{ListState, TableState};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::controller::{Notice, NoticeKind, RefreshController};
use crate::domain::email::{EmailId, EmailRecord, HealthStatus, SortField};
use crate::domain::status_log::StatusLog;
use crate::logs;
use crate::pipeline::table::{self, FilterState, SortState};

const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard = 0,
    Emails = 1,
    Logs = 2,
    Settings = 3,
}

impl View {
    pub const ALL: [View; 4] = [View::Dashboard, View::Emails, View::Logs, View::Settings];

    pub fn title(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Emails => "Emails",
            View::Logs => "Logs",
            View::Settings => "Settings",
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self as usize + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

pub struct AppState {
    pub config: Config,
    pub view: View,

    pub controller: RefreshController,
    /// `None` while the first probe is in flight
    pub health: Option<HealthStatus>,

    // Emails view; reset when the view is left
    pub filters: FilterState,
    pub sort: SortState,
    pub show_filters: bool,
    pub table_state: TableState,
    /// Row whose detail pane is expanded
    pub opened_id: Option<EmailId>,

    pub logs: Vec<StatusLog>,
    pub logs_loading: bool,
    pub log_list_state: ListState,

    pub notices: Vec<(Notice, Instant)>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            view: View::Dashboard,
            controller: RefreshController::new(),
            health: None,
            filters: FilterState::default(),
            sort: SortState::default(),
            show_filters: false,
            table_state: TableState::default(),
            opened_id: None,
            logs: vec![],
            logs_loading: false,
            log_list_state: ListState::default(),
            notices: vec![],
        }
    }

    /// The caller drops the old view's tasks, so pending results are lost.
    pub fn set_view(&mut self, view: View) {
        if view != self.view {
            self.controller.abandon();
        }
        if self.view == View::Emails && view != View::Emails {
            self.filters.reset();
            self.sort = SortState::default();
            self.show_filters = false;
            self.opened_id = None;
            self.table_state.select(None);
        }
        self.view = view;
    }

    /// Filtered + sorted rows for the table.
    pub fn visible(&self) -> Vec<&EmailRecord> {
        table::apply(self.controller.emails(), &self.filters, &self.sort)
    }

    pub fn category_options(&self) -> Vec<String> {
        table::distinct_categories(self.controller.emails())
    }

    pub fn department_options(&self) -> Vec<String> {
        table::distinct_departments(self.controller.emails())
    }

    pub fn selected(&self) -> Option<&EmailRecord> {
        let idx = self.table_state.selected()?;
        self.visible().get(idx).copied()
    }

    /// Keep the cursor inside the current view after data or filters change.
    pub fn clamp_selection(&mut self) {
        let len = self.visible().len();
        match self.table_state.selected() {
            _ if len == 0 => self.table_state.select(None),
            None => self.table_state.select(Some(0)),
            Some(i) if i >= len => self.table_state.select(Some(len - 1)),
            Some(_) => {}
        }
    }

    pub fn move_selection(&mut self, delta: i32) {
        let len = self.visible().len();
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let cur = self.table_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len as i32 - 1) as usize;
        self.table_state.select(Some(next));
    }

    pub fn select_first(&mut self) {
        let len = self.visible().len();
        self.table_state.select((len > 0).then_some(0));
    }

    pub fn select_last(&mut self) {
        let len = self.visible().len();
        self.table_state.select(len.checked_sub(1));
    }

    /// Same row again closes the detail pane.
    pub fn toggle_detail(&mut self) {
        let Some(id) = self.selected().map(|e| e.id.clone()) else {
            return;
        };
        if self.opened_id.as_ref() == Some(&id) {
            self.opened_id = None;
        } else {
            self.opened_id = Some(id);
        }
    }

    /// Detail record, if the opened row is still visible.
    pub fn opened(&self) -> Option<&EmailRecord> {
        let id = self.opened_id.as_ref()?;
        self.visible().into_iter().find(|e| &e.id == id)
    }

    pub fn cycle_category(&mut self) {
        let next = cycle(&self.category_options(), &self.filters.category);
        self.filters.category = next;
        self.clamp_selection();
    }

    pub fn cycle_department(&mut self) {
        let next = cycle(&self.department_options(), &self.filters.department);
        self.filters.department = next;
        self.clamp_selection();
    }

    pub fn toggle_spam_only(&mut self) {
        self.filters.spam_only = !self.filters.spam_only;
        self.clamp_selection();
    }

    pub fn toggle_duplicate_only(&mut self) {
        self.filters.duplicate_only = !self.filters.duplicate_only;
        self.clamp_selection();
    }

    pub fn clear_filters(&mut self) {
        self.filters.reset();
        self.clamp_selection();
    }

    pub fn sort_by(&mut self, field: SortField) {
        self.sort.toggle(field);
    }

    pub fn set_logs(&mut self, logs: Vec<StatusLog>) {
        self.logs = logs;
        self.logs_loading = false;
        if !self.logs.is_empty() {
            self.log_list_state.select(Some(self.logs.len() - 1));
        }
    }

    pub fn scroll_logs(&mut self, delta: i32) {
        if self.logs.is_empty() {
            return;
        }
        let cur = self.log_list_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, self.logs.len() as i32 - 1) as usize;
        self.log_list_state.select(Some(next));
    }

    /// Outcome is reported as a notice either way.
    pub fn export_logs(&mut self) {
        let dir = self.config.resolve_log_dir();
        let notice = match logs::export_logs(&self.logs, &dir, Local::now().date_naive()) {
            Ok(path) => Notice {
                kind: NoticeKind::Success,
                title: "Success".into(),
                description: format!("Logs downloaded to {}", path.display()),
            },
            Err(e) => {
                error!("Error downloading logs: {e:#}");
                Notice {
                    kind: NoticeKind::Error,
                    title: "Error".into(),
                    description: "Failed to download logs. Please try again.".into(),
                }
            }
        };
        self.push_notice(notice);
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push((notice, Instant::now()));
    }

    pub fn expire_notices(&mut self, now: Instant) {
        self.notices
            .retain(|(_, shown)| now.duration_since(*shown) < NOTICE_TTL);
    }
}

/// "" -> first -> ... -> last -> "" (empty means "all").
fn cycle(options: &[String], current: &str) -> String {
    if current.is_empty() {
        return options.first().cloned().unwrap_or_default();
    }
    match options.iter().position(|o| o == current) {
        Some(i) => options.get(i + 1).cloned().unwrap_or_default(),
        None => String::new(),
    }
}
