pub mod events;
pub mod state;
pub mod ui;

use anyhow::{Result, anyhow};
use chrono::Utc;
use log::debug;
use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{self, Event, KeyEventKind};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use crate::api::ClassifierApi;
use crate::config::Config;
use crate::controller::{FetchKind, FetchOutcome, spawn_email_poller, spawn_health_poller};
use crate::domain::status_log::StatusLog;
use crate::logs::generate_mock_logs;
use crate::poller::Poller;
use crate::terminal::events::{Action, handle_key};
use crate::terminal::state::{AppState, View};

/// Background work owned by the currently shown view. Dropping it cancels the
/// pollers and the receivers, so answers that arrive late are discarded.
enum ViewTasks {
    Idle,
    Emails {
        poller: Poller<FetchKind>,
        results: Receiver<FetchOutcome>,
    },
    Logs {
        poller: Poller<()>,
        results: Receiver<Vec<StatusLog>>,
    },
}

impl ViewTasks {
    fn mount(state: &mut AppState, api: &Arc<dyn ClassifierApi>) -> Result<Self> {
        let cfg = &state.config;
        let tasks = match state.view {
            View::Dashboard | View::Emails => {
                let (tx, results) = mpsc::channel();
                let poller = spawn_email_poller(api.clone(), cfg.refresh_interval(), tx)?;
                state.controller.begin(FetchKind::Refresh);
                ViewTasks::Emails { poller, results }
            }
            View::Logs => {
                let (tx, results) = mpsc::channel();
                let poller = Poller::spawn("logs", cfg.logs_interval(), (), move |_| {
                    let logs = generate_mock_logs(&mut rand::thread_rng(), Utc::now());
                    let _ = tx.send(logs);
                })?;
                state.logs_loading = true;
                ViewTasks::Logs { poller, results }
            }
            View::Settings => ViewTasks::Idle,
        };
        debug!("mounted {:?}", state.view);
        Ok(tasks)
    }

    fn drain(&self, state: &mut AppState) {
        match self {
            ViewTasks::Emails { results, .. } => {
                while let Ok(outcome) = results.try_recv() {
                    if let Some(notice) = state.controller.apply(outcome) {
                        state.push_notice(notice);
                    }
                    state.clamp_selection();
                }
            }
            ViewTasks::Logs { results, .. } => {
                while let Ok(logs) = results.try_recv() {
                    state.set_logs(logs);
                }
            }
            ViewTasks::Idle => {}
        }
    }

    fn fetch(&self, kind: FetchKind, state: &mut AppState) {
        if let ViewTasks::Emails { poller, .. } = self {
            state.controller.begin(kind);
            poller.trigger(kind);
        }
    }

    fn refresh_logs(&self, state: &mut AppState) {
        if let ViewTasks::Logs { poller, .. } = self {
            state.logs_loading = true;
            poller.trigger(());
        }
    }
}

pub fn run_tui(config: Config, api: Arc<dyn ClassifierApi>) -> Result<()> {
    color_eyre::install().map_err(|e| anyhow!("{e}"))?;

    let terminal = ratatui::init();
    let result = run(terminal, config, api);

    ratatui::restore();

    result
}

fn run(mut terminal: DefaultTerminal, config: Config, api: Arc<dyn ClassifierApi>) -> Result<()> {
    let (health_tx, health_rx) = mpsc::channel();
    let _health = spawn_health_poller(api.clone(), config.health_interval(), health_tx)?;

    let mut state = AppState::new(config);
    let mut tasks = ViewTasks::mount(&mut state, &api)?;

    loop {
        while let Ok(h) = health_rx.try_recv() {
            state.health = Some(h);
        }
        tasks.drain(&mut state);
        state.expire_notices(Instant::now());

        terminal.draw(|f| ui::render(f, &state))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match handle_key(key, &mut state) {
            Action::Quit => break,
            Action::SwitchView(v) if v != state.view => {
                // tear down before the next view mounts
                drop(tasks);
                state.set_view(v);
                state.clamp_selection();
                tasks = ViewTasks::mount(&mut state, &api)?;
            }
            Action::Fetch(kind) => tasks.fetch(kind, &mut state),
            Action::RefreshLogs => tasks.refresh_logs(&mut state),
            Action::ExportLogs => state.export_logs(),
            Action::SwitchView(_) | Action::None => {}
        }
    }

    Ok(())
}
