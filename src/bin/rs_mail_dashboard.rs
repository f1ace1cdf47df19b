use anyhow::{Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use rs_mail_dashboard::api::ClassifierApi;
use rs_mail_dashboard::api::http::HttpApi;
use rs_mail_dashboard::api::mock::MockApi;
use rs_mail_dashboard::config::{Config, load_config};
use rs_mail_dashboard::controller::{
    RefreshController, run_fetch, run_recheck, spawn_email_poller,
};
use rs_mail_dashboard::domain::email::SortField;
use rs_mail_dashboard::pipeline::aggregate::{AggregateStats, aggregate};
use rs_mail_dashboard::pipeline::table::{FilterState, SortDirection, SortState, apply};
use rs_mail_dashboard::terminal::run_tui;

#[derive(Parser)]
#[command(name = "rs_mail_dashboard")]
#[command(about = "Dashboard for the email classification service", long_about = None)]
struct Cli {
    /// Override the backend base URL from config
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Use built-in demo data instead of the backend
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the interactive dashboard (default)
    Tui,

    /// Probe the backend health endpoint
    Health,

    /// Fetch, filter and sort the classified emails
    Emails {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        department: Option<String>,

        /// Only spam
        #[arg(long)]
        spam: bool,

        /// Only duplicates
        #[arg(long)]
        duplicates: bool,

        /// from, subject, routed_to, date, category, ...
        #[arg(long, default_value = "date")]
        sort: SortField,

        #[arg(long, conflicts_with = "desc")]
        asc: bool,

        #[arg(long)]
        desc: bool,
    },

    /// Fetch once and print the dashboard numbers
    Stats,

    /// Ask the backend to re-scan, then fetch
    Recheck,

    /// Poll the backend and log the numbers until Ctrl-C
    Watch {
        /// Seconds between polls (defaults to refresh_interval_secs)
        #[arg(long)]
        interval: Option<u64>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let cfg = load_config()
        .and_then(|c| c.with_overrides(cli.api_url, cli.mock))
        .map_err(|e| anyhow!("Configuration error: {e}"))?;

    let api = build_api(&cfg)?;

    match cli.cmd.unwrap_or(Command::Tui) {
        Command::Tui => run_tui(cfg, api),

        Command::Health => {
            let h = api.check_health();
            if h.is_running {
                println!("API Running: {}", h.message);
            } else {
                println!("API Offline: {}", h.message);
            }
            Ok(())
        }

        Command::Emails {
            category,
            department,
            spam,
            duplicates,
            sort,
            asc,
            desc,
        } => {
            let emails = run_fetch(api.as_ref())?;
            let filters = FilterState {
                category: category.unwrap_or_default(),
                department: department.unwrap_or_default(),
                spam_only: spam,
                duplicate_only: duplicates,
            };
            let direction = if asc && !desc {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            };
            let sort = SortState {
                field: sort,
                direction,
            };
            let rows = apply(&emails, &filters, &sort);
            println!("Emails ({})", rows.len());
            for e in rows {
                println!(
                    "{:<26} {:<40} {:<22} {:<26} {}",
                    e.from,
                    e.subject,
                    e.routed_to,
                    e.date,
                    e.status_label()
                );
            }
            Ok(())
        }

        Command::Stats => {
            let emails = run_fetch(api.as_ref())?;
            print_stats(&aggregate(&emails));
            Ok(())
        }

        Command::Recheck => {
            let emails = run_recheck(api.as_ref())
                .map_err(|e| anyhow!("Failed to recheck emails: {e}"))?;
            println!("Emails checked and updated: {} emails", emails.len());
            Ok(())
        }

        Command::Watch { interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| cfg.refresh_interval());
            watch(api, interval)
        }
    }
}

fn build_api(cfg: &Config) -> Result<Arc<dyn ClassifierApi>> {
    if cfg.use_mock {
        info!("using built-in demo backend");
        return Ok(Arc::new(MockApi::new(Utc::now(), true)));
    }
    Ok(Arc::new(HttpApi::new(&cfg.api_url, cfg.request_timeout())?))
}

fn print_stats(s: &AggregateStats) {
    let pct = |p: Option<u32>| p.map(|v| format!(" ({v}%)")).unwrap_or_default();
    println!("Total emails:     {}", s.total_count);
    println!("Spam emails:      {}{}", s.spam_count, pct(s.spam_percent()));
    println!(
        "Duplicate emails: {}{}",
        s.duplicate_count,
        pct(s.duplicate_percent())
    );
    println!("Categories:");
    for (name, n) in &s.category_counts {
        println!("  {name:<24} {n}");
    }
    println!("Departments:");
    for (name, n) in &s.department_counts {
        println!("  {name:<24} {n}");
    }
}

fn watch(api: Arc<dyn ClassifierApi>, interval: Duration) -> Result<()> {
    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    let (tx, rx) = mpsc::channel();
    let mut poller = spawn_email_poller(api, interval, tx)?;
    let mut controller = RefreshController::new();

    while stop_rx.try_recv().is_err() {
        match rx.recv_timeout(Duration::from_millis(250)) {
            Ok(outcome) => match controller.apply(outcome) {
                Some(notice) => warn!("{}: {}", notice.title, notice.description),
                None => {
                    let s = controller.stats();
                    info!(
                        "{} emails, {} spam, {} duplicates",
                        s.total_count, s.spam_count, s.duplicate_count
                    );
                    print_stats(s);
                }
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    poller.stop();
    Ok(())
}
