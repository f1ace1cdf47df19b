use anyhow::Result;
use chrono::{DateTime, Local};
use log::{error, info};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;
use thiserror::Error;

use crate::api::{ApiError, ClassifierApi};
use crate::domain::email::{EmailRecord, HealthStatus};
use crate::pipeline::aggregate::{AggregateStats, aggregate};
use crate::poller::Poller;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Plain re-fetch of the classified list (scheduled or manual).
    Refresh,
    /// Ask the backend to re-scan the inbox, then re-fetch.
    Recheck,
}

#[derive(Debug, Error)]
pub enum RecheckError {
    #[error("re-scan failed: {0}")]
    Recheck(ApiError),

    #[error("re-scan done, but fetching the list failed: {0}")]
    Fetch(ApiError),
}

#[derive(Debug)]
pub enum FetchOutcome {
    Refreshed(Result<Vec<EmailRecord>, ApiError>),
    Rechecked(Result<Vec<EmailRecord>, RecheckError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A short user-facing message, shown as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn error(description: &str) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: "Error".to_string(),
            description: description.to_string(),
        }
    }

    fn success(description: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: "Success".to_string(),
            description: description.to_string(),
        }
    }
}

pub const FETCH_FAILED: &str = "Failed to fetch emails. Please try again.";
pub const RECHECK_FAILED: &str = "Failed to recheck emails. Please try again.";
pub const RECHECK_DONE: &str = "Emails checked and updated successfully.";

pub fn run_fetch(api: &dyn ClassifierApi) -> Result<Vec<EmailRecord>, ApiError> {
    api.classify_emails()
}

/// Re-scan result is discarded; only the follow-up list matters.
pub fn run_recheck(api: &dyn ClassifierApi) -> Result<Vec<EmailRecord>, RecheckError> {
    api.recheck_emails().map_err(RecheckError::Recheck)?;
    api.classify_emails().map_err(RecheckError::Fetch)
}

pub fn run_job(api: &dyn ClassifierApi, kind: FetchKind) -> FetchOutcome {
    match kind {
        FetchKind::Refresh => FetchOutcome::Refreshed(run_fetch(api)),
        FetchKind::Recheck => FetchOutcome::Rechecked(run_recheck(api)),
    }
}

/// Owner of the canonical email list. Lives on the UI thread; workers only
/// hand it results.
#[derive(Debug, Default)]
pub struct RefreshController {
    emails: Vec<EmailRecord>,
    stats: AggregateStats,
    loading: bool,
    rechecking: bool,
    last_success: Option<DateTime<Local>>,
}

impl RefreshController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emails(&self) -> &[EmailRecord] {
        &self.emails
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_rechecking(&self) -> bool {
        self.rechecking
    }

    pub fn last_success(&self) -> Option<DateTime<Local>> {
        self.last_success
    }

    pub fn begin(&mut self, kind: FetchKind) {
        self.loading = true;
        if kind == FetchKind::Recheck {
            self.rechecking = true;
        }
    }

    /// In-flight work was cancelled and its result will never arrive.
    pub fn abandon(&mut self) {
        self.loading = false;
        self.rechecking = false;
    }

    pub fn apply(&mut self, outcome: FetchOutcome) -> Option<Notice> {
        match outcome {
            FetchOutcome::Refreshed(r) => self.apply_fetch(r),
            FetchOutcome::Rechecked(r) => Some(self.apply_recheck(r)),
        }
    }

    /// Success replaces the list wholesale; failure keeps what we had.
    pub fn apply_fetch(&mut self, result: Result<Vec<EmailRecord>, ApiError>) -> Option<Notice> {
        self.loading = false;
        match result {
            Ok(emails) => {
                self.replace(emails);
                None
            }
            Err(e) => {
                error!("Error fetching emails: {e}");
                Some(Notice::error(FETCH_FAILED))
            }
        }
    }

    pub fn apply_recheck(&mut self, result: Result<Vec<EmailRecord>, RecheckError>) -> Notice {
        self.loading = false;
        self.rechecking = false;
        match result {
            Ok(emails) => {
                self.replace(emails);
                Notice::success(RECHECK_DONE)
            }
            Err(RecheckError::Recheck(e)) => {
                error!("Error rechecking emails: {e}");
                Notice::error(RECHECK_FAILED)
            }
            Err(RecheckError::Fetch(e)) => {
                error!("Error fetching emails after recheck: {e}");
                Notice::error(FETCH_FAILED)
            }
        }
    }

    fn replace(&mut self, emails: Vec<EmailRecord>) {
        self.stats = aggregate(&emails);
        self.emails = emails;
        self.last_success = Some(Local::now());
        info!("loaded {} classified emails", self.emails.len());
    }
}

/// Polls the email endpoint; results go to `tx`. Once the receiving side is
/// gone, late results are simply dropped.
pub fn spawn_email_poller(
    api: Arc<dyn ClassifierApi>,
    interval: Duration,
    tx: Sender<FetchOutcome>,
) -> Result<Poller<FetchKind>> {
    Poller::spawn("emails", interval, FetchKind::Refresh, move |kind| {
        let out = run_job(api.as_ref(), kind);
        let _ = tx.send(out);
    })
}

pub fn spawn_health_poller(
    api: Arc<dyn ClassifierApi>,
    interval: Duration,
    tx: Sender<HealthStatus>,
) -> Result<Poller<()>> {
    Poller::spawn("health", interval, (), move |_| {
        let _ = tx.send(api.check_health());
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::email::fixtures::{email, with_category};
    use std::sync::Mutex;
    use std::sync::mpsc;

    /// Scripted backend: pops queued replies in order.
    struct Scripted {
        lists: Mutex<Vec<Result<Vec<EmailRecord>, u16>>>,
        recheck_ok: bool,
    }

    impl ClassifierApi for Scripted {
        fn check_health(&self) -> HealthStatus {
            HealthStatus::offline()
        }

        fn classify_emails(&self) -> Result<Vec<EmailRecord>, ApiError> {
            let mut q = self.lists.lock().unwrap();
            if q.is_empty() {
                return Err(ApiError::Status(503));
            }
            q.remove(0).map_err(ApiError::Status)
        }

        fn recheck_emails(&self) -> Result<EmailRecord, ApiError> {
            if self.recheck_ok {
                Ok(email("r"))
            } else {
                Err(ApiError::Status(500))
            }
        }
    }

    #[test]
    fn success_replaces_list_and_stats() {
        let mut c = RefreshController::new();
        c.begin(FetchKind::Refresh);
        assert!(c.is_loading());

        let notice = c.apply_fetch(Ok(vec![with_category("1", "A"), email("2")]));
        assert!(notice.is_none());
        assert!(!c.is_loading());
        assert_eq!(c.emails().len(), 2);
        assert_eq!(c.stats().total_count, 2);
        assert!(c.last_success().is_some());

        c.apply_fetch(Ok(vec![email("9")]));
        assert_eq!(c.emails()[0].id, "9");
        assert!(c.stats().category_counts.is_empty());
    }

    #[test]
    fn failure_after_success_keeps_previous_list() {
        let mut c = RefreshController::new();
        c.apply_fetch(Ok(vec![email("1"), email("2")]));

        c.begin(FetchKind::Refresh);
        let notice = c.apply_fetch(Err(ApiError::Status(502))).unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.description, FETCH_FAILED);
        assert!(!c.is_loading());
        assert_eq!(c.emails().len(), 2);
        assert_eq!(c.stats().total_count, 2);
    }

    #[test]
    fn recheck_then_fetch() {
        let api = Scripted {
            lists: Mutex::new(vec![Ok(vec![email("1"), email("2"), email("3")])]),
            recheck_ok: true,
        };
        let mut c = RefreshController::new();
        c.begin(FetchKind::Recheck);
        assert!(c.is_rechecking());
        let notice = c.apply(run_job(&api, FetchKind::Recheck)).unwrap();
        assert_eq!(notice.description, RECHECK_DONE);
        assert!(!c.is_rechecking());
        assert_eq!(c.emails().len(), 3);
    }

    #[test]
    fn recheck_failure_skips_fetch() {
        let api = Scripted {
            lists: Mutex::new(vec![Ok(vec![email("1")])]),
            recheck_ok: false,
        };
        let mut c = RefreshController::new();
        let notice = c.apply(run_job(&api, FetchKind::Recheck)).unwrap();
        assert_eq!(notice.description, RECHECK_FAILED);
        assert!(c.emails().is_empty());
        // the queued list was not consumed
        assert_eq!(api.lists.lock().unwrap().len(), 1);
    }

    #[test]
    fn abandon_clears_busy_flags_but_keeps_data() {
        let mut c = RefreshController::new();
        c.apply_fetch(Ok(vec![email("1")]));
        c.begin(FetchKind::Recheck);
        c.abandon();
        assert!(!c.is_loading());
        assert!(!c.is_rechecking());
        assert_eq!(c.emails().len(), 1);
    }

    #[test]
    fn recheck_error_reads_as_text() {
        let e = RecheckError::Recheck(ApiError::Status(500));
        assert_eq!(e.to_string(), "re-scan failed: backend answered with HTTP 500");
        let e = RecheckError::Fetch(ApiError::Status(503));
        assert!(e.to_string().ends_with("HTTP 503"));
    }

    #[test]
    fn poller_delivers_results_until_receiver_is_gone() {
        let api: Arc<dyn ClassifierApi> = Arc::new(Scripted {
            lists: Mutex::new(vec![Ok(vec![email("1")]), Err(500)]),
            recheck_ok: true,
        });
        let (tx, rx) = mpsc::channel();
        let poller = spawn_email_poller(api, Duration::from_secs(3600), tx).unwrap();

        let mut c = RefreshController::new();
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(c.apply(first).is_none());

        poller.trigger(FetchKind::Refresh);
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(c.apply(second).is_some());
        assert_eq!(c.emails().len(), 1);

        drop(rx);
        poller.trigger(FetchKind::Refresh);
        poller.shutdown();
    }
}
