use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::info;
use rand::Rng;
use rand::seq::SliceRandom;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::status_log::{LogKind, StatusLog};

const MOCK_LOG_COUNT: usize = 20;
const MOCK_WINDOW_MS: i64 = 30 * 60 * 1000;

const MESSAGES: [&str; 17] = [
    "Fetching unread emails from the server",
    "✅ Successfully fetched 5 unread emails",
    "Processing email from customer@example.com",
    "Extracting text from email attachments",
    "✅ Successfully extracted text from 2 attachments",
    "🤖 AI analyzing email content",
    "✅ Email classified as \"Mortgage\" with 92% confidence",
    "✅ Email routed to \"Mortgage Services\"",
    "🚨 [SPAM DETECTED] Email contains spam-like content",
    "🔄 [DUPLICATE] Email was already processed",
    "Processing email from support@bank.com",
    "❌ Failed to extract text from PDF attachment",
    "Retrying attachment processing",
    "✅ Successfully extracted text on retry",
    "🤖 AI analyzing email content",
    "⚠️ Low confidence classification (65%)",
    "✅ Email routed to \"General Inquiries\"",
];

/// Backend has no log endpoint yet; this stands in for it. Entries fall in
/// the half hour before `now`, oldest first.
pub fn generate_mock_logs<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> Vec<StatusLog> {
    let stamp = now.timestamp_millis();
    let mut logs: Vec<StatusLog> = (0..MOCK_LOG_COUNT)
        .map(|i| {
            let kind = *LogKind::ALL.choose(rng).unwrap_or(&LogKind::Info);
            let message = MESSAGES.choose(rng).copied().unwrap_or_default();
            let age = rng.gen_range(0..MOCK_WINDOW_MS);
            StatusLog {
                id: format!("log-{i}-{stamp}"),
                message: message.to_string(),
                kind,
                timestamp: now - Duration::milliseconds(age),
            }
        })
        .collect();
    logs.sort_by_key(|l| l.timestamp);
    logs
}

pub fn render_logs(logs: &[StatusLog]) -> String {
    logs.iter()
        .map(StatusLog::to_line)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("email-classifier-logs-{}.txt", today.format("%Y-%m-%d"))
}

/// Write the logs as plain text into `dir`, returning the file path.
pub fn export_logs(logs: &[StatusLog], dir: &Path, today: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(export_file_name(today));
    fs::write(&path, render_logs(logs)).with_context(|| format!("writing {}", path.display()))?;
    info!("exported {} log lines to {}", logs.len(), path.display());
    Ok(path)
}
