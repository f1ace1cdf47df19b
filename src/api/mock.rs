use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use rand::seq::SliceRandom;
use std::thread;
use std::time::Duration;

use crate::api::{ApiError, ClassifierApi};
use crate::domain::email::{EmailRecord, HealthStatus};

/// In-process stand-in for the classification backend, for local development.
pub struct MockApi {
    emails: Vec<EmailRecord>,
    simulate_latency: bool,
}

// (from, subject, body, extracted, routed_to, category, spam, duplicate, confidence)
type Fixture = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    bool,
    bool,
    f64,
);

const FIXTURES: [Fixture; 8] = [
    (
        "customer@example.com",
        "Credit Limit Increase Request",
        "I would like to request a credit limit increase for my account #12345.",
        "Request for credit limit increase. Account #12345.",
        "Credit Card Services",
        "Credit Card",
        false,
        false,
        0.92,
    ),
    (
        "support@bank.com",
        "Your Account Statement",
        "Please find attached your monthly account statement.",
        "Monthly account statement for checking account.",
        "Customer Service",
        "Statement",
        false,
        false,
        0.85,
    ),
    (
        "phishing@scam.com",
        "Urgent: Account Verification",
        "Click here to verify your account details immediately.",
        "Click link to verify account details.",
        "Spam",
        "Security",
        true,
        false,
        0.97,
    ),
    (
        "mortgage@bank.com",
        "Mortgage Application Status",
        "Your mortgage application has been processed.",
        "Mortgage application processed. Status: Approved.",
        "Mortgage Services",
        "Mortgage",
        false,
        false,
        0.89,
    ),
    (
        "customer@example.com",
        "Re: Mortgage Application Status",
        "Thank you for processing my mortgage application.",
        "Thanks for processing mortgage application.",
        "Mortgage Services",
        "Mortgage",
        false,
        true,
        0.77,
    ),
    (
        "support@bank.com",
        "Login Attempt from New Device",
        "We detected a login attempt from a new device.",
        "Login attempt from new device detected.",
        "Security",
        "Security",
        false,
        false,
        0.95,
    ),
    (
        "investments@bank.com",
        "Investment Portfolio Update",
        "Your investment portfolio has been updated.",
        "Investment portfolio updated. New balance: $50,000.",
        "Wealth Management",
        "Investments",
        false,
        false,
        0.91,
    ),
    (
        "loans@bank.com",
        "Loan Payment Confirmation",
        "Your recent loan payment has been received.",
        "Loan payment received. Remaining balance: $15,000.",
        "Loans",
        "Loans",
        false,
        false,
        0.88,
    ),
];

impl MockApi {
    /// Fixture `i` is dated `i` days before `now`.
    pub fn new(now: DateTime<Utc>, simulate_latency: bool) -> Self {
        let emails = FIXTURES
            .iter()
            .enumerate()
            .map(
                |(i, (from, subject, body, extracted, routed_to, category, spam, dup, conf))| {
                    EmailRecord {
                        id: (i + 1).to_string(),
                        from: from.to_string(),
                        subject: subject.to_string(),
                        body: Some(body.to_string()),
                        extracted_text: Some(extracted.to_string()),
                        routed_to: routed_to.to_string(),
                        category: Some(category.to_string()),
                        date: (now - ChronoDuration::days(i as i64))
                            .to_rfc3339_opts(SecondsFormat::Millis, true),
                        is_spam: spam.then_some(true),
                        is_duplicate: dup.then_some(true),
                        confidence: Some(*conf),
                    }
                },
            )
            .collect();
        Self {
            emails,
            simulate_latency,
        }
    }

    fn pause(&self, ms: u64) {
        if self.simulate_latency {
            thread::sleep(Duration::from_millis(ms));
        }
    }
}

impl ClassifierApi for MockApi {
    fn check_health(&self) -> HealthStatus {
        self.pause(500);
        HealthStatus {
            message: "Email Classifier API is running!".to_string(),
            is_running: true,
        }
    }

    fn classify_emails(&self) -> Result<Vec<EmailRecord>, ApiError> {
        self.pause(800);
        Ok(self.emails.clone())
    }

    fn recheck_emails(&self) -> Result<EmailRecord, ApiError> {
        self.pause(800);
        self.emails
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(ApiError::Status(404))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::aggregate::aggregate;
    use chrono::TimeZone;

    #[test]
    fn fixtures_are_newest_first_iso_dates() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let api = MockApi::new(now, false);
        let emails = api.classify_emails().unwrap();
        assert_eq!(emails.len(), 8);
        assert_eq!(emails[0].date, "2025-06-10T12:00:00.000Z");
        assert_eq!(emails[7].date, "2025-06-03T12:00:00.000Z");
    }

    #[test]
    fn fixtures_aggregate_like_the_demo_dashboard() {
        let api = MockApi::new(Utc::now(), false);
        let s = aggregate(&api.classify_emails().unwrap());
        assert_eq!(s.spam_count, 1);
        assert_eq!(s.duplicate_count, 1);
        assert_eq!(s.category_counts[2], ("Security".to_string(), 2));
        assert!(api.check_health().is_running);
        assert!(api.recheck_emails().is_ok());
    }
}
