use anyhow::{Result, anyhow};
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::api::{ApiError, ClassifierApi};
use crate::domain::email::{EmailRecord, HealthStatus};

#[derive(Debug, Deserialize)]
struct HealthBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct EmailsBody {
    emails: Vec<EmailRecord>,
}

pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| anyhow!("Invalid api_url '{base_url}': {e}"))?;
        // so that join() appends instead of replacing the last segment
        if !base.path().ends_with('/') {
            let p = format!("{}/", base.path());
            base.set_path(&p);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.base.join(path)?;
        debug!("GET {url}");

        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        let text = resp.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl ClassifierApi for HttpApi {
    fn check_health(&self) -> HealthStatus {
        match self.get_json::<HealthBody>("") {
            Ok(b) => HealthStatus {
                message: b.message,
                is_running: true,
            },
            Err(e) => {
                debug!("health check failed: {e}");
                HealthStatus::offline()
            }
        }
    }

    fn classify_emails(&self) -> Result<Vec<EmailRecord>, ApiError> {
        self.get_json::<EmailsBody>("classify-emails")
            .map(|b| b.emails)
            .inspect_err(|e| warn!("Error classifying emails: {e}"))
    }

    fn recheck_emails(&self) -> Result<EmailRecord, ApiError> {
        self.get_json::<EmailRecord>("recheck-emails")
            .inspect_err(|e| warn!("Error rechecking emails: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_gets_trailing_slash() {
        let api = HttpApi::new("http://127.0.0.1:8000/api", Duration::from_secs(1)).unwrap();
        assert_eq!(
            api.base_url().join("classify-emails").unwrap().as_str(),
            "http://127.0.0.1:8000/api/classify-emails"
        );
    }

    #[test]
    fn rejects_garbage_url() {
        assert!(HttpApi::new("not a url", Duration::from_secs(1)).is_err());
    }
}
