use anyhow::{Result, anyhow};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    /// Email list / dashboard refresh.
    pub refresh_interval_secs: u64,
    pub health_interval_secs: u64,
    pub logs_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Where exported logs go. Falls back to the download dir.
    pub log_dir: Option<String>,
    /// Serve the built-in demo data instead of calling the backend.
    pub use_mock: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            refresh_interval_secs: 120,
            health_interval_secs: 30,
            logs_interval_secs: 60,
            request_timeout_secs: 10,
            log_dir: None,
            use_mock: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_url)
            .map_err(|e| anyhow!("api_url '{}' is not a valid URL: {e}", self.api_url))?;
        for (name, v) in [
            ("refresh_interval_secs", self.refresh_interval_secs),
            ("health_interval_secs", self.health_interval_secs),
            ("logs_interval_secs", self.logs_interval_secs),
            ("request_timeout_secs", self.request_timeout_secs),
        ] {
            if v == 0 {
                return Err(anyhow!("{name} must be greater than zero"));
            }
        }
        Ok(())
    }

    /// Command-line values win over the file; validation runs on the result.
    pub fn with_overrides(mut self, api_url: Option<String>, use_mock: bool) -> Result<Self> {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if use_mock {
            self.use_mock = true;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    pub fn logs_interval(&self) -> Duration {
        Duration::from_secs(self.logs_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resolve_log_dir(&self) -> PathBuf {
        if let Some(p) = &self.log_dir {
            return PathBuf::from(p);
        }
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("rs_mail_dashboard"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Missing file: write a template with the defaults and run with those.
/// Not validated here; see [`Config::with_overrides`].
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let sample = Config::default();
        let tom = toml::to_string_pretty(&sample)?;
        fs::write(path, tom)?;
        info!("Created template config at {}", path.display());
        return Ok(sample);
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config =
        toml::from_str(&s).map_err(|e| anyhow!("Invalid config {}: {e}", path.display()))?;
    Ok(cfg)
}
