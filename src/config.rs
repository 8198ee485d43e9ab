use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Runtime settings: defaults, then `sccourses.toml`, then `SCC_*` env vars.
/// CLI flags override on top in `main`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    /// Bound on one department expansion.
    pub expand_timeout_secs: u64,
    /// Bound on loading a college index page.
    pub page_timeout_secs: u64,
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    /// Rendered fetches go through spider.cloud when set; plain GET otherwise.
    pub spider_api_key: Option<String>,
    /// Query parameter naming the department on a college page.
    pub dept_param: String,
    /// Query parameter naming the selected quarter.
    pub quarter_param: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            log_level: "info".to_string(),
            expand_timeout_secs: 30,
            page_timeout_secs: 60,
            max_retries: 3,
            base_backoff_ms: 2000,
            spider_api_key: None,
            dept_param: "dept".to_string(),
            quarter_param: "quarter".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Settings> {
        Config::builder()
            .add_source(File::with_name("sccourses").required(false))
            .add_source(Environment::with_prefix("SCC"))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn expand_timeout(&self) -> Duration {
        Duration::from_secs(self.expand_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}
