use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use anyhow::Result;
use reqwest::{StatusCode, Url};
use spider_client::shapes::request::{ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use super::{html, DepartmentId, PageSource, Quarter};
use crate::config::Settings;
use crate::error::{ExpansionError, SourceError};
use crate::record::College;

/// Fetches rendered pages over the network.
///
/// Owns a current-thread runtime and blocks on every fetch, so the walk stays
/// sequential. Pages go through spider.cloud when an API key is configured,
/// which renders the schedule application's scripts; otherwise a plain GET.
pub struct LiveSource {
    college: College,
    runtime: Runtime,
    spider: Option<Spider>,
    http: reqwest::Client,
    settings: Settings,
    quarter: Option<String>,
    expanded: HashMap<String, String>,
}

/// Why one fetch attempt failed.
#[derive(Debug)]
enum FetchError {
    Status(u16),
    Transport { message: String, retryable: bool },
    Content(String),
}

impl FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status(code) => {
                *code == StatusCode::TOO_MANY_REQUESTS.as_u16()
                    || matches!(code, 500 | 502 | 503 | 504)
            }
            FetchError::Transport { retryable, .. } => *retryable,
            FetchError::Content(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Transport {
                retryable: e.is_timeout() || e.is_connect(),
                message: e.to_string(),
            },
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Status(code) => write!(f, "HTTP status {}", code),
            FetchError::Transport { message, .. } => f.write_str(message),
            FetchError::Content(message) => f.write_str(message),
        }
    }
}

/// Delay before retry number `attempt` (0-based): `base_ms * 2^attempt`.
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(2u64.saturating_pow(attempt)))
}

impl LiveSource {
    pub fn new(college: College, settings: &Settings) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let spider = match &settings.spider_api_key {
            Some(key) => Some(
                Spider::new(Some(key.clone()))
                    .map_err(|e| anyhow::anyhow!("Failed to create Spider client: {}", e))?,
            ),
            None => None,
        };

        Ok(LiveSource {
            college,
            runtime,
            spider,
            http: reqwest::Client::new(),
            settings: settings.clone(),
            quarter: None,
            expanded: HashMap::new(),
        })
    }

    /// College page URL, narrowed to the selected quarter and, when given,
    /// to one department.
    fn page_url(&self, dept: Option<&DepartmentId>) -> std::result::Result<Url, String> {
        let mut url = Url::parse(self.college.base_url()).map_err(|e| e.to_string())?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(quarter) = &self.quarter {
                query.append_pair(&self.settings.quarter_param, quarter);
            }
            if let Some(dept) = dept {
                query.append_pair(&self.settings.dept_param, &dept.code);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    /// Load a page within the page timeout, mapping failures to `SourceError`.
    fn load_page(&self, dept: Option<&DepartmentId>) -> std::result::Result<String, SourceError> {
        let url = self
            .page_url(dept)
            .map_err(|reason| SourceError::PageLoad {
                url: self.college.base_url().to_string(),
                reason,
            })?;
        info!(college = %self.college, url = %url, "loading college page");

        self.runtime
            .block_on(tokio::time::timeout(
                self.settings.page_timeout(),
                self.fetch_with_retry(url.as_str()),
            ))
            .map_err(|_| SourceError::PageLoad {
                url: url.to_string(),
                reason: format!("timed out after {:?}", self.settings.page_timeout()),
            })?
            .map_err(|e| SourceError::PageLoad {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Fetch with retry and exponential backoff on rate limits, 5xx and
    /// transient transport errors.
    async fn fetch_with_retry(&self, url: &str) -> std::result::Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.settings.max_retries && e.is_retryable() => {
                    let backoff = backoff_delay(self.settings.base_backoff_ms, attempt);
                    warn!(
                        "Page load failed for {} (attempt {}/{}), backing off {:.1}s: {}",
                        url,
                        attempt + 1,
                        self.settings.max_retries,
                        backoff.as_secs_f64(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, FetchError> {
        match &self.spider {
            Some(spider) => fetch_rendered(spider, url).await,
            None => {
                let response = self.http.get(url).send().await?.error_for_status()?;
                Ok(response.text().await?)
            }
        }
    }
}

async fn fetch_rendered(spider: &Spider, url: &str) -> std::result::Result<String, FetchError> {
    let params = RequestParams {
        return_format: Some(ReturnFormatHandling::Single(ReturnFormat::Raw)),
        ..Default::default()
    };

    let response = spider
        .scrape_url(url, Some(params), "application/json")
        .await?;

    let parsed: serde_json::Value = match response.as_str() {
        Some(s) => serde_json::from_str(s).unwrap_or(response.clone()),
        None => response,
    };
    let first = parsed.as_array().and_then(|arr| arr.first());

    if let Some(status) = first.and_then(|o| o.get("status")).and_then(|s| s.as_u64()) {
        if status >= 400 {
            return Err(FetchError::Status(u16::try_from(status).unwrap_or(u16::MAX)));
        }
    }

    first
        .and_then(|o| o.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| FetchError::Content("No content in spider response".to_string()))
}

impl PageSource for LiveSource {
    fn list_quarters(&mut self) -> std::result::Result<Vec<Quarter>, SourceError> {
        let selected = self.quarter.take();
        let page = self.load_page(None);
        self.quarter = selected;
        Ok(html::parse_quarters(&page?))
    }

    fn select_quarter(&mut self, quarter: &Quarter) -> std::result::Result<(), SourceError> {
        debug!(college = %self.college, quarter = %quarter, "selecting quarter");
        self.quarter = Some(quarter.code.clone());
        self.expanded.clear();
        Ok(())
    }

    fn list_departments(&mut self) -> std::result::Result<Vec<DepartmentId>, SourceError> {
        html::parse_departments(&self.load_page(None)?)
    }

    fn expand(&mut self, dept: &DepartmentId, timeout: Duration) -> std::result::Result<(), ExpansionError> {
        if self.expanded.contains_key(&dept.code) {
            return Ok(());
        }

        let url = self
            .page_url(Some(dept))
            .map_err(ExpansionError::Load)?;
        debug!(department = %dept, url = %url, "expanding department");

        let page = self
            .runtime
            .block_on(tokio::time::timeout(timeout, self.fetch_with_retry(url.as_str())))
            .map_err(|_| ExpansionError::Timeout(timeout))?
            .map_err(|e| ExpansionError::Load(e.to_string()))?;

        let text = html::render_course_list(&page).ok_or(ExpansionError::Timeout(timeout))?;
        self.expanded.insert(dept.code.clone(), text);
        Ok(())
    }

    fn read_expanded_text(&self, dept: &DepartmentId) -> std::result::Result<String, ExpansionError> {
        self.expanded
            .get(&dept.code)
            .cloned()
            .ok_or_else(|| ExpansionError::Unavailable(format!("{} is not expanded", dept.code)))
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert!(FetchError::Status(429).is_retryable());
        assert!(FetchError::Status(503).is_retryable());
        assert!(!FetchError::Status(404).is_retryable());
        assert!(!FetchError::Status(501).is_retryable());
    }

    #[test]
    fn error_text_does_not_decide_retries() {
        let e = FetchError::Transport {
            message: "builder error for url (https://example.edu/rate/500)".into(),
            retryable: false,
        };
        assert!(!e.is_retryable());
        assert!(!FetchError::Content("HTTP 503 in page body".into()).is_retryable());
        assert!(FetchError::Transport {
            message: "connection reset".into(),
            retryable: true
        }
        .is_retryable());
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_delay(2000, 0), Duration::from_millis(2000));
        assert_eq!(backoff_delay(2000, 3), Duration::from_millis(16000));
        assert_eq!(backoff_delay(2000, 64), Duration::from_millis(u64::MAX));
        assert_eq!(backoff_delay(2000, u32::MAX), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn page_urls() {
        let mut source = LiveSource::new(College::North, &Settings::default()).unwrap();
        assert_eq!(
            source.page_url(None).unwrap().as_str(),
            "https://mynorth.seattlecolleges.edu/"
        );
        assert_eq!(
            source.page_url(Some(&DepartmentId::new("ENGL"))).unwrap().as_str(),
            "https://mynorth.seattlecolleges.edu/?dept=ENGL"
        );

        source
            .select_quarter(&Quarter {
                code: "B563".into(),
                name: "Winter 2026".into(),
            })
            .unwrap();
        assert_eq!(
            source.page_url(Some(&DepartmentId::new("ENGL&"))).unwrap().as_str(),
            "https://mynorth.seattlecolleges.edu/?quarter=B563&dept=ENGL%26"
        );
    }

    #[test]
    fn selecting_a_quarter_drops_expanded_pages() {
        let mut source = LiveSource::new(College::South, &Settings::default()).unwrap();
        let dept = DepartmentId::new("ART");
        source.expanded.insert("ART".into(), "101 Design 5.0 Credits".into());
        // No network: a cached department must short-circuit.
        source.expand(&dept, Duration::from_millis(1)).unwrap();
        assert_eq!(source.read_expanded_text(&dept).unwrap(), "101 Design 5.0 Credits");

        source
            .select_quarter(&Quarter {
                code: "B563".into(),
                name: String::new(),
            })
            .unwrap();
        assert!(source.read_expanded_text(&dept).is_err());
    }
}
