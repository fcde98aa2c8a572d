use crate::client::{ApiError, ApiResult};
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.showroom-live.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PACING: Duration = Duration::from_millis(80);
/// The upstream rejects requests that do not look like they come from a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Tunables for [`crate::ShowroomApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request bound.
    pub timeout: Duration,
    /// Delay inserted between consecutive ranking requests.
    pub pacing: Duration,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            pacing: DEFAULT_PACING,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub(crate) fn parse_base_url(&self) -> ApiResult<Url> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(format!(
                "{}: expected an http(s) origin",
                self.base_url
            )));
        }
        Ok(url)
    }
}
