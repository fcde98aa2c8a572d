use log::warn;
use showroom_api::ApiConfig;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "SHOWROOM_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "SHOWROOM_TIMEOUT_SECS";
pub const ENV_PACING_MS: &str = "SHOWROOM_PACING_MS";
pub const ENV_USER_AGENT: &str = "SHOWROOM_USER_AGENT";

/// Log directives used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "showroom_api=info,showroom_rank=info";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSettings {
    pub api: ApiConfig,
}

impl AppSettings {
    /// Built-in defaults overlaid with `SHOWROOM_*` environment variables.
    pub fn load() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Unparsable values are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = var(ENV_BASE_URL) {
            settings.api.base_url = url.trim().to_owned();
        }
        if let Some(secs) = var(ENV_TIMEOUT_SECS).and_then(|v| parse_var::<u64>(ENV_TIMEOUT_SECS, &v)) {
            settings.api.timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(ms) = var(ENV_PACING_MS).and_then(|v| parse_var::<u64>(ENV_PACING_MS, &v)) {
            settings.api.pacing = Duration::from_millis(ms);
        }
        if let Some(ua) = var(ENV_USER_AGENT) {
            settings.api.user_agent = ua;
        }
        settings
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring {name}={value:?}: not a valid number");
            None
        }
    }
}
