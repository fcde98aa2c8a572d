use crate::config::ApiConfig;
use crate::endpoints::{self, EndpointTemplate};
use crate::ranking::{self, RawRecord};
use crate::showroom;
use crate::{
    EventFilter, EventListing, Observation, ProbeFailure, ProbeResult, ResolvedRanking,
    TemplateOutcome, TemplateReport,
};
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::thread;

pub type ApiResult<T> = Result<T, ApiError>;

/// Response bodies are cut to this many characters in diagnostics.
const BODY_SAMPLE_CHARS: usize = 400;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Timeout, connection failure, or the body could not be read.
    #[error("network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("unexpected status {status} for {url}")]
    Status {
        url: String,
        status: StatusCode,
        body_sample: String,
    },

    #[error("malformed response from {url}: {source}")]
    Malformed {
        url: String,
        source: serde_json::Error,
        body_sample: String,
    },

    #[error("invalid base url {0}")]
    InvalidBaseUrl(String),

    #[error("could not build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ApiError {
    fn outcome(&self) -> TemplateOutcome {
        match self {
            ApiError::Status { status, .. } => TemplateOutcome::Rejected { status: status.as_u16() },
            ApiError::Malformed { .. } => TemplateOutcome::Malformed,
            ApiError::Network { .. } | ApiError::InvalidBaseUrl(_) | ApiError::ClientBuild(_) => {
                TemplateOutcome::Unreachable
            }
        }
    }

    fn observation(&self) -> Option<Observation> {
        match self {
            ApiError::Network { url, source } => Some(Observation {
                url: url.clone(),
                status: source.status().map(|s| s.as_u16()),
                message: self.to_string(),
                body_sample: String::new(),
            }),
            ApiError::Status { url, status, body_sample } => Some(Observation {
                url: url.clone(),
                status: Some(status.as_u16()),
                message: self.to_string(),
                body_sample: body_sample.clone(),
            }),
            ApiError::Malformed { url, body_sample, .. } => Some(Observation {
                url: url.clone(),
                status: Some(StatusCode::OK.as_u16()),
                message: self.to_string(),
                body_sample: body_sample.clone(),
            }),
            ApiError::InvalidBaseUrl(_) | ApiError::ClientBuild(_) => None,
        }
    }
}

/// A 200 response parsed as JSON, with the raw body kept for diagnostics.
struct JsonPage {
    value: Value,
    body: String,
}

/// How one candidate template fared.
enum TemplateProbe {
    Matched(Vec<RawRecord>),
    Missed(TemplateOutcome),
}

/// SHOWROOM event API client.
///
/// Every call is blocking and sequential: one request in flight at a time,
/// bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct ShowroomApi {
    client: Client,
    base_url: Url,
    config: ApiConfig,
}

impl ShowroomApi {
    pub fn new() -> ApiResult<Self> {
        Self::with_config(ApiConfig::default())
    }

    pub fn with_config(config: ApiConfig) -> ApiResult<Self> {
        let base_url = config.parse_base_url()?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::ClientBuild)?;
        Ok(Self { client, base_url, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Fetch search pages `1..=page_count` and concatenate their events in
    /// page order.
    ///
    /// One attempt per page. A failed page (network, non-200, bad JSON) is
    /// logged and skipped; later pages are still requested. No deduplication:
    /// overlapping pages show up twice.
    pub fn list_events(&self, page_count: u32, filter: EventFilter) -> EventListing {
        let page_count = page_count.max(1);
        let now = Utc::now();
        let mut listing = EventListing {
            pages_requested: page_count,
            ..EventListing::default()
        };

        for page in 1..=page_count {
            let url = endpoints::event_search_url(&self.base_url, page, filter);
            match self.get_json(&url) {
                Ok(json) => {
                    let events = showroom::events_from_page(&json.value);
                    debug!("event page {page}: {} events", events.len());
                    listing.pages_ok += 1;
                    listing
                        .events
                        .extend(events.into_iter().filter(|e| filter.admits(e, now)));
                }
                Err(e) => warn!("event page {page} skipped: {e}"),
            }
        }

        info!(
            "listed {} events from {}/{} pages ({filter})",
            listing.events.len(),
            listing.pages_ok,
            listing.pages_requested
        );
        listing
    }

    /// Locate and normalize the ranking of one event.
    ///
    /// Candidate templates are tried in order; the first one that yields at
    /// least one record wins and the rest are not requested. Within a template,
    /// pages `1..=max_pages` are fetched until a page comes back empty, fails,
    /// or `max_pages` is reached. An empty or failed first page disqualifies
    /// the template.
    pub fn resolve_ranking(
        &self,
        event_id: i64,
        event_key: Option<&str>,
        max_pages: u32,
    ) -> ProbeResult {
        let max_pages = max_pages.max(1);
        let mut probe = Probe::default();
        let mut reports = Vec::new();

        for template in endpoints::candidate_templates(event_key) {
            match self.probe_template(&template, event_id, max_pages, &mut probe) {
                TemplateProbe::Matched(raw) => {
                    let records = ranking::normalize(&raw);
                    info!(
                        "event {event_id}: {} ranking records via {template}",
                        records.len()
                    );
                    return ProbeResult::Found(ResolvedRanking {
                        records,
                        template,
                        attempted: probe.attempted,
                    });
                }
                TemplateProbe::Missed(outcome) => {
                    debug!("event {event_id}: {template} missed ({outcome:?})");
                    reports.push(TemplateReport { template, outcome });
                }
            }
        }

        warn!(
            "event {event_id}: no ranking after {} requests across {} templates",
            probe.attempted.len(),
            reports.len()
        );
        ProbeResult::Failed(ProbeFailure {
            attempted: probe.attempted,
            last_observation: probe.last_observation,
            templates: reports,
        })
    }

    fn probe_template(
        &self,
        template: &EndpointTemplate,
        event_id: i64,
        max_pages: u32,
        probe: &mut Probe,
    ) -> TemplateProbe {
        let mut accumulated: Vec<RawRecord> = Vec::new();

        for page in 1..=max_pages {
            if !probe.attempted.is_empty() {
                thread::sleep(self.config.pacing);
            }
            let url = template.url(&self.base_url, event_id, page);
            probe.attempted.push(url.to_string());

            let json = match self.get_json(&url) {
                Ok(json) => json,
                Err(e) => {
                    probe.last_observation = e.observation();
                    if accumulated.is_empty() {
                        return TemplateProbe::Missed(e.outcome());
                    }
                    debug!("{template}: stopping at page {page}: {e}");
                    break;
                }
            };

            let items = ranking::detect_ranking_array(&json.value);
            if items.is_empty() {
                if page == 1 {
                    probe.last_observation = Some(Observation {
                        url: url.to_string(),
                        status: Some(StatusCode::OK.as_u16()),
                        message: "no ranking array in response".to_owned(),
                        body_sample: body_sample(&json.body),
                    });
                    return TemplateProbe::Missed(TemplateOutcome::Exhausted);
                }
                debug!("{template}: end of data at page {page}");
                break;
            }
            accumulated.extend(items);
        }

        if accumulated.is_empty() {
            TemplateProbe::Missed(TemplateOutcome::Exhausted)
        } else {
            TemplateProbe::Matched(accumulated)
        }
    }

    fn get_json(&self, url: &Url) -> ApiResult<JsonPage> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .timeout(self.config.timeout)
            .send()
            .map_err(|e| ApiError::Network { url: url.to_string(), source: e })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ApiError::Network { url: url.to_string(), source: e })?;

        if status != StatusCode::OK {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
                body_sample: body_sample(&body),
            });
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(JsonPage { value, body }),
            Err(e) => Err(ApiError::Malformed {
                url: url.to_string(),
                source: e,
                body_sample: body_sample(&body),
            }),
        }
    }
}

/// Bookkeeping shared across all templates of one `resolve_ranking` call.
#[derive(Default)]
struct Probe {
    attempted: Vec<String>,
    last_observation: Option<Observation>,
}

fn body_sample(body: &str) -> String {
    body.chars().take(BODY_SAMPLE_CHARS).collect()
}
