pub mod client;
pub mod config;
pub mod endpoints;
pub mod ranking;
pub mod showroom;

pub use client::{ApiError, ApiResult, ShowroomApi};
pub use config::ApiConfig;
pub use endpoints::{EndpointTemplate, RankingPath};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Domain types — clean model, independent of the SHOWROOM wire format
// ---------------------------------------------------------------------------

/// One row of the event list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDescriptor {
    pub event_id: i64,
    pub event_name: String,
    /// Secondary identifier (`event_url_key`) used by the key-based ranking paths.
    pub event_key: Option<String>,
    /// Epoch seconds. Left unset when the upstream omits them.
    pub started_at: Option<i64>,
    pub ended_at: Option<i64>,
    pub type_name: Option<String>,
}

impl EventDescriptor {
    pub fn started(&self) -> Option<DateTime<Utc>> {
        self.started_at.and_then(|s| DateTime::from_timestamp(s, 0))
    }

    pub fn ended(&self) -> Option<DateTime<Utc>> {
        self.ended_at.and_then(|s| DateTime::from_timestamp(s, 0))
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.ended().is_some_and(|end| end <= now)
    }

    /// Label used when offering the event for selection.
    pub fn choice_label(&self) -> String {
        let name = if self.event_name.trim().is_empty() {
            "(no name)"
        } else {
            self.event_name.as_str()
        };
        format!("{name}  (id:{})", self.event_id)
    }
}

/// Which events the search endpoint should return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFilter {
    #[default]
    Ongoing,
    Ended,
    All,
}

impl EventFilter {
    /// Value sent as `include_ended`. The upstream has no "ended only" switch,
    /// so `Ended` asks for everything and narrows client-side.
    pub fn include_ended(self) -> u8 {
        match self {
            EventFilter::Ongoing => 0,
            EventFilter::Ended | EventFilter::All => 1,
        }
    }

    pub fn admits(self, event: &EventDescriptor, now: DateTime<Utc>) -> bool {
        match self {
            EventFilter::Ended => event.has_ended(now),
            EventFilter::Ongoing | EventFilter::All => true,
        }
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventFilter::Ongoing => "ongoing",
            EventFilter::Ended => "ended",
            EventFilter::All => "all",
        };
        f.write_str(s)
    }
}

impl FromStr for EventFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ongoing" => Ok(EventFilter::Ongoing),
            "ended" => Ok(EventFilter::Ended),
            "all" => Ok(EventFilter::All),
            other => Err(format!("unknown event filter '{other}' (expected ongoing, ended or all)")),
        }
    }
}

/// Result of one `list_events` call. Failed pages are counted, never propagated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventListing {
    pub events: Vec<EventDescriptor>,
    pub pages_requested: u32,
    pub pages_ok: u32,
}

impl EventListing {
    pub fn pages_failed(&self) -> u32 {
        self.pages_requested.saturating_sub(self.pages_ok)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// One leaderboard row after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RankingRecord {
    /// 1 = top.
    pub rank: u32,
    pub participant_name: String,
    pub points: i64,
    pub participant_id: Option<String>,
}

/// Outcome of resolving the ranking of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeResult {
    Found(ResolvedRanking),
    Failed(ProbeFailure),
}

impl ProbeResult {
    pub fn is_found(&self) -> bool {
        matches!(self, ProbeResult::Found(_))
    }

    pub fn attempted(&self) -> &[String] {
        match self {
            ProbeResult::Found(found) => &found.attempted,
            ProbeResult::Failed(failure) => &failure.attempted,
        }
    }
}

/// A non-empty leaderboard and the template that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRanking {
    /// Sorted ascending by rank; ranks are unique.
    pub records: Vec<RankingRecord>,
    pub template: EndpointTemplate,
    pub attempted: Vec<String>,
}

impl ResolvedRanking {
    pub fn top(&self, n: usize) -> &[RankingRecord] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn total_points(&self) -> i64 {
        self.records.iter().map(|r| r.points).sum()
    }
}

/// Every candidate template failed or came back empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    /// Every URL requested, in request order.
    pub attempted: Vec<String>,
    pub last_observation: Option<Observation>,
    pub templates: Vec<TemplateReport>,
}

impl ProbeFailure {
    /// True when every template answered 200 but carried no ranking: the
    /// event most likely has no leaderboard yet, as opposed to the upstream
    /// rejecting every path.
    pub fn all_exhausted(&self) -> bool {
        !self.templates.is_empty()
            && self
                .templates
                .iter()
                .all(|t| t.outcome == TemplateOutcome::Exhausted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateReport {
    pub template: EndpointTemplate,
    pub outcome: TemplateOutcome,
}

/// Why a template did not win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateOutcome {
    /// 200 on page 1 but no ranking array in the payload.
    Exhausted,
    /// Non-200 on page 1.
    Rejected { status: u16 },
    /// Timeout, connection or body read failure.
    Unreachable,
    /// Body was not JSON.
    Malformed,
}

/// The last response (or transport failure) seen while probing, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub url: String,
    /// `None` when no HTTP response was received.
    pub status: Option<u16>,
    pub message: String,
    pub body_sample: String,
}
