use chrono::{DateTime, Utc};
use showroom_api::{EventDescriptor, EventListing, ProbeFailure, ResolvedRanking};
use std::fmt::Write;

/// Attempted URLs shown in a failure report unless verbose.
pub const RECENT_URLS: usize = 6;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn format_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_owned())
}

pub fn listing_summary(listing: &EventListing) -> String {
    let mut out = format!(
        "{} events from {}/{} pages",
        listing.events.len(),
        listing.pages_ok,
        listing.pages_requested
    );
    if listing.pages_failed() > 0 {
        let _ = write!(out, " ({} failed)", listing.pages_failed());
    }
    out
}

/// One line per event, index first so it can be picked by number.
pub fn events_table(events: &[EventDescriptor]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:>8}  {:<16}  {:<16}  {:<12}  {}",
        "#", "id", "start (UTC)", "end (UTC)", "type", "event"
    );
    for (i, e) in events.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:>8}  {:<16}  {:<16}  {:<12}  {}",
            i,
            e.event_id,
            format_time(e.started()),
            format_time(e.ended()),
            e.type_name.as_deref().unwrap_or("-"),
            e.choice_label()
        );
    }
    out
}

pub fn ranking_table(ranking: &ResolvedRanking, top: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} entries via {} ({} requests)",
        ranking.records.len(),
        ranking.template,
        ranking.attempted.len()
    );
    let _ = writeln!(out, "{:>5}  {:>12}  {}", "rank", "points", "name");
    for r in ranking.top(top) {
        let _ = writeln!(out, "{:>5}  {:>12}  {}", r.rank, r.points, r.participant_name);
    }
    if ranking.records.len() > top {
        let _ = writeln!(out, "... {} more", ranking.records.len() - top);
    }
    out
}

pub fn failure_report(failure: &ProbeFailure, verbose: bool) -> String {
    let mut out = String::new();
    if failure.all_exhausted() {
        let _ = writeln!(
            out,
            "No ranking found: every endpoint answered but none carried a leaderboard \
             (the event may not have one yet)."
        );
    } else {
        let _ = writeln!(out, "Ranking lookup failed.");
    }

    let shown = if verbose {
        failure.attempted.len()
    } else {
        RECENT_URLS.min(failure.attempted.len())
    };
    let _ = writeln!(
        out,
        "Attempted {} URLs (last {shown}):",
        failure.attempted.len()
    );
    for url in &failure.attempted[failure.attempted.len() - shown..] {
        let _ = writeln!(out, "  {url}");
    }

    if let Some(obs) = &failure.last_observation {
        let status = obs
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "no response".to_owned());
        let _ = writeln!(out, "Last response: {} [{status}] {}", obs.url, obs.message);
        if !obs.body_sample.is_empty() {
            let _ = writeln!(out, "  {}", obs.body_sample);
        }
    }
    out
}
