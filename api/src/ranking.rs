/// Ranking payload heuristics: locating the leaderboard array inside an
/// arbitrarily shaped response, and mapping its loosely named fields onto
/// [`RankingRecord`].
use crate::RankingRecord;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashSet;

/// One leaderboard entry exactly as the upstream sent it.
pub type RawRecord = Map<String, Value>;

// Candidate keys per canonical field, highest priority first.
pub const RANK_KEYS: &[&str] = &["rank", "順位", "position", "no", "ranking"];
pub const NAME_KEYS: &[&str] = &["user_name", "room_name", "name", "display_name", "user"];
pub const POINT_KEYS: &[&str] = &["point", "points", "score", "value"];
pub const ID_KEYS: &[&str] = &["room_id", "user_id", "id"];

/// An array only counts as a leaderboard if its first element carries one of these.
/// Deliberately narrower than the candidate tables: `no`, `value` and `id`
/// appear in too many unrelated payloads.
pub const INDICATOR_KEYS: &[&str] = &[
    "rank",
    "順位",
    "position",
    "point",
    "points",
    "score",
    "room_id",
    "user_id",
    "room_name",
    "user_name",
    "name",
    "display_name",
];

/// Find the leaderboard array in a response body.
///
/// A top-level array of objects is taken as-is. For an object, the values are
/// scanned in document order and the first non-empty array whose first element
/// is an object carrying an indicator key wins. Anything else yields nothing;
/// there is no "any array" fallback.
pub fn detect_ranking_array(value: &Value) -> Vec<RawRecord> {
    match value {
        Value::Array(items) if first_is_object(items) => objects(items),
        Value::Object(map) => map
            .values()
            .find_map(|v| match v {
                Value::Array(items) if looks_like_ranking(items) => Some(objects(items)),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn first_is_object(items: &[Value]) -> bool {
    items.first().is_some_and(Value::is_object)
}

fn looks_like_ranking(items: &[Value]) -> bool {
    items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| INDICATOR_KEYS.iter().any(|k| first.contains_key(*k)))
}

fn objects(items: &[Value]) -> Vec<RawRecord> {
    items
        .iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
}

/// Map raw entries to canonical records, sorted by rank then name.
///
/// Entries without a usable rank take their 1-based arrival position. Exact
/// duplicates that carry a participant id (overlapping pages) are collapsed;
/// without an id, identical rows may be distinct participants and are kept.
/// A rank already taken by an earlier record moves the later one to the next
/// free rank, so ranks in the output are unique and strictly increasing.
pub fn normalize(raw: &[RawRecord]) -> Vec<RankingRecord> {
    let mut seen = HashSet::new();
    let mut records: Vec<RankingRecord> = raw
        .iter()
        .enumerate()
        .map(|(i, entry)| normalize_entry(entry, arrival_rank(i)))
        .filter(|record| record.participant_id.is_none() || seen.insert(record.clone()))
        .collect();

    records.sort_by(compare_records);

    let mut previous = 0u32;
    for record in &mut records {
        if record.rank <= previous {
            record.rank = previous.saturating_add(1);
        }
        previous = record.rank;
    }
    records
}

fn arrival_rank(index: usize) -> u32 {
    u32::try_from(index).map_or(u32::MAX, |i| i.saturating_add(1))
}

fn compare_records(a: &RankingRecord, b: &RankingRecord) -> Ordering {
    a.rank
        .cmp(&b.rank)
        .then_with(|| a.participant_name.cmp(&b.participant_name))
}

fn normalize_entry(entry: &RawRecord, arrival: u32) -> RankingRecord {
    let rank = lookup(entry, RANK_KEYS)
        .and_then(as_integer)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n > 0)
        .unwrap_or(arrival);

    let participant_id = lookup(entry, ID_KEYS).map(as_text);

    let participant_name = lookup(entry, NAME_KEYS)
        .map(as_text)
        .or_else(|| participant_id.clone())
        .unwrap_or_default();

    let points = lookup(entry, POINT_KEYS).and_then(as_integer).unwrap_or(0);

    RankingRecord { rank, participant_name, points, participant_id }
}

/// First candidate key present with a non-null value.
fn lookup<'a>(entry: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|k| entry.get(*k).filter(|v| !v.is_null()))
}

/// Integers, integral floats and strings that parse as integers. Nothing else.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .filter(|f| (i64::MIN as f64..=i64::MAX as f64).contains(f))
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
