/// URL shapes for the SHOWROOM event API.
///
/// The ranking contract is undocumented, so a ranking is located by probing a
/// fixed, ordered list of candidate templates. Identifier-based paths go first:
/// some of the key-based paths answer 200 with an unrelated payload instead of
/// a clean 404.
use crate::EventFilter;
use reqwest::Url;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPath {
    Ranking,
    RankList,
    RoomRanking,
}

impl RankingPath {
    pub fn segment(self) -> &'static str {
        match self {
            RankingPath::Ranking => "ranking",
            RankingPath::RankList => "rank_list",
            RankingPath::RoomRanking => "room_ranking",
        }
    }
}

const BY_ID_ORDER: [RankingPath; 3] = [
    RankingPath::Ranking,
    RankingPath::RankList,
    RankingPath::RoomRanking,
];

const BY_KEY_ORDER: [RankingPath; 3] = [
    RankingPath::Ranking,
    RankingPath::RoomRanking,
    RankingPath::RankList,
];

/// One candidate ranking endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndpointTemplate {
    /// `/api/event/{path}?event_id={id}&page={n}`
    ById { path: RankingPath },
    /// `/api/event/{key}/{path}?page={n}`
    ByKey { key: String, path: RankingPath },
}

impl EndpointTemplate {
    pub fn path(&self) -> RankingPath {
        match self {
            EndpointTemplate::ById { path } | EndpointTemplate::ByKey { path, .. } => *path,
        }
    }

    pub fn is_key_based(&self) -> bool {
        matches!(self, EndpointTemplate::ByKey { .. })
    }

    /// Concrete URL for one page of this template.
    pub fn url(&self, base: &Url, event_id: i64, page: u32) -> Url {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "event"]);
            if let EndpointTemplate::ByKey { key, .. } = self {
                segments.push(key);
            }
            segments.push(self.path().segment());
        }
        {
            let mut query = url.query_pairs_mut();
            if let EndpointTemplate::ById { .. } = self {
                query.append_pair("event_id", &event_id.to_string());
            }
            query.append_pair("page", &page.to_string());
        }
        url
    }
}

impl fmt::Display for EndpointTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointTemplate::ById { path } => write!(
                f,
                "/api/event/{}?event_id={{event_id}}&page={{page}}",
                path.segment()
            ),
            EndpointTemplate::ByKey { key, path } => {
                write!(f, "/api/event/{key}/{}?page={{page}}", path.segment())
            }
        }
    }
}

/// Ordered candidate templates for one event. Blank keys count as absent.
pub fn candidate_templates(event_key: Option<&str>) -> Vec<EndpointTemplate> {
    let mut templates: Vec<EndpointTemplate> = BY_ID_ORDER
        .iter()
        .map(|&path| EndpointTemplate::ById { path })
        .collect();

    if let Some(key) = event_key.map(str::trim).filter(|k| !k.is_empty()) {
        templates.extend(BY_KEY_ORDER.iter().map(|&path| EndpointTemplate::ByKey {
            key: key.to_owned(),
            path,
        }));
    }
    templates
}

/// `/api/event/search?page={n}&include_ended={0|1}`
pub fn event_search_url(base: &Url, page: u32, filter: EventFilter) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(["api", "event", "search"]);
    }
    url.query_pairs_mut()
        .append_pair("page", &page.to_string())
        .append_pair("include_ended", &filter.include_ended().to_string());
    url
}
