use mockito::{Matcher, Server, ServerGuard};
use showroom_api::{
    ApiConfig, EndpointTemplate, EventFilter, ProbeResult, RankingPath, ShowroomApi,
    TemplateOutcome,
};
use std::time::{Duration, Instant};

fn api(server: &ServerGuard) -> ShowroomApi {
    let config = ApiConfig::default()
        .with_base_url(server.url())
        .with_pacing(Duration::ZERO)
        .with_timeout(Duration::from_secs(5));
    ShowroomApi::with_config(config).expect("mock server url should be valid")
}

fn query(pairs: &[(&str, &str)]) -> Matcher {
    Matcher::AllOf(
        pairs
            .iter()
            .map(|(k, v)| Matcher::UrlEncoded((*k).into(), (*v).into()))
            .collect(),
    )
}

fn json_mock(server: &mut ServerGuard, path: &str, q: Matcher, body: &str) -> mockito::Mock {
    server
        .mock("GET", path)
        .match_query(q)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}

fn found(result: ProbeResult) -> showroom_api::ResolvedRanking {
    match result {
        ProbeResult::Found(found) => found,
        ProbeResult::Failed(failure) => panic!("expected a ranking, got failure: {failure:?}"),
    }
}

fn failed(result: ProbeResult) -> showroom_api::ProbeFailure {
    match result {
        ProbeResult::Failed(failure) => failure,
        ProbeResult::Found(found) => panic!("expected failure, got ranking: {found:?}"),
    }
}

// ---------------------------------------------------------------------------
// Event lister
// ---------------------------------------------------------------------------

#[test]
fn list_events_requests_every_page_and_skips_failures() {
    let mut server = Server::new();
    let p1 = json_mock(
        &mut server,
        "/api/event/search",
        query(&[("page", "1"), ("include_ended", "1")]),
        r#"{"event_list":[{"event_id":1,"event_name":"A"},{"event_id":2,"event_name":"B"}]}"#,
    );
    let p2 = server
        .mock("GET", "/api/event/search")
        .match_query(query(&[("page", "2"), ("include_ended", "1")]))
        .with_status(500)
        .with_body("boom")
        .create();
    let p3 = json_mock(
        &mut server,
        "/api/event/search",
        query(&[("page", "3"), ("include_ended", "1")]),
        r#"{"event_list":[{"event_id":2,"event_name":"B"}]}"#,
    );
    let p4 = json_mock(
        &mut server,
        "/api/event/search",
        query(&[("page", "4"), ("include_ended", "1")]),
        "not json",
    );

    let listing = api(&server).list_events(4, EventFilter::All);

    p1.assert();
    p2.assert();
    p3.assert();
    p4.assert();
    assert_eq!(listing.pages_requested, 4);
    assert_eq!(listing.pages_ok, 2);
    assert_eq!(listing.pages_failed(), 2);
    let ids: Vec<i64> = listing.events.iter().map(|e| e.event_id).collect();
    assert_eq!(ids, vec![1, 2, 2], "pages concatenate in order without dedup");
}

#[test]
fn list_events_page_without_event_list_is_not_an_error() {
    let mut server = Server::new();
    let page = json_mock(
        &mut server,
        "/api/event/search",
        query(&[("page", "1"), ("include_ended", "0")]),
        r#"{"total_entries":0}"#,
    );

    let listing = api(&server).list_events(1, EventFilter::Ongoing);

    page.assert();
    assert!(listing.is_empty());
    assert_eq!(listing.pages_ok, 1);
}

#[test]
fn ended_filter_keeps_only_past_events() {
    let mut server = Server::new();
    let page = json_mock(
        &mut server,
        "/api/event/search",
        query(&[("page", "1"), ("include_ended", "1")]),
        r#"{"event_list":[
            {"event_id":1,"event_name":"old","ended_at":1600000000},
            {"event_id":2,"event_name":"future","ended_at":4102444800},
            {"event_id":3,"event_name":"unknown"}
        ]}"#,
    );

    let listing = api(&server).list_events(1, EventFilter::Ended);

    page.assert();
    let ids: Vec<i64> = listing.events.iter().map(|e| e.event_id).collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn requests_carry_a_browser_user_agent() {
    let mut server = Server::new();
    let page = server
        .mock("GET", "/api/event/search")
        .match_query(Matcher::Any)
        .match_header("user-agent", Matcher::Regex("^Mozilla/5.0".into()))
        .with_status(200)
        .with_body(r#"{"event_list":[]}"#)
        .create();

    let listing = api(&server).list_events(1, EventFilter::All);

    page.assert();
    assert_eq!(listing.pages_ok, 1);
}

// ---------------------------------------------------------------------------
// Ranking resolver
// ---------------------------------------------------------------------------

#[test]
fn rejected_template_falls_through_to_next_candidate() {
    let mut server = Server::new();
    let a = server
        .mock("GET", "/api/event/ranking")
        .match_query(Matcher::Any)
        .with_status(404)
        .create();
    let b1 = json_mock(
        &mut server,
        "/api/event/rank_list",
        query(&[("event_id", "10"), ("page", "1")]),
        r#"{"rank_list":[{"rank":1,"room_name":"Solo","point":42}]}"#,
    );
    let b2 = json_mock(
        &mut server,
        "/api/event/rank_list",
        query(&[("event_id", "10"), ("page", "2")]),
        r#"{"rank_list":[]}"#,
    );
    let c = server
        .mock("GET", "/api/event/room_ranking")
        .match_query(Matcher::Any)
        .expect(0)
        .create();

    let ranking = found(api(&server).resolve_ranking(10, None, 5));

    a.assert();
    b1.assert();
    b2.assert();
    c.assert();
    assert_eq!(ranking.template, EndpointTemplate::ById { path: RankingPath::RankList });
    assert_eq!(ranking.records.len(), 1);
    assert_eq!(ranking.records[0].participant_name, "Solo");
    assert_eq!(ranking.records[0].points, 42);
    assert!(ranking.attempted[0].contains("/api/event/ranking?event_id=10&page=1"));
}

#[test]
fn pagination_stops_at_first_empty_page() {
    let mut server = Server::new();
    let mut pages = Vec::new();
    for page in 1..=3 {
        let body = format!(
            r#"{{"ranking":[{{"rank":{},"room_name":"R{page}a","point":{}}},{{"rank":{},"room_name":"R{page}b","point":{}}}]}}"#,
            page * 2 - 1,
            1000 - page * 10,
            page * 2,
            1000 - page * 10 - 5
        );
        let page = page.to_string();
        pages.push(json_mock(
            &mut server,
            "/api/event/ranking",
            query(&[("event_id", "7"), ("page", page.as_str())]),
            &body,
        ));
    }
    let empty = json_mock(
        &mut server,
        "/api/event/ranking",
        query(&[("event_id", "7"), ("page", "4")]),
        r#"{"ranking":[]}"#,
    );
    let beyond = server
        .mock("GET", "/api/event/ranking")
        .match_query(query(&[("event_id", "7"), ("page", "5")]))
        .expect(0)
        .create();

    let ranking = found(api(&server).resolve_ranking(7, None, 10));

    for m in &pages {
        m.assert();
    }
    empty.assert();
    beyond.assert();
    assert_eq!(ranking.records.len(), 6);
    assert_eq!(ranking.attempted.len(), 4);
    let ranks: Vec<u32> = ranking.records.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn pagination_is_bounded_by_max_pages() {
    let mut server = Server::new();
    let m = server
        .mock("GET", "/api/event/ranking")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"ranking":[{"rank":1,"room_name":"Same","point":1,"room_id":8}]}"#)
        .expect(2)
        .create();

    let ranking = found(api(&server).resolve_ranking(1, None, 2));

    m.assert();
    assert_eq!(ranking.attempted.len(), 2);
    // Both pages carried the same room; it is collapsed.
    assert_eq!(ranking.records.len(), 1);
}

#[test]
fn failure_after_first_page_keeps_accumulated_records() {
    let mut server = Server::new();
    let p1 = json_mock(
        &mut server,
        "/api/event/ranking",
        query(&[("event_id", "5"), ("page", "1")]),
        r#"[{"rank":1,"user_name":"Top","points":99}]"#,
    );
    let p2 = server
        .mock("GET", "/api/event/ranking")
        .match_query(query(&[("event_id", "5"), ("page", "2")]))
        .with_status(503)
        .create();
    let next = server
        .mock("GET", "/api/event/rank_list")
        .match_query(Matcher::Any)
        .expect(0)
        .create();

    let ranking = found(api(&server).resolve_ranking(5, None, 5));

    p1.assert();
    p2.assert();
    next.assert();
    assert_eq!(ranking.template, EndpointTemplate::ById { path: RankingPath::Ranking });
    assert_eq!(ranking.records[0].participant_name, "Top");
    assert_eq!(ranking.records[0].points, 99);
}

#[test]
fn unrelated_payload_on_first_page_disqualifies_template() {
    let mut server = Server::new();
    let unrelated = json_mock(
        &mut server,
        "/api/event/ranking",
        query(&[("event_id", "3"), ("page", "1")]),
        r#"{"event":{"event_id":3},"banners":[{"image":"x.png"}]}"#,
    );
    let malformed = json_mock(
        &mut server,
        "/api/event/rank_list",
        query(&[("event_id", "3"), ("page", "1")]),
        "<html>maintenance</html>",
    );
    let good = json_mock(
        &mut server,
        "/api/event/room_ranking",
        query(&[("event_id", "3"), ("page", "1")]),
        r#"{"list":[{"room_id":77}]}"#,
    );
    let good_end = json_mock(
        &mut server,
        "/api/event/room_ranking",
        query(&[("event_id", "3"), ("page", "2")]),
        r#"{"list":[]}"#,
    );

    let ranking = found(api(&server).resolve_ranking(3, None, 3));

    unrelated.assert();
    malformed.assert();
    good.assert();
    good_end.assert();
    assert_eq!(ranking.template, EndpointTemplate::ById { path: RankingPath::RoomRanking });
    assert_eq!(ranking.records[0].rank, 1);
    assert_eq!(ranking.records[0].participant_name, "77");
    assert_eq!(ranking.records[0].points, 0);
}

#[test]
fn all_templates_failing_returns_diagnostics() {
    let mut server = Server::new();
    let rejected = server
        .mock("GET", Matcher::Regex("^/api/event/".into()))
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"errors":[{"message":"not found"}]}"#)
        .expect(6)
        .create();

    let failure = failed(api(&server).resolve_ranking(10, Some("e1"), 5));

    rejected.assert();
    assert_eq!(failure.attempted.len(), 6);
    assert!(failure.attempted[0].ends_with("/api/event/ranking?event_id=10&page=1"));
    assert!(failure.attempted[5].ends_with("/api/event/e1/rank_list?page=1"));
    assert_eq!(failure.templates.len(), 6);
    assert!(failure
        .templates
        .iter()
        .all(|t| t.outcome == TemplateOutcome::Rejected { status: 404 }));
    assert!(!failure.all_exhausted());

    let last = failure.last_observation.expect("last response should be recorded");
    assert_eq!(last.status, Some(404));
    assert!(last.url.ends_with("/api/event/e1/rank_list?page=1"));
    assert!(last.body_sample.contains("not found"));
}

#[test]
fn requests_after_the_first_are_paced() {
    let mut server = Server::new();
    let rejected = server
        .mock("GET", Matcher::Regex("^/api/event/".into()))
        .match_query(Matcher::Any)
        .with_status(404)
        .expect(6)
        .create();
    let pacing = Duration::from_millis(100);
    let config = ApiConfig::default()
        .with_base_url(server.url())
        .with_pacing(pacing)
        .with_timeout(Duration::from_secs(5));
    let api = ShowroomApi::with_config(config).expect("mock server url should be valid");

    let started = Instant::now();
    let failure = failed(api.resolve_ranking(1, Some("k"), 3));
    let elapsed = started.elapsed();

    rejected.assert();
    assert_eq!(failure.attempted.len(), 6);
    assert!(
        elapsed >= pacing * 5,
        "six requests should be separated by five delays, took {elapsed:?}"
    );
}

#[test]
fn single_request_is_not_delayed() {
    let mut server = Server::new();
    let page = json_mock(
        &mut server,
        "/api/event/ranking",
        query(&[("event_id", "2"), ("page", "1")]),
        r#"{"ranking":[{"rank":1,"room_name":"Only","point":1}]}"#,
    );
    let config = ApiConfig::default()
        .with_base_url(server.url())
        .with_pacing(Duration::from_secs(3))
        .with_timeout(Duration::from_secs(5));
    let api = ShowroomApi::with_config(config).expect("mock server url should be valid");

    let started = Instant::now();
    let ranking = found(api.resolve_ranking(2, None, 1));

    page.assert();
    assert_eq!(ranking.attempted.len(), 1);
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "the first request must not wait for the pacing delay"
    );
}

#[test]
fn empty_rankings_everywhere_are_reported_as_exhausted() {
    let mut server = Server::new();
    let empty = server
        .mock("GET", Matcher::Regex("^/api/event/".into()))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"ranking":[]}"#)
        .expect(3)
        .create();

    let failure = failed(api(&server).resolve_ranking(42, None, 5));

    empty.assert();
    assert!(failure.all_exhausted());
    let last = failure.last_observation.expect("empty page is recorded");
    assert_eq!(last.status, Some(200));
    assert_eq!(last.body_sample, r#"{"ranking":[]}"#);
}

#[test]
fn unreachable_upstream_is_a_structured_failure() {
    let config = ApiConfig::default()
        .with_base_url("http://127.0.0.1:1")
        .with_pacing(Duration::ZERO)
        .with_timeout(Duration::from_secs(2));
    let api = ShowroomApi::with_config(config).expect("valid url");

    let failure = failed(api.resolve_ranking(1, Some("key"), 3));

    assert_eq!(failure.attempted.len(), 6);
    assert!(failure
        .templates
        .iter()
        .all(|t| t.outcome == TemplateOutcome::Unreachable));
    let last = failure.last_observation.expect("transport failure is recorded");
    assert_eq!(last.status, None);
    assert!(last.body_sample.is_empty());
}

// ---------------------------------------------------------------------------
// End to end: list, pick, resolve
// ---------------------------------------------------------------------------

#[test]
fn key_based_template_wins_when_identifier_paths_are_missing() {
    let mut server = Server::new();
    let search = json_mock(
        &mut server,
        "/api/event/search",
        query(&[("page", "1")]),
        r#"{"event_list":[{"event_id":10,"event_name":"E1","event_url_key":"e1"}]}"#,
    );
    let id_paths: Vec<_> = ["ranking", "rank_list", "room_ranking"]
        .iter()
        .map(|p| {
            server
                .mock("GET", format!("/api/event/{p}").as_str())
                .match_query(query(&[("event_id", "10")]))
                .with_status(404)
                .expect(1)
                .create()
        })
        .collect();
    let key_p1 = json_mock(
        &mut server,
        "/api/event/e1/ranking",
        query(&[("page", "1")]),
        r#"{"ranking":[{"rank":1,"room_name":"X","point":500},{"rank":2,"room_name":"Y","point":300}]}"#,
    );
    let key_p2 = json_mock(
        &mut server,
        "/api/event/e1/ranking",
        query(&[("page", "2")]),
        r#"{"ranking":[]}"#,
    );

    let api = api(&server);
    let listing = api.list_events(1, EventFilter::All);
    search.assert();
    let event = &listing.events[0];
    assert_eq!(event.event_id, 10);

    let ranking = found(api.resolve_ranking(event.event_id, event.event_key.as_deref(), 5));

    for m in &id_paths {
        m.assert();
    }
    key_p1.assert();
    key_p2.assert();
    assert_eq!(
        ranking.template,
        EndpointTemplate::ByKey { key: "e1".into(), path: RankingPath::Ranking }
    );
    let rows: Vec<(u32, &str, i64)> = ranking
        .records
        .iter()
        .map(|r| (r.rank, r.participant_name.as_str(), r.points))
        .collect();
    assert_eq!(rows, vec![(1, "X", 500), (2, "Y", 300)]);
    assert_eq!(ranking.attempted.len(), 5);
}
