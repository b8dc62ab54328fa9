use super::*;

fn config(base_url: &str) -> FetcherConfig {
    FetcherConfig {
        base_url: base_url.to_owned(),
        timeout_secs: 5,
        user_agent: "showpipe-test/0.1".to_owned(),
        concurrency: 5,
        retry: RetryPolicy::new(1, 0),
        inter_batch_delay_ms: 0,
        estimated_total_pages: 10,
        max_pages: 100,
    }
}

#[test]
fn shows_url_uses_page_query() {
    let client = TvMazeClient::new(config("https://api.tvmaze.com")).unwrap();
    assert_eq!(client.shows_url(0), "https://api.tvmaze.com/shows?page=0");
    assert_eq!(client.shows_url(12), "https://api.tvmaze.com/shows?page=12");
}

#[test]
fn cast_url_embeds_show_id() {
    let client = TvMazeClient::new(config("https://api.tvmaze.com")).unwrap();
    assert_eq!(client.cast_url(82), "https://api.tvmaze.com/shows/82/cast");
}

#[test]
fn new_strips_trailing_slash() {
    let client = TvMazeClient::new(config("https://api.tvmaze.com/")).unwrap();
    assert_eq!(client.config().base_url, "https://api.tvmaze.com");
    assert_eq!(client.shows_url(1), "https://api.tvmaze.com/shows?page=1");
}

#[test]
fn new_rejects_invalid_base_url() {
    let result = TvMazeClient::new(config("not-a-url"));
    assert!(
        matches!(result, Err(FetchError::InvalidBaseUrl { .. })),
        "expected InvalidBaseUrl"
    );
}

#[test]
fn new_raises_zero_concurrency_to_one() {
    let mut cfg = config("https://api.tvmaze.com");
    cfg.concurrency = 0;
    let client = TvMazeClient::new(cfg).unwrap();
    assert_eq!(client.config().concurrency, 1);
}

#[test]
fn only_end_of_data_is_terminal() {
    assert!(PageFetchResult::EndOfData.is_terminal());
    assert!(!PageFetchResult::Shows(Vec::new()).is_terminal());
    assert!(!PageFetchResult::Failed(FetchError::UnexpectedStatus {
        status: 500,
        url: "u".to_owned(),
    })
    .is_terminal());
}

#[test]
fn decode_shows_keeps_valid_records_around_a_bad_one() {
    let items = vec![
        serde_json::json!({"id": 1, "name": "One"}),
        serde_json::json!({"name": "no id"}),
        serde_json::json!({"id": 3, "name": null}),
    ];
    let shows = decode_shows(0, items);
    let ids: Vec<i64> = shows.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(shows[1].name, "");
}
