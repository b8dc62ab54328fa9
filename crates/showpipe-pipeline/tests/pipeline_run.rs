//! End-to-end runs against a migrated test database and a mocked catalog.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use showpipe_core::{NewCastEntry, NewShow, TopShowCriteria};
use showpipe_pipeline::{
    MemoryStatusStore, Pipeline, PipelineConfig, PipelineError, ProgressTracker, RunStage,
    RunStatus, StatusStore, StatusStoreError,
};
use showpipe_tvmaze::{FetcherConfig, RetryPolicy};

/// Wraps the in-memory store and records every write, in order.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStatusStore,
    history: Mutex<Vec<RunStatus>>,
}

#[async_trait]
impl StatusStore for RecordingStore {
    async fn put(&self, status: &RunStatus) -> Result<(), StatusStoreError> {
        self.history.lock().unwrap().push(status.clone());
        self.inner.put(status).await
    }

    async fn get(&self, run_id: Uuid) -> Result<Option<RunStatus>, StatusStoreError> {
        self.inner.get(run_id).await
    }
}

/// Rejects every write for the enriching stage.
#[derive(Default)]
struct EnrichRejectingStore {
    inner: MemoryStatusStore,
}

#[async_trait]
impl StatusStore for EnrichRejectingStore {
    async fn put(&self, status: &RunStatus) -> Result<(), StatusStoreError> {
        if status.stage == RunStage::Enriching {
            return Err(StatusStoreError::UnknownRun(status.run_id));
        }
        self.inner.put(status).await
    }

    async fn get(&self, run_id: Uuid) -> Result<Option<RunStatus>, StatusStoreError> {
        self.inner.get(run_id).await
    }
}

fn pipeline_config(base_url: &str) -> PipelineConfig {
    PipelineConfig {
        fetcher: FetcherConfig {
            base_url: base_url.to_owned(),
            timeout_secs: 5,
            user_agent: "showpipe-test/0.1".to_owned(),
            concurrency: 5,
            retry: RetryPolicy::new(2, 0),
            inter_batch_delay_ms: 0,
            estimated_total_pages: 10,
            max_pages: 50,
        },
        default_lookback_years: 10,
    }
}

/// Even ids are English, odd ids French. Premiere years step back one year
/// per id within a page, so only some shows fall inside a five-year window.
fn show_json(id: i64, index_in_page: i64) -> serde_json::Value {
    let year = Utc::now().year() - i32::try_from(index_in_page % 10).unwrap();
    json!({
        "id": id,
        "name": format!("Show {id}"),
        "type": "Scripted",
        "language": if id % 2 == 0 { "English" } else { "French" },
        "genres": ["Action", "Drama"],
        "status": "Running",
        "premiered": format!("{year}-03-01"),
        "ended": null,
        "rating": {"average": (id % 10) as f64},
        "summary": null,
        "updated": 1_700_000_000
    })
}

async fn mount_catalog(server: &MockServer, pages: i64, per_page: i64) {
    for page in 0..pages {
        let shows: Vec<serde_json::Value> = (0..per_page)
            .map(|i| show_json(page * per_page + i + 1, i))
            .collect();
        Mock::given(method("GET"))
            .and(path("/shows"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Array(shows)))
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path_regex(r"^/shows/\d+/cast$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "person": {"id": 1, "name": "Lead", "country": null},
            "character": {"id": 1, "name": "Hero", "image": null}
        }])))
        .mount(server)
        .await;
}

#[sqlx::test(migrations = "../../migrations")]
async fn full_run_stores_catalog_and_completes_at_100(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mount_catalog(&server, 3, 20).await;

    let store = Arc::new(RecordingStore::default());
    let tracker = ProgressTracker::new(store.clone());
    let pipeline =
        Pipeline::new(pool.clone(), pipeline_config(&server.uri()), tracker).expect("pipeline");

    let ctx = pipeline.create_run(Some(5)).await.expect("create run");
    let summary = pipeline.run(&ctx).await.expect("run succeeds");

    assert_eq!(summary.shows_fetched, 60);
    assert_eq!(showpipe_db::count_shows(&pool).await.expect("count"), 60);

    let top = showpipe_db::list_top_shows(&pool, 10).await.expect("top");
    assert!(!top.is_empty() && top.len() <= 10);
    let min_year = Utc::now().year() - 5;
    for row in &top {
        assert_eq!(row.language.as_deref(), Some("English"));
        assert!(row.premiered.expect("premiered").year() >= min_year);
    }
    for pair in top.windows(2) {
        assert!(pair[0].rating_average >= pair[1].rating_average);
    }

    let actors_cast = showpipe_db::list_show_cast(&pool, top[0].id).await.expect("cast");
    assert_eq!(actors_cast.len(), 1);

    let history = store.history.lock().unwrap();
    let progress: Vec<u8> = history.iter().map(|s| s.progress).collect();
    assert!(
        progress.windows(2).all(|w| w[0] <= w[1]),
        "progress must never decrease: {progress:?}"
    );
    assert_eq!(progress.iter().filter(|p| **p == 100).count(), 1);

    let last = history.last().expect("at least one write");
    assert_eq!(last.stage, RunStage::Completed);
    assert_eq!(last.progress, 100);
    assert!(!last.running);

    let stages: Vec<RunStage> = history.iter().map(|s| s.stage).collect();
    let first_aggregating = stages.iter().position(|s| *s == RunStage::Aggregating);
    let last_fetching = stages.iter().rposition(|s| *s == RunStage::Fetching);
    assert!(last_fetching < first_aggregating, "stages must not interleave");
}

#[sqlx::test(migrations = "../../migrations")]
async fn stage_failure_marks_run_failed_with_message(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    // Every page has data, so the end of the catalog is never seen.
    Mock::given(method("GET"))
        .and(path("/shows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([show_json(1, 0)])))
        .mount(&server)
        .await;

    let mut config = pipeline_config(&server.uri());
    config.fetcher.max_pages = 10;
    let tracker = ProgressTracker::new(Arc::new(MemoryStatusStore::new()));
    let pipeline = Pipeline::new(pool, config, tracker.clone()).expect("pipeline");

    let ctx = pipeline.create_run(None).await.expect("create run");
    let err = pipeline.run(&ctx).await.unwrap_err();
    assert!(matches!(err, PipelineError::Fetch(_)), "got {err:?}");

    let status = tracker
        .get(ctx.run_id)
        .await
        .expect("get")
        .expect("status exists");
    assert_eq!(status.stage, RunStage::Failed);
    assert!(!status.running);
    assert_eq!(status.error.as_deref(), Some(err.to_string().as_str()));
    assert!(status.progress < 100);
}

#[sqlx::test(migrations = "../../migrations")]
async fn negative_lookback_is_rejected_before_any_status_write(pool: sqlx::PgPool) {
    let store = Arc::new(RecordingStore::default());
    let pipeline = Pipeline::new(
        pool,
        pipeline_config("http://127.0.0.1:9"),
        ProgressTracker::new(store.clone()),
    )
    .expect("pipeline");

    let Err(err) = pipeline.create_run(Some(-1)).await else {
        panic!("negative lookback must be rejected");
    };
    assert!(matches!(err, PipelineError::InvalidLookback(_)), "got {err:?}");
    assert!(store.history.lock().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn started_run_is_visible_immediately(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mount_catalog(&server, 1, 5).await;

    let tracker = ProgressTracker::new(Arc::new(MemoryStatusStore::new()));
    let pipeline = Arc::new(
        Pipeline::new(pool, pipeline_config(&server.uri()), tracker.clone()).expect("pipeline"),
    );

    let run_id = Arc::clone(&pipeline)
        .start(Some(3))
        .await
        .expect("start")
        .run_id;
    assert!(tracker.get(run_id).await.expect("get").is_some());

    // Wait for the background task to finish.
    for _ in 0..100 {
        let status = tracker.get(run_id).await.expect("get").expect("status");
        if status.stage.is_terminal() {
            assert_eq!(status.stage, RunStage::Completed, "error: {:?}", status.error);
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    panic!("run did not finish in time");
}

async fn mount_single_page(server: &MockServer, shows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/shows"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(shows))
        .mount(server)
        .await;
}

fn cast_json(person_id: i64) -> serde_json::Value {
    json!([{
        "person": {"id": person_id, "name": format!("Person {person_id}"), "country": null},
        "character": {"id": person_id * 10, "name": "Hero", "image": null}
    }])
}

#[sqlx::test(migrations = "../../migrations")]
async fn one_failing_cast_fetch_keeps_other_cast_rows(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mount_single_page(
        &server,
        json!([show_json(2, 0), show_json(4, 1), show_json(6, 2)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/shows/4/cast"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    for id in [2, 6] {
        Mock::given(method("GET"))
            .and(path(format!("/shows/{id}/cast")))
            .respond_with(ResponseTemplate::new(200).set_body_json(cast_json(id)))
            .mount(&server)
            .await;
    }

    let tracker = ProgressTracker::new(Arc::new(MemoryStatusStore::new()));
    let pipeline = Pipeline::new(pool.clone(), pipeline_config(&server.uri()), tracker.clone())
        .expect("pipeline");

    let ctx = pipeline.create_run(Some(5)).await.expect("create run");
    let summary = pipeline.run(&ctx).await.expect("run succeeds");

    assert_eq!(summary.top_shows, 3);
    assert_eq!(summary.cast_failures, 1);
    assert_eq!(summary.cast_entries, 2);
    assert_eq!(showpipe_db::list_show_cast(&pool, 2).await.expect("cast 2").len(), 1);
    assert_eq!(showpipe_db::list_show_cast(&pool, 6).await.expect("cast 6").len(), 1);
    assert!(showpipe_db::list_show_cast(&pool, 4).await.expect("cast 4").is_empty());

    let status = tracker.get(ctx.run_id).await.expect("get").expect("status");
    assert_eq!(status.stage, RunStage::Completed);
}

#[sqlx::test(migrations = "../../migrations")]
async fn failed_enrichment_leaves_no_cast_from_previous_top_set(pool: sqlx::PgPool) {
    let year = Utc::now().year();
    let previous = NewShow {
        id: 1,
        name: "Show 1".to_string(),
        show_type: Some("Scripted".to_string()),
        language: Some("English".to_string()),
        genres: vec!["Action".to_string()],
        status: Some("Running".to_string()),
        premiered: chrono::NaiveDate::from_ymd_opt(year, 1, 1),
        ended: None,
        rating_average: Some(5.0),
        summary: None,
        source_updated: None,
    };
    showpipe_db::upsert_shows(&pool, &[previous]).await.expect("seed show");
    showpipe_db::recompute_top_shows(&pool, &TopShowCriteria::english_action(5))
        .await
        .expect("seed top");
    showpipe_db::replace_show_cast(
        &pool,
        &[NewCastEntry {
            show_id: 1,
            show_name: "Show 1".to_string(),
            person_id: Some(10),
            person_name: Some("Person 10".to_string()),
            person_birthday: None,
            person_deathday: None,
            person_gender: None,
            person_country_name: None,
            character_id: Some(100),
            character_name: Some("Old Hero".to_string()),
            image: None,
        }],
    )
    .await
    .expect("seed cast");

    // Show 1 turns French, show 2 is the only English candidate.
    let server = MockServer::start().await;
    mount_single_page(&server, json!([show_json(1, 0), show_json(2, 1)])).await;

    let tracker = ProgressTracker::new(Arc::new(EnrichRejectingStore::default()));
    let pipeline =
        Pipeline::new(pool.clone(), pipeline_config(&server.uri()), tracker).expect("pipeline");

    let ctx = pipeline.create_run(Some(5)).await.expect("create run");
    let Err(err) = pipeline.run(&ctx).await else {
        panic!("enrichment status write must fail the run");
    };
    assert!(matches!(err, PipelineError::Status(_)), "got {err:?}");

    let top_ids: Vec<i64> = showpipe_db::list_top_show_refs(&pool)
        .await
        .expect("refs")
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(top_ids, vec![2]);
    assert!(showpipe_db::list_show_cast(&pool, 1).await.expect("cast 1").is_empty());
    assert!(showpipe_db::list_show_cast(&pool, 2).await.expect("cast 2").is_empty());
}
