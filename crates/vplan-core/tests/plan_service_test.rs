//! Integration tests for the plan service layer.
//!
//! Each test creates a unique temporary database (shared container via
//! vplan-test-utils), runs migrations, and drops it on completion.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use vplan_core::pdf::PdfRenderer;
use vplan_core::plan::service::{self, PlanError};
use vplan_db::models::Participant;
use vplan_test_utils::{create_test_db, drop_test_db};

/// Renderer stub: returns fixed bytes and counts invocations, so tests can
/// assert the converter is skipped for missing records.
struct StubRenderer {
    calls: AtomicUsize,
}

impl StubRenderer {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfRenderer for StubRenderer {
    fn name(&self) -> &str {
        "stub"
    }

    async fn render(&self, _html: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(b"%PDF-1.4 stub".to_vec())
    }
}

fn valid_body() -> serde_json::Value {
    json!({
        "title": "Summer Vacation",
        "description": "Let's go to the most famous resort in Brazil",
        "date": "2024-12-12",
        "location": "Fernando de Noronha",
        "participants": ["Pedro", "Maria"],
    })
}

#[tokio::test]
async fn create_persists_and_transforms_participants() {
    let (pool, db_name) = create_test_db().await;

    let created = service::create(&pool, &valid_body())
        .await
        .expect("create should succeed");

    let fetched = service::get(&pool, created.id)
        .await
        .expect("get should succeed");

    assert_eq!(fetched.title, "Summer Vacation");
    assert_eq!(
        fetched.description.as_deref(),
        Some("Let's go to the most famous resort in Brazil")
    );
    assert_eq!(fetched.date.to_string(), "2024-12-12");
    assert_eq!(fetched.location, "Fernando de Noronha");
    assert_eq!(
        fetched.participants.0,
        vec![Participant::new("Pedro"), Participant::new("Maria")]
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn create_without_optional_fields() {
    let (pool, db_name) = create_test_db().await;

    let body = json!({
        "title": "Weekend trip",
        "date": "2025-03-01",
        "location": "Ubatuba",
    });
    let created = service::create(&pool, &body)
        .await
        .expect("create should succeed");

    assert_eq!(created.description, None);
    assert!(created.participants.0.is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn failed_validation_leaves_table_unchanged() {
    let (pool, db_name) = create_test_db().await;

    let body = json!({"description": "no title", "date": "not-a-date"});
    let err = service::create(&pool, &body)
        .await
        .expect_err("create should fail validation");

    match err {
        PlanError::Validation(errors) => {
            assert!(errors.get("title").is_some());
            assert!(errors.get("date").is_some());
            assert!(errors.get("location").is_some());
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let plans = service::list(&pool).await.expect("list should succeed");
    assert!(plans.is_empty(), "no row may be inserted on failure");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn get_unknown_id_is_not_found() {
    let (pool, db_name) = create_test_db().await;

    let err = service::get(&pool, 4242).await.expect_err("should fail");
    assert!(matches!(err, PlanError::NotFound));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn list_distinguishes_empty_from_populated() {
    let (pool, db_name) = create_test_db().await;

    let plans = service::list(&pool).await.expect("list should succeed");
    assert!(plans.is_empty());

    service::create(&pool, &valid_body())
        .await
        .expect("create should succeed");

    let plans = service::list(&pool).await.expect("list should succeed");
    assert_eq!(plans.len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_replaces_every_field() {
    let (pool, db_name) = create_test_db().await;

    let created = service::create(&pool, &valid_body())
        .await
        .expect("create should succeed");

    let replacement = json!({
        "title": "Winter Trip",
        "date": "2025-07-20",
        "location": "Bariloche",
        "participants": ["Bianca"],
    });
    let updated = service::update(&pool, created.id, &replacement)
        .await
        .expect("update should succeed");

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Winter Trip");
    assert_eq!(updated.description, None, "omitted description is cleared");
    assert_eq!(updated.date.to_string(), "2025-07-20");
    assert_eq!(updated.location, "Bariloche");
    assert_eq!(updated.participants.0, vec![Participant::new("Bianca")]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_requires_all_required_fields_again() {
    let (pool, db_name) = create_test_db().await;

    let created = service::create(&pool, &valid_body())
        .await
        .expect("create should succeed");

    let partial = json!({"title": "Only a title"});
    let err = service::update(&pool, created.id, &partial)
        .await
        .expect_err("partial update should fail validation");
    assert!(matches!(err, PlanError::Validation(_)));

    // The row is untouched.
    let fetched = service::get(&pool, created.id)
        .await
        .expect("get should succeed");
    assert_eq!(fetched.title, "Summer Vacation");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_unknown_id_is_not_found_even_with_bad_body() {
    let (pool, db_name) = create_test_db().await;

    // Locating the record comes first, so not-found wins over validation.
    let err = service::update(&pool, 4242, &json!({}))
        .await
        .expect_err("should fail");
    assert!(matches!(err, PlanError::NotFound));

    let err = service::update(&pool, 4242, &valid_body())
        .await
        .expect_err("should fail");
    assert!(matches!(err, PlanError::NotFound));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_removes_record() {
    let (pool, db_name) = create_test_db().await;

    let created = service::create(&pool, &valid_body())
        .await
        .expect("create should succeed");

    service::delete(&pool, created.id)
        .await
        .expect("delete should succeed");

    let err = service::get(&pool, created.id)
        .await
        .expect_err("record should be gone");
    assert!(matches!(err, PlanError::NotFound));

    let err = service::delete(&pool, created.id)
        .await
        .expect_err("second delete should fail");
    assert!(matches!(err, PlanError::NotFound));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn export_pdf_returns_renderer_bytes() {
    let (pool, db_name) = create_test_db().await;

    let created = service::create(&pool, &valid_body())
        .await
        .expect("create should succeed");

    let renderer = StubRenderer::new();
    let bytes = service::export_pdf(&pool, created.id, &renderer)
        .await
        .expect("export should succeed");

    assert!(!bytes.is_empty());
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(renderer.calls(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn export_pdf_unknown_id_skips_renderer() {
    let (pool, db_name) = create_test_db().await;

    let renderer = StubRenderer::new();
    let err = service::export_pdf(&pool, 4242, &renderer)
        .await
        .expect_err("should fail");
    assert!(matches!(err, PlanError::NotFound));
    assert_eq!(renderer.calls(), 0, "renderer must not run for missing ids");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn round_trip_preserves_input_fields() {
    let (pool, db_name) = create_test_db().await;

    let body = json!({
        "title": "Carnival",
        "description": "Street parades",
        "date": "2025-02-28",
        "location": "Olinda",
        "participants": ["Ana", "Bia", "Caio"],
    });
    let created = service::create(&pool, &body)
        .await
        .expect("create should succeed");
    let fetched = service::get(&pool, created.id)
        .await
        .expect("get should succeed");

    assert_eq!(fetched.title, body["title"].as_str().unwrap());
    assert_eq!(
        fetched.description.as_deref(),
        body["description"].as_str()
    );
    assert_eq!(fetched.date.to_string(), body["date"].as_str().unwrap());
    assert_eq!(fetched.location, body["location"].as_str().unwrap());
    let expected: Vec<Participant> = body["participants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| Participant::new(v.as_str().unwrap()))
        .collect();
    assert_eq!(fetched.participants.0, expected);

    pool.close().await;
    drop_test_db(&db_name).await;
}
