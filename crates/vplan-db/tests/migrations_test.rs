//! Verify the embedded migrations produce the expected schema.

use vplan_db::pool;
use vplan_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn migrations_create_holiday_plans_table() {
    let (pool, db_name) = create_test_db().await;

    let counts = pool::table_counts(&pool)
        .await
        .expect("table_counts should succeed");

    let holiday_plans = counts
        .iter()
        .find(|(name, _)| name == "holiday_plans")
        .expect("holiday_plans table should exist");
    assert_eq!(holiday_plans.1, 0, "fresh table should be empty");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let (pool, db_name) = create_test_db().await;

    // create_test_db already ran them once; a second run must be a no-op.
    pool::run_migrations(&pool)
        .await
        .expect("re-running migrations should succeed");

    pool.close().await;
    drop_test_db(&db_name).await;
}
