use jobly_core::testing::{self as cert, Stores};
use jobly_sqlite::{SqliteConfig, SqliteDatabase};
use std::sync::Arc;

async fn seeded() -> (Stores, Vec<i64>) {
    let db = SqliteDatabase::connect(&SqliteConfig::in_memory())
        .await
        .unwrap();
    let stores = Stores::new(Arc::new(db));
    let job_ids = cert::seed(&stores).await;
    (stores, job_ids)
}

#[tokio::test]
async fn register_should_return_user() {
    let (stores, _) = seeded().await;
    cert::test_user_register_returns_record(&stores).await;
}

#[tokio::test]
async fn register_should_reject_duplicate_username() {
    let (stores, _) = seeded().await;
    cert::test_user_duplicate_is_rejected(&stores).await;
}

#[tokio::test]
async fn find_all_should_list_users_by_username() {
    let (stores, _) = seeded().await;
    cert::test_user_find_all(&stores).await;
}

#[tokio::test]
async fn update_should_change_only_given_fields() {
    let (stores, _) = seeded().await;
    cert::test_user_update_round_trip(&stores).await;
}

#[tokio::test]
async fn apply_to_job_should_record_application() {
    let (stores, job_ids) = seeded().await;
    cert::test_user_apply_to_job(&stores, &job_ids).await;
}

#[tokio::test]
async fn remove_should_delete_user() {
    let (stores, job_ids) = seeded().await;
    cert::test_user_remove(&stores, &job_ids).await;
}
