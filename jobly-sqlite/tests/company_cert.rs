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
async fn create_should_return_company() {
    let (stores, _) = seeded().await;
    cert::test_company_create_returns_record(&stores).await;
}

#[tokio::test]
async fn create_should_reject_duplicate_handle() {
    let (stores, _) = seeded().await;
    cert::test_company_duplicate_is_rejected(&stores).await;
}

#[tokio::test]
async fn find_all_should_list_every_company_by_name() {
    let (stores, _) = seeded().await;
    cert::test_company_find_all_unfiltered(&stores).await;
}

#[tokio::test]
async fn find_all_should_match_name_case_insensitively() {
    let (stores, _) = seeded().await;
    cert::test_company_find_all_by_name(&stores).await;
}

#[tokio::test]
async fn find_all_should_fold_name_case_like_in_memory_filter() {
    let (stores, _) = seeded().await;
    cert::test_company_name_filter_agrees_with_in_memory(&stores).await;
}

#[tokio::test]
async fn find_all_should_honour_employee_range() {
    let (stores, _) = seeded().await;
    cert::test_company_find_all_by_employee_range(&stores).await;
}

#[tokio::test]
async fn find_all_should_reject_min_above_max() {
    let (stores, _) = seeded().await;
    cert::test_company_inverted_range_is_rejected(&stores).await;
}

#[tokio::test]
async fn get_should_include_jobs() {
    let (stores, _) = seeded().await;
    cert::test_company_get_includes_jobs(&stores).await;
}

#[tokio::test]
async fn update_should_change_only_given_fields() {
    let (stores, _) = seeded().await;
    cert::test_company_update_round_trip(&stores).await;
}

#[tokio::test]
async fn update_should_accept_null_values() {
    let (stores, _) = seeded().await;
    cert::test_company_update_null_field(&stores).await;
}

#[tokio::test]
async fn update_should_report_missing_and_empty() {
    let (stores, _) = seeded().await;
    cert::test_company_update_errors(&stores).await;
}

#[tokio::test]
async fn remove_should_delete_company_and_jobs() {
    let (stores, job_ids) = seeded().await;
    cert::test_company_remove_cascades_jobs(&stores, &job_ids).await;
}
