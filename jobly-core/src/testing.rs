//! Store certification suite. Each adapter runs these against a freshly
//! created, empty schema.

use crate::{
    apply_filters, CompanyFilter, CompanyStore, Database, FilterFields, JobFilter, JobStore,
    JoblyError, NewCompany, NewJob, NewUser, Record, UpdatePayload, UserStore,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct Stores {
    pub companies: CompanyStore,
    pub jobs: JobStore,
    pub users: UserStore,
}

impl Stores {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            companies: CompanyStore::new(Arc::clone(&db)),
            jobs: JobStore::new(Arc::clone(&db)),
            users: UserStore::new(db),
        }
    }
}

fn company(n: i64) -> NewCompany {
    NewCompany {
        handle: format!("c{n}"),
        name: format!("C{n}"),
        description: format!("Desc{n}"),
        num_employees: Some(n),
        logo_url: Some(format!("http://c{n}.img")),
    }
}

fn user(name: &str) -> NewUser {
    NewUser {
        username: name.to_string(),
        first_name: format!("{name}F"),
        last_name: format!("{name}L"),
        email: format!("{name}@email.com"),
        is_admin: false,
    }
}

/// Three companies, four jobs at c1, two users. Returns the job ids in
/// creation order.
pub async fn seed(stores: &Stores) -> Vec<i64> {
    for n in 1..=3 {
        stores.companies.create(company(n)).await.unwrap();
    }

    let jobs = [
        ("Job1", Some(100), Some(0.1)),
        ("Job2", Some(200), Some(0.2)),
        ("Job3", Some(300), Some(0.0)),
        ("Job4", None, None),
    ];
    let mut ids = Vec::new();
    for (title, salary, equity) in jobs {
        let job = stores
            .jobs
            .create(NewJob {
                title: title.to_string(),
                salary,
                equity,
                company_handle: "c1".to_string(),
            })
            .await
            .unwrap();
        ids.push(job["id"].as_i64().unwrap());
    }

    stores.users.register(user("u1")).await.unwrap();
    stores.users.register(user("u2")).await.unwrap();
    ids
}

fn field<'a>(records: &'a [Record], key: &str) -> Vec<&'a Value> {
    records.iter().map(|r| &r[key]).collect()
}

// ---- Companies ----

pub async fn test_company_create_returns_record(stores: &Stores) {
    let created = stores
        .companies
        .create(NewCompany {
            handle: "new".to_string(),
            name: "New".to_string(),
            description: "New Description".to_string(),
            num_employees: Some(1),
            logo_url: Some("http://new.img".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(created["handle"], json!("new"));
    assert_eq!(created["numEmployees"], json!(1));
    assert_eq!(created["logoUrl"], json!("http://new.img"));
}

pub async fn test_company_duplicate_is_rejected(stores: &Stores) {
    let err = stores.companies.create(company(1)).await.unwrap_err();
    assert!(matches!(err, JoblyError::InvalidArgument(_)));
}

pub async fn test_company_find_all_unfiltered(stores: &Stores) {
    let all = stores
        .companies
        .find_all(&CompanyFilter::default())
        .await
        .unwrap();
    assert_eq!(field(&all, "handle"), vec!["c1", "c2", "c3"]);
}

pub async fn test_company_find_all_by_name(stores: &Stores) {
    let filter = CompanyFilter {
        name: Some("c2".to_string()),
        ..Default::default()
    };
    let found = stores.companies.find_all(&filter).await.unwrap();
    assert_eq!(field(&found, "handle"), vec!["c2"]);

    let filter = CompanyFilter {
        name: Some("%".to_string()),
        ..Default::default()
    };
    assert!(stores.companies.find_all(&filter).await.unwrap().is_empty());
}

pub async fn test_company_name_filter_agrees_with_in_memory(stores: &Stores) {
    for (handle, name) in [("ecole-a", "ÉCOLE"), ("ecole-b", "l'école"), ("ecole-c", "Ecole")] {
        stores
            .companies
            .create(NewCompany {
                handle: handle.to_string(),
                name: name.to_string(),
                description: "school".to_string(),
                num_employees: None,
                logo_url: None,
            })
            .await
            .unwrap();
    }

    let all = stores
        .companies
        .find_all(&CompanyFilter::default())
        .await
        .unwrap();
    let fields = FilterFields::new().text("name");
    for needle in ["école", "ÉCOLE", "ecole", "C1", "c"] {
        let filter = CompanyFilter {
            name: Some(needle.to_string()),
            ..Default::default()
        };
        let in_sql = stores.companies.find_all(&filter).await.unwrap();
        let in_memory = apply_filters(all.clone(), &filter.criteria(), &fields);
        assert_eq!(
            field(&in_sql, "handle"),
            field(&in_memory, "handle"),
            "name filter {needle:?}"
        );
    }

    let filter = CompanyFilter {
        name: Some("école".to_string()),
        ..Default::default()
    };
    let found = stores.companies.find_all(&filter).await.unwrap();
    assert_eq!(field(&found, "handle"), vec!["ecole-b"]);
}

pub async fn test_company_find_all_by_employee_range(stores: &Stores) {
    let filter = CompanyFilter {
        name: None,
        min_employees: Some(2),
        max_employees: Some(3),
    };
    let found = stores.companies.find_all(&filter).await.unwrap();
    assert_eq!(field(&found, "handle"), vec!["c2", "c3"]);

    let filter = CompanyFilter {
        name: Some("C".to_string()),
        min_employees: None,
        max_employees: Some(1),
    };
    let found = stores.companies.find_all(&filter).await.unwrap();
    assert_eq!(field(&found, "handle"), vec!["c1"]);
}

pub async fn test_company_inverted_range_is_rejected(stores: &Stores) {
    let filter = CompanyFilter {
        name: None,
        min_employees: Some(2),
        max_employees: Some(1),
    };
    let err = stores.companies.find_all(&filter).await.unwrap_err();
    assert!(matches!(err, JoblyError::InvalidArgument(_)));
}

pub async fn test_company_get_includes_jobs(stores: &Stores) {
    let c1 = stores.companies.get("c1").await.unwrap();
    assert_eq!(c1["name"], json!("C1"));
    let jobs = c1["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 4);
    assert_eq!(jobs[0]["title"], json!("Job1"));

    let c2 = stores.companies.get("c2").await.unwrap();
    assert_eq!(c2["jobs"], json!([]));

    let err = stores.companies.get("nope").await.unwrap_err();
    assert!(matches!(err, JoblyError::NotFound(_)));
}

pub async fn test_company_update_round_trip(stores: &Stores) {
    let payload = UpdatePayload::new()
        .set("name", "Renamed")
        .set("numEmployees", 10);
    let updated = stores.companies.update("c1", &payload).await.unwrap();
    assert_eq!(updated["name"], json!("Renamed"));
    assert_eq!(updated["numEmployees"], json!(10));

    let read = stores.companies.get("c1").await.unwrap();
    assert_eq!(read["name"], json!("Renamed"));
    assert_eq!(read["numEmployees"], json!(10));
    assert_eq!(read["description"], json!("Desc1"));
    assert_eq!(read["logoUrl"], json!("http://c1.img"));
}

pub async fn test_company_update_null_field(stores: &Stores) {
    let payload = UpdatePayload::new()
        .set("numEmployees", Value::Null)
        .set("logoUrl", Value::Null);
    let updated = stores.companies.update("c2", &payload).await.unwrap();
    assert_eq!(updated["numEmployees"], Value::Null);
    assert_eq!(updated["logoUrl"], Value::Null);
}

pub async fn test_company_update_errors(stores: &Stores) {
    let payload = UpdatePayload::new().set("name", "x");
    let err = stores.companies.update("nope", &payload).await.unwrap_err();
    assert!(matches!(err, JoblyError::NotFound(_)));

    let err = stores
        .companies
        .update("c1", &UpdatePayload::new())
        .await
        .unwrap_err();
    assert!(matches!(err, JoblyError::InvalidArgument(_)));
}

pub async fn test_company_remove_cascades_jobs(stores: &Stores, job_ids: &[i64]) {
    stores.companies.remove("c1").await.unwrap();
    assert!(matches!(
        stores.companies.get("c1").await.unwrap_err(),
        JoblyError::NotFound(_)
    ));
    assert!(matches!(
        stores.jobs.get(job_ids[0]).await.unwrap_err(),
        JoblyError::NotFound(_)
    ));
    assert!(matches!(
        stores.companies.remove("c1").await.unwrap_err(),
        JoblyError::NotFound(_)
    ));
}

// ---- Jobs ----

pub async fn test_job_create_returns_record(stores: &Stores) {
    let job = stores
        .jobs
        .create(NewJob {
            title: "New".to_string(),
            salary: Some(500),
            equity: Some(0.5),
            company_handle: "c2".to_string(),
        })
        .await
        .unwrap();
    assert!(job["id"].as_i64().is_some());
    assert_eq!(job["title"], json!("New"));
    assert_eq!(job["salary"], json!(500));
    assert_eq!(job["equity"], json!("0.5"));
    assert_eq!(job["companyHandle"], json!("c2"));
}

pub async fn test_job_create_for_unknown_company(stores: &Stores) {
    let err = stores
        .jobs
        .create(NewJob {
            title: "New".to_string(),
            salary: None,
            equity: None,
            company_handle: "nope".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, JoblyError::NotFound(_)));
}

pub async fn test_job_find_all_unfiltered(stores: &Stores) {
    let all = stores.jobs.find_all(&JobFilter::default()).await.unwrap();
    assert_eq!(field(&all, "title"), vec!["Job1", "Job2", "Job3", "Job4"]);
    assert_eq!(all[0]["equity"], json!("0.1"));
    assert_eq!(all[3]["equity"], Value::Null);
}

pub async fn test_job_find_all_by_title(stores: &Stores) {
    let filter = JobFilter {
        title: Some("job2".to_string()),
        ..Default::default()
    };
    let found = stores.jobs.find_all(&filter).await.unwrap();
    assert_eq!(field(&found, "title"), vec!["Job2"]);
}

pub async fn test_job_find_all_by_min_salary(stores: &Stores) {
    let filter = JobFilter {
        min_salary: Some(200),
        ..Default::default()
    };
    let found = stores.jobs.find_all(&filter).await.unwrap();
    assert_eq!(field(&found, "title"), vec!["Job2", "Job3"]);
}

pub async fn test_job_find_all_with_equity(stores: &Stores) {
    let filter = JobFilter {
        has_equity: Some(true),
        ..Default::default()
    };
    let found = stores.jobs.find_all(&filter).await.unwrap();
    assert_eq!(field(&found, "title"), vec!["Job1", "Job2"]);

    let filter = JobFilter {
        has_equity: Some(false),
        ..Default::default()
    };
    assert_eq!(stores.jobs.find_all(&filter).await.unwrap().len(), 4);
}

pub async fn test_job_find_all_combined(stores: &Stores) {
    let filter = JobFilter {
        title: Some("job".to_string()),
        min_salary: Some(150),
        has_equity: Some(true),
    };
    let found = stores.jobs.find_all(&filter).await.unwrap();
    assert_eq!(field(&found, "title"), vec!["Job2"]);
}

pub async fn test_job_get_includes_company(stores: &Stores, job_ids: &[i64]) {
    let job = stores.jobs.get(job_ids[0]).await.unwrap();
    assert_eq!(job["title"], json!("Job1"));
    assert!(job.get("companyHandle").is_none());
    assert_eq!(job["company"]["handle"], json!("c1"));
    assert_eq!(job["company"]["numEmployees"], json!(1));

    let err = stores.jobs.get(0).await.unwrap_err();
    assert!(matches!(err, JoblyError::NotFound(_)));
}

pub async fn test_job_update_round_trip(stores: &Stores, job_ids: &[i64]) {
    let payload = UpdatePayload::new().set("title", "Renamed");
    let updated = stores.jobs.update(job_ids[0], &payload).await.unwrap();
    assert_eq!(updated["title"], json!("Renamed"));

    let read = stores.jobs.get(job_ids[0]).await.unwrap();
    assert_eq!(read["title"], json!("Renamed"));
    assert_eq!(read["salary"], json!(100));
    assert_eq!(read["equity"], json!("0.1"));
}

pub async fn test_job_update_errors(stores: &Stores, job_ids: &[i64]) {
    let payload = UpdatePayload::new().set("title", "x");
    let err = stores.jobs.update(0, &payload).await.unwrap_err();
    assert!(matches!(err, JoblyError::NotFound(_)));

    let err = stores
        .jobs
        .update(job_ids[0], &UpdatePayload::new())
        .await
        .unwrap_err();
    assert!(matches!(err, JoblyError::InvalidArgument(_)));
}

pub async fn test_job_remove(stores: &Stores, job_ids: &[i64]) {
    stores.jobs.remove(job_ids[0]).await.unwrap();
    assert!(matches!(
        stores.jobs.get(job_ids[0]).await.unwrap_err(),
        JoblyError::NotFound(_)
    ));
    assert!(matches!(
        stores.jobs.remove(job_ids[0]).await.unwrap_err(),
        JoblyError::NotFound(_)
    ));
}

// ---- Users ----

pub async fn test_user_register_returns_record(stores: &Stores) {
    let created = stores
        .users
        .register(NewUser {
            is_admin: true,
            ..user("admin")
        })
        .await
        .unwrap();
    assert_eq!(created["username"], json!("admin"));
    assert_eq!(created["firstName"], json!("adminF"));
    assert_eq!(created["isAdmin"], json!(true));
}

pub async fn test_user_duplicate_is_rejected(stores: &Stores) {
    let err = stores.users.register(user("u1")).await.unwrap_err();
    assert!(matches!(err, JoblyError::InvalidArgument(_)));
}

pub async fn test_user_find_all(stores: &Stores) {
    let all = stores.users.find_all().await.unwrap();
    assert_eq!(field(&all, "username"), vec!["u1", "u2"]);
    assert_eq!(all[0]["isAdmin"], json!(false));
}

pub async fn test_user_update_round_trip(stores: &Stores) {
    let payload = UpdatePayload::new()
        .set("firstName", "NewF")
        .set("isAdmin", true);
    let updated = stores.users.update("u1", &payload).await.unwrap();
    assert_eq!(updated["firstName"], json!("NewF"));
    assert_eq!(updated["isAdmin"], json!(true));

    let read = stores.users.get("u1").await.unwrap();
    assert_eq!(read["firstName"], json!("NewF"));
    assert_eq!(read["lastName"], json!("u1L"));
    assert_eq!(read["email"], json!("u1@email.com"));

    let err = stores.users.update("nope", &payload).await.unwrap_err();
    assert!(matches!(err, JoblyError::NotFound(_)));
}

pub async fn test_user_apply_to_job(stores: &Stores, job_ids: &[i64]) {
    stores.users.apply_to_job("u1", job_ids[1]).await.unwrap();
    stores.users.apply_to_job("u1", job_ids[0]).await.unwrap();

    let u1 = stores.users.get("u1").await.unwrap();
    assert_eq!(u1["jobs"], json!([job_ids[0], job_ids[1]]));
    let u2 = stores.users.get("u2").await.unwrap();
    assert_eq!(u2["jobs"], json!([]));

    let err = stores
        .users
        .apply_to_job("u1", job_ids[0])
        .await
        .unwrap_err();
    assert!(matches!(err, JoblyError::InvalidArgument(_)));

    let err = stores.users.apply_to_job("u1", 0).await.unwrap_err();
    assert!(matches!(err, JoblyError::NotFound(_)));
    let err = stores
        .users
        .apply_to_job("nope", job_ids[0])
        .await
        .unwrap_err();
    assert!(matches!(err, JoblyError::NotFound(_)));
}

pub async fn test_user_remove(stores: &Stores, job_ids: &[i64]) {
    stores.users.apply_to_job("u2", job_ids[0]).await.unwrap();
    stores.users.remove("u2").await.unwrap();
    assert!(matches!(
        stores.users.get("u2").await.unwrap_err(),
        JoblyError::NotFound(_)
    ));
    assert!(matches!(
        stores.users.remove("u2").await.unwrap_err(),
        JoblyError::NotFound(_)
    ));
}
