use super::first_row;
use crate::filter::{apply_filters, FilterCriteria, FilterFields};
use crate::update::{build_set_clause, ColumnMap, UpdatePayload};
use crate::{Database, JoblyError, Record, Result, SqlValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

// equity is a decimal; reading it as text keeps its written form.
const JOB_COLUMNS: &str =
    r#"id, title, salary, CAST(equity AS TEXT) AS equity, company_handle AS "companyHandle""#;

const JOB_FILTER_FIELDS: FilterFields = FilterFields::new()
    .text("title")
    .numeric("salary")
    .flag("equity");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i64>,
    #[serde(default)]
    pub equity: Option<f64>,
    pub company_handle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i64>,
    pub has_equity: Option<bool>,
}

impl JobFilter {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            text_contains: self.title.clone(),
            numeric_min: self.min_salary.map(|n| n as f64),
            numeric_max: None,
            flag_required: self.has_equity,
        }
    }
}

pub struct JobStore {
    db: Arc<dyn Database>,
}

impl JobStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    pub async fn create(&self, job: NewJob) -> Result<Record> {
        let company = self
            .db
            .execute(
                "SELECT handle FROM companies WHERE handle = $1",
                &[Value::from(job.company_handle.as_str())],
            )
            .await?;
        first_row(company, || format!("No company: {}", job.company_handle))?;

        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle)
             VALUES ($1, $2, $3, $4)
             RETURNING {JOB_COLUMNS}"
        );
        let params = [
            Value::from(job.title),
            Value::from(job.salary),
            Value::from(job.equity),
            Value::from(job.company_handle),
        ];
        let rows = self.db.execute(&sql, &params).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| JoblyError::Storage("insert returned no row".to_string()))
    }

    /// All jobs ordered by title, narrowed by `filter`.
    pub async fn find_all(&self, filter: &JobFilter) -> Result<Vec<Record>> {
        let criteria = filter.criteria();
        criteria.validate()?;

        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY title, id");
        let rows = self.db.execute(&sql, &[]).await?;
        Ok(apply_filters(rows, &criteria, &JOB_FILTER_FIELDS))
    }

    /// One job, with its company nested under `company`.
    pub async fn get(&self, id: i64) -> Result<Record> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        let rows = self.db.execute(&sql, &[Value::from(id)]).await?;
        let mut job = first_row(rows, || format!("No job: {id}"))?;

        let handle = job
            .remove("companyHandle")
            .and_then(|v| v.as_str().map(String::from))
            .ok_or_else(|| JoblyError::Parse(format!("job {id} has no company handle")))?;
        let company = self
            .db
            .execute(
                r#"SELECT handle, name, description, num_employees AS "numEmployees", logo_url AS "logoUrl"
                   FROM companies WHERE handle = $1"#,
                &[Value::from(handle.as_str())],
            )
            .await?;
        let company = first_row(company, || format!("No company: {handle}"))?;
        job.insert("company".to_string(), Value::Object(company));
        Ok(job)
    }

    /// Apply a partial update; fields not in `payload` are left alone.
    pub async fn update(&self, id: i64, payload: &UpdatePayload) -> Result<Record> {
        let set = build_set_clause(payload, &ColumnMap::new())?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {JOB_COLUMNS}",
            set.clause,
            set.next_placeholder()
        );
        let mut params: Vec<SqlValue> = set.values;
        params.push(Value::from(id));

        let rows = self.db.execute(&sql, &params).await?;
        first_row(rows, || format!("No job: {id}"))
    }

    pub async fn remove(&self, id: i64) -> Result<()> {
        let rows = self
            .db
            .execute("DELETE FROM jobs WHERE id = $1 RETURNING id", &[Value::from(id)])
            .await?;
        first_row(rows, || format!("No job: {id}"))?;
        Ok(())
    }
}
