use super::{first_row, into_array};
use crate::filter::{build_predicates, FilterCriteria, FilterFields};
use crate::update::{build_set_clause, ColumnMap, UpdatePayload};
use crate::{Database, JoblyError, Record, Result, SqlValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

const COMPANY_COLUMNS: &str =
    r#"handle, name, description, num_employees AS "numEmployees", logo_url AS "logoUrl""#;

const COMPANY_FILTER_FIELDS: FilterFields = FilterFields::new()
    .text("name")
    .numeric("num_employees");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub num_employees: Option<i64>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFilter {
    pub name: Option<String>,
    pub min_employees: Option<i64>,
    pub max_employees: Option<i64>,
}

impl CompanyFilter {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            text_contains: self.name.clone(),
            numeric_min: self.min_employees.map(|n| n as f64),
            numeric_max: self.max_employees.map(|n| n as f64),
            flag_required: None,
        }
    }
}

pub struct CompanyStore {
    db: Arc<dyn Database>,
}

impl CompanyStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    fn columns() -> ColumnMap {
        ColumnMap::new()
            .with("numEmployees", "num_employees")
            .with("logoUrl", "logo_url")
    }

    pub async fn create(&self, company: NewCompany) -> Result<Record> {
        let existing = self
            .db
            .execute(
                "SELECT handle FROM companies WHERE handle = $1",
                &[Value::from(company.handle.as_str())],
            )
            .await?;
        if !existing.is_empty() {
            return Err(JoblyError::InvalidArgument(format!(
                "Duplicate company: {}",
                company.handle
            )));
        }

        let sql = format!(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COMPANY_COLUMNS}"
        );
        let params = [
            Value::from(company.handle),
            Value::from(company.name),
            Value::from(company.description),
            Value::from(company.num_employees),
            Value::from(company.logo_url),
        ];
        let rows = self.db.execute(&sql, &params).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| JoblyError::Storage("insert returned no row".to_string()))
    }

    /// Companies ordered by name; the filter runs in the query.
    pub async fn find_all(&self, filter: &CompanyFilter) -> Result<Vec<Record>> {
        let criteria = filter.criteria();
        criteria.validate()?;

        let part = build_predicates(&criteria, &COMPANY_FILTER_FIELDS, 1);
        let sql = format!(
            "SELECT {COMPANY_COLUMNS} FROM companies {} ORDER BY name",
            part.where_clause()
        );
        self.db.execute(&sql, &part.values).await
    }

    /// One company, with its jobs nested under `jobs`.
    pub async fn get(&self, handle: &str) -> Result<Record> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE handle = $1");
        let rows = self.db.execute(&sql, &[Value::from(handle)]).await?;
        let mut company = first_row(rows, || format!("No company: {handle}"))?;

        let jobs = self
            .db
            .execute(
                "SELECT id, title, salary, CAST(equity AS TEXT) AS equity
                 FROM jobs WHERE company_handle = $1 ORDER BY id",
                &[Value::from(handle)],
            )
            .await?;
        company.insert("jobs".to_string(), into_array(jobs));
        Ok(company)
    }

    pub async fn update(&self, handle: &str, payload: &UpdatePayload) -> Result<Record> {
        let set = build_set_clause(payload, &Self::columns())?;
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {COMPANY_COLUMNS}",
            set.clause,
            set.next_placeholder()
        );
        let mut params: Vec<SqlValue> = set.values;
        params.push(Value::from(handle));

        let rows = self.db.execute(&sql, &params).await?;
        first_row(rows, || format!("No company: {handle}"))
    }

    /// Delete a company; its jobs go with it.
    pub async fn remove(&self, handle: &str) -> Result<()> {
        let rows = self
            .db
            .execute(
                "DELETE FROM companies WHERE handle = $1 RETURNING handle",
                &[Value::from(handle)],
            )
            .await?;
        first_row(rows, || format!("No company: {handle}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fake::{record, RecordingDatabase};
    use serde_json::json;

    #[tokio::test]
    async fn find_all_pushes_filter_into_query() {
        let db = Arc::new(RecordingDatabase::default());
        let store = CompanyStore::new(db.clone());

        let filter = CompanyFilter {
            name: Some("Net".to_string()),
            min_employees: Some(10),
            max_employees: Some(500),
        };
        store.find_all(&filter).await.unwrap();

        let calls = db.calls();
        let (sql, params) = &calls[0];
        assert!(sql.contains(
            r#"WHERE LOWER("name") LIKE $1 ESCAPE '\' AND "num_employees" >= $2 AND "num_employees" <= $3 ORDER BY name"#
        ));
        assert_eq!(params, &vec![json!("%net%"), json!(10), json!(500)]);
    }

    #[tokio::test]
    async fn find_all_rejects_inverted_range_before_querying() {
        let db = Arc::new(RecordingDatabase::default());
        let store = CompanyStore::new(db.clone());

        let filter = CompanyFilter {
            name: None,
            min_employees: Some(2),
            max_employees: Some(1),
        };
        let err = store.find_all(&filter).await.unwrap_err();
        assert!(matches!(err, JoblyError::InvalidArgument(_)));
        assert!(db.calls().is_empty());
    }

    #[tokio::test]
    async fn update_maps_camel_case_fields() {
        let db = Arc::new(RecordingDatabase::default().respond(vec![record(&[(
            "handle",
            json!("c1"),
        )])]));
        let store = CompanyStore::new(db.clone());

        let payload = UpdatePayload::new()
            .set("numEmployees", 12)
            .set("name", "C1 Inc")
            .set("logoUrl", "http://c1.img");
        store.update("c1", &payload).await.unwrap();

        let calls = db.calls();
        let (sql, params) = &calls[0];
        assert!(sql.starts_with(
            r#"UPDATE companies SET "num_employees"=$1, "name"=$2, "logo_url"=$3 WHERE handle = $4"#
        ));
        assert_eq!(
            params,
            &vec![json!(12), json!("C1 Inc"), json!("http://c1.img"), json!("c1")]
        );
    }

    #[tokio::test]
    async fn create_rejects_duplicate_handle() {
        let db = Arc::new(RecordingDatabase::default().respond(vec![record(&[(
            "handle",
            json!("c1"),
        )])]));
        let store = CompanyStore::new(db.clone());

        let company = NewCompany {
            handle: "c1".to_string(),
            name: "C1".to_string(),
            description: "Desc1".to_string(),
            num_employees: Some(1),
            logo_url: None,
        };
        let err = store.create(company).await.unwrap_err();
        assert!(matches!(err, JoblyError::InvalidArgument(_)));
        assert_eq!(db.calls().len(), 1);
    }

    #[tokio::test]
    async fn remove_missing_is_not_found() {
        let store = CompanyStore::new(Arc::new(RecordingDatabase::default()));
        let err = store.remove("nope").await.unwrap_err();
        assert!(matches!(err, JoblyError::NotFound(_)));
    }
}
