use super::{first_row, normalize_flag};
use crate::update::{build_set_clause, ColumnMap, UpdatePayload};
use crate::{Database, JoblyError, Record, Result, SqlValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

const USER_COLUMNS: &str = r#"username, first_name AS "firstName", last_name AS "lastName", email, is_admin AS "isAdmin""#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

pub struct UserStore {
    db: Arc<dyn Database>,
}

impl UserStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    fn columns() -> ColumnMap {
        ColumnMap::new()
            .with("firstName", "first_name")
            .with("lastName", "last_name")
            .with("isAdmin", "is_admin")
    }

    fn user(mut record: Record) -> Record {
        normalize_flag(&mut record, "isAdmin");
        record
    }

    async fn exists(&self, username: &str) -> Result<bool> {
        let rows = self
            .db
            .execute(
                "SELECT username FROM users WHERE username = $1",
                &[Value::from(username)],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    pub async fn register(&self, user: NewUser) -> Result<Record> {
        if self.exists(&user.username).await? {
            return Err(JoblyError::InvalidArgument(format!(
                "Duplicate username: {}",
                user.username
            )));
        }

        let sql = format!(
            "INSERT INTO users (username, first_name, last_name, email, is_admin)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        let params = [
            Value::from(user.username),
            Value::from(user.first_name),
            Value::from(user.last_name),
            Value::from(user.email),
            Value::from(user.is_admin),
        ];
        let rows = self.db.execute(&sql, &params).await?;
        rows.into_iter()
            .next()
            .map(Self::user)
            .ok_or_else(|| JoblyError::Storage("insert returned no row".to_string()))
    }

    pub async fn find_all(&self) -> Result<Vec<Record>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");
        let rows = self.db.execute(&sql, &[]).await?;
        Ok(rows.into_iter().map(Self::user).collect())
    }

    /// One user, with the ids of jobs applied to under `jobs`.
    pub async fn get(&self, username: &str) -> Result<Record> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let rows = self.db.execute(&sql, &[Value::from(username)]).await?;
        let mut user = Self::user(first_row(rows, || format!("No user: {username}"))?);

        let applied = self
            .db
            .execute(
                "SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id",
                &[Value::from(username)],
            )
            .await?;
        let job_ids = applied
            .into_iter()
            .filter_map(|mut row| row.remove("job_id"))
            .collect();
        user.insert("jobs".to_string(), Value::Array(job_ids));
        Ok(user)
    }

    pub async fn update(&self, username: &str, payload: &UpdatePayload) -> Result<Record> {
        let set = build_set_clause(payload, &Self::columns())?;
        let sql = format!(
            "UPDATE users SET {} WHERE username = ${} RETURNING {USER_COLUMNS}",
            set.clause,
            set.next_placeholder()
        );
        let mut params: Vec<SqlValue> = set.values;
        params.push(Value::from(username));

        let rows = self.db.execute(&sql, &params).await?;
        first_row(rows, || format!("No user: {username}")).map(Self::user)
    }

    pub async fn remove(&self, username: &str) -> Result<()> {
        let rows = self
            .db
            .execute(
                "DELETE FROM users WHERE username = $1 RETURNING username",
                &[Value::from(username)],
            )
            .await?;
        first_row(rows, || format!("No user: {username}"))?;
        Ok(())
    }

    /// Record that `username` applied to `job_id`.
    pub async fn apply_to_job(&self, username: &str, job_id: i64) -> Result<()> {
        let job = self
            .db
            .execute("SELECT id FROM jobs WHERE id = $1", &[Value::from(job_id)])
            .await?;
        first_row(job, || format!("No job: {job_id}"))?;

        if !self.exists(username).await? {
            return Err(JoblyError::NotFound(format!("No user: {username}")));
        }

        let params = [Value::from(job_id), Value::from(username)];
        let existing = self
            .db
            .execute(
                "SELECT job_id FROM applications WHERE job_id = $1 AND username = $2",
                &params,
            )
            .await?;
        if !existing.is_empty() {
            return Err(JoblyError::InvalidArgument(format!(
                "{username} already applied to job {job_id}"
            )));
        }

        self.db
            .execute(
                "INSERT INTO applications (job_id, username) VALUES ($1, $2)",
                &params,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fake::{record, RecordingDatabase};
    use serde_json::json;

    #[tokio::test]
    async fn admin_flag_comes_back_as_bool() {
        let db = Arc::new(RecordingDatabase::default().respond(vec![
            record(&[("username", json!("u1")), ("isAdmin", json!(0))]),
            record(&[("username", json!("u2")), ("isAdmin", json!(1))]),
            record(&[("username", json!("u3")), ("isAdmin", json!(true))]),
        ]));
        let users = UserStore::new(db).find_all().await.unwrap();
        let flags: Vec<&Value> = users.iter().map(|u| &u["isAdmin"]).collect();
        assert_eq!(flags, vec![&json!(false), &json!(true), &json!(true)]);
    }

    #[tokio::test]
    async fn update_maps_camel_case_fields() {
        let db = Arc::new(
            RecordingDatabase::default()
                .respond(vec![record(&[("username", json!("u1")), ("isAdmin", json!(1))])]),
        );
        let store = UserStore::new(db.clone());

        let payload = UpdatePayload::new()
            .set("firstName", "New")
            .set("isAdmin", true);
        let user = store.update("u1", &payload).await.unwrap();
        assert_eq!(user["isAdmin"], json!(true));

        let calls = db.calls();
        let (sql, params) = &calls[0];
        assert!(sql.starts_with(
            r#"UPDATE users SET "first_name"=$1, "is_admin"=$2 WHERE username = $3"#
        ));
        assert_eq!(params, &vec![json!("New"), json!(true), json!("u1")]);
    }

    #[tokio::test]
    async fn apply_to_missing_job_is_not_found() {
        let db = Arc::new(RecordingDatabase::default());
        let store = UserStore::new(db.clone());
        let err = store.apply_to_job("u1", 0).await.unwrap_err();
        assert!(matches!(err, JoblyError::NotFound(msg) if msg == "No job: 0"));
        assert_eq!(db.calls().len(), 1);
    }

    #[tokio::test]
    async fn apply_as_missing_user_is_not_found() {
        let db = Arc::new(RecordingDatabase::default().respond(vec![record(&[("id", json!(3))])]));
        let store = UserStore::new(db);
        let err = store.apply_to_job("ghost", 3).await.unwrap_err();
        assert!(matches!(err, JoblyError::NotFound(msg) if msg == "No user: ghost"));
    }
}
