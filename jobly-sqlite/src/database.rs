use crate::config::SqliteConfig;
use crate::schema::init_schema;
use async_trait::async_trait;
use jobly_core::{Database, JoblyError, Record, Result, SqlValue};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};
use std::str::FromStr;
use tracing::{debug, warn};

/// [`Database`] over a SQLite pool. Creating one ensures the schema exists.
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn connect(config: &SqliteConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| JoblyError::Storage(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| JoblyError::Storage(e.to_string()))?;
        Self::new_with_pool(pool).await
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Result<Self> {
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_record(row: &SqliteRow) -> Result<Record> {
        let mut record = Record::new();
        for column in row.columns() {
            let idx = column.ordinal();
            let raw = row
                .try_get_raw(idx)
                .map_err(|e| JoblyError::Storage(e.to_string()))?;

            let value = if raw.is_null() {
                Value::Null
            } else {
                // runtime storage class, not the declared column type
                let kind = raw.type_info().name().to_string();
                match kind.as_str() {
                    "INTEGER" | "BOOLEAN" => Value::from(
                        row.try_get_unchecked::<i64, _>(idx)
                            .map_err(|e| JoblyError::Storage(e.to_string()))?,
                    ),
                    "REAL" => Value::from(
                        row.try_get_unchecked::<f64, _>(idx)
                            .map_err(|e| JoblyError::Storage(e.to_string()))?,
                    ),
                    "TEXT" | "DATE" | "TIME" | "DATETIME" => Value::from(
                        row.try_get_unchecked::<String, _>(idx)
                            .map_err(|e| JoblyError::Storage(e.to_string()))?,
                    ),
                    other => {
                        return Err(JoblyError::Parse(format!(
                            "unsupported {other} value in column {}",
                            column.name()
                        )))
                    }
                }
            };
            record.insert(column.name().to_string(), value);
        }
        Ok(record)
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
        debug!("Executing statement with {} parameter(s): {}", params.len(), sql);

        let mut query = sqlx::query(sql);
        for value in params {
            query = match value {
                Value::Null => query.bind(None::<String>),
                Value::Bool(b) => query.bind(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => query.bind(i),
                    None => query.bind(n.as_f64()),
                },
                Value::String(s) => query.bind(s.as_str()),
                other => query.bind(other.to_string()),
            };
        }

        let rows = query.fetch_all(&self.pool).await.map_err(|e| {
            warn!("Statement failed: {}", e);
            JoblyError::Storage(e.to_string())
        })?;

        rows.iter().map(Self::row_to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn database() -> SqliteDatabase {
        SqliteDatabase::connect(&SqliteConfig::in_memory())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn decodes_each_storage_class() {
        let db = database().await;
        let rows = db
            .execute(
                "SELECT $1 AS i, $2 AS r, $3 AS t, $4 AS n, $5 AS b",
                &[json!(42), json!(1.5), json!("text"), Value::Null, json!(true)],
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["i"], json!(42));
        assert_eq!(row["r"], json!(1.5));
        assert_eq!(row["t"], json!("text"));
        assert_eq!(row["n"], Value::Null);
        assert_eq!(row["b"], json!(1));
    }

    #[tokio::test]
    async fn positional_placeholders_bind_by_number() {
        let db = database().await;
        let rows = db
            .execute("SELECT $2 AS second, $1 AS first", &[json!("a"), json!("b")])
            .await
            .unwrap();
        assert_eq!(rows[0]["first"], json!("a"));
        assert_eq!(rows[0]["second"], json!("b"));
    }

    #[tokio::test]
    async fn driver_errors_surface_as_storage() {
        let db = database().await;
        let err = db.execute("SELECT * FROM missing", &[]).await.unwrap_err();
        assert!(matches!(err, JoblyError::Storage(_)));
    }

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let db = database().await;
        init_schema(db.pool()).await.unwrap();
        let tables = db
            .execute(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = $1",
                &[json!("applications")],
            )
            .await
            .unwrap();
        assert_eq!(tables.len(), 1);
    }
}
