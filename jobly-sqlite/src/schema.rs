use jobly_core::{JoblyError, Result};
use sqlx::SqlitePool;
use tracing::info;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS companies (
        handle VARCHAR(25) PRIMARY KEY CHECK (handle = lower(handle)),
        name TEXT UNIQUE NOT NULL,
        num_employees INTEGER CHECK (num_employees >= 0),
        description TEXT NOT NULL,
        logo_url TEXT
    )",
    "CREATE TABLE IF NOT EXISTS jobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        salary INTEGER CHECK (salary >= 0),
        equity NUMERIC CHECK (equity <= 1.0),
        company_handle VARCHAR(25) NOT NULL
            REFERENCES companies (handle) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS users (
        username VARCHAR(25) PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL CHECK (instr(email, '@') > 1),
        is_admin BOOLEAN NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS applications (
        username VARCHAR(25) NOT NULL
            REFERENCES users (username) ON DELETE CASCADE,
        job_id INTEGER NOT NULL
            REFERENCES jobs (id) ON DELETE CASCADE,
        PRIMARY KEY (username, job_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_jobs_company_handle ON jobs(company_handle)",
];

pub(crate) async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| JoblyError::Storage(e.to_string()))?;
    }
    info!("Initialized jobly schema ({} statements)", SCHEMA.len());
    Ok(())
}
