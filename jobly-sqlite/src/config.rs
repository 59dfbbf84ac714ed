use jobly_core::{JoblyError, Result};
use std::env;

/// Connection settings for [`SqliteDatabase`](crate::SqliteDatabase).
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl SqliteConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Read `JOBLY_DATABASE_URL` (required) and `JOBLY_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("JOBLY_DATABASE_URL")
            .map_err(|e| JoblyError::Parse(format!("JOBLY_DATABASE_URL: {e}")))?;
        let max_connections = match env::var("JOBLY_MAX_CONNECTIONS") {
            Ok(v) => v
                .parse()
                .map_err(|e| JoblyError::Parse(format!("JOBLY_MAX_CONNECTIONS: {e}")))?,
            Err(_) => Self::DEFAULT_MAX_CONNECTIONS,
        };
        Ok(Self {
            database_url,
            max_connections,
        })
    }

    /// A private in-memory database. One connection, so every statement
    /// sees the same data.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_uses_single_connection() {
        let config = SqliteConfig::in_memory();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.max_connections, 1);
    }

    #[test]
    fn new_uses_default_pool_size() {
        let config = SqliteConfig::new("sqlite://jobly.db").max_connections(2);
        assert_eq!(config.database_url, "sqlite://jobly.db");
        assert_eq!(config.max_connections, 2);
        assert_eq!(
            SqliteConfig::new("x").max_connections,
            SqliteConfig::DEFAULT_MAX_CONNECTIONS
        );
    }
}
