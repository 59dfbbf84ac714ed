//! Entity data access over a [`Database`](crate::Database).
//!
//! Records come back with camelCase keys; storage columns are snake_case and
//! are renamed in each `SELECT` list and, for updates, through a
//! [`ColumnMap`](crate::ColumnMap).

mod company;
mod job;
mod user;

pub use company::{CompanyFilter, CompanyStore, NewCompany};
pub use job::{JobFilter, JobStore, NewJob};
pub use user::{NewUser, UserStore};

use crate::filter::numeric_value;
use crate::{JoblyError, Record, Result};
use serde_json::Value;

/// First row, or `NotFound` built from `missing`.
fn first_row(rows: Vec<Record>, missing: impl FnOnce() -> String) -> Result<Record> {
    rows.into_iter()
        .next()
        .ok_or_else(|| JoblyError::NotFound(missing()))
}

/// Rewrite `key` as a JSON bool. Backends without a native boolean hand
/// back 0/1.
fn normalize_flag(record: &mut Record, key: &str) {
    if let Some(value) = record.get_mut(key) {
        let flag = match &*value {
            Value::Bool(b) => *b,
            other => numeric_value(other).is_some_and(|n| n != 0.0),
        };
        *value = Value::Bool(flag);
    }
}

fn into_array(records: Vec<Record>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flag_is_rewritten_in_place() {
        let mut record = fake::record(&[
            ("a", json!(1)),
            ("b", json!("0")),
            ("c", json!(false)),
            ("d", Value::Null),
        ]);
        for key in ["a", "b", "c", "d", "missing"] {
            normalize_flag(&mut record, key);
        }
        assert_eq!(record["a"], json!(true));
        assert_eq!(record["b"], json!(false));
        assert_eq!(record["c"], json!(false));
        assert_eq!(record["d"], json!(false));
        assert!(record.get("missing").is_none());
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use crate::{Database, Record, Result, SqlValue};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every statement and answers with queued row sets (empty once
    /// the queue runs dry).
    #[derive(Default)]
    pub struct RecordingDatabase {
        pub calls: Mutex<Vec<(String, Vec<SqlValue>)>>,
        responses: Mutex<VecDeque<Vec<Record>>>,
    }

    impl RecordingDatabase {
        pub fn respond(self, rows: Vec<Record>) -> Self {
            self.responses.lock().unwrap().push_back(rows);
            self
        }

        pub fn calls(&self) -> Vec<(String, Vec<SqlValue>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Database for RecordingDatabase {
        async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
            Ok(self.responses.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    pub fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}
