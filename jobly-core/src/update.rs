use crate::{JoblyError, Record, Result, SqlValue};
use std::collections::HashMap;

/// Fields to change on one row, in the order they were supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePayload {
    fields: Vec<(String, SqlValue)>,
}

impl UpdatePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`. Setting a field twice keeps its original
    /// position and replaces the value.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for UpdatePayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(UpdatePayload::new(), |payload, (k, v)| payload.set(k, v))
    }
}

/// Takes the fields of a decoded request body in the map's iteration order.
impl From<Record> for UpdatePayload {
    fn from(record: Record) -> Self {
        record.into_iter().collect()
    }
}

/// External field name to storage column name. Unmapped fields pass through.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: HashMap<String, String>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.columns.insert(field.into(), column.into());
        self
    }

    pub fn resolve<'a>(&'a self, field: &'a str) -> &'a str {
        self.columns.get(field).map(String::as_str).unwrap_or(field)
    }
}

/// A `SET` clause body and the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub clause: String,
    pub values: Vec<SqlValue>,
}

impl SetClause {
    /// Index of the first placeholder free for a trailing `WHERE`.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }
}

/// Quote a SQL identifier, doubling any embedded quote.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build `"col1"=$1, "col2"=$2, ...` for a partial update.
///
/// Columns come out in payload order; `columns` renames fields that are
/// stored under a different name.
pub fn build_set_clause(payload: &UpdatePayload, columns: &ColumnMap) -> Result<SetClause> {
    if payload.is_empty() {
        return Err(JoblyError::InvalidArgument("No data".to_string()));
    }

    let mut fragments = Vec::with_capacity(payload.len());
    let mut values = Vec::with_capacity(payload.len());

    for (idx, (field, value)) in payload.iter().enumerate() {
        let column = columns.resolve(field);
        fragments.push(format!("{}=${}", quote_ident(column), idx + 1));
        values.push(value.clone());
    }

    Ok(SetClause {
        clause: fragments.join(", "),
        values,
    })
}
