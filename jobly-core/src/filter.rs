//! Optional list filters, applied either to fetched records or pushed down
//! into SQL.
//!
//! Both forms share [`FilterCriteria`] and [`FilterFields`] and combine every
//! active criterion with AND. Criteria are assumed to have passed
//! [`FilterCriteria::validate`].

use crate::update::quote_ident;
use crate::{JoblyError, Record, Result, SqlValue};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Substring, ignoring ASCII case only (SQL `LOWER`/`LIKE` fold no
    /// further). `Some("")` matches every string value.
    pub text_contains: Option<String>,
    /// Inclusive lower bound.
    pub numeric_min: Option<f64>,
    /// Inclusive upper bound.
    pub numeric_max: Option<f64>,
    /// When `Some(true)`, the flag field must hold a non-zero number.
    pub flag_required: Option<bool>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.text_contains.is_none()
            && self.numeric_min.is_none()
            && self.numeric_max.is_none()
            && self.flag_required != Some(true)
    }

    /// Reject a lower bound above the upper bound.
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.numeric_min, self.numeric_max) {
            if min > max {
                return Err(JoblyError::InvalidArgument(format!(
                    "Minimum ({min}) cannot be greater than maximum ({max})"
                )));
            }
        }
        Ok(())
    }
}

/// Which field each kind of criterion looks at: a record key for
/// [`apply_filters`], a column name for [`build_predicates`].
///
/// A criterion whose kind has no field here is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterFields {
    pub text: Option<&'static str>,
    pub numeric: Option<&'static str>,
    pub flag: Option<&'static str>,
}

impl FilterFields {
    pub const fn new() -> Self {
        Self {
            text: None,
            numeric: None,
            flag: None,
        }
    }

    pub const fn text(mut self, field: &'static str) -> Self {
        self.text = Some(field);
        self
    }

    pub const fn numeric(mut self, field: &'static str) -> Self {
        self.numeric = Some(field);
        self
    }

    pub const fn flag(mut self, field: &'static str) -> Self {
        self.flag = Some(field);
        self
    }
}

/// Read a JSON number, or a string holding one (decimal columns usually come
/// back as text).
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn matches(record: &Record, criteria: &FilterCriteria, fields: &FilterFields) -> bool {
    if let (Some(needle), Some(field)) = (&criteria.text_contains, fields.text) {
        let needle = needle.to_ascii_lowercase();
        let hit = record
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|text| text.to_ascii_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }

    if let Some(field) = fields.numeric {
        let number = record.get(field).and_then(numeric_value);
        if let Some(min) = criteria.numeric_min {
            if !number.is_some_and(|n| n >= min) {
                return false;
            }
        }
        if let Some(max) = criteria.numeric_max {
            if !number.is_some_and(|n| n <= max) {
                return false;
            }
        }
    }

    if let (Some(true), Some(field)) = (criteria.flag_required, fields.flag) {
        let set = record
            .get(field)
            .and_then(numeric_value)
            .is_some_and(|n| n != 0.0);
        if !set {
            return false;
        }
    }

    true
}

/// Keep the records satisfying every active criterion, in input order.
pub fn apply_filters(
    records: Vec<Record>,
    criteria: &FilterCriteria,
    fields: &FilterFields,
) -> Vec<Record> {
    if criteria.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|record| matches(record, criteria, fields))
        .collect()
}

/// SQL predicates and the values bound to their placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPart {
    pub predicates: Vec<String>,
    pub values: Vec<SqlValue>,
}

impl QueryPart {
    pub fn clause(&self) -> String {
        self.predicates.join(" AND ")
    }

    /// `WHERE p1 AND p2 ...`, or an empty string when nothing is filtered.
    pub fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clause())
        }
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn bound_value(n: f64) -> SqlValue {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

/// Build predicates for the active criteria, numbering placeholders from
/// `first_placeholder`.
pub fn build_predicates(
    criteria: &FilterCriteria,
    fields: &FilterFields,
    first_placeholder: usize,
) -> QueryPart {
    let mut part = QueryPart::default();
    let mut idx = first_placeholder;

    if let (Some(needle), Some(column)) = (&criteria.text_contains, fields.text) {
        part.predicates.push(format!(
            "LOWER({}) LIKE ${} ESCAPE '\\'",
            quote_ident(column),
            idx
        ));
        part.values
            .push(Value::from(format!("%{}%", escape_like(&needle.to_ascii_lowercase()))));
        idx += 1;
    }

    if let Some(column) = fields.numeric {
        if let Some(min) = criteria.numeric_min {
            part.predicates
                .push(format!("{} >= ${}", quote_ident(column), idx));
            part.values.push(bound_value(min));
            idx += 1;
        }
        if let Some(max) = criteria.numeric_max {
            part.predicates
                .push(format!("{} <= ${}", quote_ident(column), idx));
            part.values.push(bound_value(max));
        }
    }

    if let (Some(true), Some(column)) = (criteria.flag_required, fields.flag) {
        part.predicates
            .push(format!("CAST({} AS REAL) <> 0", quote_ident(column)));
    }

    part
}
