pub mod error;
pub mod filter;
pub mod store;
pub mod testing;
pub mod update;

pub use error::{JoblyError, Result};
pub use filter::{apply_filters, build_predicates, FilterCriteria, FilterFields, QueryPart};
pub use store::{
    CompanyFilter, CompanyStore, JobFilter, JobStore, NewCompany, NewJob, NewUser, UserStore,
};
pub use update::{build_set_clause, quote_ident, ColumnMap, SetClause, UpdatePayload};

/// One row as handed back by a [`Database`]: column name to JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A scalar bound to a positional placeholder.
pub type SqlValue = serde_json::Value;

/// Parameterized statement execution, supplied by a storage adapter.
///
/// Placeholders are 1-based and written `$1`, `$2`, ... . Statements that
/// need to report what they touched use `RETURNING`; every returned row comes
/// back as a [`Record`] in result order.
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>>;
}
