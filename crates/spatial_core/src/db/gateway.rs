//! Store gateway seam between statement builders and the SQLite pool.
//!
//! # Responsibility
//! - Execute one rendered [`Statement`] and return its rows as owned values.
//! - Hold a pooled connection only for the duration of that statement.
//!
//! # Invariants
//! - Gateways never inspect or rewrite statement text.
//! - Store failures are passed through unclassified as [`DbError`](super::DbError).

use super::pool::ConnectionPool;
use super::DbResult;
use crate::query::statement::{SqlValue, Statement};
use log::{debug, error};
use rusqlite::params_from_iter;
use std::sync::Arc;
use std::time::Instant;

/// Request/response execute primitive consumed by the query engine.
pub trait StoreGateway {
    fn execute(&self, statement: &Statement) -> DbResult<RowSet>;
}

impl<G: StoreGateway + ?Sized> StoreGateway for &G {
    fn execute(&self, statement: &Statement) -> DbResult<RowSet> {
        (**self).execute(statement)
    }
}

impl<G: StoreGateway + ?Sized> StoreGateway for Arc<G> {
    fn execute(&self, statement: &Statement) -> DbResult<RowSet> {
        (**self).execute(statement)
    }
}

/// One returned row, columns in select order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreRow {
    columns: Vec<(String, SqlValue)>,
}

impl StoreRow {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    /// Value of the first column named `name`.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }
}

/// Ordered rows returned by one statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    rows: Vec<StoreRow>,
}

impl RowSet {
    pub fn new(rows: Vec<StoreRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[StoreRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Gateway over a shared [`ConnectionPool`].
#[derive(Clone)]
pub struct SqliteGateway {
    pool: Arc<ConnectionPool>,
}

impl SqliteGateway {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

impl StoreGateway for SqliteGateway {
    fn execute(&self, statement: &Statement) -> DbResult<RowSet> {
        let started_at = Instant::now();
        let result = run_statement(&self.pool, statement);
        match &result {
            Ok(rows) => debug!(
                "event=store_execute module=db status=ok mutation={} params={} rows={} duration_ms={}",
                statement.is_mutation(),
                statement.params().len(),
                rows.row_count(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_execute module=db status=error mutation={} duration_ms={} error_code=store_execute_failed error={}",
                statement.is_mutation(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

fn run_statement(pool: &ConnectionPool, statement: &Statement) -> DbResult<RowSet> {
    let conn = pool.acquire()?;
    let mut stmt = conn.prepare(statement.sql())?;
    let names: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = stmt.query(params_from_iter(statement.params().iter()))?;
    let mut collected = Vec::new();
    while let Some(row) = rows.next()? {
        let mut columns = Vec::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            columns.push((name.clone(), row.get::<_, SqlValue>(index)?));
        }
        collected.push(StoreRow::new(columns));
    }
    Ok(RowSet::new(collected))
}

#[cfg(test)]
mod tests {
    use super::{SqliteGateway, StoreGateway};
    use crate::db::open_pool_in_memory;
    use crate::query::statement::{SqlValue, StatementBuilder};
    use std::sync::Arc;

    #[test]
    fn returns_named_columns_in_order() {
        let gateway = SqliteGateway::new(Arc::new(open_pool_in_memory().unwrap()));
        let statement = StatementBuilder::new("SELECT ")
            .bind(
                "? AS answer, ? AS label",
                [SqlValue::Integer(42), SqlValue::Text("x".into())],
            )
            .build();

        let rows = gateway.execute(&statement).unwrap();
        assert_eq!(rows.row_count(), 1);
        let row = &rows.rows()[0];
        assert_eq!(row.get("answer"), Some(&SqlValue::Integer(42)));
        assert_eq!(row.get("label"), Some(&SqlValue::Text("x".into())));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn store_errors_release_the_connection() {
        let pool = Arc::new(open_pool_in_memory().unwrap());
        let gateway = SqliteGateway::new(Arc::clone(&pool));
        let statement = StatementBuilder::new("SELECT * FROM no_such_table").build();

        assert!(gateway.execute(&statement).is_err());
        assert_eq!(pool.idle_count(), 1);
    }
}
