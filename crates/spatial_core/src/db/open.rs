//! Pool bootstrap for the spatial store.
//!
//! # Responsibility
//! - Open file-backed or in-memory SQLite connections.
//! - Configure pragmas and register spatial SQL functions on each one.
//! - Apply schema migrations before the pool is handed out.
//!
//! # Invariants
//! - Returned pools hold only fully bootstrapped connections.
//! - File pools run in WAL mode so readers never block the single writer.
//! - In-memory pools hold exactly one connection; separate in-memory
//!   connections would not share data.

use super::migrations::apply_migrations;
use super::pool::ConnectionPool;
use super::spatial_sql::register_spatial_functions;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Largest accepted pool size.
pub const MAX_POOL_SIZE: usize = 64;

/// Opens `size` connections to a SQLite file and migrates the schema.
///
/// # Side effects
/// - Creates the database file when missing.
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool(path: impl AsRef<Path>, size: usize) -> DbResult<ConnectionPool> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file pool_size={size}");

    let result = open_file_connections(path.as_ref(), size).and_then(ConnectionPool::new);
    log_open_outcome("file", started_at, &result);
    result
}

/// Opens a single-connection in-memory pool and migrates the schema.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool_in_memory() -> DbResult<ConnectionPool> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory pool_size=1");

    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|mut conn| {
            bootstrap_connection(&conn)?;
            apply_migrations(&mut conn)?;
            Ok(conn)
        })
        .and_then(|conn| ConnectionPool::new(vec![conn]));
    log_open_outcome("memory", started_at, &result);
    result
}

fn open_file_connections(path: &Path, size: usize) -> DbResult<Vec<Connection>> {
    if size == 0 || size > MAX_POOL_SIZE {
        return Err(DbError::InvalidPoolSize(size));
    }

    let mut connections = Vec::with_capacity(size);
    for index in 0..size {
        let mut conn = Connection::open(path)?;
        bootstrap_connection(&conn)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        if index == 0 {
            apply_migrations(&mut conn)?;
        }
        connections.push(conn);
    }
    Ok(connections)
}

fn bootstrap_connection(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    register_spatial_functions(conn)?;
    Ok(())
}

fn log_open_outcome(mode: &str, started_at: Instant, result: &DbResult<ConnectionPool>) {
    match result {
        Ok(pool) => info!(
            "event=db_open module=db status=ok mode={} pool_size={} duration_ms={}",
            mode,
            pool.size(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code={} error={}",
            mode,
            started_at.elapsed().as_millis(),
            open_error_code(err),
            err
        ),
    }
}

fn open_error_code(err: &DbError) -> &'static str {
    match err {
        DbError::Sqlite(_) => "db_open_failed",
        DbError::UnsupportedSchemaVersion { .. } => "db_schema_unsupported",
        DbError::InvalidPoolSize(_) => "db_pool_size_invalid",
        DbError::PoolPoisoned => "db_pool_poisoned",
    }
}
