//! SQLite spatial store bootstrap, pooling and statement execution.
//!
//! # Responsibility
//! - Open and configure pooled SQLite connections.
//! - Register the spatial SQL functions statements rely on.
//! - Apply schema migrations in deterministic order.
//! - Execute rendered statements through the [`StoreGateway`] seam.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Every pooled connection has spatial functions registered before use.
//! - A pooled connection is held for exactly one statement.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod gateway;
pub mod migrations;
mod open;
pub mod pool;
pub mod spatial_sql;

pub use gateway::{RowSet, SqliteGateway, StoreGateway, StoreRow};
pub use open::{open_pool, open_pool_in_memory, MAX_POOL_SIZE};
pub use pool::{ConnectionPool, PooledConnection};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Pool bookkeeping lock was poisoned by a panicking holder.
    PoolPoisoned,
    InvalidPoolSize(usize),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::PoolPoisoned => f.write_str("connection pool lock poisoned"),
            Self::InvalidPoolSize(size) => write!(f, "invalid connection pool size {size}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
