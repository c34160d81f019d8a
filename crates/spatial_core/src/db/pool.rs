//! Fixed-size SQLite connection pool with scoped checkout.
//!
//! # Invariants
//! - A connection is owned by at most one [`PooledConnection`] at a time.
//! - Dropping a [`PooledConnection`] always returns its connection, on every
//!   exit path, including unwinding.
//! - `acquire` blocks until a connection is free; the pool imposes no timeout.

use super::{DbError, DbResult};
use log::debug;
use rusqlite::Connection;
use std::ops::Deref;
use std::sync::{Condvar, Mutex};

pub struct ConnectionPool {
    idle: Mutex<Vec<Connection>>,
    returned: Condvar,
    size: usize,
}

impl ConnectionPool {
    /// Wraps already bootstrapped connections.
    pub fn new(connections: Vec<Connection>) -> DbResult<Self> {
        if connections.is_empty() {
            return Err(DbError::InvalidPoolSize(0));
        }
        let size = connections.len();
        Ok(Self {
            idle: Mutex::new(connections),
            returned: Condvar::new(),
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of connections currently checked in.
    pub fn idle_count(&self) -> usize {
        match self.idle.lock() {
            Ok(idle) => idle.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Checks out one connection, waiting while all are in use.
    pub fn acquire(&self) -> DbResult<PooledConnection<'_>> {
        let mut idle = self.idle.lock().map_err(|_| DbError::PoolPoisoned)?;
        loop {
            if let Some(conn) = idle.pop() {
                return Ok(PooledConnection {
                    pool: self,
                    conn: Some(conn),
                });
            }
            debug!("event=pool_wait module=db status=start size={}", self.size);
            idle = self
                .returned
                .wait(idle)
                .map_err(|_| DbError::PoolPoisoned)?;
        }
    }

    fn release(&self, conn: Connection) {
        let mut idle = match self.idle.lock() {
            Ok(idle) => idle,
            Err(poisoned) => poisoned.into_inner(),
        };
        idle.push(conn);
        self.returned.notify_one();
    }
}

/// Checked-out connection, returned to its pool on drop.
pub struct PooledConnection<'pool> {
    pool: &'pool ConnectionPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `Drop` takes the connection out.
        self.conn
            .as_ref()
            .unwrap_or_else(|| unreachable!("pooled connection used after release"))
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionPool;
    use crate::db::DbError;
    use rusqlite::Connection;
    use std::sync::Arc;
    use std::thread;

    fn pool_of(size: usize) -> ConnectionPool {
        let connections = (0..size)
            .map(|_| Connection::open_in_memory().unwrap())
            .collect();
        ConnectionPool::new(connections).unwrap()
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(matches!(
            ConnectionPool::new(Vec::new()),
            Err(DbError::InvalidPoolSize(0))
        ));
    }

    #[test]
    fn connection_returns_on_drop() {
        let pool = pool_of(2);
        {
            let first = pool.acquire().unwrap();
            let _second = pool.acquire().unwrap();
            assert_eq!(pool.idle_count(), 0);
            let one: i64 = first.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
            assert_eq!(one, 1);
        }
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn connection_returns_on_error_path() {
        let pool = pool_of(1);
        let result: Result<i64, rusqlite::Error> = (|| {
            let conn = pool.acquire().unwrap();
            conn.query_row("SELECT * FROM missing_table", [], |row| row.get(0))
        })();
        assert!(result.is_err());
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn waiting_acquirer_is_woken_by_release() {
        let pool = Arc::new(pool_of(1));
        let held = pool.acquire().unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let conn = pool.acquire().unwrap();
                conn.query_row("SELECT 2", [], |row| row.get::<_, i64>(0))
                    .unwrap()
            })
        };

        drop(held);
        assert_eq!(waiter.join().unwrap(), 2);
        assert_eq!(pool.idle_count(), 1);
    }
}
