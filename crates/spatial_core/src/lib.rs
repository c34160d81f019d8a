//! Spatial filter and mutation engine for point and polygon resources.
//! This crate owns validation, statement assembly and the SQLite store adapter.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{ConfigError, SpatialConfig};
pub use db::{
    open_pool, open_pool_in_memory, ConnectionPool, DbError, DbResult, RowSet, SqliteGateway,
    StoreGateway, StoreRow,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::geometry::{Geometry, GeometryError, GeometryKind, WGS84_SRID};
pub use model::resource::{
    CreateResource, ListQuery, NearestPage, NearestQuery, NearestResource, PatchResource,
    Properties, Resource, ResourceId, ResourceKind, ResourcePage, ValidationError,
};
pub use repo::spatial_repo::{RepoError, RepoResult, SpatialRepository};
pub use service::resource_service::{ResourceService, ServiceError, ServiceResult};

use query::statement::{SqlValue, StatementBuilder};

/// Minimal liveness probe.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Round-trips one trivial statement through `gateway`.
///
/// # Errors
/// Returns the store error when the statement fails or answers unexpectedly.
pub fn health_check<G: StoreGateway>(gateway: &G) -> RepoResult<()> {
    let statement = StatementBuilder::new("SELECT 1 AS ok").build();
    let rows = gateway.execute(&statement)?;
    match rows.rows().first().and_then(|row| row.get("ok")) {
        Some(SqlValue::Integer(1)) => Ok(()),
        other => Err(RepoError::InvalidData(format!(
            "health probe returned {other:?}"
        ))),
    }
}
