//! Resource repository parameterized by [`ResourceKind`].
//!
//! # Responsibility
//! - Execute one statement per operation through a [`StoreGateway`].
//! - Map returned rows to [`Resource`] and [`NearestResource`] values.
//!
//! # Invariants
//! - Every operation issues exactly one statement.
//! - Patch and delete report `NotFound` when the statement returns no row.

use crate::db::{DbError, StoreGateway, StoreRow};
use crate::model::geometry::Geometry;
use crate::model::resource::{NearestResource, Properties, Resource, ResourceId, ResourceKind};
use crate::query::mutation::{InsertMutation, PatchMutation};
use crate::query::pagination::Page;
use crate::query::predicate::PredicateSet;
use crate::query::shapes::{
    contained_points_statement, delete_statement, insert_statement, list_statement,
    nearest_points_statement, patch_statement, select_by_id_statement,
};
use crate::query::statement::SqlValue;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for resource persistence and spatial queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(ResourceId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "resource not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted resource data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// One resource table behind a store gateway.
pub struct SpatialRepository<G: StoreGateway> {
    gateway: G,
    kind: ResourceKind,
}

impl<G: StoreGateway> SpatialRepository<G> {
    pub fn new(gateway: G, kind: ResourceKind) -> Self {
        Self { gateway, kind }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Inserts one row and returns it as stored.
    pub fn insert(&self, insert: &InsertMutation) -> RepoResult<Resource> {
        let rows = self.gateway.execute(&insert_statement(self.kind, insert))?;
        let row = rows.rows().first().ok_or_else(|| {
            RepoError::InvalidData(format!("insert into {} returned no row", self.kind.table()))
        })?;
        parse_resource_row(self.kind, row)
    }

    pub fn get(&self, id: ResourceId) -> RepoResult<Option<Resource>> {
        let rows = self
            .gateway
            .execute(&select_by_id_statement(self.kind, id))?;
        rows.rows()
            .first()
            .map(|row| parse_resource_row(self.kind, row))
            .transpose()
    }

    /// Filtered page, newest first.
    pub fn list(&self, predicates: PredicateSet, page: Page) -> RepoResult<Vec<Resource>> {
        let rows = self
            .gateway
            .execute(&list_statement(self.kind, predicates, page))?;
        rows.rows()
            .iter()
            .map(|row| parse_resource_row(self.kind, row))
            .collect()
    }

    /// Applies `patch` to one row and returns the updated record.
    pub fn patch(&self, id: ResourceId, patch: PatchMutation) -> RepoResult<Resource> {
        let rows = self
            .gateway
            .execute(&patch_statement(self.kind, id, patch))?;
        match rows.rows().first() {
            Some(row) => parse_resource_row(self.kind, row),
            None => Err(RepoError::NotFound(id)),
        }
    }

    pub fn delete(&self, id: ResourceId) -> RepoResult<()> {
        let rows = self.gateway.execute(&delete_statement(self.kind, id))?;
        if rows.row_count() == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    /// Points closest to `position`, ascending by geodesic distance.
    pub fn nearest_points(
        &self,
        position: [f64; 2],
        limit: i64,
    ) -> RepoResult<Vec<NearestResource>> {
        let rows = self
            .gateway
            .execute(&nearest_points_statement(position, limit))?;
        rows.rows()
            .iter()
            .map(|row| {
                Ok(NearestResource {
                    resource: parse_resource_row(ResourceKind::Point, row)?,
                    meters: real_column(row, "meters")?,
                })
            })
            .collect()
    }

    /// Points whose geometry lies within polygon `polygon_id`.
    ///
    /// An unknown polygon id yields an empty list.
    pub fn points_within_polygon(&self, polygon_id: ResourceId) -> RepoResult<Vec<Resource>> {
        let rows = self
            .gateway
            .execute(&contained_points_statement(polygon_id))?;
        rows.rows()
            .iter()
            .map(|row| parse_resource_row(ResourceKind::Point, row))
            .collect()
    }
}

fn parse_resource_row(kind: ResourceKind, row: &StoreRow) -> RepoResult<Resource> {
    let table = kind.table();

    let id_text = text_column(row, "id")?;
    let id = Uuid::parse_str(id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in {table}.id"))
    })?;

    let properties: Properties =
        serde_json::from_str(text_column(row, "properties")?).map_err(|err| {
            RepoError::InvalidData(format!("invalid JSON object in {table}.properties: {err}"))
        })?;

    let geom: Geometry = serde_json::from_str(text_column(row, "geom")?).map_err(|err| {
        RepoError::InvalidData(format!("invalid geometry in {table}.geom: {err}"))
    })?;
    if geom.kind() != kind.geometry_kind() {
        return Err(RepoError::InvalidData(format!(
            "unexpected {} geometry in {table}.geom",
            geom.kind().as_str()
        )));
    }

    Ok(Resource {
        id,
        name: text_column(row, "name")?.to_string(),
        properties,
        geom,
        created_at: integer_column(row, "created_at")?,
        updated_at: integer_column(row, "updated_at")?,
    })
}

fn column<'row>(row: &'row StoreRow, name: &str) -> RepoResult<&'row SqlValue> {
    row.get(name)
        .ok_or_else(|| RepoError::InvalidData(format!("missing column `{name}`")))
}

fn text_column<'row>(row: &'row StoreRow, name: &str) -> RepoResult<&'row str> {
    match column(row, name)? {
        SqlValue::Text(text) => Ok(text),
        other => Err(RepoError::InvalidData(format!(
            "expected text in column `{name}`, found {other:?}"
        ))),
    }
}

fn integer_column(row: &StoreRow, name: &str) -> RepoResult<i64> {
    match column(row, name)? {
        SqlValue::Integer(value) => Ok(*value),
        other => Err(RepoError::InvalidData(format!(
            "expected integer in column `{name}`, found {other:?}"
        ))),
    }
}

fn real_column(row: &StoreRow, name: &str) -> RepoResult<f64> {
    match column(row, name)? {
        SqlValue::Real(value) => Ok(*value),
        SqlValue::Integer(value) => Ok(*value as f64),
        other => Err(RepoError::InvalidData(format!(
            "expected number in column `{name}`, found {other:?}"
        ))),
    }
}
