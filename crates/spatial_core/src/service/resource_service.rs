//! Point and polygon resource service.
//!
//! # Responsibility
//! - Provide create/list/get/patch/delete for one resource kind.
//! - Provide nearest-to-point (points) and containment (polygons) reads.
//! - Emit one `resource_<operation>` outcome event per call.
//!
//! # Invariants
//! - Validation failures return before the gateway is touched.
//! - Store failures keep their cause in `Error::source` but display a
//!   generic message.
//! - Log events carry metadata only, never names, properties or geometry.

use crate::db::StoreGateway;
use crate::model::resource::{
    CreateResource, ListQuery, NearestPage, NearestQuery, PatchResource, Resource, ResourceId,
    ResourceKind, ResourcePage, ValidationError,
};
use crate::query::mutation::{InsertMutation, PatchMutation};
use crate::query::pagination::{normalize_limit, Page};
use crate::query::predicate::PredicateSet;
use crate::repo::spatial_repo::{RepoError, SpatialRepository};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Default result count for nearest-to-point queries.
pub const DEFAULT_NEAREST_LIMIT: i64 = 1;
/// Largest result count a nearest-to-point query may request.
pub const MAX_NEAREST_LIMIT: i64 = 1000;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Outcome taxonomy exposed to the routing layer.
#[derive(Debug)]
pub enum ServiceError {
    /// Client error detected before any store interaction.
    Validation(ValidationError),
    NotFound(ResourceId),
    /// Opaque persistence failure, including undecodable rows.
    Store(RepoError),
}

impl ServiceError {
    /// HTTP-style status the routing layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Store(_) => 500,
        }
    }

    /// Stable machine-readable code, also used in log events.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::InvalidGeometry(_)) => "invalid_geometry",
            Self::Validation(ValidationError::MissingRequiredField(_)) => "missing_required_field",
            Self::Validation(ValidationError::NoFieldsToUpdate) => "no_fields_to_update",
            Self::Validation(ValidationError::UnsupportedForKind { .. }) => "unsupported_for_kind",
            Self::NotFound(_) => "not_found",
            Self::Store(cause) => store_error_code(cause),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(_) => f.write_str("Not found"),
            Self::Store(_) => f.write_str("internal store error"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Service facade for one resource kind.
pub struct ResourceService<G: StoreGateway> {
    repo: SpatialRepository<G>,
}

impl<G: StoreGateway> ResourceService<G> {
    pub fn new(gateway: G, kind: ResourceKind) -> Self {
        Self {
            repo: SpatialRepository::new(gateway, kind),
        }
    }

    pub fn points(gateway: G) -> Self {
        Self::new(gateway, ResourceKind::Point)
    }

    pub fn polygons(gateway: G) -> Self {
        Self::new(gateway, ResourceKind::Polygon)
    }

    pub fn kind(&self) -> ResourceKind {
        self.repo.kind()
    }

    /// Creates one resource from a raw payload.
    ///
    /// # Errors
    /// - `MissingRequiredField("name")`, `InvalidGeometry` before any write.
    pub fn create(&self, payload: &CreateResource) -> ServiceResult<Resource> {
        self.observe("create", || {
            let insert = InsertMutation::from_payload(self.kind(), payload)?;
            Ok(self.repo.insert(&insert)?)
        })
    }

    /// Lists one page of resources matching the optional filters.
    pub fn list(&self, query: &ListQuery) -> ServiceResult<ResourcePage> {
        self.observe("list", || {
            let page = Page::normalize(query.limit.as_deref(), query.offset.as_deref());
            let predicates = PredicateSet::from_query(self.kind(), query);
            let items = self.repo.list(predicates, page)?;
            Ok(ResourcePage::new(items))
        })
    }

    pub fn get(&self, id: ResourceId) -> ServiceResult<Resource> {
        self.observe("get", || {
            self.repo.get(id)?.ok_or(ServiceError::NotFound(id))
        })
    }

    /// Applies only the fields present in `payload`.
    ///
    /// # Errors
    /// - `NoFieldsToUpdate` when the payload carries no recognized field;
    ///   nothing is sent to the store.
    /// - `NotFound` when no row matched `id`.
    pub fn patch(&self, id: ResourceId, payload: &PatchResource) -> ServiceResult<Resource> {
        self.observe("patch", || {
            let patch = PatchMutation::from_payload(self.kind(), payload)?;
            Ok(self.repo.patch(id, patch)?)
        })
    }

    pub fn delete(&self, id: ResourceId) -> ServiceResult<()> {
        self.observe("delete", || Ok(self.repo.delete(id)?))
    }

    /// Points ordered by ascending geodesic distance from `(lon, lat)`.
    ///
    /// # Errors
    /// - `UnsupportedForKind` on a polygon service.
    /// - `MissingRequiredField` when `lon` or `lat` is absent or not finite.
    pub fn nearest(&self, query: &NearestQuery) -> ServiceResult<NearestPage> {
        self.observe("nearest", || {
            self.require_kind("nearest", ResourceKind::Point)?;
            let lon = required_coordinate(query.lon, "lon")?;
            let lat = required_coordinate(query.lat, "lat")?;
            let limit = nearest_limit(query.limit.as_deref());
            let items = self.repo.nearest_points([lon, lat], limit)?;
            Ok(NearestPage { items })
        })
    }

    /// Points lying within polygon `polygon_id`.
    ///
    /// An unknown polygon yields an empty page, not `NotFound`.
    pub fn contained_points(&self, polygon_id: ResourceId) -> ServiceResult<ResourcePage> {
        self.observe("contains", || {
            self.require_kind("contains", ResourceKind::Polygon)?;
            let items = self.repo.points_within_polygon(polygon_id)?;
            Ok(ResourcePage::new(items))
        })
    }

    fn require_kind(&self, operation: &'static str, expected: ResourceKind) -> ServiceResult<()> {
        if self.kind() != expected {
            return Err(ValidationError::UnsupportedForKind {
                operation,
                kind: self.kind(),
            }
            .into());
        }
        Ok(())
    }

    fn observe<T>(
        &self,
        operation: &'static str,
        run: impl FnOnce() -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let started_at = Instant::now();
        let result = run();
        let kind = self.kind().label();
        match &result {
            Ok(_) => info!(
                "event=resource_{} module=service status=ok kind={} duration_ms={}",
                operation,
                kind,
                started_at.elapsed().as_millis()
            ),
            Err(ServiceError::Store(cause)) => error!(
                "event=resource_{} module=service status=error kind={} duration_ms={} error_code={} error={}",
                operation,
                kind,
                started_at.elapsed().as_millis(),
                store_error_code(cause),
                cause
            ),
            Err(err) => info!(
                "event=resource_{} module=service status=error kind={} duration_ms={} error_code={}",
                operation,
                kind,
                started_at.elapsed().as_millis(),
                err.error_code()
            ),
        }
        result
    }
}

fn store_error_code(cause: &RepoError) -> &'static str {
    match cause {
        RepoError::InvalidData(_) => "invalid_data",
        _ => "store_error",
    }
}

fn nearest_limit(raw: Option<&str>) -> i64 {
    normalize_limit(raw, DEFAULT_NEAREST_LIMIT, MAX_NEAREST_LIMIT)
}

fn required_coordinate(value: Option<f64>, field: &'static str) -> Result<f64, ValidationError> {
    value
        .filter(|value| value.is_finite())
        .ok_or(ValidationError::MissingRequiredField(field))
}
