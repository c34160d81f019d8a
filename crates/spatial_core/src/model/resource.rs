//! Resource domain model shared by points and polygons.
//!
//! # Responsibility
//! - Define the persisted resource record and its kind tag.
//! - Define request payloads accepted by the resource services.
//!
//! # Invariants
//! - `id`, `created_at` and `updated_at` are store-assigned and never part
//!   of a write payload.
//! - A resource's geometry kind always equals `ResourceKind::geometry_kind()`.

use crate::model::geometry::{Geometry, GeometryError, GeometryKind};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned resource identifier.
pub type ResourceId = Uuid;

/// Open caller-defined attribute mapping.
pub type Properties = serde_json::Map<String, Value>;

/// Resource variant, carrying everything that differs between points and
/// polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Point,
    Polygon,
}

impl ResourceKind {
    pub fn geometry_kind(self) -> GeometryKind {
        match self {
            Self::Point => GeometryKind::Point,
            Self::Polygon => GeometryKind::Polygon,
        }
    }

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::Point => "points",
            Self::Polygon => "polygons",
        }
    }

    /// Kind-specific topological list filter.
    pub fn topological_filter(self) -> TopologicalFilter {
        match self {
            Self::Point => TopologicalFilter::Within,
            Self::Polygon => TopologicalFilter::Intersects,
        }
    }

    /// Short lowercase label used in log events.
    pub fn label(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Polygon => "polygon",
        }
    }
}

/// Geometry-to-geometry list filter selected by resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologicalFilter {
    /// Keeps resources whose geometry lies within the filter geometry.
    Within,
    /// Keeps resources whose geometry intersects the filter geometry.
    Intersects,
}

/// Persisted point or polygon record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub properties: Properties,
    pub geom: Geometry,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed on every patch.
    pub updated_at: i64,
}

/// Point record annotated with its geodesic distance from a query position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestResource {
    #[serde(flatten)]
    pub resource: Resource,
    pub meters: f64,
}

/// One page of list or containment results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePage {
    /// Rows returned in this page, not a total.
    pub count: usize,
    pub items: Vec<Resource>,
}

impl ResourcePage {
    pub fn new(items: Vec<Resource>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

/// Nearest-neighbor results, closest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestPage {
    pub items: Vec<NearestResource>,
}

/// Create payload.
///
/// Fields stay optional so missing values surface as validation errors
/// instead of decode failures.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateResource {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default)]
    pub geom: Option<Value>,
}

/// Sparse patch payload.
///
/// Absent fields are left unchanged. An explicit `"geom": null` counts as
/// present and is rejected by geometry validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PatchResource {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub geom: Option<Value>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Raw list query parameters, exactly as received from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    /// `west,south,east,north`.
    pub bbox: Option<String>,
    /// GeoJSON geometry, honored for points.
    pub within: Option<String>,
    /// GeoJSON geometry, honored for polygons.
    pub intersects: Option<String>,
}

impl ListQuery {
    /// Returns the topological filter geometry relevant to `kind`.
    pub fn topology_for(&self, kind: ResourceKind) -> Option<&str> {
        let raw = match kind.topological_filter() {
            TopologicalFilter::Within => self.within.as_deref(),
            TopologicalFilter::Intersects => self.intersects.as_deref(),
        };
        raw.filter(|value| !value.is_empty())
    }
}

/// Nearest-to-point query parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NearestQuery {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    /// Result count, defaults to 1.
    pub limit: Option<String>,
}

/// Client-side request errors detected before any store interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidGeometry(GeometryError),
    MissingRequiredField(&'static str),
    NoFieldsToUpdate,
    /// Operation only defined for another resource kind.
    UnsupportedForKind {
        operation: &'static str,
        kind: ResourceKind,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGeometry(err) => write!(f, "{err}"),
            Self::MissingRequiredField(field) => write!(f, "{field} is required"),
            Self::NoFieldsToUpdate => f.write_str("No fields to update"),
            Self::UnsupportedForKind { operation, kind } => {
                write!(f, "{operation} is not available for {} resources", kind.label())
            }
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidGeometry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GeometryError> for ValidationError {
    fn from(value: GeometryError) -> Self {
        Self::InvalidGeometry(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ListQuery, PatchResource, ResourceKind};
    use serde_json::json;

    #[test]
    fn patch_distinguishes_absent_and_null_geometry() {
        let absent: PatchResource = serde_json::from_value(json!({"name": "x"})).unwrap();
        assert!(absent.geom.is_none());

        let explicit_null: PatchResource =
            serde_json::from_value(json!({"geom": null})).unwrap();
        assert_eq!(explicit_null.geom, Some(serde_json::Value::Null));
    }

    #[test]
    fn empty_properties_object_counts_as_present() {
        let patch: PatchResource = serde_json::from_value(json!({"properties": {}})).unwrap();
        assert_eq!(patch.properties, Some(serde_json::Map::new()));
    }

    #[test]
    fn topology_parameter_follows_kind() {
        let query = ListQuery {
            within: Some("w".to_string()),
            intersects: Some("i".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(query.topology_for(ResourceKind::Point), Some("w"));
        assert_eq!(query.topology_for(ResourceKind::Polygon), Some("i"));
    }
}
