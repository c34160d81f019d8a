//! Geometry model and structural validation.
//!
//! # Responsibility
//! - Define the two geometry shapes resources can carry (Point, Polygon).
//! - Validate raw GeoJSON payloads against an expected geometry kind.
//!
//! # Invariants
//! - A `Geometry` value only exists after passing [`validate_geometry`] or
//!   after being decoded from a persisted row.
//! - Coordinates are longitude/latitude in WGS84 (SRID 4326).
//! - Validation is structural only: no coordinate-range, ring-closure or
//!   winding checks are performed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Spatial reference identifier every persisted geometry is tagged with.
pub const WGS84_SRID: i32 = 4326;

/// One `[longitude, latitude]` position.
pub type Coordinate = [f64; 2];

/// Ordered positions forming one polygon ring.
pub type LinearRing = Vec<Coordinate>;

/// Structural discriminator a resource geometry must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Polygon,
}

impl GeometryKind {
    /// GeoJSON `type` member for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::Polygon => "Polygon",
        }
    }

    /// Human-readable description of the accepted payload shape.
    pub fn expected_shape(self) -> &'static str {
        match self {
            Self::Point => "geom must be GeoJSON Point [lon, lat] in EPSG:4326",
            Self::Polygon => {
                "geom must be GeoJSON Polygon (array of linear rings) in EPSG:4326"
            }
        }
    }
}

/// Validated resource geometry.
///
/// Serialized as plain GeoJSON (`{"type": "...", "coordinates": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Coordinate },
    Polygon { coordinates: Vec<LinearRing> },
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point { .. } => GeometryKind::Point,
            Self::Polygon { .. } => GeometryKind::Polygon,
        }
    }

    /// Renders the geometry as a GeoJSON document string.
    pub fn to_geojson(&self) -> String {
        let value = match self {
            Self::Point { coordinates } => serde_json::json!({
                "type": "Point",
                "coordinates": coordinates,
            }),
            Self::Polygon { coordinates } => serde_json::json!({
                "type": "Polygon",
                "coordinates": coordinates,
            }),
        };
        value.to_string()
    }
}

/// Structural mismatch between a payload and the expected geometry kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryError {
    expected: GeometryKind,
}

impl GeometryError {
    pub fn new(expected: GeometryKind) -> Self {
        Self { expected }
    }

    pub fn expected(&self) -> GeometryKind {
        self.expected
    }
}

impl Display for GeometryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.expected.expected_shape())
    }
}

impl Error for GeometryError {}

/// Validates a raw GeoJSON payload against `kind` and returns the typed value.
///
/// # Contract
/// - `Point`: object with `type == "Point"` and exactly two numeric
///   coordinates.
/// - `Polygon`: object with `type == "Polygon"` and a non-empty array of
///   rings, each ring an array of numeric coordinate pairs.
/// - Absent or `null` payloads are rejected like any other mismatch.
///
/// # Errors
/// Returns [`GeometryError`] naming the expected shape on any violation.
pub fn validate_geometry(
    kind: GeometryKind,
    geometry: Option<&Value>,
) -> Result<Geometry, GeometryError> {
    let invalid = || GeometryError::new(kind);

    let object = geometry.and_then(Value::as_object).ok_or_else(invalid)?;
    if object.get("type").and_then(Value::as_str) != Some(kind.as_str()) {
        return Err(invalid());
    }
    let coordinates = object
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(invalid)?;

    match kind {
        GeometryKind::Point => parse_coordinate(coordinates)
            .map(|coordinates| Geometry::Point { coordinates })
            .ok_or_else(invalid),
        GeometryKind::Polygon => {
            if coordinates.is_empty() {
                return Err(invalid());
            }
            coordinates
                .iter()
                .map(parse_ring)
                .collect::<Option<Vec<_>>>()
                .map(|coordinates| Geometry::Polygon { coordinates })
                .ok_or_else(invalid)
        }
    }
}

fn parse_ring(ring: &Value) -> Option<LinearRing> {
    ring.as_array()?
        .iter()
        .map(|position| parse_coordinate(position.as_array()?))
        .collect()
}

fn parse_coordinate(values: &[Value]) -> Option<Coordinate> {
    match values {
        [lon, lat] => Some([lon.as_f64()?, lat.as_f64()?]),
        _ => None,
    }
}
