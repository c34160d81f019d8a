//! Spatial SQL functions registered on every store connection.
//!
//! # Responsibility
//! - Provide the PostGIS-style function surface used by statement templates.
//! - Keep geometry storage as `SRID=<srid>;<GeoJSON>` text.
//!
//! # Invariants
//! - SQL `NULL` input yields `NULL` output for every geometry function.
//! - Binary predicates refuse geometries with different SRIDs.
//! - Envelopes with non-finite bounds evaluate to `NULL`, so a malformed
//!   bbox filter matches no rows instead of failing the statement.

use geo::{BoundingRect, Contains, Distance, Geodesic, Intersects, Point, Rect};
use geojson::GeoJson;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::Connection;
use uuid::Uuid;

type GeoGeometry = geo::Geometry<f64>;

const SRID_PREFIX: &str = "SRID=";

/// Registers all spatial functions on `conn`.
pub fn register_spatial_functions(conn: &Connection) -> rusqlite::Result<()> {
    let deterministic = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("ST_GeomFromGeoJSON", 1, deterministic, |ctx| {
        let Some(text) = ctx.get::<Option<String>>(0)? else {
            return Ok(None);
        };
        let geometry = parse_geojson(&text)?;
        let normalized = serde_json::to_string(&geometry)
            .map_err(|err| user_error(format!("ST_GeomFromGeoJSON: {err}")))?;
        Ok(Some(encode(0, &normalized)))
    })?;

    conn.create_scalar_function("ST_SetSRID", 2, deterministic, |ctx| {
        let Some(stored) = ctx.get::<Option<String>>(0)? else {
            return Ok(None);
        };
        let srid: i32 = ctx.get(1)?;
        let (_, geojson) = split_stored(&stored)?;
        Ok(Some(encode(srid, geojson)))
    })?;

    conn.create_scalar_function("ST_SRID", 1, deterministic, |ctx| {
        let Some(stored) = ctx.get::<Option<String>>(0)? else {
            return Ok(None);
        };
        Ok(Some(split_stored(&stored)?.0))
    })?;

    conn.create_scalar_function("ST_AsGeoJSON", 1, deterministic, |ctx| {
        let Some(stored) = ctx.get::<Option<String>>(0)? else {
            return Ok(None);
        };
        Ok(Some(split_stored(&stored)?.1.to_string()))
    })?;

    conn.create_scalar_function("ST_MakePoint", 2, deterministic, |ctx| {
        let (Some(x), Some(y)) = (finite_arg(ctx, 0)?, finite_arg(ctx, 1)?) else {
            return Ok(None);
        };
        let point = serde_json::json!({"type": "Point", "coordinates": [x, y]});
        Ok(Some(encode(0, &point.to_string())))
    })?;

    conn.create_scalar_function("ST_MakeEnvelope", 5, deterministic, |ctx| {
        let mut bounds = [0.0_f64; 4];
        for (index, bound) in bounds.iter_mut().enumerate() {
            match finite_arg(ctx, index)? {
                Some(value) => *bound = value,
                None => return Ok(None),
            }
        }
        let srid: i32 = ctx.get(4)?;
        let [xmin, ymin, xmax, ymax] = bounds;
        let envelope = serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[xmin, ymin], [xmax, ymin], [xmax, ymax], [xmin, ymax], [xmin, ymin]]],
        });
        Ok(Some(encode(srid, &envelope.to_string())))
    })?;

    conn.create_scalar_function("ST_BBoxIntersects", 2, deterministic, |ctx| {
        let Some((left, right)) = geometry_pair(ctx)? else {
            return Ok(None);
        };
        let overlap = match (left.bounding_rect(), right.bounding_rect()) {
            (Some(left), Some(right)) => rects_intersect(&left, &right),
            _ => false,
        };
        Ok(Some(overlap))
    })?;

    conn.create_scalar_function("ST_Within", 2, deterministic, |ctx| {
        let Some((inner, outer)) = geometry_pair(ctx)? else {
            return Ok(None);
        };
        Ok(Some(outer.contains(&inner)))
    })?;

    conn.create_scalar_function("ST_Intersects", 2, deterministic, |ctx| {
        let Some((left, right)) = geometry_pair(ctx)? else {
            return Ok(None);
        };
        Ok(Some(left.intersects(&right)))
    })?;

    conn.create_scalar_function("ST_DistanceGeodesic", 2, deterministic, |ctx| {
        let Some((from, to)) = geometry_pair(ctx)? else {
            return Ok(None);
        };
        match (from, to) {
            (GeoGeometry::Point(from), GeoGeometry::Point(to)) => {
                Ok(Some(geodesic_meters(from, to)))
            }
            _ => Err(user_error(
                "ST_DistanceGeodesic supports Point geometries only",
            )),
        }
    })?;

    conn.create_scalar_function("gen_random_uuid", 0, FunctionFlags::SQLITE_UTF8, |_| {
        Ok(Uuid::new_v4().to_string())
    })?;

    Ok(())
}

/// Ellipsoidal (WGS84) distance in meters.
pub fn geodesic_meters(from: Point<f64>, to: Point<f64>) -> f64 {
    Geodesic.distance(from, to)
}

fn encode(srid: i32, geojson: &str) -> String {
    format!("{SRID_PREFIX}{srid};{geojson}")
}

fn split_stored(stored: &str) -> rusqlite::Result<(i32, &str)> {
    let (srid, geojson) = stored
        .strip_prefix(SRID_PREFIX)
        .and_then(|rest| rest.split_once(';'))
        .ok_or_else(|| user_error("geometry value is missing its SRID prefix"))?;
    let srid = srid
        .parse::<i32>()
        .map_err(|_| user_error(format!("invalid SRID `{srid}` in geometry value")))?;
    Ok((srid, geojson))
}

fn parse_geojson(text: &str) -> rusqlite::Result<geojson::Geometry> {
    match text.parse::<GeoJson>() {
        Ok(GeoJson::Geometry(geometry)) => Ok(geometry),
        Ok(_) => Err(user_error("expected a GeoJSON geometry object")),
        Err(err) => Err(user_error(format!("invalid GeoJSON geometry: {err}"))),
    }
}

fn decode(stored: &str) -> rusqlite::Result<(i32, GeoGeometry)> {
    let (srid, geojson) = split_stored(stored)?;
    let geometry = GeoGeometry::try_from(parse_geojson(geojson)?)
        .map_err(|err| user_error(format!("unsupported geometry: {err}")))?;
    Ok((srid, geometry))
}

fn geometry_pair(ctx: &Context<'_>) -> rusqlite::Result<Option<(GeoGeometry, GeoGeometry)>> {
    let (Some(left), Some(right)) = (
        ctx.get::<Option<String>>(0)?,
        ctx.get::<Option<String>>(1)?,
    ) else {
        return Ok(None);
    };
    let (left_srid, left) = decode(&left)?;
    let (right_srid, right) = decode(&right)?;
    if left_srid != right_srid {
        return Err(user_error(format!(
            "operation on mixed SRID geometries ({left_srid} != {right_srid})"
        )));
    }
    Ok(Some((left, right)))
}

fn finite_arg(ctx: &Context<'_>, index: usize) -> rusqlite::Result<Option<f64>> {
    Ok(ctx.get::<Option<f64>>(index)?.filter(|value| value.is_finite()))
}

fn rects_intersect(left: &Rect<f64>, right: &Rect<f64>) -> bool {
    left.min().x <= right.max().x
        && left.max().x >= right.min().x
        && left.min().y <= right.max().y
        && left.max().y >= right.min().y
}

fn user_error(message: impl Into<String>) -> rusqlite::Error {
    rusqlite::Error::UserFunctionError(message.into().into())
}
