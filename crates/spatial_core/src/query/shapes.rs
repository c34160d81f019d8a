//! Statement shapes for every resource operation.
//!
//! Each function only decides statement structure; values arrive already
//! validated from the builders in this module's siblings.

use crate::model::resource::{ResourceId, ResourceKind};
use crate::query::mutation::{InsertMutation, PatchMutation};
use crate::query::pagination::Page;
use crate::query::predicate::PredicateSet;
use crate::query::statement::{SqlValue, Statement, StatementBuilder};

const RESOURCE_COLUMNS: &str =
    "id, name, properties, ST_AsGeoJSON(geom) AS geom, created_at, updated_at";

const RETURNING_RESOURCE: &str =
    " RETURNING id, name, properties, ST_AsGeoJSON(geom) AS geom, created_at, updated_at";

/// Store expression for the current time in Unix epoch milliseconds.
pub const NOW_EPOCH_MS_SQL: &str =
    "CAST((julianday('now') - 2440587.5) * 86400000.0 AS INTEGER)";

fn id_value(id: ResourceId) -> SqlValue {
    SqlValue::Text(id.to_string())
}

pub fn insert_statement(kind: ResourceKind, insert: &InsertMutation) -> Statement {
    StatementBuilder::new("INSERT INTO ")
        .text(kind.table())
        .text(" (id, name, properties, geom)")
        .bind(
            " VALUES (gen_random_uuid(), ?, ?, ST_SetSRID(ST_GeomFromGeoJSON(?), 4326))",
            insert.values(),
        )
        .text(RETURNING_RESOURCE)
        .build()
}

pub fn select_by_id_statement(kind: ResourceKind, id: ResourceId) -> Statement {
    StatementBuilder::new("SELECT ")
        .text(RESOURCE_COLUMNS)
        .text(" FROM ")
        .text(kind.table())
        .bind(" WHERE id = ?", [id_value(id)])
        .build()
}

/// Filtered page, newest first. Pagination values follow the predicates.
pub fn list_statement(kind: ResourceKind, predicates: PredicateSet, page: Page) -> Statement {
    StatementBuilder::new("SELECT ")
        .text(RESOURCE_COLUMNS)
        .text(" FROM ")
        .text(kind.table())
        .join(" WHERE ", " AND ", predicates.into_fragments())
        .text(" ORDER BY created_at DESC, rowid DESC")
        .bind(
            " LIMIT ? OFFSET ?",
            [SqlValue::Integer(page.limit), SqlValue::Integer(page.offset)],
        )
        .build()
}

/// Partial update scoped to one id; the id is always the last parameter.
pub fn patch_statement(kind: ResourceKind, id: ResourceId, patch: PatchMutation) -> Statement {
    StatementBuilder::new("UPDATE ")
        .text(kind.table())
        .join(" SET ", ", ", patch.into_assignments())
        .text(", updated_at = ")
        .text(NOW_EPOCH_MS_SQL)
        .bind(" WHERE id = ?", [id_value(id)])
        .text(RETURNING_RESOURCE)
        .build()
}

pub fn delete_statement(kind: ResourceKind, id: ResourceId) -> Statement {
    StatementBuilder::new("DELETE FROM ")
        .text(kind.table())
        .bind(" WHERE id = ?", [id_value(id)])
        .text(" RETURNING id")
        .build()
}

/// Points ordered by ascending geodesic distance from `[lon, lat]`.
pub fn nearest_points_statement([lon, lat]: [f64; 2], limit: i64) -> Statement {
    StatementBuilder::new("SELECT ")
        .text(RESOURCE_COLUMNS)
        .bind(
            ", ST_DistanceGeodesic(geom, ST_SetSRID(ST_MakePoint(?, ?), 4326)) AS meters",
            [SqlValue::Real(lon), SqlValue::Real(lat)],
        )
        .text(" FROM points ORDER BY meters ASC")
        .bind(" LIMIT ?", [SqlValue::Integer(limit)])
        .build()
}

/// Points lying within the geometry of one polygon.
pub fn contained_points_statement(polygon_id: ResourceId) -> Statement {
    StatementBuilder::new(
        "SELECT p.id AS id, p.name AS name, p.properties AS properties, \
         ST_AsGeoJSON(p.geom) AS geom, p.created_at AS created_at, p.updated_at AS updated_at \
         FROM points p JOIN polygons g ON ST_Within(p.geom, g.geom)",
    )
    .bind(" WHERE g.id = ?", [id_value(polygon_id)])
    .build()
}

#[cfg(test)]
mod tests {
    use super::{
        contained_points_statement, delete_statement, list_statement, nearest_points_statement,
        patch_statement,
    };
    use crate::model::resource::{ListQuery, PatchResource, ResourceKind};
    use crate::query::mutation::PatchMutation;
    use crate::query::pagination::Page;
    use crate::query::predicate::PredicateSet;
    use crate::query::statement::SqlValue;
    use uuid::Uuid;

    #[test]
    fn list_without_filters_has_no_where_clause() {
        let statement = list_statement(
            ResourceKind::Polygon,
            PredicateSet::default(),
            Page::default(),
        );
        assert!(!statement.sql().contains("WHERE"));
        assert!(statement.sql().contains("FROM polygons"));
        assert!(statement.sql().ends_with("LIMIT ?1 OFFSET ?2"));
        assert_eq!(
            statement.params(),
            &[SqlValue::Integer(100), SqlValue::Integer(0)]
        );
    }

    #[test]
    fn list_pagination_follows_filter_placeholders() {
        let query = ListQuery {
            bbox: Some("0,0,1,1".to_string()),
            within: Some("{\"type\":\"Polygon\"}".to_string()),
            ..ListQuery::default()
        };
        let statement = list_statement(
            ResourceKind::Point,
            PredicateSet::from_query(ResourceKind::Point, &query),
            Page::normalize(Some("5"), Some("10")),
        );

        assert!(statement
            .sql()
            .contains("WHERE ST_BBoxIntersects(geom, ST_MakeEnvelope(?1, ?2, ?3, ?4, 4326))"));
        assert!(statement
            .sql()
            .contains("AND ST_Within(geom, ST_SetSRID(ST_GeomFromGeoJSON(?5), 4326))"));
        assert!(statement.sql().ends_with("LIMIT ?6 OFFSET ?7"));
        assert_eq!(statement.params().len(), 7);
        assert_eq!(statement.params()[5], SqlValue::Integer(5));
        assert_eq!(statement.params()[6], SqlValue::Integer(10));
    }

    #[test]
    fn patch_binds_id_last() {
        let id = Uuid::new_v4();
        let payload: PatchResource =
            serde_json::from_value(serde_json::json!({"name": "n", "properties": {"a": 1}}))
                .unwrap();
        let patch = PatchMutation::from_payload(ResourceKind::Point, &payload).unwrap();
        let statement = patch_statement(ResourceKind::Point, id, patch);

        assert!(statement.sql().starts_with("UPDATE points SET name = ?1, properties = ?2"));
        assert!(statement.sql().contains("updated_at = "));
        assert!(statement.sql().contains("WHERE id = ?3 RETURNING"));
        assert_eq!(
            statement.params().last(),
            Some(&SqlValue::Text(id.to_string()))
        );
        assert!(statement.is_mutation());
    }

    #[test]
    fn delete_is_scoped_to_one_id() {
        let id = Uuid::new_v4();
        let statement = delete_statement(ResourceKind::Polygon, id);
        assert_eq!(
            statement.sql(),
            "DELETE FROM polygons WHERE id = ?1 RETURNING id"
        );
    }

    #[test]
    fn nearest_orders_by_distance() {
        let statement = nearest_points_statement([77.6, 12.97], 3);
        assert!(statement.sql().contains("ST_MakePoint(?1, ?2)"));
        assert!(statement.sql().contains("ORDER BY meters ASC LIMIT ?3"));
        assert_eq!(statement.params()[2], SqlValue::Integer(3));
    }

    #[test]
    fn containment_joins_points_to_polygon() {
        let statement = contained_points_statement(Uuid::new_v4());
        assert!(statement.sql().contains("ST_Within(p.geom, g.geom)"));
        assert!(statement.sql().ends_with("WHERE g.id = ?1"));
    }
}
