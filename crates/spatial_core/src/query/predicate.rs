//! List filter predicates.
//!
//! # Responsibility
//! - Translate optional `bbox` and `within`/`intersects` parameters into
//!   ordered predicate fragments with bound values.
//!
//! # Invariants
//! - Fragment order is bbox first, then the topological filter. Placeholder
//!   indices are positional, so this order is load-bearing.
//! - Filter input is passed through unvalidated: malformed bbox numbers
//!   become `NaN` operands and malformed GeoJSON is left for the store to
//!   reject.

use crate::model::resource::{ListQuery, ResourceKind, TopologicalFilter};
use crate::query::statement::{Fragment, SqlValue};

const BBOX_PREDICATE: &str = "ST_BBoxIntersects(geom, ST_MakeEnvelope(?, ?, ?, ?, 4326))";
const WITHIN_PREDICATE: &str = "ST_Within(geom, ST_SetSRID(ST_GeomFromGeoJSON(?), 4326))";
const INTERSECTS_PREDICATE: &str =
    "ST_Intersects(geom, ST_SetSRID(ST_GeomFromGeoJSON(?), 4326))";

/// Ordered list filters for one resource kind, combined with `AND`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    fragments: Vec<Fragment>,
}

impl PredicateSet {
    /// Builds predicates from raw list parameters.
    ///
    /// Empty parameter strings count as absent.
    pub fn from_query(kind: ResourceKind, query: &ListQuery) -> Self {
        let mut predicates = Self::default();

        if let Some(bbox) = query.bbox.as_deref().filter(|value| !value.is_empty()) {
            predicates.push_bbox(parse_bbox(bbox));
        }
        if let Some(geojson) = query.topology_for(kind) {
            predicates.push_topology(kind.topological_filter(), geojson);
        }

        predicates
    }

    pub fn push_bbox(&mut self, [west, south, east, north]: [f64; 4]) {
        self.fragments.push(Fragment::new(
            BBOX_PREDICATE,
            [west, south, east, north].map(SqlValue::Real),
        ));
    }

    pub fn push_topology(&mut self, filter: TopologicalFilter, geojson: &str) {
        let template = match filter {
            TopologicalFilter::Within => WITHIN_PREDICATE,
            TopologicalFilter::Intersects => INTERSECTS_PREDICATE,
        };
        self.fragments
            .push(Fragment::new(template, [SqlValue::Text(geojson.to_string())]));
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }
}

/// Splits `west,south,east,north`. Blank members read as `0`; missing or
/// malformed members become `NaN`.
pub fn parse_bbox(raw: &str) -> [f64; 4] {
    let mut parts = raw.split(',').map(parse_bbox_member);
    [(); 4].map(|()| parts.next().unwrap_or(f64::NAN))
}

fn parse_bbox_member(part: &str) -> f64 {
    let trimmed = part.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::{parse_bbox, PredicateSet};
    use crate::model::resource::{ListQuery, ResourceKind};
    use crate::query::statement::SqlValue;

    fn query(bbox: Option<&str>, within: Option<&str>, intersects: Option<&str>) -> ListQuery {
        ListQuery {
            bbox: bbox.map(str::to_string),
            within: within.map(str::to_string),
            intersects: intersects.map(str::to_string),
            ..ListQuery::default()
        }
    }

    #[test]
    fn no_filters_yield_no_predicates() {
        let predicates = PredicateSet::from_query(ResourceKind::Point, &ListQuery::default());
        assert!(predicates.is_empty());
    }

    #[test]
    fn bbox_precedes_topology() {
        let predicates = PredicateSet::from_query(
            ResourceKind::Point,
            &query(Some("0,0,1,1"), Some("{\"type\":\"Point\"}"), None),
        );
        let templates: Vec<_> = predicates.fragments().iter().map(|f| f.template()).collect();
        assert_eq!(templates.len(), 2);
        assert!(templates[0].starts_with("ST_BBoxIntersects"));
        assert!(templates[1].starts_with("ST_Within"));
        assert_eq!(
            predicates.fragments()[0].values(),
            &[
                SqlValue::Real(0.0),
                SqlValue::Real(0.0),
                SqlValue::Real(1.0),
                SqlValue::Real(1.0)
            ]
        );
    }

    #[test]
    fn polygons_use_intersects_and_ignore_within() {
        let predicates = PredicateSet::from_query(
            ResourceKind::Polygon,
            &query(None, Some("ignored"), Some("{}")),
        );
        assert_eq!(predicates.len(), 1);
        assert!(predicates.fragments()[0].template().starts_with("ST_Intersects"));
        assert_eq!(
            predicates.fragments()[0].values(),
            &[SqlValue::Text("{}".to_string())]
        );
    }

    #[test]
    fn empty_parameters_are_ignored() {
        let predicates =
            PredicateSet::from_query(ResourceKind::Point, &query(Some(""), Some(""), None));
        assert!(predicates.is_empty());
    }

    #[test]
    fn malformed_bbox_members_become_nan() {
        let [west, south, east, north] = parse_bbox("1,abc,3");
        assert_eq!(west, 1.0);
        assert!(south.is_nan());
        assert_eq!(east, 3.0);
        assert!(north.is_nan());
    }

    #[test]
    fn blank_bbox_members_read_as_zero() {
        assert_eq!(parse_bbox("0,0,,1"), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(parse_bbox(" ,2, 3 ,4"), [0.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn extra_bbox_members_are_ignored() {
        assert_eq!(parse_bbox("1, 2 ,3,4,5"), [1.0, 2.0, 3.0, 4.0]);
    }
}
