//! Insert and patch field assembly.
//!
//! # Responsibility
//! - Turn create payloads into the three-field write tuple.
//! - Turn sparse patch payloads into per-field assignment fragments.
//!
//! # Invariants
//! - Geometry is validated for the resource kind before it becomes a value.
//! - Geometry values are always wrapped in `ST_SetSRID(..., 4326)`.
//! - `id` and timestamps never appear in caller-controlled fields.

use crate::model::geometry::{validate_geometry, Geometry};
use crate::model::resource::{
    CreateResource, PatchResource, Properties, ResourceKind, ValidationError,
};
use crate::query::statement::{Fragment, SqlValue};

/// Values for a new resource row.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertMutation {
    name: String,
    properties: Properties,
    geom: Geometry,
}

impl InsertMutation {
    /// Validates a create payload for `kind`.
    ///
    /// # Errors
    /// - `MissingRequiredField("name")` when the name is absent or empty.
    /// - `InvalidGeometry` when `geom` does not match the kind.
    pub fn from_payload(
        kind: ResourceKind,
        payload: &CreateResource,
    ) -> Result<Self, ValidationError> {
        let name = required_name(payload.name.as_deref())?;
        let geom = validate_geometry(kind.geometry_kind(), payload.geom.as_ref())?;

        Ok(Self {
            name,
            properties: payload.properties.clone().unwrap_or_default(),
            geom,
        })
    }

    /// `(name, properties, geom)` in column order.
    pub fn values(&self) -> [SqlValue; 3] {
        [
            SqlValue::Text(self.name.clone()),
            properties_value(&self.properties),
            SqlValue::Text(self.geom.to_geojson()),
        ]
    }
}

/// Column assignments for a partial update, in payload field order.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchMutation {
    fields: Vec<&'static str>,
    assignments: Vec<Fragment>,
}

impl PatchMutation {
    /// Collects only the fields present in `payload`.
    ///
    /// # Errors
    /// - `MissingRequiredField("name")` when `name` is present but empty.
    /// - `InvalidGeometry` when a present `geom` does not match the kind.
    /// - `NoFieldsToUpdate` when nothing would change.
    pub fn from_payload(
        kind: ResourceKind,
        payload: &PatchResource,
    ) -> Result<Self, ValidationError> {
        let mut patch = Self {
            fields: Vec::new(),
            assignments: Vec::new(),
        };

        if let Some(name) = payload.name.as_deref() {
            let name = required_name(Some(name))?;
            patch.push("name", Fragment::new("name = ?", [SqlValue::Text(name)]));
        }
        if let Some(properties) = payload.properties.as_ref() {
            patch.push(
                "properties",
                Fragment::new("properties = ?", [properties_value(properties)]),
            );
        }
        if payload.geom.is_some() {
            let geom = validate_geometry(kind.geometry_kind(), payload.geom.as_ref())?;
            patch.push(
                "geom",
                Fragment::new(
                    "geom = ST_SetSRID(ST_GeomFromGeoJSON(?), 4326)",
                    [SqlValue::Text(geom.to_geojson())],
                ),
            );
        }

        if patch.assignments.is_empty() {
            return Err(ValidationError::NoFieldsToUpdate);
        }
        Ok(patch)
    }

    /// Names of the fields this patch writes.
    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn into_assignments(self) -> Vec<Fragment> {
        self.assignments
    }

    fn push(&mut self, field: &'static str, assignment: Fragment) {
        self.fields.push(field);
        self.assignments.push(assignment);
    }
}

fn required_name(name: Option<&str>) -> Result<String, ValidationError> {
    match name {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ValidationError::MissingRequiredField("name")),
    }
}

fn properties_value(properties: &Properties) -> SqlValue {
    SqlValue::Text(serde_json::Value::Object(properties.clone()).to_string())
}

#[cfg(test)]
mod tests {
    use super::{InsertMutation, PatchMutation};
    use crate::model::resource::{CreateResource, PatchResource, ResourceKind, ValidationError};
    use crate::query::statement::SqlValue;
    use serde_json::json;

    fn create(value: serde_json::Value) -> CreateResource {
        serde_json::from_value(value).unwrap()
    }

    fn patch(value: serde_json::Value) -> PatchResource {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn insert_defaults_properties_to_empty_object() {
        let payload = create(json!({
            "name": "A",
            "geom": {"type": "Point", "coordinates": [77.6, 12.97]}
        }));
        let insert = InsertMutation::from_payload(ResourceKind::Point, &payload).unwrap();
        let [name, properties, geom] = insert.values();
        assert_eq!(name, SqlValue::Text("A".to_string()));
        assert_eq!(properties, SqlValue::Text("{}".to_string()));
        assert!(matches!(geom, SqlValue::Text(text) if text.contains("\"Point\"")));
    }

    #[test]
    fn insert_requires_non_empty_name() {
        let geom = json!({"type": "Point", "coordinates": [0, 0]});
        for payload in [json!({"geom": geom}), json!({"name": "", "geom": geom})] {
            let err = InsertMutation::from_payload(ResourceKind::Point, &create(payload))
                .unwrap_err();
            assert_eq!(err, ValidationError::MissingRequiredField("name"));
        }
    }

    #[test]
    fn insert_rejects_mismatched_geometry() {
        let payload = create(json!({
            "name": "A",
            "geom": {"type": "Point", "coordinates": [0, 0]}
        }));
        let err = InsertMutation::from_payload(ResourceKind::Polygon, &payload).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidGeometry(_)));
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = PatchMutation::from_payload(ResourceKind::Point, &patch(json!({}))).unwrap_err();
        assert_eq!(err, ValidationError::NoFieldsToUpdate);
    }

    #[test]
    fn unknown_fields_do_not_count_as_updates() {
        let err = PatchMutation::from_payload(
            ResourceKind::Point,
            &patch(json!({"id": "x", "created_at": 1})),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::NoFieldsToUpdate);
    }

    #[test]
    fn patch_includes_only_present_fields() {
        let mutation =
            PatchMutation::from_payload(ResourceKind::Point, &patch(json!({"name": "B"})))
                .unwrap();
        assert_eq!(mutation.fields(), &["name"]);

        let mutation = PatchMutation::from_payload(
            ResourceKind::Polygon,
            &patch(json!({
                "properties": {},
                "geom": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [0, 1], [0, 0]]]}
            })),
        )
        .unwrap();
        assert_eq!(mutation.fields(), &["properties", "geom"]);
        let assignments = mutation.into_assignments();
        assert_eq!(assignments[0].values(), &[SqlValue::Text("{}".to_string())]);
        assert!(assignments[1].template().contains("4326"));
    }

    #[test]
    fn patch_geometry_is_validated_for_kind() {
        let err = PatchMutation::from_payload(
            ResourceKind::Point,
            &patch(json!({"name": "ok", "geom": {"type": "Point", "coordinates": [1]}})),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidGeometry(_)));

        let err = PatchMutation::from_payload(ResourceKind::Point, &patch(json!({"geom": null})))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidGeometry(_)));
    }
}
