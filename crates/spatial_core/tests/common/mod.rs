#![allow(dead_code)]

use serde_json::{json, Value};
use spatial_core::query::statement::Statement;
use spatial_core::{
    open_pool_in_memory, CreateResource, DbResult, PatchResource, RowSet, SqliteGateway,
    StoreGateway,
};
use std::sync::{Arc, Mutex};

pub const BANGALORE: [f64; 2] = [77.6, 12.97];

pub fn memory_gateway() -> SqliteGateway {
    SqliteGateway::new(Arc::new(open_pool_in_memory().unwrap()))
}

pub fn create_payload(value: Value) -> CreateResource {
    serde_json::from_value(value).unwrap()
}

pub fn patch_payload(value: Value) -> PatchResource {
    serde_json::from_value(value).unwrap()
}

pub fn point(name: &str, [lon, lat]: [f64; 2]) -> CreateResource {
    create_payload(json!({
        "name": name,
        "geom": {"type": "Point", "coordinates": [lon, lat]},
    }))
}

/// Axis-aligned square polygon, closed ring, counter-clockwise.
pub fn square(name: &str, [west, south, east, north]: [f64; 4]) -> CreateResource {
    create_payload(json!({
        "name": name,
        "geom": {
            "type": "Polygon",
            "coordinates": [[[west, south], [east, south], [east, north], [west, north], [west, south]]],
        },
    }))
}

/// Gateway wrapper recording every statement it forwards.
pub struct RecordingGateway<G> {
    inner: G,
    statements: Mutex<Vec<Statement>>,
}

impl<G: StoreGateway> RecordingGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.statements()
            .iter()
            .filter(|statement| statement.is_mutation())
            .count()
    }
}

impl<G: StoreGateway> StoreGateway for RecordingGateway<G> {
    fn execute(&self, statement: &Statement) -> DbResult<RowSet> {
        self.statements.lock().unwrap().push(statement.clone());
        self.inner.execute(statement)
    }
}
