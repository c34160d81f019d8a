//! Domain model for geometry-typed resources.
//!
//! # Responsibility
//! - Define resource records, request payloads and geometry shapes.
//! - Own structural geometry validation.
//!
//! # Invariants
//! - Resources are identified by a store-assigned `ResourceId`.
//! - Deletion is physical; there are no tombstones.

pub mod geometry;
pub mod resource;
