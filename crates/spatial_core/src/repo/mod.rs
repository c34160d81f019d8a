//! Spatial query engine over the store gateway.
//!
//! # Responsibility
//! - Compose statement shapes for list, lookup, nearest and containment.
//! - Decode returned rows into typed resource records.
//!
//! # Invariants
//! - Inputs arrive already validated; the repository never re-validates
//!   payloads.
//! - `NotFound` is derived from an empty returned row set, never from a
//!   pre-check.
//! - Persisted rows that cannot be decoded surface as `InvalidData`.

pub mod spatial_repo;
