//! Statement construction for the spatial store.
//!
//! # Responsibility
//! - Normalize pagination, build filter predicates and mutation fields.
//! - Compose them into positional statements for the store gateway.
//!
//! # Invariants
//! - Builders never talk to the store; they are pure functions of input.
//! - Every caller-supplied value travels as a bound parameter.

pub mod mutation;
pub mod pagination;
pub mod predicate;
pub mod shapes;
pub mod statement;
