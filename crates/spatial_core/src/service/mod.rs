//! Resource use-case services.
//!
//! # Responsibility
//! - Validate raw payloads and query parameters before any store call.
//! - Orchestrate repository calls per resource kind.
//! - Map outcomes to the error taxonomy exposed to the routing layer.

pub mod resource_service;
