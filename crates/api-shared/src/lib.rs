//! # API Shared
//!
//! Shared request/response types for the filedock front ends.
//!
//! Contains:
//! - Wire DTOs (`dto` module) with their OpenAPI schemas
//! - Conversions between DTOs and core types
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` to keep the JSON shapes in one place.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
