//! HTTP REST API interfaces
//!
//! - `common`: response wrapper and the validating JSON extractor
//! - `middleware`: session-token authentication
//! - `modules`: request handlers grouped by resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, AppServices};
