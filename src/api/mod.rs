//! API Module
//!
//! HTTP handlers and routing for inspecting and driving the hosted cache.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
