//! # Middleware
//!
//! Tower layers applied around the proxy routes.

pub mod tracing_layer;
