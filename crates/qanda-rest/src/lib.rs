//! # Qanda REST
//!
//! HTTP surface of the Qanda server: question and answer endpoints, the
//! `/questionshub` push endpoint, health probes, metrics, and Swagger UI.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
