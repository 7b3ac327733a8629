//! # Qanda Config
//!
//! Configuration management for the Qanda server.
//! Supports layered configuration from TOML files, a `.env` file, and
//! `QANDA_`-prefixed environment variables.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
