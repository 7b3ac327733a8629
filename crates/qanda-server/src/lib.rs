//! # Qanda Server Library
//!
//! Wiring and startup for the Qanda server binary: [`di::AppModule`] builds
//! every shared component once, [`app::run`] serves HTTP until a shutdown
//! signal and then stops the background workers.

pub mod app;
pub mod di;
pub mod logging;
pub mod startup;
