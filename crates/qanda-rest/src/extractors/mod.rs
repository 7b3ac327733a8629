//! Custom Axum extractors.

mod identity;
mod validated;

pub use identity::*;
pub use validated::*;
