//! # Qanda Core
//!
//! Core types, domain entities, and error definitions for the Qanda server.
//! Every other crate in the workspace builds on the vocabulary defined here:
//! questions and answers, their typed identifiers, the caller identity, and
//! the unified error type.

pub mod domain;
pub mod error;
pub mod id;
pub mod pagination;
pub mod result;
pub mod traits;
pub mod validation;

pub use domain::*;
pub use error::*;
pub use id::*;
pub use pagination::*;
pub use result::*;
pub use traits::*;
pub use validation::*;
