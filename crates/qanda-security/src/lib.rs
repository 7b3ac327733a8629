//! # Qanda Security
//!
//! Bearer token validation. A valid token yields the caller's [`Identity`]:
//! the opaque subject identifier and the display name.
//!
//! [`Identity`]: qanda_core::Identity

pub mod jwt;

pub use jwt::*;
