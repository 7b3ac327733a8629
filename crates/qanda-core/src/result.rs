//! Result type aliases for Qanda.

use crate::QandaError;

/// A specialized `Result` type for Qanda operations.
pub type QandaResult<T> = Result<T, QandaError>;
