//! Request types accepted by the question service.

mod question_dto;

pub use question_dto::*;
