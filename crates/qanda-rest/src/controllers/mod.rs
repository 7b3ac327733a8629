//! REST API controllers.

pub mod answer_controller;
pub mod health_controller;
pub mod hub_controller;
pub mod metrics_controller;
pub mod question_controller;

pub use health_controller::*;
