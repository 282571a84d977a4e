//! REST API controllers.

pub mod health_controller;
pub mod news_controller;
pub mod podcast_controller;

pub use health_controller::*;
