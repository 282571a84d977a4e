//! Data Transfer Objects for the service layer.

pub mod news_dto;
pub mod podcast_dto;

pub use news_dto::*;
pub use podcast_dto::*;
