//! # Micropub Shared
//!
//! Wire types shared by the HTTP surfaces.

pub mod dto;
pub mod response;

pub use dto::HealthResponse;
pub use response::ErrorResponse;
