//! Pecha API integration module
//!
//! Provides the HTTP client and request models for the text endpoints,
//! behind the `ContentSource` trait the reading session consumes.

pub mod client;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use client::{ContentSource, PechaClient};
pub use error::ApiError;
pub use models::{DetailsQuery, PageDirection};
