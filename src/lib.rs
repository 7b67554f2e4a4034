//! Pecha reader - multi-chapter reading sessions over the Pecha text API
//!
//! Keeps up to three chapters open side by side, pages their content in
//! both scroll directions, and persists the open chapters in a
//! session-scoped store so a reload resumes where the reader left off.

pub mod api;
pub mod config;
pub mod reader;
pub mod text;

pub use api::{ApiError, ContentSource, PechaClient};
pub use config::Config;
pub use reader::ReadingSession;
