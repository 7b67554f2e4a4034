//! Text content handling

pub mod model;

pub use model::{ContentPage, Footnote, Section, Segment, TableOfContents};
