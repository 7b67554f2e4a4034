//! Multi-chapter reading session
//!
//! Up to a handful of chapter panes are open side by side. Each pane pages
//! its text in both directions as the reader scrolls, keeps the viewport
//! anchored when earlier content is inserted above it, and reports which
//! section is on screen so the table of contents can follow along.

pub mod accumulator;
pub mod chapter;
pub mod clicks;
pub mod cursor;
pub mod panels;
pub mod scroll;
pub mod session;
pub mod slots;

// Re-exports
pub use accumulator::ContentAccumulator;
pub use chapter::{Applied, ChapterPane, FetchDirection, FetchRequest, FetchResponse, PaginationMode};
pub use clicks::{ClickAction, ClickDispatcher, ClickInterceptor, ClickTarget};
pub use cursor::PaginationCursor;
pub use panels::{PanelCoordinator, PanelKind};
pub use scroll::{ScrollDirection, ScrollMetrics, ScrollSpy, ScrollTrigger, SectionRect};
pub use session::{FetchOutcome, ReadingSession};
pub use slots::{
    ChapterSlot, ChapterSlotStore, NavigationParams, NewChapter, ResourceIdentity, SlotMatcher,
    SlotPatch,
};
