//! Accumulated content of a chapter pane
//!
//! Pages are appended below or spliced in above the current content. When a
//! page is prepended the viewport must not jump: the scroll height and offset
//! are captured before the merge, and once the new content has been laid out
//! the offset is moved down by exactly the height that was added.

use super::scroll::ScrollMetrics;
use crate::text::{ContentPage, Section};

/// Viewport state captured right before content was prepended
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrollAnchor {
    scroll_height: f64,
    scroll_top: f64,
}

/// Ordered sections merged from fetched pages
#[derive(Debug, Clone, Default)]
pub struct ContentAccumulator {
    sections: Vec<Section>,
    /// Position (1-indexed) of the earliest merged page
    first_position: Option<u32>,
    /// Position (1-indexed) of the latest merged page
    last_position: Option<u32>,
    total_known: bool,
    pending_anchor: Option<ScrollAnchor>,
}

impl ContentAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a page fetched below the current content
    pub fn append_forward(&mut self, page: ContentPage, forward_skip: u32) {
        let position = page.position().unwrap_or(forward_skip.saturating_add(1));
        self.total_known |= page.total_hint().is_some();

        if self.sections.is_empty() && forward_skip == 0 {
            self.sections = page.sections;
        } else {
            self.sections.extend(page.sections);
        }

        if self.first_position.is_none() {
            self.first_position = Some(position);
        }
        self.last_position = Some(position);
    }

    /// Merge a page fetched above the current content.
    ///
    /// `metrics` is the viewport right before the merge; `None` when there is
    /// no viewport, in which case no scroll correction will be produced.
    pub fn prepend_backward(&mut self, page: ContentPage, metrics: Option<ScrollMetrics>) {
        self.pending_anchor = metrics.map(|m| ScrollAnchor {
            scroll_height: m.scroll_height,
            scroll_top: m.scroll_top,
        });

        let position = page
            .position()
            .or_else(|| self.first_position.map(|p| p.saturating_sub(1).max(1)));
        self.total_known |= page.total_hint().is_some();
        self.sections.splice(0..0, page.sections);

        if position.is_some() {
            self.first_position = position;
        }
        if self.last_position.is_none() {
            self.last_position = position;
        }
    }

    /// Scroll offset to apply after the prepended content was laid out.
    ///
    /// Returns `S0 + (H1 - H0)`. Consumes the pending anchor; `None` when
    /// nothing was prepended or the viewport is gone.
    pub fn restore_anchor(&mut self, new_scroll_height: Option<f64>) -> Option<f64> {
        let anchor = self.pending_anchor.take()?;
        let new_height = new_scroll_height?;
        Some(anchor.scroll_top + (new_height - anchor.scroll_height))
    }

    /// Whether a scroll correction is waiting for layout
    pub fn has_pending_anchor(&self) -> bool {
        self.pending_anchor.is_some()
    }

    /// Merged sections in reading order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Position of the first merged page, used to decide whether earlier pages exist
    pub fn first_position(&self) -> Option<u32> {
        self.first_position
    }

    /// Position of the last merged page
    pub fn last_position(&self) -> Option<u32> {
        self.last_position
    }

    /// Whether any page has reported the content length
    pub fn is_total_known(&self) -> bool {
        self.total_known
    }

    /// First segment of the merged content
    pub fn first_segment_id(&self) -> Option<&str> {
        self.sections.iter().find_map(Section::first_segment).map(|s| s.segment_id.as_str())
    }

    /// Last segment of the merged content
    pub fn last_segment_id(&self) -> Option<&str> {
        self.sections.iter().rev().find_map(Section::last_segment).map(|s| s.segment_id.as_str())
    }

    /// Find a merged section by id at any depth
    pub fn find_section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find_map(|s| s.find(id))
    }

    /// Number of top-level sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether nothing has been merged
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Drop all content
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
