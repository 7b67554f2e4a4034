//! A mounted chapter pane
//!
//! Binds a slot to its cursor, content and scroll spy. Fetching is split in
//! two halves so the pane never holds a borrow across an await: the pane
//! issues [`FetchRequest`]s, somebody executes them, and the resulting
//! [`FetchResponse`]s are applied back. Every request is tagged with the
//! pane's identity and epoch; a response whose tag no longer matches was
//! issued for content the pane has since moved away from and is dropped.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use super::accumulator::ContentAccumulator;
use super::cursor::PaginationCursor;
use super::scroll::{ScrollMetrics, ScrollSpy, ScrollThresholds, ScrollTrigger, SectionRect};
use super::slots::{ChapterSlot, ResourceIdentity};
use crate::api::{ApiError, ContentSource, DetailsQuery, PageDirection};
use crate::config::Config;
use crate::text::ContentPage;

/// How a pane pages through its text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    /// Whole pages addressed by `skip`
    Skip,
    /// Segment windows around an anchor segment
    SegmentCursor,
}

/// Which end of the content a fetch extends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDirection {
    Forward,
    Backward,
}

/// A page fetch issued by a pane
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Pane that asked for the page
    pub pane_id: String,
    /// Content the pane showed when the request was issued
    pub identity: ResourceIdentity,
    /// Pane epoch when the request was issued
    pub epoch: u64,
    pub direction: FetchDirection,
    /// Page position requested
    pub skip: u32,
    pub query: DetailsQuery,
    /// Cancelled when the pane resets or closes
    pub cancel: CancellationToken,
}

/// A completed fetch
#[derive(Debug)]
pub struct FetchResponse {
    pub request: FetchRequest,
    pub result: Result<ContentPage, ApiError>,
}

/// Run one request against `source`, giving up early if it is cancelled
pub async fn execute<C: ContentSource>(source: &C, request: FetchRequest) -> FetchResponse {
    let result = tokio::select! {
        _ = request.cancel.cancelled() => Err(ApiError::Cancelled),
        result = source.text_details(&request.identity.text_id, &request.query) => result,
    };
    FetchResponse { request, result }
}

/// What applying a response did
#[derive(Debug)]
pub enum Applied {
    /// Content was merged
    Merged,
    /// A forward page arrived while prepended content awaits layout; it is
    /// merged by the next [`ChapterPane::after_layout`]
    Deferred,
    /// The response belonged to superseded content and was dropped
    Stale,
    /// The fetch failed; the pane shows the error and the cursor was released.
    /// Transient failures are retried by the next scroll in that direction,
    /// anything else stops paging that way.
    Failed(ApiError),
}

/// One open chapter
#[derive(Debug)]
pub struct ChapterPane {
    slot: ChapterSlot,
    mode: PaginationMode,
    cursor: PaginationCursor,
    content: ContentAccumulator,
    spy: ScrollSpy,
    epoch: u64,
    cancel: CancellationToken,
    page_size: u32,
    segment_page_size: u32,
    open_footnotes: HashSet<String>,
    last_error: Option<String>,
    /// Forward page held back until the pending prepend is laid out
    deferred_forward: Option<(u32, ContentPage)>,
}

impl ChapterPane {
    /// Mount a pane for `slot`
    pub fn new(slot: ChapterSlot, config: &Config) -> Self {
        Self {
            mode: Self::mode_for(&slot),
            cursor: PaginationCursor::new(slot.content_index),
            content: ContentAccumulator::new(),
            spy: ScrollSpy::new(ScrollThresholds::from(config)),
            epoch: 0,
            cancel: CancellationToken::new(),
            page_size: config.page_size,
            segment_page_size: config.segment_page_size,
            open_footnotes: HashSet::new(),
            last_error: None,
            deferred_forward: None,
            slot,
        }
    }

    fn mode_for(slot: &ChapterSlot) -> PaginationMode {
        if slot.segment_id.is_some() { PaginationMode::SegmentCursor } else { PaginationMode::Skip }
    }

    pub fn id(&self) -> &str {
        &self.slot.id
    }

    pub fn slot(&self) -> &ChapterSlot {
        &self.slot
    }

    pub fn identity(&self) -> ResourceIdentity {
        self.slot.identity()
    }

    pub fn mode(&self) -> PaginationMode {
        self.mode
    }

    pub fn cursor(&self) -> &PaginationCursor {
        &self.cursor
    }

    pub fn content(&self) -> &ContentAccumulator {
        &self.content
    }

    pub fn scroll_spy(&self) -> &ScrollSpy {
        &self.spy
    }

    /// Incremented every time the pane's content is invalidated
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Message of the last failed fetch
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replace the slot; resets the pane when it now points at different content.
    ///
    /// Returns whether a reset happened.
    pub fn set_slot(&mut self, slot: ChapterSlot) -> bool {
        let changed = slot.identity() != self.slot.identity();
        if changed {
            self.reset_to(slot);
        } else {
            self.slot = slot;
        }
        changed
    }

    /// Drop everything fetched so far and start over at `slot.content_index`
    pub fn reset_to(&mut self, slot: ChapterSlot) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.epoch += 1;

        self.mode = Self::mode_for(&slot);
        self.cursor.reset(slot.content_index);
        self.content.clear();
        self.spy.reset();
        self.open_footnotes.clear();
        self.last_error = None;
        self.deferred_forward = None;
        tracing::debug!(id = %slot.id, epoch = self.epoch, "chapter reset");
        self.slot = slot;
    }

    /// Cancel outstanding fetches
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Request the first page
    pub fn initial_request(&mut self) -> Option<FetchRequest> {
        let skip = self.cursor.begin_initial()?;
        self.build_request(FetchDirection::Forward, skip)
    }

    /// Feed a scroll tick; returns the pages to fetch
    pub fn on_scroll(&mut self, metrics: &ScrollMetrics) -> Vec<FetchRequest> {
        let mut requests = Vec::new();

        for trigger in self.spy.observe(metrics) {
            match trigger {
                ScrollTrigger::Forward => {
                    if let Some(skip) = self.cursor.on_forward_scroll_threshold() {
                        requests.extend(self.build_request(FetchDirection::Forward, skip));
                    }
                }
                ScrollTrigger::Backward => {
                    let Some(first_visible) = self.content.first_position() else {
                        continue;
                    };
                    if let Some(skip) = self.cursor.on_backward_scroll_threshold(first_visible) {
                        requests.extend(self.build_request(FetchDirection::Backward, skip));
                    }
                }
            }
        }

        requests
    }

    fn build_request(&mut self, direction: FetchDirection, skip: u32) -> Option<FetchRequest> {
        let Some(query) = self.build_query(direction, skip) else {
            // Nothing to anchor a segment window on; release the cursor
            match direction {
                FetchDirection::Forward => self.cursor.on_forward_failed(),
                FetchDirection::Backward => self.cursor.on_backward_failed(),
            }
            return None;
        };

        Some(FetchRequest {
            pane_id: self.slot.id.clone(),
            identity: self.identity(),
            epoch: self.epoch,
            direction,
            skip,
            query,
            cancel: self.cancel.clone(),
        })
    }

    fn build_query(&self, direction: FetchDirection, skip: u32) -> Option<DetailsQuery> {
        let content_id = self.slot.content_id.clone();
        let version_id = self.slot.version_id.clone();

        let query = match self.mode {
            PaginationMode::Skip => DetailsQuery::skip(content_id, skip, self.page_size),
            PaginationMode::SegmentCursor => {
                let (anchor, page_direction) = match direction {
                    FetchDirection::Forward => (
                        self.content.last_segment_id().or(self.slot.segment_id.as_deref()),
                        PageDirection::Next,
                    ),
                    FetchDirection::Backward => {
                        (self.content.first_segment_id(), PageDirection::Previous)
                    }
                };
                DetailsQuery::cursor(content_id, anchor?, page_direction, self.segment_page_size)
            }
        };

        Some(query.with_version(version_id))
    }

    /// Merge a completed fetch.
    ///
    /// `metrics` is the viewport right before the merge, used to anchor
    /// prepended content; `None` falls back to the last observed scroll tick.
    pub fn apply(&mut self, response: FetchResponse, metrics: Option<ScrollMetrics>) -> Applied {
        let FetchResponse { request, result } = response;

        if request.epoch != self.epoch || request.identity != self.identity() {
            tracing::debug!(
                id = %self.slot.id,
                request_epoch = request.epoch,
                epoch = self.epoch,
                "dropping stale response"
            );
            return Applied::Stale;
        }

        let page = match result {
            Ok(page) => page,
            Err(ApiError::Cancelled) => return Applied::Stale,
            Err(e) => {
                tracing::warn!(id = %self.slot.id, "Failed to fetch page {}: {}", request.skip, e);
                match (request.direction, e.is_recoverable()) {
                    (FetchDirection::Forward, true) => self.cursor.on_forward_failed(),
                    (FetchDirection::Forward, false) => self.cursor.on_forward_rejected(),
                    (FetchDirection::Backward, true) => self.cursor.on_backward_failed(),
                    (FetchDirection::Backward, false) => self.cursor.on_backward_rejected(),
                }
                self.last_error = Some(e.to_string());
                return Applied::Failed(e);
            }
        };

        self.last_error = None;
        if self.slot.content_id.is_none() {
            // Resolving the content tree does not change what the pane shows
            self.slot.content_id = page.content_id.clone();
        }

        match request.direction {
            FetchDirection::Forward if self.content.has_pending_anchor() => {
                tracing::debug!(id = %self.slot.id, skip = request.skip, "holding forward page until layout");
                self.deferred_forward = Some((request.skip, page));
                return Applied::Deferred;
            }
            FetchDirection::Forward => self.merge_forward(request.skip, page),
            FetchDirection::Backward => {
                self.cursor.on_backward_page_arrived(&page);
                let metrics = metrics.or_else(|| self.spy.last_metrics());
                self.content.prepend_backward(page, metrics);
            }
        }
        Applied::Merged
    }

    fn merge_forward(&mut self, skip: u32, page: ContentPage) {
        self.cursor.on_forward_page_arrived(&page);
        self.content.append_forward(page, skip);
    }

    /// Layout finished; returns the scroll offset to restore, if any.
    ///
    /// A forward page held back by [`Applied::Deferred`] is merged afterwards,
    /// so it gets a layout pass of its own.
    pub fn after_layout(&mut self, new_scroll_height: Option<f64>) -> Option<f64> {
        let scroll_top = self.content.restore_anchor(new_scroll_height);
        if let Some(scroll_top) = scroll_top {
            self.spy.set_scroll_top(scroll_top);
        }
        if let Some((skip, page)) = self.deferred_forward.take() {
            self.merge_forward(skip, page);
        }
        scroll_top
    }

    /// Whether a forward page is waiting for the next layout pass
    pub fn has_deferred_forward(&self) -> bool {
        self.deferred_forward.is_some()
    }

    /// Recompute the active section from rendered positions; `Some` on change
    pub fn update_active_section(&mut self, rects: &[SectionRect]) -> Option<String> {
        let active = self.spy.update_active(rects)?.to_string();
        self.slot.section_id = Some(active.clone());
        Some(active)
    }

    /// Show or hide a footnote; returns whether it is now shown
    pub fn toggle_footnote(&mut self, footnote_id: &str) -> bool {
        if self.open_footnotes.remove(footnote_id) {
            false
        } else {
            self.open_footnotes.insert(footnote_id.to_string());
            true
        }
    }

    /// Whether a footnote is shown
    pub fn is_footnote_open(&self, footnote_id: &str) -> bool {
        self.open_footnotes.contains(footnote_id)
    }
}
