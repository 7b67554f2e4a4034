//! Bidirectional pagination cursor for one chapter
//!
//! The forward cursor counts pages fetched below the starting point and only
//! ever grows. The backward cursor is one-shot: it is set when the reader
//! scrolls up past the top and cleared once that page has been merged.
//! Each direction admits one outstanding fetch at a time.

use crate::text::ContentPage;

/// Pagination state of a chapter pane
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    forward_skip: u32,
    backward_skip: Option<u32>,
    total_known: Option<u32>,
    forward_in_flight: bool,
    /// The page at the starting position has been requested
    initial_issued: bool,
    /// The last forward fetch failed; the next threshold re-requests the same page
    forward_retry: bool,
    forward_exhausted: bool,
    backward_exhausted: bool,
}

impl PaginationCursor {
    /// Create a cursor starting at page `content_index`
    pub fn new(content_index: u32) -> Self {
        Self { forward_skip: content_index, ..Default::default() }
    }

    /// Forward page position
    pub fn forward_skip(&self) -> u32 {
        self.forward_skip
    }

    /// Pending backward page position, if a backward fetch was requested
    pub fn backward_skip(&self) -> Option<u32> {
        self.backward_skip
    }

    /// Total page count, once a page has reported it
    pub fn total_known(&self) -> Option<u32> {
        self.total_known
    }

    /// Whether a forward fetch is outstanding
    pub fn is_forward_loading(&self) -> bool {
        self.forward_in_flight
    }

    /// Whether a backward fetch is outstanding
    pub fn is_backward_loading(&self) -> bool {
        self.backward_skip.is_some()
    }

    /// Whether the page at the current forward position may be fetched
    pub fn should_fetch_forward(&self) -> bool {
        !self.forward_exhausted && Self::within_total(self.forward_skip, self.total_known)
    }

    fn within_total(skip: u32, total: Option<u32>) -> bool {
        total.is_none_or(|total| skip < total)
    }

    /// Claim the forward slot for the first page, at the starting position.
    ///
    /// A no-op once any forward page has been requested.
    pub fn begin_initial(&mut self) -> Option<u32> {
        if self.initial_issued || self.forward_in_flight || !self.should_fetch_forward() {
            return None;
        }
        self.initial_issued = true;
        self.forward_in_flight = true;
        Some(self.forward_skip)
    }

    /// The reader reached the bottom; returns the page to fetch, if any.
    ///
    /// Before the first page was requested this claims the starting position.
    pub fn on_forward_scroll_threshold(&mut self) -> Option<u32> {
        if !self.initial_issued {
            return self.begin_initial();
        }
        if self.forward_in_flight {
            return None;
        }

        if self.forward_retry {
            self.forward_retry = false;
            self.forward_in_flight = true;
            return Some(self.forward_skip);
        }

        let Some(next) = self.forward_skip.checked_add(1) else {
            self.forward_exhausted = true;
            return None;
        };
        if self.forward_exhausted || !Self::within_total(next, self.total_known) {
            return None;
        }

        self.forward_skip = next;
        self.forward_in_flight = true;
        tracing::debug!(skip = next, "forward page requested");
        Some(next)
    }

    /// The reader scrolled up past the top while the first visible page is
    /// `first_visible` (1-indexed); returns the page to fetch, if any
    pub fn on_backward_scroll_threshold(&mut self, first_visible: u32) -> Option<u32> {
        if first_visible <= 1 || self.backward_skip.is_some() || self.backward_exhausted {
            return None;
        }

        let skip = first_visible.saturating_sub(2);
        self.backward_skip = Some(skip);
        tracing::debug!(skip, "backward page requested");
        Some(skip)
    }

    /// A forward page was merged
    pub fn on_forward_page_arrived(&mut self, page: &ContentPage) {
        self.forward_in_flight = false;
        if self.total_known.is_none() {
            self.total_known = page.total_hint();
        }
        if page.is_last() {
            self.forward_exhausted = true;
        }
    }

    /// A backward page was merged
    pub fn on_backward_page_arrived(&mut self, page: &ContentPage) {
        self.backward_skip = None;
        if page.is_first() {
            self.backward_exhausted = true;
        }
    }

    /// The forward fetch failed; release the slot without advancing
    pub fn on_forward_failed(&mut self) {
        self.forward_in_flight = false;
        self.forward_retry = true;
    }

    /// The backward fetch failed; a later top-scroll may ask again
    pub fn on_backward_failed(&mut self) {
        self.backward_skip = None;
    }

    /// The server refused the forward page; stop paging forward
    pub fn on_forward_rejected(&mut self) {
        self.forward_in_flight = false;
        self.forward_retry = false;
        self.forward_exhausted = true;
    }

    /// The server refused the backward page; stop paging backward
    pub fn on_backward_rejected(&mut self) {
        self.backward_skip = None;
        self.backward_exhausted = true;
    }

    /// Start over at `content_index`
    pub fn reset(&mut self, content_index: u32) {
        *self = Self::new(content_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn page(current: u32, total: u32) -> ContentPage {
        ContentPage { current_section: Some(current), total: Some(total), ..Default::default() }
    }

    #[test]
    fn unknown_total_allows_fetching() {
        let cursor = PaginationCursor::new(0);
        assert!(cursor.should_fetch_forward());
    }

    #[test]
    fn initial_fetch_uses_content_index() {
        let mut cursor = PaginationCursor::new(3);
        assert_eq!(cursor.begin_initial(), Some(3));
        assert!(cursor.is_forward_loading());
        assert_eq!(cursor.begin_initial(), None);
    }

    #[test]
    fn scroll_before_initial_claims_content_index() {
        let mut cursor = PaginationCursor::new(2);
        assert_eq!(cursor.on_forward_scroll_threshold(), Some(2));
        assert_eq!(cursor.forward_skip(), 2);
        assert_eq!(cursor.begin_initial(), None);

        cursor.on_forward_page_arrived(&page(3, 5));
        assert_eq!(cursor.begin_initial(), None);
        assert_eq!(cursor.on_forward_scroll_threshold(), Some(3));
    }

    #[test]
    fn forward_at_u32_max_is_exhausted() {
        let mut cursor = PaginationCursor::new(u32::MAX);
        assert_eq!(cursor.begin_initial(), Some(u32::MAX));
        cursor.on_forward_page_arrived(&ContentPage::default());

        assert_eq!(cursor.on_forward_scroll_threshold(), None);
        assert_eq!(cursor.forward_skip(), u32::MAX);
        assert!(!cursor.should_fetch_forward());
    }

    #[test]
    fn rejected_pages_stop_paging() {
        let mut cursor = PaginationCursor::new(0);
        cursor.begin_initial();
        cursor.on_forward_rejected();
        assert!(!cursor.is_forward_loading());
        assert_eq!(cursor.on_forward_scroll_threshold(), None);

        let mut cursor = PaginationCursor::new(4);
        assert_eq!(cursor.on_backward_scroll_threshold(5), Some(3));
        cursor.on_backward_rejected();
        assert_eq!(cursor.on_backward_scroll_threshold(5), None);
    }

    #[test]
    fn threshold_is_ignored_while_loading() {
        let mut cursor = PaginationCursor::new(0);
        cursor.begin_initial();
        assert_eq!(cursor.on_forward_scroll_threshold(), None);

        cursor.on_forward_page_arrived(&page(1, 5));
        assert_eq!(cursor.on_forward_scroll_threshold(), Some(1));
        assert_eq!(cursor.on_forward_scroll_threshold(), None);
        assert_eq!(cursor.forward_skip(), 1);
    }

    #[test]
    fn forward_stops_at_total() {
        let mut cursor = PaginationCursor::new(0);
        cursor.begin_initial();
        cursor.on_forward_page_arrived(&ContentPage { total: Some(2), ..Default::default() });

        assert_eq!(cursor.on_forward_scroll_threshold(), Some(1));
        cursor.on_forward_page_arrived(&ContentPage::default());
        assert_eq!(cursor.on_forward_scroll_threshold(), None);
        assert_eq!(cursor.forward_skip(), 1);
    }

    #[test]
    fn total_is_first_write_wins() {
        let mut cursor = PaginationCursor::new(0);
        cursor.begin_initial();
        cursor.on_forward_page_arrived(&ContentPage { total: Some(10), ..Default::default() });
        cursor.on_forward_scroll_threshold();
        cursor.on_forward_page_arrived(&ContentPage { total: Some(3), ..Default::default() });
        assert_eq!(cursor.total_known(), Some(10));
    }

    #[test]
    fn last_segment_page_stops_forward() {
        let mut cursor = PaginationCursor::new(0);
        cursor.begin_initial();
        cursor.on_forward_page_arrived(&ContentPage {
            current_segment_position: Some(40),
            total_segments: Some(40),
            ..Default::default()
        });
        assert!(!cursor.should_fetch_forward());
        assert_eq!(cursor.on_forward_scroll_threshold(), None);
    }

    #[test]
    fn failed_forward_fetch_is_retried_at_same_skip() {
        let mut cursor = PaginationCursor::new(0);
        cursor.begin_initial();
        cursor.on_forward_page_arrived(&page(1, 5));

        assert_eq!(cursor.on_forward_scroll_threshold(), Some(1));
        cursor.on_forward_failed();
        assert_eq!(cursor.on_forward_scroll_threshold(), Some(1));
        cursor.on_forward_page_arrived(&page(2, 5));
        assert_eq!(cursor.on_forward_scroll_threshold(), Some(2));
    }

    #[test]
    fn backward_threshold_requires_earlier_pages() {
        let mut cursor = PaginationCursor::new(0);
        assert_eq!(cursor.on_backward_scroll_threshold(1), None);
        assert_eq!(cursor.on_backward_scroll_threshold(4), Some(2));
        assert_eq!(cursor.backward_skip(), Some(2));
    }

    #[test]
    fn backward_is_one_shot() {
        let mut cursor = PaginationCursor::new(5);
        assert_eq!(cursor.on_backward_scroll_threshold(6), Some(4));
        assert_eq!(cursor.on_backward_scroll_threshold(6), None);

        cursor.on_backward_page_arrived(&page(5, 9));
        assert_eq!(cursor.backward_skip(), None);
        assert_eq!(cursor.on_backward_scroll_threshold(5), Some(3));
    }

    #[test]
    fn backward_stops_at_first_page() {
        let mut cursor = PaginationCursor::new(1);
        assert_eq!(cursor.on_backward_scroll_threshold(2), Some(0));
        cursor.on_backward_page_arrived(&page(1, 9));
        assert_eq!(cursor.on_backward_scroll_threshold(2), None);
    }

    #[test]
    fn reset_clears_both_cursors() {
        let mut cursor = PaginationCursor::new(0);
        cursor.begin_initial();
        cursor.on_forward_page_arrived(&page(1, 5));
        cursor.on_forward_scroll_threshold();
        cursor.on_backward_scroll_threshold(3);

        cursor.reset(7);
        assert_eq!(cursor, PaginationCursor::new(7));
        assert_eq!(cursor.forward_skip(), 7);
        assert_eq!(cursor.backward_skip(), None);
        assert!(!cursor.is_forward_loading());
    }

    #[derive(Debug, Clone)]
    enum Event {
        Threshold,
        Arrived,
        Failed,
    }

    fn event() -> impl Strategy<Value = Event> {
        prop_oneof![Just(Event::Threshold), Just(Event::Arrived), Just(Event::Failed)]
    }

    proptest! {
        #[test]
        fn forward_skip_is_monotonic_and_gated(
            start in 0u32..5,
            total in proptest::option::of(1u32..20),
            events in proptest::collection::vec(event(), 0..60),
        ) {
            let mut cursor = PaginationCursor::new(start);
            let mut last = cursor.forward_skip();
            let mut increments_since_arrival = 0;

            for event in events {
                match event {
                    Event::Threshold => {
                        cursor.on_forward_scroll_threshold();
                    }
                    Event::Arrived => {
                        if cursor.is_forward_loading() {
                            cursor.on_forward_page_arrived(&ContentPage { total, ..Default::default() });
                            increments_since_arrival = 0;
                        }
                    }
                    Event::Failed => {
                        if cursor.is_forward_loading() {
                            cursor.on_forward_failed();
                        }
                    }
                }

                let skip = cursor.forward_skip();
                prop_assert!(skip >= last);
                if skip > last {
                    increments_since_arrival += 1;
                }
                prop_assert!(increments_since_arrival <= 1);
                last = skip;
            }
        }
    }
}
