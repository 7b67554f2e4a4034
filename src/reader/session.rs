//! Reading session lifecycle
//!
//! A session is mounted over a session store, owns one pane per open chapter
//! and the panel state shared by all of them, and is torn down by
//! [`ReadingSession::unmount`], which purges the persisted chapters.

use std::collections::HashMap;

use futures_util::future::join_all;

use super::chapter::{Applied, ChapterPane, FetchDirection, FetchRequest, execute};
use super::clicks::{ClickAction, ClickDispatcher, ClickTarget};
use super::panels::{PanelCoordinator, PanelKind};
use super::scroll::{ScrollMetrics, SectionRect};
use super::slots::{ChapterSlot, ChapterSlotStore, NavigationParams, NewChapter, SlotMatcher, SlotPatch};
use crate::api::{ApiError, ContentSource};
use crate::config::{Config, SessionStore};
use crate::text::TableOfContents;

/// Result of applying one fetch to its pane
#[derive(Debug)]
pub struct FetchOutcome {
    pub pane_id: String,
    pub direction: FetchDirection,
    pub applied: Applied,
}

/// A mounted multi-chapter reading session
#[derive(Debug)]
pub struct ReadingSession<S> {
    config: Config,
    chapters: ChapterSlotStore<S>,
    panes: HashMap<String, ChapterPane>,
    panels: PanelCoordinator,
    clicks: ClickDispatcher,
    /// Cached tables of contents by text id
    contents: HashMap<String, TableOfContents>,
    /// Segment shown in the resources panel
    resources_segment: Option<String>,
}

impl<S: SessionStore> ReadingSession<S> {
    /// Mount a session, restoring chapters from `store` or seeding from `nav`
    pub fn mount(store: S, config: Config, nav: Option<&NavigationParams>) -> Self {
        let mut chapters = ChapterSlotStore::new(store, config.max_chapters);
        chapters.load(nav);

        let panes = chapters
            .slots()
            .iter()
            .map(|slot| (slot.id.clone(), ChapterPane::new(slot.clone(), &config)))
            .collect();
        tracing::info!(chapters = chapters.len(), "reading session mounted");

        Self {
            config,
            chapters,
            panes,
            panels: PanelCoordinator::new(),
            clicks: ClickDispatcher::default(),
            contents: HashMap::new(),
            resources_segment: None,
        }
    }

    /// Tear the session down, clearing persisted state; returns the store
    pub fn unmount(mut self) -> S {
        for pane in self.panes.values() {
            pane.close();
        }
        self.panels.reset();
        self.chapters.teardown();
        tracing::info!("reading session unmounted");
        self.chapters.into_store()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open chapters in display order
    pub fn chapters(&self) -> &[ChapterSlot] {
        self.chapters.slots()
    }

    /// Session store behind the chapters
    pub fn store(&self) -> &S {
        self.chapters.store()
    }

    pub fn pane(&self, id: &str) -> Option<&ChapterPane> {
        self.panes.get(id)
    }

    pub fn pane_mut(&mut self, id: &str) -> Option<&mut ChapterPane> {
        self.panes.get_mut(id)
    }

    /// Panes in display order
    pub fn panes(&self) -> impl Iterator<Item = &ChapterPane> {
        self.chapters.slots().iter().filter_map(|slot| self.panes.get(&slot.id))
    }

    pub fn panels(&self) -> &PanelCoordinator {
        &self.panels
    }

    pub fn panels_mut(&mut self) -> &mut PanelCoordinator {
        &mut self.panels
    }

    /// Interceptor chain used by [`click`](Self::click)
    pub fn clicks_mut(&mut self) -> &mut ClickDispatcher {
        &mut self.clicks
    }

    /// Segment the resources panel was opened for
    pub fn resources_segment(&self) -> Option<&str> {
        self.resources_segment.as_deref()
    }

    /// Open a chapter after `after`; returns the new pane id, `None` at capacity
    pub fn add_chapter(&mut self, new: NewChapter, after: Option<&str>) -> Option<String> {
        let slot = self.chapters.insert(new, after)?;
        let id = slot.id.clone();
        self.panes.insert(id.clone(), ChapterPane::new(slot, &self.config));
        Some(id)
    }

    /// Close the chapters selected by `matcher`
    pub fn remove_chapter(&mut self, matcher: &SlotMatcher) -> &[ChapterSlot] {
        self.chapters.remove(matcher);
        let open: Vec<&str> = self.chapters.slots().iter().map(|s| s.id.as_str()).collect();
        self.panes.retain(|id, pane| {
            let keep = open.contains(&id.as_str());
            if !keep {
                pane.close();
            }
            keep
        });
        self.chapters.slots()
    }

    /// Merge `patch` into a chapter; panes whose content changed are reset
    pub fn update_chapter(&mut self, matcher: &SlotMatcher, patch: SlotPatch) -> &[ChapterSlot] {
        self.chapters.update(matcher, patch);
        self.sync_panes();
        self.chapters.slots()
    }

    fn sync_panes(&mut self) {
        for slot in self.chapters.slots() {
            if let Some(pane) = self.panes.get_mut(&slot.id) {
                if pane.slot() != slot {
                    pane.set_slot(slot.clone());
                }
            }
        }
    }

    /// Switch a chapter to another translation version and remember it for new chapters
    pub fn select_version(&mut self, pane_id: &str, version_id: &str) {
        self.chapters.set_version_id(Some(version_id));
        self.update_chapter(
            &SlotMatcher::by_id(pane_id),
            SlotPatch { version_id: Some(version_id.to_string()), ..Default::default() },
        );
        self.panels.close(PanelKind::TranslationSource);
    }

    /// Open the translation selector; the resources panel is closed to make room
    pub fn open_translation_source(&mut self) {
        self.panels.close(PanelKind::Resources);
        self.panels.open(PanelKind::TranslationSource);
    }

    /// First-page requests for every pane that has not loaded yet
    pub fn initial_requests(&mut self) -> Vec<FetchRequest> {
        let mut requests = Vec::new();
        for slot in self.chapters.slots() {
            if let Some(request) = self.panes.get_mut(&slot.id).and_then(ChapterPane::initial_request) {
                requests.push(request);
            }
        }
        requests
    }

    /// Feed a scroll tick to a pane
    pub fn on_scroll(&mut self, pane_id: &str, metrics: &ScrollMetrics) -> Vec<FetchRequest> {
        self.panes.get_mut(pane_id).map(|pane| pane.on_scroll(metrics)).unwrap_or_default()
    }

    /// Execute requests concurrently and merge the results into their panes.
    ///
    /// Backward pages are applied first so a forward page from the same batch
    /// waits for the prepend to be laid out ([`Applied::Deferred`]). Responses
    /// for panes closed or reset in the meantime are reported as
    /// [`Applied::Stale`].
    pub async fn fetch<C: ContentSource>(
        &mut self,
        source: &C,
        requests: Vec<FetchRequest>,
    ) -> Vec<FetchOutcome> {
        let mut responses = join_all(requests.into_iter().map(|r| execute(source, r))).await;
        responses.sort_by_key(|r| r.request.direction != FetchDirection::Backward);

        let mut outcomes = Vec::with_capacity(responses.len());
        for response in responses {
            let pane_id = response.request.pane_id.clone();
            let direction = response.request.direction;
            let applied = match self.panes.get_mut(&pane_id) {
                Some(pane) => pane.apply(response, None),
                None => Applied::Stale,
            };
            if matches!(applied, Applied::Merged | Applied::Deferred) {
                self.persist_resolved_content(&pane_id);
            }
            outcomes.push(FetchOutcome { pane_id, direction, applied });
        }
        outcomes
    }

    fn persist_resolved_content(&mut self, pane_id: &str) {
        let Some(resolved) = self.panes.get(pane_id).and_then(|p| p.slot().content_id.clone()) else {
            return;
        };
        let stored = self.chapters.get(pane_id).and_then(|s| s.content_id.clone());
        if stored.is_none() {
            self.chapters.update(
                &SlotMatcher::by_id(pane_id),
                SlotPatch { content_id: Some(resolved), ..Default::default() },
            );
        }
    }

    /// Layout of a pane finished; returns the scroll offset to restore
    pub fn after_layout(&mut self, pane_id: &str, new_scroll_height: Option<f64>) -> Option<f64> {
        self.panes.get_mut(pane_id)?.after_layout(new_scroll_height)
    }

    /// Recompute a pane's active section.
    ///
    /// On change, the section is remembered on the chapter and the table of
    /// contents path to expand is returned (just the section when the table
    /// of contents is not loaded).
    pub fn update_active_section(&mut self, pane_id: &str, rects: &[SectionRect]) -> Option<Vec<String>> {
        let pane = self.panes.get_mut(pane_id)?;
        let active = pane.update_active_section(rects)?;
        let text_id = pane.slot().text_id.clone();

        self.chapters.update(
            &SlotMatcher::by_id(pane_id),
            SlotPatch { section_id: Some(active.clone()), ..Default::default() },
        );

        let path = self.contents.get(&text_id).and_then(|toc| toc.path_to(&active));
        Some(path.unwrap_or_else(|| vec![active]))
    }

    /// Route a click inside a pane
    pub fn click(&mut self, pane_id: &str, target: &ClickTarget) -> Option<ClickAction> {
        let action = self.clicks.dispatch(target)?;
        match &action {
            ClickAction::ToggleFootnote { footnote_id } => {
                self.panes.get_mut(pane_id)?.toggle_footnote(footnote_id);
            }
            ClickAction::OpenResources { segment_id } => {
                self.resources_segment = Some(segment_id.clone());
                self.panels.open(PanelKind::Resources);
            }
        }
        Some(action)
    }

    /// Fetch (or reuse) the table of contents for a text
    pub async fn load_table_of_contents<C: ContentSource>(
        &mut self,
        source: &C,
        text_id: &str,
    ) -> Result<&TableOfContents, ApiError> {
        if !self.contents.contains_key(text_id) {
            let toc = source.table_of_contents(text_id).await?;
            self.contents.insert(text_id.to_string(), toc);
        }
        self.contents.get(text_id).ok_or_else(|| ApiError::NotFound(text_id.to_string()))
    }
}
