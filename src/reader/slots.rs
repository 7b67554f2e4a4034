//! Open chapter slots
//!
//! The ordered, bounded list of chapter panes in a reading session. Every
//! mutation is written through to the session store under [`CHAPTERS_KEY`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::config::SessionStore;

/// Session store key holding the JSON array of open chapters
pub const CHAPTERS_KEY: &str = "chapters";
/// Session store key holding the shared translation version
pub const VERSION_KEY: &str = "versionId";

static SLOT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// One open reading pane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSlot {
    /// Stable identifier, unique within the session
    pub id: String,
    /// Text being read
    pub text_id: String,
    /// Content tree; resolved by the first fetch when absent
    #[serde(default)]
    pub content_id: Option<String>,
    /// Segment the pane was opened on
    #[serde(default)]
    pub segment_id: Option<String>,
    /// Translation version
    #[serde(default)]
    pub version_id: Option<String>,
    /// Section anchoring the table of contents
    #[serde(default)]
    pub section_id: Option<String>,
    /// Page to start reading from
    #[serde(default)]
    pub content_index: u32,
}

impl ChapterSlot {
    /// Build a slot with a freshly generated id
    pub fn from_new(new: NewChapter) -> Self {
        let id = generate_slot_id(&new.text_id, new.content_id.as_deref(), new.segment_id.as_deref());
        Self {
            id,
            text_id: new.text_id,
            content_id: new.content_id,
            segment_id: new.segment_id,
            version_id: new.version_id,
            section_id: new.section_id,
            content_index: new.content_index,
        }
    }

    /// The content this slot currently points at
    pub fn identity(&self) -> ResourceIdentity {
        ResourceIdentity {
            text_id: self.text_id.clone(),
            content_id: self.content_id.clone(),
            version_id: self.version_id.clone(),
            segment_id: self.segment_id.clone(),
        }
    }

    fn apply(&mut self, patch: SlotPatch) {
        if let Some(content_id) = patch.content_id {
            self.content_id = Some(content_id);
        }
        if let Some(segment_id) = patch.segment_id {
            self.segment_id = Some(segment_id);
        }
        if let Some(version_id) = patch.version_id {
            self.version_id = Some(version_id);
        }
        if let Some(section_id) = patch.section_id {
            self.section_id = Some(section_id);
        }
        if let Some(content_index) = patch.content_index {
            self.content_index = content_index;
        }
    }
}

/// What a chapter pane is showing; a change invalidates everything fetched for it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentity {
    pub text_id: String,
    pub content_id: Option<String>,
    pub version_id: Option<String>,
    pub segment_id: Option<String>,
}

/// Fields for a chapter about to be opened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewChapter {
    pub text_id: String,
    pub content_id: Option<String>,
    pub segment_id: Option<String>,
    pub version_id: Option<String>,
    pub section_id: Option<String>,
    pub content_index: u32,
}

impl NewChapter {
    /// Open a text
    pub fn new(text_id: impl Into<String>) -> Self {
        Self { text_id: text_id.into(), ..Default::default() }
    }

    /// Set the content tree
    pub fn with_content(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    /// Set the segment to open on
    pub fn with_segment(mut self, segment_id: impl Into<String>) -> Self {
        self.segment_id = Some(segment_id.into());
        self
    }

    /// Set the translation version
    pub fn with_version(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    /// Set the starting page
    pub fn at_index(mut self, content_index: u32) -> Self {
        self.content_index = content_index;
        self
    }
}

/// Selects slots for removal or update
///
/// A matcher carrying an `id` matches by id. Without one, removal falls back
/// to the exact `(content_id, version_id)` pair and update to `content_id`,
/// for callers that never learned the slot id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotMatcher {
    pub id: Option<String>,
    pub content_id: Option<String>,
    pub version_id: Option<String>,
}

impl SlotMatcher {
    /// Match by slot id
    pub fn by_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), ..Default::default() }
    }

    /// Match by content and version
    pub fn by_content(content_id: Option<String>, version_id: Option<String>) -> Self {
        Self { id: None, content_id, version_id }
    }

    fn matches_pair(&self, slot: &ChapterSlot) -> bool {
        slot.content_id == self.content_id && slot.version_id == self.version_id
    }
}

/// Partial update; only the fields that are `Some` are written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotPatch {
    pub content_id: Option<String>,
    pub segment_id: Option<String>,
    pub version_id: Option<String>,
    pub section_id: Option<String>,
    pub content_index: Option<u32>,
}

/// Where a session was opened from (query string of the reader URL)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationParams {
    pub text_id: String,
    pub content_id: Option<String>,
    pub segment_id: Option<String>,
    pub version_id: Option<String>,
    pub section_id: Option<String>,
    pub content_index: u32,
}

impl NavigationParams {
    /// Parse `text_id=..&content_id=..` (leading `?` optional).
    ///
    /// Returns `None` when no text id is present.
    pub fn parse_query(query: &str) -> Option<Self> {
        let url = Url::parse(&format!("http://reader.local/?{}", query.trim_start_matches('?'))).ok()?;
        let mut params = Self::default();

        for (key, value) in url.query_pairs() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "text_id" | "textId" => params.text_id = value.to_string(),
                "content_id" | "contentId" => params.content_id = Some(value.to_string()),
                "segment_id" | "segmentId" => params.segment_id = Some(value.to_string()),
                "version_id" | "versionId" => params.version_id = Some(value.to_string()),
                "section_id" | "sectionId" => params.section_id = Some(value.to_string()),
                "content_index" | "contentIndex" => {
                    params.content_index = value.parse().unwrap_or_default()
                }
                _ => {}
            }
        }

        (!params.text_id.is_empty()).then_some(params)
    }

    fn to_new_chapter(&self) -> NewChapter {
        NewChapter {
            text_id: self.text_id.clone(),
            content_id: self.content_id.clone(),
            segment_id: self.segment_id.clone(),
            version_id: self.version_id.clone(),
            section_id: self.section_id.clone(),
            content_index: self.content_index,
        }
    }
}

/// Generate a slot id that stays unique for identical fields added in the same millisecond
pub fn generate_slot_id(text_id: &str, content_id: Option<&str>, segment_id: Option<&str>) -> String {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
    let seq = SLOT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}-{}-{}-{}-{}",
        text_id,
        content_id.unwrap_or("none"),
        segment_id.unwrap_or("none"),
        millis,
        seq
    )
}

/// Bounded, persisted list of open chapters
#[derive(Debug)]
pub struct ChapterSlotStore<S> {
    store: S,
    slots: Vec<ChapterSlot>,
    max_chapters: usize,
}

impl<S: SessionStore> ChapterSlotStore<S> {
    /// Create an empty slot list over `store`
    pub fn new(store: S, max_chapters: usize) -> Self {
        Self { store, slots: Vec::new(), max_chapters }
    }

    /// Restore slots from the store, or seed one from navigation parameters
    pub fn load(&mut self, nav: Option<&NavigationParams>) -> &[ChapterSlot] {
        if let Some(slots) = self.read_persisted() {
            self.slots = slots;
        } else if let Some(nav) = nav {
            let mut new = nav.to_new_chapter();
            if new.version_id.is_none() {
                new.version_id = self.version_id();
            }
            self.slots = vec![ChapterSlot::from_new(new)];
            tracing::debug!(text_id = %nav.text_id, "seeded chapter from navigation");
            self.persist();
        } else {
            self.slots.clear();
        }
        &self.slots
    }

    fn read_persisted(&self) -> Option<Vec<ChapterSlot>> {
        let raw = self.store.get_item(CHAPTERS_KEY)?;
        match serde_json::from_str::<Vec<ChapterSlot>>(&raw) {
            Ok(mut slots) => {
                if slots.len() > self.max_chapters {
                    tracing::warn!(
                        "Persisted session has {} chapters, keeping first {}",
                        slots.len(),
                        self.max_chapters
                    );
                    slots.truncate(self.max_chapters);
                }
                Some(slots)
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed persisted chapters: {}", e);
                None
            }
        }
    }

    /// Write the whole list back to the store
    pub fn persist(&mut self) {
        let result = serde_json::to_string(&self.slots)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.set_item(CHAPTERS_KEY, &json));
        if let Err(e) = result {
            tracing::warn!("Failed to persist chapters: {:#}", e);
        }
    }

    /// Open a chapter after `after` (or at the end); a no-op at capacity
    pub fn add(&mut self, new: NewChapter, after: Option<&str>) -> &[ChapterSlot] {
        self.insert(new, after);
        &self.slots
    }

    /// Like [`add`](Self::add), returning the created slot
    pub fn insert(&mut self, new: NewChapter, after: Option<&str>) -> Option<ChapterSlot> {
        if self.slots.len() >= self.max_chapters {
            tracing::debug!(max = self.max_chapters, "chapter limit reached, ignoring add");
            return None;
        }

        let slot = ChapterSlot::from_new(new);
        let position = after
            .and_then(|id| self.slots.iter().position(|s| s.id == id))
            .map(|i| i + 1)
            .unwrap_or(self.slots.len());
        self.slots.insert(position, slot.clone());
        tracing::debug!(id = %slot.id, position, "added chapter");

        self.persist();
        Some(slot)
    }

    /// Close the chapters selected by `matcher`
    pub fn remove(&mut self, matcher: &SlotMatcher) -> &[ChapterSlot] {
        let len_before = self.slots.len();
        match &matcher.id {
            Some(id) => self.slots.retain(|s| &s.id != id),
            None => self.slots.retain(|s| !matcher.matches_pair(s)),
        }

        if self.slots.len() < len_before {
            tracing::debug!(removed = len_before - self.slots.len(), "removed chapter");
            self.persist();
        }
        &self.slots
    }

    /// Merge `patch` into the chapter selected by `matcher`
    pub fn update(&mut self, matcher: &SlotMatcher, patch: SlotPatch) -> &[ChapterSlot] {
        let by_id = matcher.id.as_ref().and_then(|id| self.slots.iter().position(|s| &s.id == id));
        let index = by_id.or_else(|| {
            matcher
                .content_id
                .as_ref()
                .and_then(|cid| self.slots.iter().position(|s| s.content_id.as_ref() == Some(cid)))
        });

        if let Some(index) = index {
            self.slots[index].apply(patch);
            self.persist();
        }
        &self.slots
    }

    /// Shared translation version
    pub fn version_id(&self) -> Option<String> {
        self.store.get_item(VERSION_KEY)
    }

    /// Set or clear the shared translation version
    pub fn set_version_id(&mut self, version_id: Option<&str>) {
        let result = match version_id {
            Some(v) => self.store.set_item(VERSION_KEY, v),
            None => self.store.remove_item(VERSION_KEY),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to persist version: {:#}", e);
        }
    }

    /// Drop all slots and purge them from the store
    pub fn teardown(&mut self) {
        self.slots.clear();
        for key in [CHAPTERS_KEY, VERSION_KEY] {
            if let Err(e) = self.store.remove_item(key) {
                tracing::warn!("Failed to clear {}: {:#}", key, e);
            }
        }
    }

    /// Open chapters in display order
    pub fn slots(&self) -> &[ChapterSlot] {
        &self.slots
    }

    /// Find a chapter by id
    pub fn get(&self, id: &str) -> Option<&ChapterSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    /// Number of open chapters
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no chapter is open
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Capacity of the list
    pub fn max_chapters(&self) -> usize {
        self.max_chapters
    }

    /// Underlying session store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the list, returning the session store
    pub fn into_store(self) -> S {
        self.store
    }
}
