//! Content model for Pecha texts
//!
//! This module defines the data structures returned by the text endpoints.
//! Sections form an owned recursive tree: a section may hold segments, child
//! sections, or both, and the server order is preserved everywhere.

use serde::{Deserialize, Serialize};

/// A titled node in a text's hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section identifier
    pub id: String,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Position of the section within its text (1-indexed), when the server sends it
    #[serde(default)]
    pub section_number: Option<u32>,
    /// Segments directly under this section
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// Nested sections
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Section {
    /// Create an empty section
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            section_number: None,
            segments: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Set the section number
    pub fn with_number(mut self, number: u32) -> Self {
        self.section_number = Some(number);
        self
    }

    /// Append a segment
    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Append a child section
    pub fn with_child(mut self, child: Section) -> Self {
        self.sections.push(child);
        self
    }

    /// Count segments in this section and all descendants
    pub fn segment_count(&self) -> usize {
        self.segments.len() + self.sections.iter().map(Section::segment_count).sum::<usize>()
    }

    /// Find a section by id in this subtree (depth-first, self included)
    pub fn find(&self, id: &str) -> Option<&Section> {
        if self.id == id {
            return Some(self);
        }
        self.sections.iter().find_map(|child| child.find(id))
    }

    /// First segment in document order
    pub fn first_segment(&self) -> Option<&Segment> {
        self.segments.first().or_else(|| self.sections.iter().find_map(Section::first_segment))
    }

    /// Last segment in document order
    pub fn last_segment(&self) -> Option<&Segment> {
        self.sections
            .iter()
            .rev()
            .find_map(Section::last_segment)
            .or_else(|| self.segments.last())
    }
}

/// An atomic unit of source or translation content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment identifier
    pub segment_id: String,
    /// Position within the text (1-indexed)
    #[serde(default)]
    pub segment_number: Option<u32>,
    /// Segment content (may contain inline markup)
    #[serde(default)]
    pub content: String,
    /// Footnotes attached to this segment
    #[serde(default)]
    pub footnotes: Vec<Footnote>,
}

impl Segment {
    /// Create a new segment
    pub fn new(segment_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            segment_id: segment_id.into(),
            segment_number: None,
            content: content.into(),
            footnotes: Vec::new(),
        }
    }

    /// Set the segment number
    pub fn with_number(mut self, number: u32) -> Self {
        self.segment_number = Some(number);
        self
    }
}

/// A footnote shown next to its marker when toggled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footnote {
    /// Footnote identifier, referenced by the marker
    pub id: String,
    /// Footnote body
    pub content: String,
}

/// One fetched page of section content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPage {
    /// Content tree the page was read from
    #[serde(default)]
    pub content_id: Option<String>,
    /// Sections in server order
    #[serde(default, alias = "content")]
    pub sections: Vec<Section>,
    /// Page number of this response (skip mode, 1-indexed)
    #[serde(default)]
    pub current_section: Option<u32>,
    /// Number of pages available (skip mode)
    #[serde(default)]
    pub total: Option<u32>,
    /// Position of the anchor segment (segment-cursor mode, 1-indexed)
    #[serde(default)]
    pub current_segment_position: Option<u32>,
    /// Number of segments available (segment-cursor mode)
    #[serde(default)]
    pub total_segments: Option<u32>,
}

impl ContentPage {
    /// Create a page with the given sections and no cursor metadata
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections, ..Default::default() }
    }

    /// Total reported by whichever pagination mode the server answered in
    pub fn total_hint(&self) -> Option<u32> {
        self.total.or(self.total_segments)
    }

    /// Position reported by whichever pagination mode the server answered in
    pub fn position(&self) -> Option<u32> {
        self.current_section.or(self.current_segment_position)
    }

    /// Position of the page after this one, or `None` at the end of the text
    pub fn next_position(&self) -> Option<u32> {
        match (self.current_segment_position, self.total_segments) {
            (Some(current), Some(total)) if current >= total => None,
            (Some(current), _) => current.checked_add(1),
            _ => match (self.current_section, self.total) {
                (Some(current), Some(total)) if current >= total => None,
                (Some(current), _) => current.checked_add(1),
                _ => None,
            },
        }
    }

    /// Position of the page before this one, or `None` at the start of the text
    pub fn previous_position(&self) -> Option<u32> {
        self.position().filter(|p| *p > 1).map(|p| p - 1)
    }

    /// Whether no page follows this one
    pub fn is_last(&self) -> bool {
        self.position().is_some() && self.next_position().is_none()
    }

    /// Whether no page precedes this one
    pub fn is_first(&self) -> bool {
        self.position().is_some() && self.previous_position().is_none()
    }

    /// Count all segments in the page
    pub fn segment_count(&self) -> usize {
        self.sections.iter().map(Section::segment_count).sum()
    }
}

/// Table of contents for a text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableOfContents {
    /// Identifier of the content tree (the `content_id` used in detail requests)
    #[serde(default)]
    pub id: Option<String>,
    /// Text the contents belong to
    #[serde(default)]
    pub text_id: Option<String>,
    /// Top-level sections
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl TableOfContents {
    /// Ids of the sections to expand so `section_id` is visible, root first.
    ///
    /// The returned path ends with `section_id` itself.
    pub fn path_to(&self, section_id: &str) -> Option<Vec<String>> {
        fn walk(sections: &[Section], target: &str, path: &mut Vec<String>) -> bool {
            for section in sections {
                path.push(section.id.clone());
                if section.id == target || walk(&section.sections, target, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        walk(&self.sections, section_id, &mut path).then_some(path)
    }
}
