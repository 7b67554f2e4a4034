//! Request bodies for the Pecha text endpoints

use serde::{Deserialize, Serialize};

/// Direction for segment-cursor pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageDirection {
    /// Content after the anchor segment
    Next,
    /// Content before the anchor segment
    Previous,
}

/// Request body for `POST /texts/{id}/details`
///
/// Either the skip variant (`skip` + `limit`) or the cursor variant
/// (`segment_id` + `direction` + `size`) is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailsQuery {
    /// Content tree to read from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    /// Translation version to interleave
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    /// Anchor segment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    /// Pages to skip (skip variant)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    /// Page size (skip variant)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Cursor direction (cursor variant)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<PageDirection>,
    /// Number of segments (cursor variant)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl DetailsQuery {
    /// Create a skip/limit query
    pub fn skip(content_id: Option<String>, skip: u32, limit: u32) -> Self {
        Self {
            content_id,
            version_id: None,
            segment_id: None,
            skip: Some(skip),
            limit: Some(limit),
            direction: None,
            size: None,
        }
    }

    /// Create a segment-cursor query
    pub fn cursor(
        content_id: Option<String>,
        segment_id: impl Into<String>,
        direction: PageDirection,
        size: u32,
    ) -> Self {
        Self {
            content_id,
            version_id: None,
            segment_id: Some(segment_id.into()),
            skip: None,
            limit: None,
            direction: Some(direction),
            size: Some(size),
        }
    }

    /// Set the translation version
    pub fn with_version(mut self, version_id: Option<String>) -> Self {
        self.version_id = version_id;
        self
    }
}
