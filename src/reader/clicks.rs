//! Click dispatch for rendered segments
//!
//! Interceptors run in order and the first one that claims a click stops it
//! from reaching the rest. Footnote markers sit inside segments, so the
//! footnote interceptor is registered ahead of the segment handler; otherwise
//! toggling a footnote would also open the resources panel.

use std::fmt::Debug;

/// CSS class carried by footnote marker nodes
pub const FOOTNOTE_MARKER_CLASS: &str = "footnote-marker";

/// The node a click landed on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickTarget {
    /// Class names of the clicked node
    pub classes: Vec<String>,
    /// Footnote referenced by the node, for markers
    pub footnote_id: Option<String>,
    /// Enclosing segment
    pub segment_id: Option<String>,
}

impl ClickTarget {
    /// A click on plain segment text
    pub fn segment(segment_id: impl Into<String>) -> Self {
        Self { segment_id: Some(segment_id.into()), ..Default::default() }
    }

    /// A click on a footnote marker inside a segment
    pub fn footnote_marker(footnote_id: impl Into<String>, segment_id: impl Into<String>) -> Self {
        Self {
            classes: vec![FOOTNOTE_MARKER_CLASS.to_string()],
            footnote_id: Some(footnote_id.into()),
            segment_id: Some(segment_id.into()),
        }
    }

    /// Whether the node has `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// What a click should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Show or hide a footnote next to its marker
    ToggleFootnote { footnote_id: String },
    /// Open the resources panel for a segment
    OpenResources { segment_id: String },
}

/// One step of the click chain
pub trait ClickInterceptor: Debug {
    /// Claim the click by returning an action
    fn intercept(&self, target: &ClickTarget) -> Option<ClickAction>;
}

/// Claims clicks on footnote markers
#[derive(Debug, Default)]
pub struct FootnoteInterceptor;

impl ClickInterceptor for FootnoteInterceptor {
    fn intercept(&self, target: &ClickTarget) -> Option<ClickAction> {
        if !target.has_class(FOOTNOTE_MARKER_CLASS) {
            return None;
        }
        target.footnote_id.clone().map(|footnote_id| ClickAction::ToggleFootnote { footnote_id })
    }
}

/// Claims any click inside a segment
#[derive(Debug, Default)]
pub struct SegmentInterceptor;

impl ClickInterceptor for SegmentInterceptor {
    fn intercept(&self, target: &ClickTarget) -> Option<ClickAction> {
        target.segment_id.clone().map(|segment_id| ClickAction::OpenResources { segment_id })
    }
}

/// Ordered interceptor chain
#[derive(Debug)]
pub struct ClickDispatcher {
    interceptors: Vec<Box<dyn ClickInterceptor>>,
}

impl Default for ClickDispatcher {
    fn default() -> Self {
        Self { interceptors: vec![Box::new(FootnoteInterceptor), Box::new(SegmentInterceptor)] }
    }
}

impl ClickDispatcher {
    /// Create an empty chain
    pub fn empty() -> Self {
        Self { interceptors: Vec::new() }
    }

    /// Run `interceptor` before every registered one
    pub fn push_front(&mut self, interceptor: Box<dyn ClickInterceptor>) {
        self.interceptors.insert(0, interceptor);
    }

    /// Run `interceptor` after every registered one
    pub fn push(&mut self, interceptor: Box<dyn ClickInterceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Route a click; the first claiming interceptor wins
    pub fn dispatch(&self, target: &ClickTarget) -> Option<ClickAction> {
        self.interceptors.iter().find_map(|i| i.intercept(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footnote_marker_does_not_reach_segment_handler() {
        let dispatcher = ClickDispatcher::default();
        let action = dispatcher.dispatch(&ClickTarget::footnote_marker("fn-1", "seg-1"));
        assert_eq!(action, Some(ClickAction::ToggleFootnote { footnote_id: "fn-1".into() }));
    }

    #[test]
    fn segment_click_opens_resources() {
        let dispatcher = ClickDispatcher::default();
        let action = dispatcher.dispatch(&ClickTarget::segment("seg-1"));
        assert_eq!(action, Some(ClickAction::OpenResources { segment_id: "seg-1".into() }));
    }

    #[test]
    fn click_outside_segments_is_ignored() {
        let dispatcher = ClickDispatcher::default();
        assert_eq!(dispatcher.dispatch(&ClickTarget::default()), None);
    }

    #[test]
    fn front_interceptor_runs_first() {
        #[derive(Debug)]
        struct Swallow;
        impl ClickInterceptor for Swallow {
            fn intercept(&self, target: &ClickTarget) -> Option<ClickAction> {
                target.segment_id.clone().map(|_| ClickAction::ToggleFootnote {
                    footnote_id: "swallowed".into(),
                })
            }
        }

        let mut dispatcher = ClickDispatcher::default();
        dispatcher.push_front(Box::new(Swallow));
        assert_eq!(
            dispatcher.dispatch(&ClickTarget::segment("seg-1")),
            Some(ClickAction::ToggleFootnote { footnote_id: "swallowed".into() })
        );
    }

    #[test]
    fn empty_chain_claims_nothing() {
        let mut dispatcher = ClickDispatcher::empty();
        assert_eq!(dispatcher.dispatch(&ClickTarget::segment("seg-1")), None);
        dispatcher.push(Box::new(SegmentInterceptor));
        assert!(dispatcher.dispatch(&ClickTarget::segment("seg-1")).is_some());
    }
}
