//! Scroll observation for a chapter pane
//!
//! [`classify`] is the pure decision: scroll ratio and direction from one
//! set of viewport metrics and the previous offset. [`ScrollSpy`] is the thin
//! stateful adapter fed with every scroll tick; it remembers the last offset,
//! decides when more content is needed and tracks the active section.

use crate::config::Config;

/// Viewport measurements of a scroll container
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollMetrics {
    /// Offset of the viewport from the top of the content
    pub scroll_top: f64,
    /// Height of the whole content
    pub scroll_height: f64,
    /// Height of the visible viewport
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Create metrics from raw values
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self { scroll_top, scroll_height, client_height }
    }
}

/// Direction of the last scroll movement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollDirection {
    #[default]
    Still,
    Up,
    Down,
}

/// Result of classifying one scroll tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollObservation {
    pub direction: ScrollDirection,
    /// `(scroll_top + client_height) / scroll_height`
    pub ratio: f64,
}

/// Classify a scroll tick against the previous offset
pub fn classify(metrics: &ScrollMetrics, last_top: f64) -> ScrollObservation {
    let direction = if metrics.scroll_top > last_top {
        ScrollDirection::Down
    } else if metrics.scroll_top < last_top {
        ScrollDirection::Up
    } else {
        ScrollDirection::Still
    };

    let ratio = if metrics.scroll_height > 0.0 {
        (metrics.scroll_top + metrics.client_height) / metrics.scroll_height
    } else {
        1.0
    };

    ScrollObservation { direction, ratio }
}

/// Content that should be requested after a scroll tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTrigger {
    /// Reader is at the bottom
    Forward,
    /// Reader is at the top and moving up
    Backward,
}

/// Thresholds for requesting more content
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollThresholds {
    /// Ratio at or above which the next page is needed
    pub forward_ratio: f64,
    /// Offset below which, when moving up, the previous page is needed
    pub top_px: f64,
}

impl Default for ScrollThresholds {
    fn default() -> Self {
        Self { forward_ratio: 0.99, top_px: 10.0 }
    }
}

impl From<&Config> for ScrollThresholds {
    fn from(config: &Config) -> Self {
        Self { forward_ratio: config.forward_ratio, top_px: config.top_threshold_px }
    }
}

/// Bounding box of a rendered section, relative to the viewport top
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRect {
    pub id: String,
    pub top: f64,
    pub bottom: f64,
}

impl SectionRect {
    pub fn new(id: impl Into<String>, top: f64, bottom: f64) -> Self {
        Self { id: id.into(), top, bottom }
    }
}

/// Pick the section nearest the top of the viewport.
///
/// That is the last section (in reading order) starting at or above the
/// probe line; when every section starts below it, the first one.
pub fn active_section(rects: &[SectionRect], probe: f64) -> Option<&str> {
    rects
        .iter()
        .rev()
        .find(|r| r.top <= probe && r.bottom > 0.0)
        .or_else(|| rects.first())
        .map(|r| r.id.as_str())
}

/// Stateful scroll observer for one pane
#[derive(Debug, Clone, Default)]
pub struct ScrollSpy {
    thresholds: ScrollThresholds,
    last_top: f64,
    last_metrics: Option<ScrollMetrics>,
    last_observation: Option<ScrollObservation>,
    active_section: Option<String>,
    /// Distance below the viewport top at which a section counts as active
    probe_offset: f64,
}

impl ScrollSpy {
    /// Create a spy with the given thresholds
    pub fn new(thresholds: ScrollThresholds) -> Self {
        Self { thresholds, probe_offset: 1.0, ..Default::default() }
    }

    /// Feed one scroll tick
    pub fn observe(&mut self, metrics: &ScrollMetrics) -> Vec<ScrollTrigger> {
        let observation = classify(metrics, self.last_top);
        self.last_top = metrics.scroll_top;
        self.last_metrics = Some(*metrics);
        self.last_observation = Some(observation);

        let mut triggers = Vec::new();
        if observation.ratio >= self.thresholds.forward_ratio {
            triggers.push(ScrollTrigger::Forward);
        }
        if metrics.scroll_top < self.thresholds.top_px
            && observation.direction == ScrollDirection::Up
        {
            triggers.push(ScrollTrigger::Backward);
        }
        triggers
    }

    /// Record a programmatic scroll so it does not read as user movement
    pub fn set_scroll_top(&mut self, scroll_top: f64) {
        self.last_top = scroll_top;
        if let Some(metrics) = self.last_metrics.as_mut() {
            metrics.scroll_top = scroll_top;
        }
    }

    /// Viewport as of the most recent tick
    pub fn last_metrics(&self) -> Option<ScrollMetrics> {
        self.last_metrics
    }

    /// Most recent classification
    pub fn last_observation(&self) -> Option<ScrollObservation> {
        self.last_observation
    }

    /// Recompute the active section; returns its id only when it changed
    pub fn update_active(&mut self, rects: &[SectionRect]) -> Option<&str> {
        let current = active_section(rects, self.probe_offset)?;
        if self.active_section.as_deref() == Some(current) {
            return None;
        }
        self.active_section = Some(current.to_string());
        self.active_section.as_deref()
    }

    /// Currently active section
    pub fn active(&self) -> Option<&str> {
        self.active_section.as_deref()
    }

    /// Forget offsets and the active section
    pub fn reset(&mut self) {
        *self = Self::new(self.thresholds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_direction_and_ratio() {
        let metrics = ScrollMetrics::new(300.0, 1000.0, 500.0);
        let down = classify(&metrics, 100.0);
        assert_eq!(down.direction, ScrollDirection::Down);
        assert_eq!(down.ratio, 0.8);

        assert_eq!(classify(&metrics, 400.0).direction, ScrollDirection::Up);
        assert_eq!(classify(&metrics, 300.0).direction, ScrollDirection::Still);
    }

    #[test]
    fn classify_empty_container_counts_as_bottom() {
        let observation = classify(&ScrollMetrics::default(), 0.0);
        assert_eq!(observation.ratio, 1.0);
    }

    #[test]
    fn bottom_triggers_forward() {
        let mut spy = ScrollSpy::new(ScrollThresholds::default());
        assert!(spy.observe(&ScrollMetrics::new(100.0, 1000.0, 500.0)).is_empty());
        assert_eq!(
            spy.observe(&ScrollMetrics::new(495.0, 1000.0, 500.0)),
            vec![ScrollTrigger::Forward]
        );
    }

    #[test]
    fn top_triggers_backward_only_when_moving_up() {
        let mut spy = ScrollSpy::new(ScrollThresholds::default());
        spy.observe(&ScrollMetrics::new(200.0, 2000.0, 500.0));
        assert_eq!(
            spy.observe(&ScrollMetrics::new(5.0, 2000.0, 500.0)),
            vec![ScrollTrigger::Backward]
        );

        // Moving down inside the top band is not a backward request
        spy.set_scroll_top(0.0);
        assert!(spy.observe(&ScrollMetrics::new(4.0, 2000.0, 500.0)).is_empty());
    }

    #[test]
    fn active_section_is_last_started_above_probe() {
        let rects = vec![
            SectionRect::new("a", -900.0, -100.0),
            SectionRect::new("b", -100.0, 400.0),
            SectionRect::new("c", 400.0, 900.0),
        ];
        assert_eq!(active_section(&rects, 1.0), Some("b"));
    }

    #[test]
    fn active_section_defaults_to_first() {
        let rects = vec![SectionRect::new("a", 50.0, 500.0), SectionRect::new("b", 500.0, 900.0)];
        assert_eq!(active_section(&rects, 1.0), Some("a"));
        assert_eq!(active_section(&[], 1.0), None);
    }

    #[test]
    fn update_active_reports_changes_only() {
        let mut spy = ScrollSpy::new(ScrollThresholds::default());
        let first = vec![SectionRect::new("a", 0.0, 300.0), SectionRect::new("b", 300.0, 600.0)];
        assert_eq!(spy.update_active(&first), Some("a"));
        assert_eq!(spy.update_active(&first), None);

        let scrolled = vec![SectionRect::new("a", -300.0, 0.0), SectionRect::new("b", 0.0, 300.0)];
        assert_eq!(spy.update_active(&scrolled), Some("b"));
        assert_eq!(spy.active(), Some("b"));
    }
}
