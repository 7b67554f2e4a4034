//! Auxiliary panel visibility

/// Panels shown alongside the chapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    /// Commentaries, translations and other resources for a segment
    Resources,
    /// Translation version picker
    TranslationSource,
    /// Table of contents on the left
    LeftToc,
}

/// Panel visibility for one reading session.
///
/// Panels are independent; closing a sibling is up to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelCoordinator {
    resources: bool,
    translation_source: bool,
    left_toc: bool,
}

impl PanelCoordinator {
    /// All panels closed
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&mut self, panel: PanelKind) -> &mut bool {
        match panel {
            PanelKind::Resources => &mut self.resources,
            PanelKind::TranslationSource => &mut self.translation_source,
            PanelKind::LeftToc => &mut self.left_toc,
        }
    }

    /// Whether `panel` is open
    pub fn is_open(&self, panel: PanelKind) -> bool {
        match panel {
            PanelKind::Resources => self.resources,
            PanelKind::TranslationSource => self.translation_source,
            PanelKind::LeftToc => self.left_toc,
        }
    }

    /// Show `panel`; siblings are left as they are
    pub fn open(&mut self, panel: PanelKind) {
        *self.flag(panel) = true;
    }

    /// Hide `panel`
    pub fn close(&mut self, panel: PanelKind) {
        *self.flag(panel) = false;
    }

    /// Flip `panel`, returning the new state
    pub fn toggle(&mut self, panel: PanelKind) -> bool {
        let flag = self.flag(panel);
        *flag = !*flag;
        *flag
    }

    /// Close everything
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panels_start_closed() {
        let panels = PanelCoordinator::new();
        for panel in [PanelKind::Resources, PanelKind::TranslationSource, PanelKind::LeftToc] {
            assert!(!panels.is_open(panel));
        }
    }

    #[test]
    fn opening_one_panel_leaves_others() {
        let mut panels = PanelCoordinator::new();
        panels.open(PanelKind::TranslationSource);
        panels.open(PanelKind::Resources);

        assert!(panels.is_open(PanelKind::TranslationSource));
        assert!(panels.is_open(PanelKind::Resources));
        assert!(!panels.is_open(PanelKind::LeftToc));
    }

    #[test]
    fn close_leaves_siblings_open() {
        let mut panels = PanelCoordinator::new();
        panels.open(PanelKind::Resources);
        panels.open(PanelKind::LeftToc);
        panels.close(PanelKind::Resources);

        assert!(!panels.is_open(PanelKind::Resources));
        assert!(panels.is_open(PanelKind::LeftToc));
    }

    #[test]
    fn toggle_flips_state() {
        let mut panels = PanelCoordinator::new();
        assert!(panels.toggle(PanelKind::LeftToc));
        assert!(!panels.toggle(PanelKind::LeftToc));
        assert!(!panels.is_open(PanelKind::LeftToc));
    }

    #[test]
    fn reset_closes_everything() {
        let mut panels = PanelCoordinator::new();
        panels.open(PanelKind::Resources);
        panels.open(PanelKind::LeftToc);
        panels.reset();
        assert_eq!(panels, PanelCoordinator::new());
    }
}
