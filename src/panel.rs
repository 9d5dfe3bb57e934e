//! Collapsible panel state.

/// Show/hide state of one collapsible region. Instances never share state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelToggle {
    subject: &'static str,
    collapsed: bool,
    height_target: Option<u16>,
}

impl PanelToggle {
    pub fn new(subject: &'static str) -> Self {
        Self {
            subject,
            collapsed: true,
            height_target: None,
        }
    }

    /// Flip the panel. `natural_height` is the content's rendered height right now; it is
    /// only used when expanding.
    pub fn toggle(&mut self, natural_height: u16) {
        self.collapsed = !self.collapsed;
        self.height_target = if self.collapsed {
            None
        } else {
            Some(natural_height)
        };
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn height_target(&self) -> Option<u16> {
        self.height_target
    }

    /// Action the next toggle performs.
    pub fn label(&self) -> String {
        if self.collapsed {
            format!("Show {}", self.subject)
        } else {
            format!("Collapse {}", self.subject)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_collapsed() {
        let p = PanelToggle::new("registered sites");
        assert!(p.is_collapsed());
        assert_eq!(p.height_target(), None);
        assert_eq!(p.label(), "Show registered sites");
    }

    #[test]
    fn expanding_uses_height_given_at_toggle_time() {
        let mut p = PanelToggle::new("current terms");
        p.toggle(7);
        assert_eq!(p.height_target(), Some(7));
        assert_eq!(p.label(), "Collapse current terms");
        p.toggle(12);
        assert_eq!(p.height_target(), None);
        p.toggle(12);
        assert_eq!(p.height_target(), Some(12));
    }

    #[test]
    fn instances_are_independent() {
        let mut sites = PanelToggle::new("registered sites");
        let terms = PanelToggle::new("current terms");
        let before = terms.clone();
        sites.toggle(5);
        assert!(!sites.is_collapsed());
        assert_eq!(terms, before);
        assert_eq!(terms.label(), "Show current terms");
    }
}
