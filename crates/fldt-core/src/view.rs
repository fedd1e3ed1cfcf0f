#![forbid(unsafe_code)]

//! DOM projection of the toolbar state.
//!
//! Hosts render a [`ToolbarView`] after every dispatch. Nothing here is read
//! back from the page.

use crate::active::{ActiveMark, ActiveSetTracker};
use crate::config::DomNames;
use crate::panel::{PanelId, PanelRegistry};
use crate::toolbar::{SubWindowState, ToolbarMachine, ToolbarVisibility};

/// Visual state of one active-mark switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchView {
    pub panel: PanelId,
    pub mark: ActiveMark,
}

/// Everything the host needs to make the DOM match the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarView {
    pub toolbar_visible: bool,
    /// The collapsed-state handle is shown exactly when the toolbar is not.
    pub handle_visible: bool,
    pub open_content: Option<PanelId>,
    /// Nav entry carrying the "current panel" highlight.
    pub highlighted: Option<PanelId>,
    pub switches: Vec<SwitchView>,
    pub sub_window_visible: bool,
}

impl ToolbarView {
    #[must_use]
    pub fn project(
        machine: &ToolbarMachine,
        registry: &PanelRegistry,
        active: &ActiveSetTracker,
    ) -> Self {
        let toolbar_visible = machine.visibility() == ToolbarVisibility::Shown;
        let open_content = machine.open_panel().cloned();
        let switches = registry
            .iter()
            .filter(|entry| entry.user_enable)
            .map(|entry| SwitchView {
                panel: entry.id.clone(),
                mark: active.mark(entry.id.as_str()),
            })
            .collect();
        Self {
            toolbar_visible,
            handle_visible: !toolbar_visible,
            highlighted: open_content.clone(),
            open_content,
            switches,
            sub_window_visible: machine.sub_window() == SubWindowState::Open,
        }
    }

    #[must_use]
    pub fn content_visible(&self, id: &str) -> bool {
        self.open_content
            .as_ref()
            .is_some_and(|open| open.as_str() == id)
    }

    #[must_use]
    pub fn switch_mark(&self, id: &str) -> Option<ActiveMark> {
        self.switches
            .iter()
            .find(|switch| switch.panel.as_str() == id)
            .map(|switch| switch.mark)
    }
}

/// Zebra parity of a table row after sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowParity {
    Even,
    Odd,
}

impl RowParity {
    /// Parity of the row at post-sort `index` (0-based).
    #[must_use]
    pub const fn of(index: usize) -> Self {
        if index % 2 == 0 { Self::Even } else { Self::Odd }
    }

    #[must_use]
    pub fn class(self, names: &DomNames) -> &str {
        match self {
            Self::Even => &names.even_class,
            Self::Odd => &names.odd_class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolbarConfig;
    use crate::panel::PanelEntry;
    use crate::persist::{CookieScope, MemoryStore};
    use pretty_assertions::assert_eq;

    #[test]
    fn projection_follows_machine_and_marks() {
        let config = ToolbarConfig::default();
        let registry = PanelRegistry::new([
            PanelEntry::new("sql"),
            PanelEntry::new("timer").with_switch(false),
        ]);
        let mut store = MemoryStore::new().with_value("fldt_active", "sql");
        let active = ActiveSetTracker::load(&store, "fldt_active", CookieScope::new("/", 10));
        let mut machine = ToolbarMachine::new(&config);
        machine.load(&mut store);
        machine.toggle_panel(&registry, "sql").unwrap();

        let view = ToolbarView::project(&machine, &registry, &active);
        assert!(view.toolbar_visible);
        assert!(!view.handle_visible);
        assert!(view.content_visible("sql"));
        assert!(!view.content_visible("timer"));
        assert_eq!(view.highlighted.as_ref().map(PanelId::as_str), Some("sql"));
        assert_eq!(view.switches.len(), 1);
        assert_eq!(view.switch_mark("sql"), Some(ActiveMark::Active));
        assert_eq!(view.switch_mark("timer"), None);
    }

    #[test]
    fn zebra_parity() {
        let names = DomNames::default();
        let classes: Vec<&str> = (0..4).map(|i| RowParity::of(i).class(&names)).collect();
        assert_eq!(classes, ["flDebugEven", "flDebugOdd", "flDebugEven", "flDebugOdd"]);
    }
}
