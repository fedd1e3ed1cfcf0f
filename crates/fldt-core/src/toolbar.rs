#![forbid(unsafe_code)]

//! Toolbar visibility state machine.
//!
//! States are `Collapsed`, `ShownNoPanel` and `ShownPanel(p)`. The machine
//! enforces:
//! - at most one panel content region open at a time,
//! - toggling the open panel closes it,
//! - the sub-window is only open while the toolbar is shown, and
//! - the Escape listener is bound exactly while the toolbar is shown.
//!
//! The close cascade ([`ToolbarMachine::close_cascade`]) is the single place
//! that decides which layer a "close" command removes.

use tracing::debug;

use crate::config::ToolbarConfig;
use crate::dispatch::IgnoredReason;
use crate::panel::{PanelId, PanelRegistry};
use crate::persist::{CookieScope, PersistenceStore};

/// Whole-toolbar visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarVisibility {
    Shown,
    Collapsed,
}

/// Remote-content sub-window visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubWindowState {
    Closed,
    Open,
}

/// Toolbar state proper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarPhase {
    Collapsed,
    ShownNoPanel,
    ShownPanel(PanelId),
}

impl ToolbarPhase {
    #[must_use]
    pub const fn visibility(&self) -> ToolbarVisibility {
        match self {
            Self::Collapsed => ToolbarVisibility::Collapsed,
            Self::ShownNoPanel | Self::ShownPanel(_) => ToolbarVisibility::Shown,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Collapsed => "collapsed",
            Self::ShownNoPanel => "shown",
            Self::ShownPanel(_) => "shown_panel",
        }
    }
}

/// Host command for the document-level Escape key listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerChange {
    BindEscape,
    UnbindEscape,
}

/// Result of toggling a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelToggle {
    /// `panel` is now open; `replaced` was open before and got closed.
    Opened {
        panel: PanelId,
        replaced: Option<PanelId>,
    },
    Closed {
        panel: PanelId,
    },
}

/// Layer removed by one close-cascade step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseLayer {
    SubWindow,
    Panel(PanelId),
    Toolbar,
}

impl CloseLayer {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SubWindow => "sub_window",
            Self::Panel(_) => "panel",
            Self::Toolbar => "toolbar",
        }
    }
}

/// Side effects of a visibility transition the host must carry out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub listener: Option<ListenerChange>,
    pub closed_sub_window: bool,
    pub closed_panel: Option<PanelId>,
}

/// Explicit toolbar state. The DOM is a projection of this, never the source.
#[derive(Debug, Clone)]
pub struct ToolbarMachine {
    phase: ToolbarPhase,
    sub_window: SubWindowState,
    escape_bound: bool,
    cookie_name: String,
    collapsed_marker: String,
    scope: CookieScope,
}

impl ToolbarMachine {
    /// A machine that has not loaded persisted state yet (collapsed, no
    /// listener bound).
    #[must_use]
    pub fn new(config: &ToolbarConfig) -> Self {
        Self {
            phase: ToolbarPhase::Collapsed,
            sub_window: SubWindowState::Closed,
            escape_bound: false,
            cookie_name: config.cookie_name.clone(),
            collapsed_marker: config.collapsed_marker.clone(),
            scope: config.scope(),
        }
    }

    /// Restore visibility from the persisted collapse flag.
    ///
    /// Never reopens a panel. Loading into the shown state clears any stale
    /// flag and binds the Escape listener; loading collapsed leaves the flag
    /// untouched.
    pub fn load<S: PersistenceStore + ?Sized>(&mut self, store: &mut S) -> Transition {
        let collapsed = store
            .read(&self.cookie_name)
            .is_some_and(|flag| !flag.is_empty());
        self.sub_window = SubWindowState::Closed;
        let transition = if collapsed {
            self.phase = ToolbarPhase::Collapsed;
            Transition {
                listener: self.set_escape_bound(false),
                ..Transition::default()
            }
        } else {
            self.phase = ToolbarPhase::ShownNoPanel;
            store.write(self.scope.delete(&self.cookie_name));
            Transition {
                listener: self.set_escape_bound(true),
                ..Transition::default()
            }
        };
        debug!(
            target: "fldt_core::toolbar",
            phase = self.phase.label(),
            "loaded toolbar visibility"
        );
        transition
    }

    #[must_use]
    pub fn phase(&self) -> &ToolbarPhase {
        &self.phase
    }

    #[must_use]
    pub const fn visibility(&self) -> ToolbarVisibility {
        self.phase.visibility()
    }

    #[must_use]
    pub fn open_panel(&self) -> Option<&PanelId> {
        match &self.phase {
            ToolbarPhase::ShownPanel(panel) => Some(panel),
            _ => None,
        }
    }

    #[must_use]
    pub const fn sub_window(&self) -> SubWindowState {
        self.sub_window
    }

    #[must_use]
    pub const fn escape_bound(&self) -> bool {
        self.escape_bound
    }

    /// Open `id`, or close it when it is already the open panel.
    pub fn toggle_panel(
        &mut self,
        registry: &PanelRegistry,
        id: &str,
    ) -> Result<PanelToggle, IgnoredReason> {
        let Some(entry) = registry.get(id) else {
            return Err(IgnoredReason::UnknownPanel);
        };
        if !entry.has_content {
            return Err(IgnoredReason::PanelWithoutContent);
        }
        let toggle = match &self.phase {
            ToolbarPhase::Collapsed => return Err(IgnoredReason::ToolbarCollapsed),
            ToolbarPhase::ShownPanel(open) if open == &entry.id => {
                PanelToggle::Closed {
                    panel: open.clone(),
                }
            }
            ToolbarPhase::ShownPanel(open) => PanelToggle::Opened {
                panel: entry.id.clone(),
                replaced: Some(open.clone()),
            },
            ToolbarPhase::ShownNoPanel => PanelToggle::Opened {
                panel: entry.id.clone(),
                replaced: None,
            },
        };
        self.phase = match &toggle {
            PanelToggle::Opened { panel, .. } => ToolbarPhase::ShownPanel(panel.clone()),
            PanelToggle::Closed { .. } => ToolbarPhase::ShownNoPanel,
        };
        Ok(toggle)
    }

    /// Hide everything and persist the collapse flag.
    pub fn collapse<S: PersistenceStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<Transition, IgnoredReason> {
        if self.visibility() == ToolbarVisibility::Collapsed {
            return Err(IgnoredReason::AlreadyCollapsed);
        }
        let closed_panel = self.open_panel().cloned();
        let closed_sub_window = self.sub_window == SubWindowState::Open;
        self.phase = ToolbarPhase::Collapsed;
        self.sub_window = SubWindowState::Closed;
        store.write(
            self.scope
                .set(&self.cookie_name, self.collapsed_marker.clone()),
        );
        debug!(
            target: "fldt_core::toolbar",
            closed_sub_window,
            closed_panel = closed_panel.as_ref().map(PanelId::as_str),
            "collapsed toolbar"
        );
        Ok(Transition {
            listener: self.set_escape_bound(false),
            closed_sub_window,
            closed_panel,
        })
    }

    /// Show the toolbar with no panel open and delete the collapse flag.
    pub fn expand<S: PersistenceStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<Transition, IgnoredReason> {
        if self.visibility() == ToolbarVisibility::Shown {
            return Err(IgnoredReason::AlreadyShown);
        }
        self.phase = ToolbarPhase::ShownNoPanel;
        store.write(self.scope.delete(&self.cookie_name));
        debug!(target: "fldt_core::toolbar", "expanded toolbar");
        Ok(Transition {
            listener: self.set_escape_bound(true),
            ..Transition::default()
        })
    }

    /// Show the sub-window. Only possible while the toolbar is shown.
    pub fn open_sub_window(&mut self) -> Result<(), IgnoredReason> {
        if self.visibility() == ToolbarVisibility::Collapsed {
            return Err(IgnoredReason::ToolbarCollapsed);
        }
        self.sub_window = SubWindowState::Open;
        Ok(())
    }

    /// Hide the sub-window only; panels and toolbar are untouched.
    pub fn close_sub_window(&mut self) -> Result<(), IgnoredReason> {
        if self.sub_window == SubWindowState::Closed {
            return Err(IgnoredReason::SubWindowClosed);
        }
        self.sub_window = SubWindowState::Closed;
        Ok(())
    }

    /// Undo exactly one layer: sub-window, then open panel, then the toolbar.
    pub fn close_cascade<S: PersistenceStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<(CloseLayer, Transition), IgnoredReason> {
        if self.sub_window == SubWindowState::Open {
            self.sub_window = SubWindowState::Closed;
            return Ok((
                CloseLayer::SubWindow,
                Transition {
                    closed_sub_window: true,
                    ..Transition::default()
                },
            ));
        }
        if let Some(panel) = self.open_panel().cloned() {
            self.phase = ToolbarPhase::ShownNoPanel;
            return Ok((
                CloseLayer::Panel(panel.clone()),
                Transition {
                    closed_panel: Some(panel),
                    ..Transition::default()
                },
            ));
        }
        match self.collapse(store) {
            Ok(transition) => Ok((CloseLayer::Toolbar, transition)),
            Err(IgnoredReason::AlreadyCollapsed) => Err(IgnoredReason::NothingToClose),
            Err(reason) => Err(reason),
        }
    }

    fn set_escape_bound(&mut self, bound: bool) -> Option<ListenerChange> {
        if self.escape_bound == bound {
            return None;
        }
        self.escape_bound = bound;
        Some(if bound {
            ListenerChange::BindEscape
        } else {
            ListenerChange::UnbindEscape
        })
    }
}
