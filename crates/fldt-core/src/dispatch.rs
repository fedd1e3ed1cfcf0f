#![forbid(unsafe_code)]

//! Input dispatcher: resolves user gestures to commands and runs them
//! against the toolbar state.
//!
//! Every gesture produces one [`Dispatch`] describing what changed and which
//! host effects to perform (listener changes, fetches, content updates).
//! Each dispatch is also recorded as a structured log line that hosts drain
//! with [`Dispatcher::take_logs`].

use std::fmt;

use tracing::trace;

use crate::active::{ActiveMark, ActiveSetTracker};
use crate::config::ToolbarConfig;
use crate::disclosure::{DisclosureState, Disclosures};
use crate::error::FetchError;
use crate::panel::{PanelId, PanelRegistry};
use crate::persist::PersistenceStore;
use crate::remote::{FetchMode, RemoteCompletion, RemoteLoader, RemoteRequest, RequestToken};
use crate::toolbar::{CloseLayer, ListenerChange, SubWindowState, ToolbarMachine};
use crate::view::ToolbarView;

/// `KeyboardEvent.key` of the Escape key.
pub const ESCAPE_KEY: &str = "Escape";
/// Legacy `KeyboardEvent.keyCode` of the Escape key.
pub const ESCAPE_KEY_CODE: u32 = 27;
/// Dispatch log entries kept before the oldest are dropped.
pub const MAX_DISPATCH_LOGS: usize = 256;

/// A user gesture, already resolved to its target by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    /// Nav link of a panel. `None` when the link names no panel.
    PanelLinkClick { panel: Option<PanelId> },
    /// Active-mark switch of a panel.
    SwitchClick { panel: PanelId },
    CloseClick,
    HideClick,
    ShowClick,
    /// Link flagged as a remote call; `href` is its link target.
    RemoteCallClick { href: String },
    /// "Back" control inside a fetched fragment.
    BackClick,
    KeyDown { key: String, key_code: u32 },
    /// A sortable table finished re-sorting its rows.
    TableSortEnd,
    DisclosureClick { key: String },
}

impl Gesture {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PanelLinkClick { .. } => "panel_link_click",
            Self::SwitchClick { .. } => "switch_click",
            Self::CloseClick => "close_click",
            Self::HideClick => "hide_click",
            Self::ShowClick => "show_click",
            Self::RemoteCallClick { .. } => "remote_call_click",
            Self::BackClick => "back_click",
            Self::KeyDown { .. } => "key_down",
            Self::TableSortEnd => "table_sort_end",
            Self::DisclosureClick { .. } => "disclosure_click",
        }
    }

    /// Whether the browser's default action (link navigation) is suppressed.
    #[must_use]
    pub const fn suppresses_default(&self) -> bool {
        !matches!(
            self,
            Self::SwitchClick { .. } | Self::KeyDown { .. } | Self::TableSortEnd
        )
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        matches!(self, Self::KeyDown { key, key_code } if key == ESCAPE_KEY || *key_code == ESCAPE_KEY_CODE)
    }
}

/// A named state-machine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TogglePanel(PanelId),
    ToggleActive(PanelId),
    /// The close cascade.
    Close,
    Collapse,
    Expand,
    OpenRemote(String),
    CloseSubWindow,
    ReplacePage(String),
    Restripe,
    ToggleDisclosure(String),
}

impl Command {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::TogglePanel(_) => "toggle_panel",
            Self::ToggleActive(_) => "toggle_active",
            Self::Close => "close",
            Self::Collapse => "collapse",
            Self::Expand => "expand",
            Self::OpenRemote(_) => "open_remote",
            Self::CloseSubWindow => "close_sub_window",
            Self::ReplacePage(_) => "replace_page",
            Self::Restripe => "restripe",
            Self::ToggleDisclosure(_) => "toggle_disclosure",
        }
    }
}

/// Deterministic reason why a gesture or command changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    NoPanelTarget,
    UnknownPanel,
    PanelWithoutContent,
    SwitchNotEnabled,
    ToolbarCollapsed,
    AlreadyShown,
    AlreadyCollapsed,
    NothingToClose,
    SubWindowClosed,
    NotEscapeKey,
    EscapeNotBound,
    EmptyUrl,
    StaleResponse,
}

impl IgnoredReason {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoPanelTarget => "no_panel_target",
            Self::UnknownPanel => "unknown_panel",
            Self::PanelWithoutContent => "panel_without_content",
            Self::SwitchNotEnabled => "switch_not_enabled",
            Self::ToolbarCollapsed => "toolbar_collapsed",
            Self::AlreadyShown => "already_shown",
            Self::AlreadyCollapsed => "already_collapsed",
            Self::NothingToClose => "nothing_to_close",
            Self::SubWindowClosed => "sub_window_closed",
            Self::NotEscapeKey => "not_escape_key",
            Self::EscapeNotBound => "escape_not_bound",
            Self::EmptyUrl => "empty_url",
            Self::StaleResponse => "stale_response",
        }
    }
}

/// Sub-window or document content change the host must write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentUpdate {
    /// Empty the sub-window (pending state).
    Clear,
    Inject(String),
    ReplaceDocument(String),
}

/// Outcome category for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    Ignored(IgnoredReason),
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("outcome=applied"),
            Self::Ignored(reason) => write!(f, "outcome=ignored reason={}", reason.label()),
        }
    }
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub command: Option<Command>,
    pub outcome: DispatchOutcome,
    pub prevent_default: bool,
    pub listener: Option<ListenerChange>,
    pub close_layer: Option<CloseLayer>,
    pub active_mark: Option<ActiveMark>,
    pub fetch: Option<RemoteRequest>,
    pub content: Option<ContentUpdate>,
    pub disclosure: Option<DisclosureState>,
    pub restripe: bool,
}

impl Dispatch {
    fn new(command: Option<Command>, prevent_default: bool) -> Self {
        Self {
            command,
            outcome: DispatchOutcome::Applied,
            prevent_default,
            listener: None,
            close_layer: None,
            active_mark: None,
            fetch: None,
            content: None,
            disclosure: None,
            restripe: false,
        }
    }

    #[must_use]
    pub const fn applied(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Applied)
    }
}

/// Structured record of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchLogEntry {
    pub seq: u64,
    pub source: &'static str,
    pub command: Option<&'static str>,
    pub outcome: DispatchOutcome,
    pub layer: Option<&'static str>,
}

impl fmt::Display for DispatchLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dispatch seq={} source={}", self.seq, self.source)?;
        if let Some(command) = self.command {
            write!(f, " command={command}")?;
        }
        write!(f, " {}", self.outcome)?;
        if let Some(layer) = self.layer {
            write!(f, " layer={layer}")?;
        }
        Ok(())
    }
}

/// Owns the whole toolbar state and its persistence store.
#[derive(Debug)]
pub struct Dispatcher<S: PersistenceStore> {
    config: ToolbarConfig,
    registry: PanelRegistry,
    store: S,
    machine: ToolbarMachine,
    active: ActiveSetTracker,
    loader: RemoteLoader,
    disclosures: Disclosures,
    logs: Vec<DispatchLogEntry>,
    next_seq: u64,
}

impl<S: PersistenceStore> Dispatcher<S> {
    /// Restore persisted state for a freshly rendered page.
    ///
    /// Returns the dispatcher and the load dispatch, whose `listener` tells
    /// the host whether to bind the Escape key.
    pub fn load(config: ToolbarConfig, registry: PanelRegistry, mut store: S) -> (Self, Dispatch) {
        let mut active =
            ActiveSetTracker::load(&store, config.active_cookie_name.clone(), config.scope());
        active.adopt_rendered(
            registry
                .iter()
                .filter(|entry| entry.user_enable && entry.rendered_active)
                .map(|entry| entry.id.clone()),
        );
        let mut machine = ToolbarMachine::new(&config);
        let transition = machine.load(&mut store);
        let mut dispatcher = Self {
            config,
            registry,
            store,
            machine,
            active,
            loader: RemoteLoader::new(),
            disclosures: Disclosures::default(),
            logs: Vec::new(),
            next_seq: 1,
        };
        let mut dispatch = Dispatch::new(None, false);
        dispatch.listener = transition.listener;
        dispatcher.record("load", &dispatch);
        (dispatcher, dispatch)
    }

    /// Handle one user gesture.
    pub fn dispatch(&mut self, gesture: Gesture) -> Dispatch {
        let source = gesture.label();
        let prevent_default = gesture.suppresses_default();
        let dispatch = match self.resolve(gesture) {
            Ok(command) => self.run(command, prevent_default),
            Err(reason) => {
                let mut dispatch = Dispatch::new(None, prevent_default);
                dispatch.outcome = DispatchOutcome::Ignored(reason);
                dispatch
            }
        };
        self.record(source, &dispatch);
        dispatch
    }

    /// Run a command issued directly by the host API rather than a gesture.
    pub fn execute(&mut self, command: Command) -> Dispatch {
        let dispatch = self.run(command, false);
        self.record("api", &dispatch);
        dispatch
    }

    /// Feed back the result of a fetch issued by an earlier dispatch.
    pub fn complete_fetch(
        &mut self,
        token: RequestToken,
        result: Result<String, FetchError>,
    ) -> Dispatch {
        let mut dispatch = Dispatch::new(None, false);
        match self.loader.complete(token, result) {
            RemoteCompletion::Inject(html) => {
                if self.machine.sub_window() == SubWindowState::Open {
                    dispatch.content = Some(ContentUpdate::Inject(html));
                } else {
                    dispatch.outcome = DispatchOutcome::Ignored(IgnoredReason::SubWindowClosed);
                }
            }
            RemoteCompletion::ReplaceDocument(html) => {
                dispatch.content = Some(ContentUpdate::ReplaceDocument(html));
            }
            RemoteCompletion::Failed(_) => {}
            RemoteCompletion::Stale => {
                dispatch.outcome = DispatchOutcome::Ignored(IgnoredReason::StaleResponse);
            }
        }
        self.record("fetch", &dispatch);
        dispatch
    }

    /// Current DOM projection.
    #[must_use]
    pub fn view(&self) -> ToolbarView {
        ToolbarView::project(&self.machine, &self.registry, &self.active)
    }

    /// Drain the dispatch log as formatted lines.
    pub fn take_logs(&mut self) -> Vec<String> {
        self.logs.drain(..).map(|entry| entry.to_string()).collect()
    }

    #[must_use]
    pub fn config(&self) -> &ToolbarConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &PanelRegistry {
        &self.registry
    }

    #[must_use]
    pub fn machine(&self) -> &ToolbarMachine {
        &self.machine
    }

    #[must_use]
    pub fn active(&self) -> &ActiveSetTracker {
        &self.active
    }

    #[must_use]
    pub fn loader(&self) -> &RemoteLoader {
        &self.loader
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn resolve(&self, gesture: Gesture) -> Result<Command, IgnoredReason> {
        if let Gesture::KeyDown { .. } = &gesture {
            if !gesture.is_escape() {
                return Err(IgnoredReason::NotEscapeKey);
            }
            if !self.machine.escape_bound() {
                return Err(IgnoredReason::EscapeNotBound);
            }
            return Ok(Command::Close);
        }
        match gesture {
            Gesture::PanelLinkClick { panel } => panel
                .map(Command::TogglePanel)
                .ok_or(IgnoredReason::NoPanelTarget),
            Gesture::SwitchClick { panel } => Ok(Command::ToggleActive(panel)),
            Gesture::CloseClick => Ok(Command::Close),
            Gesture::HideClick => Ok(Command::Collapse),
            Gesture::ShowClick => Ok(Command::Expand),
            Gesture::RemoteCallClick { href } => Ok(Command::OpenRemote(href)),
            Gesture::BackClick => Ok(Command::CloseSubWindow),
            Gesture::TableSortEnd => Ok(Command::Restripe),
            Gesture::DisclosureClick { key } => Ok(Command::ToggleDisclosure(key)),
            Gesture::KeyDown { .. } => Err(IgnoredReason::NotEscapeKey),
        }
    }

    fn run(&mut self, command: Command, prevent_default: bool) -> Dispatch {
        let mut dispatch = Dispatch::new(Some(command.clone()), prevent_default);
        if let Err(reason) = self.apply(command, &mut dispatch) {
            dispatch.outcome = DispatchOutcome::Ignored(reason);
        }
        dispatch
    }

    fn apply(&mut self, command: Command, dispatch: &mut Dispatch) -> Result<(), IgnoredReason> {
        match command {
            Command::TogglePanel(panel) => {
                self.machine.toggle_panel(&self.registry, panel.as_str())?;
            }
            Command::ToggleActive(panel) => {
                let entry = self
                    .registry
                    .get(panel.as_str())
                    .ok_or(IgnoredReason::UnknownPanel)?;
                if !entry.user_enable {
                    return Err(IgnoredReason::SwitchNotEnabled);
                }
                dispatch.active_mark = Some(self.active.toggle(&panel, &mut self.store));
            }
            Command::Close => {
                let (layer, transition) = self.machine.close_cascade(&mut self.store)?;
                if transition.closed_sub_window {
                    self.loader.invalidate_sub_window();
                }
                dispatch.listener = transition.listener;
                dispatch.close_layer = Some(layer);
            }
            Command::Collapse => {
                let transition = self.machine.collapse(&mut self.store)?;
                if transition.closed_sub_window {
                    self.loader.invalidate_sub_window();
                }
                dispatch.listener = transition.listener;
            }
            Command::Expand => {
                let transition = self.machine.expand(&mut self.store)?;
                dispatch.listener = transition.listener;
            }
            Command::OpenRemote(url) => {
                let url = non_empty_url(url)?;
                self.machine.open_sub_window()?;
                dispatch.fetch = Some(self.loader.begin(url, FetchMode::SubWindow));
                dispatch.content = Some(ContentUpdate::Clear);
            }
            Command::CloseSubWindow => {
                self.machine.close_sub_window()?;
                self.loader.invalidate_sub_window();
            }
            Command::ReplacePage(url) => {
                let url = non_empty_url(url)?;
                dispatch.fetch = Some(self.loader.begin(url, FetchMode::ReplacePage));
            }
            Command::Restripe => dispatch.restripe = true,
            Command::ToggleDisclosure(key) => {
                dispatch.disclosure = Some(self.disclosures.toggle(&key));
            }
        }
        Ok(())
    }

    fn record(&mut self, source: &'static str, dispatch: &Dispatch) {
        let entry = DispatchLogEntry {
            seq: self.next_seq,
            source,
            command: dispatch.command.as_ref().map(Command::label),
            outcome: dispatch.outcome,
            layer: dispatch.close_layer.as_ref().map(CloseLayer::label),
        };
        self.next_seq = self.next_seq.saturating_add(1);
        trace!(target: "fldt_core::dispatch", "{entry}");
        if self.logs.len() >= MAX_DISPATCH_LOGS {
            let overflow = self.logs.len() - MAX_DISPATCH_LOGS + 1;
            self.logs.drain(..overflow);
        }
        self.logs.push(entry);
    }
}

fn non_empty_url(url: String) -> Result<String, IgnoredReason> {
    if url.trim().is_empty() {
        return Err(IgnoredReason::EmptyUrl);
    }
    Ok(url)
}
