#![forbid(unsafe_code)]

//! `fldt-core` holds the interaction state of the in-page debug toolbar.
//!
//! Design goals:
//! - **Explicit state**: toolbar visibility, the open panel and the sub-window
//!   live in [`toolbar::ToolbarMachine`]; the DOM is only ever a projection
//!   ([`view::ToolbarView`]).
//! - **Host-driven effects**: cookie writes go through a
//!   [`persist::PersistenceStore`], fetches and listener changes are returned
//!   to the host as data inside a [`dispatch::Dispatch`].
//! - **No browser dependency**: everything here runs and tests natively. The
//!   `fldt-web` crate wires it to a real page.

pub mod active;
pub mod config;
pub mod disclosure;
pub mod dispatch;
pub mod error;
pub mod panel;
pub mod persist;
pub mod remote;
pub mod toolbar;
pub mod view;

pub use active::{ActiveMark, ActiveSet, ActiveSetTracker};
pub use config::{DomNames, ToolbarConfig};
pub use dispatch::{
    Command, ContentUpdate, Dispatch, DispatchOutcome, Dispatcher, Gesture, IgnoredReason,
};
pub use error::{FetchError, ToolbarError};
pub use panel::{PanelEntry, PanelId, PanelRegistry};
pub use persist::{CookieScope, CookieWrite, MemoryStore, PersistenceStore};
pub use remote::{FetchMode, RemoteRequest, RequestToken};
pub use toolbar::{CloseLayer, ListenerChange, SubWindowState, ToolbarMachine, ToolbarVisibility};
pub use view::{RowParity, ToolbarView};
