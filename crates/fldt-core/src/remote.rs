#![forbid(unsafe_code)]

//! Remote content requests and stale-response filtering.
//!
//! Every request gets a [`RequestToken`]. Only the most recent sub-window
//! request may inject content; a response for any older token is dropped,
//! so a slow earlier fetch can never overwrite newer content. The same rule
//! applies separately to whole-page replacement.

use std::fmt;

use tracing::{debug, warn};

use crate::error::FetchError;

/// Identifies one issued request. Strictly increasing per loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where fetched HTML ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Injected into the floating sub-window.
    SubWindow,
    /// Replaces the whole document.
    ReplacePage,
}

impl FetchMode {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SubWindow => "sub_window",
            Self::ReplacePage => "replace_page",
        }
    }
}

/// A fetch the host must perform, reporting back with the same token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    pub token: RequestToken,
    pub url: String,
    pub mode: FetchMode,
}

/// What to do with a finished fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCompletion {
    /// Fill the sub-window with this fragment.
    Inject(String),
    /// Replace the document with this body.
    ReplaceDocument(String),
    /// Fetch failed; the sub-window (if any) stays open and empty.
    Failed(FetchError),
    /// A newer request superseded this one; ignore it.
    Stale,
}

/// Issues tokens and decides which completions are still wanted.
#[derive(Debug, Clone)]
pub struct RemoteLoader {
    next_token: u64,
    sub_window: Option<RequestToken>,
    replace_page: Option<RequestToken>,
}

impl Default for RemoteLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteLoader {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_token: 1,
            sub_window: None,
            replace_page: None,
        }
    }

    /// Issue a request, superseding any in-flight request of the same mode.
    pub fn begin(&mut self, url: impl Into<String>, mode: FetchMode) -> RemoteRequest {
        let token = RequestToken(self.next_token);
        self.next_token = self.next_token.saturating_add(1);
        let superseded = match mode {
            FetchMode::SubWindow => self.sub_window.replace(token),
            FetchMode::ReplacePage => self.replace_page.replace(token),
        };
        let url = url.into();
        debug!(
            target: "fldt_core::remote",
            token = token.get(),
            mode = mode.label(),
            url = %url,
            superseded = superseded.map(RequestToken::get),
            "issued remote request"
        );
        RemoteRequest { token, url, mode }
    }

    /// Token of the sub-window request still awaiting a response.
    #[must_use]
    pub const fn in_flight(&self) -> Option<RequestToken> {
        self.sub_window
    }

    /// Forget the in-flight sub-window request; its response becomes stale.
    pub fn invalidate_sub_window(&mut self) {
        if let Some(token) = self.sub_window.take() {
            debug!(
                target: "fldt_core::remote",
                token = token.get(),
                "sub-window request abandoned"
            );
        }
    }

    /// Resolve a finished fetch against the current tokens.
    pub fn complete(
        &mut self,
        token: RequestToken,
        result: Result<String, FetchError>,
    ) -> RemoteCompletion {
        let mode = if self.sub_window == Some(token) {
            self.sub_window = None;
            FetchMode::SubWindow
        } else if self.replace_page == Some(token) {
            self.replace_page = None;
            FetchMode::ReplacePage
        } else {
            debug!(
                target: "fldt_core::remote",
                token = token.get(),
                "dropped stale remote response"
            );
            return RemoteCompletion::Stale;
        };
        match (mode, result) {
            (FetchMode::SubWindow, Ok(html)) => RemoteCompletion::Inject(html),
            (FetchMode::ReplacePage, Ok(html)) => RemoteCompletion::ReplaceDocument(html),
            (_, Err(err)) => {
                warn!(
                    target: "fldt_core::remote",
                    token = token.get(),
                    mode = mode.label(),
                    error = %err,
                    "remote fetch failed"
                );
                RemoteCompletion::Failed(err)
            }
        }
    }
}
