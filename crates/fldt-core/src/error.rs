#![forbid(unsafe_code)]

//! Error types shared by the toolbar core and its web host.
//!
//! None of these ever reach the end user: the host logs them and the widget
//! degrades to "nothing visibly changed".

use std::fmt;

/// Failure of one remote fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response (offline, CORS, aborted, ...).
    Network(String),
    /// The server answered with a non-2xx status.
    Status(u16),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Status(status) => write!(f, "unexpected http status {status}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Toolbar error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarError {
    /// Host supplied a configuration that cannot drive the toolbar.
    InvalidConfig(String),
    /// A rendered element the host expected is absent.
    MissingElement(String),
}

impl fmt::Display for ToolbarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid toolbar config: {msg}"),
            Self::MissingElement(selector) => write!(f, "missing element: {selector}"),
        }
    }
}

impl std::error::Error for ToolbarError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        assert_eq!(
            FetchError::Status(502).to_string(),
            "unexpected http status 502"
        );
        assert_eq!(
            ToolbarError::MissingElement("#flDebug".into()).to_string(),
            "missing element: #flDebug"
        );
    }
}
