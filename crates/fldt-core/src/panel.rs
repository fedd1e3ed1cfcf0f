#![forbid(unsafe_code)]

//! Panel identifiers and the registry of panels rendered in the page.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Opaque identifier of one diagnostic panel, supplied by the server markup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(String);

impl PanelId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Element id of this panel's content region.
    #[must_use]
    pub fn content_region_id(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.0)
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PanelId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for PanelId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for PanelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PanelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One rendered panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelEntry {
    pub id: PanelId,
    /// Has a content region that its nav link opens.
    pub has_content: bool,
    /// Carries an active-mark switch.
    pub user_enable: bool,
    /// The server rendered the switch as active.
    pub rendered_active: bool,
}

impl PanelEntry {
    /// A panel with content and an active-mark switch.
    #[must_use]
    pub fn new(id: impl Into<PanelId>) -> Self {
        Self {
            id: id.into(),
            has_content: true,
            user_enable: true,
            rendered_active: false,
        }
    }

    #[must_use]
    pub fn with_content(mut self, has_content: bool) -> Self {
        self.has_content = has_content;
        self
    }

    #[must_use]
    pub fn with_switch(mut self, user_enable: bool) -> Self {
        self.user_enable = user_enable;
        self
    }

    #[must_use]
    pub fn with_rendered_active(mut self, rendered_active: bool) -> Self {
        self.rendered_active = rendered_active;
        self
    }
}

/// Fixed set of panels for one page render, in nav order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelRegistry {
    entries: Vec<PanelEntry>,
}

impl PanelRegistry {
    /// Build a registry. Duplicate ids keep their first entry.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = PanelEntry>) -> Self {
        let mut unique: Vec<PanelEntry> = Vec::new();
        for entry in entries {
            if unique.iter().any(|seen| seen.id == entry.id) {
                debug!(
                    target: "fldt_core::panel",
                    panel = %entry.id,
                    "duplicate panel id ignored"
                );
                continue;
            }
            unique.push(entry);
        }
        Self { entries: unique }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PanelEntry> {
        self.entries.iter().find(|entry| entry.id.as_str() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PanelEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
