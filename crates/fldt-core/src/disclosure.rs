#![forbid(unsafe_code)]

//! Row-level show/hide toggles inside panels (template context rows, SQL
//! stack traces). Everything starts collapsed.

use std::collections::BTreeSet;

/// Arrow shown next to a collapsed row.
pub const ARROW_COLLAPSED: &str = "\u{25b6}";
/// Arrow shown next to an expanded row.
pub const ARROW_EXPANDED: &str = "\u{25bc}";

/// State of one disclosure after a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureState {
    pub key: String,
    pub expanded: bool,
}

impl DisclosureState {
    #[must_use]
    pub const fn arrow(&self) -> &'static str {
        if self.expanded {
            ARROW_EXPANDED
        } else {
            ARROW_COLLAPSED
        }
    }
}

/// Keys of the currently expanded disclosures.
#[derive(Debug, Clone, Default)]
pub struct Disclosures {
    expanded: BTreeSet<String>,
}

impl Disclosures {
    pub fn toggle(&mut self, key: &str) -> DisclosureState {
        let expanded = if self.expanded.remove(key) {
            false
        } else {
            self.expanded.insert(key.to_owned());
            true
        };
        DisclosureState {
            key: key.to_owned(),
            expanded,
        }
    }
}
