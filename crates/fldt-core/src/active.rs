#![forbid(unsafe_code)]

//! Sticky per-panel "active" marks, persisted across page loads.
//!
//! Membership is independent of which panel is open. The set is read from
//! the store once at load and afterwards only written. The server may also
//! render a switch as active on its own (a profiler enabled by config); such
//! marks are adopted once at load, shown, and cleared by a flip, but never
//! persisted.

use tracing::debug;

use crate::panel::PanelId;
use crate::persist::{CookieScope, PersistenceStore};

/// Field delimiter of the persisted encoding.
pub const ACTIVE_DELIMITER: &str = ";";

/// Set of actively-marked panels. Equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    members: Vec<PanelId>,
}

impl ActiveSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a persisted value. Absent, empty and malformed input all
    /// degrade to the members that can be recovered (possibly none).
    #[must_use]
    pub fn decode(raw: Option<&str>) -> Self {
        let mut set = Self::new();
        for field in raw.unwrap_or_default().split(ACTIVE_DELIMITER) {
            let field = field.trim();
            if !field.is_empty() {
                set.insert(PanelId::new(field));
            }
        }
        set
    }

    /// Encode for persistence; `None` for the empty set, which must be
    /// deleted rather than stored.
    #[must_use]
    pub fn encode(&self) -> Option<String> {
        if self.members.is_empty() {
            return None;
        }
        let fields: Vec<&str> = self.members.iter().map(PanelId::as_str).collect();
        Some(fields.join(ACTIVE_DELIMITER))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|member| member.as_str() == id)
    }

    /// Add `id`; returns false when already present.
    pub fn insert(&mut self, id: PanelId) -> bool {
        if self.contains(id.as_str()) {
            return false;
        }
        self.members.push(id);
        true
    }

    /// Remove `id` by filtering; returns false when it was not a member.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|member| member.as_str() != id);
        self.members.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PanelId> {
        self.members.iter()
    }
}

impl PartialEq for ActiveSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.members.iter().all(|id| other.contains(id.as_str()))
    }
}

impl Eq for ActiveSet {}

impl FromIterator<PanelId> for ActiveSet {
    fn from_iter<T: IntoIterator<Item = PanelId>>(iter: T) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// Visual state of one active-mark switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveMark {
    Active,
    Inactive,
}

impl ActiveMark {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Owns the [`ActiveSet`] and keeps the store in sync with it.
#[derive(Debug, Clone)]
pub struct ActiveSetTracker {
    set: ActiveSet,
    rendered: ActiveSet,
    cookie_name: String,
    scope: CookieScope,
}

impl ActiveSetTracker {
    /// Restore the set persisted by a previous page load.
    pub fn load<S: PersistenceStore + ?Sized>(
        store: &S,
        cookie_name: impl Into<String>,
        scope: CookieScope,
    ) -> Self {
        let cookie_name = cookie_name.into();
        let raw = store.read(&cookie_name);
        let set = ActiveSet::decode(raw.as_deref());
        debug!(
            target: "fldt_core::active",
            cookie = %cookie_name,
            restored = set.len(),
            "restored active panel marks"
        );
        Self {
            set,
            rendered: ActiveSet::new(),
            cookie_name,
            scope,
        }
    }

    /// Adopt marks the page was rendered with. Ids already persisted are
    /// left to the persisted set.
    pub fn adopt_rendered(&mut self, ids: impl IntoIterator<Item = PanelId>) {
        for id in ids {
            if self.set.contains(id.as_str()) {
                continue;
            }
            debug!(
                target: "fldt_core::active",
                panel = %id,
                "adopted server-rendered active mark"
            );
            self.rendered.insert(id);
        }
    }

    /// The persisted set.
    #[must_use]
    pub fn set(&self) -> &ActiveSet {
        &self.set
    }

    /// Every panel currently shown as active, persisted or rendered.
    #[must_use]
    pub fn marked(&self) -> ActiveSet {
        self.set.iter().chain(self.rendered.iter()).cloned().collect()
    }

    #[must_use]
    pub fn mark(&self, id: &str) -> ActiveMark {
        if self.set.contains(id) || self.rendered.contains(id) {
            ActiveMark::Active
        } else {
            ActiveMark::Inactive
        }
    }

    /// Flip `id`'s mark and persist the whole set. The flip starts from the
    /// shown mark, so a rendered-only mark turns off.
    pub fn toggle<S: PersistenceStore + ?Sized>(&mut self, id: &PanelId, store: &mut S) -> ActiveMark {
        let rendered = self.rendered.remove(id.as_str());
        let mark = if self.set.remove(id.as_str()) || rendered {
            ActiveMark::Inactive
        } else {
            self.set.insert(id.clone());
            ActiveMark::Active
        };
        self.persist(store);
        debug!(
            target: "fldt_core::active",
            panel = %id,
            active = mark.is_active(),
            members = self.set.len(),
            "toggled active mark"
        );
        mark
    }

    fn persist<S: PersistenceStore + ?Sized>(&self, store: &mut S) {
        let write = match self.set.encode() {
            Some(encoded) => self.scope.set(&self.cookie_name, encoded),
            None => self.scope.delete(&self.cookie_name),
        };
        store.write(write);
    }
}
