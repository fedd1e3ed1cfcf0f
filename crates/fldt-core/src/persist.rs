#![forbid(unsafe_code)]

//! Persistence store abstraction behind the toolbar's cookie reads/writes.
//!
//! The state machine only ever talks to [`PersistenceStore`]. The web host
//! backs it with `document.cookie`; tests and native hosts use
//! [`MemoryStore`]. Absence is a normal state: reads never fail.

use std::collections::BTreeMap;

/// Milliseconds per day, used when hosts turn an [`Expiry`] into a date.
pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Record lifetime relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Expires this many days from now.
    Days(u32),
    /// Already expired; writing it deletes the record.
    Expired,
}

impl Expiry {
    #[must_use]
    pub const fn is_expired(self) -> bool {
        matches!(self, Self::Expired)
    }

    /// Offset from the current time, in milliseconds. Expired records are
    /// dated one day in the past.
    #[must_use]
    pub const fn offset_ms(self) -> i64 {
        match self {
            Self::Days(days) => days as i64 * MS_PER_DAY,
            Self::Expired => -MS_PER_DAY,
        }
    }
}

/// One write against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieWrite {
    pub name: String,
    pub value: Option<String>,
    pub path: String,
    pub expiry: Expiry,
}

impl CookieWrite {
    /// True when this write removes the record instead of storing a value.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.expiry.is_expired() || self.value.as_deref().is_none_or(str::is_empty)
    }
}

/// Path and lifetime shared by the toolbar's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieScope {
    path: String,
    expiry_days: u32,
}

impl CookieScope {
    #[must_use]
    pub fn new(path: impl Into<String>, expiry_days: u32) -> Self {
        Self {
            path: path.into(),
            expiry_days,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn expiry_days(&self) -> u32 {
        self.expiry_days
    }

    /// Store `value` under `name` with the scope's finite lifetime.
    #[must_use]
    pub fn set(&self, name: &str, value: impl Into<String>) -> CookieWrite {
        CookieWrite {
            name: name.to_owned(),
            value: Some(value.into()),
            path: self.path.clone(),
            expiry: Expiry::Days(self.expiry_days),
        }
    }

    /// Delete `name` by writing an already-expired, empty record.
    #[must_use]
    pub fn delete(&self, name: &str) -> CookieWrite {
        CookieWrite {
            name: name.to_owned(),
            value: None,
            path: self.path.clone(),
            expiry: Expiry::Expired,
        }
    }
}

/// Synchronous key/value persistence scoped by path.
pub trait PersistenceStore {
    /// Current value of `name`, if any.
    fn read(&self, name: &str) -> Option<String>;

    /// Apply one write. Deleting an absent record is not an error.
    fn write(&mut self, write: CookieWrite);
}

impl<S: PersistenceStore + ?Sized> PersistenceStore for Box<S> {
    fn read(&self, name: &str) -> Option<String> {
        (**self).read(name)
    }

    fn write(&mut self, write: CookieWrite) {
        (**self).write(write);
    }
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub path: String,
    pub expiry_days: u32,
}

/// In-memory jar. Keeps every write for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, CookieRecord>,
    history: Vec<CookieWrite>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record as if a previous page load had written it.
    #[must_use]
    pub fn with_value(mut self, name: &str, value: &str) -> Self {
        self.records.insert(
            name.to_owned(),
            CookieRecord {
                name: name.to_owned(),
                value: value.to_owned(),
                path: "/".to_owned(),
                expiry_days: 1,
            },
        );
        self
    }

    #[must_use]
    pub fn record(&self, name: &str) -> Option<&CookieRecord> {
        self.records.get(name)
    }

    /// Every write applied so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[CookieWrite] {
        &self.history
    }

    /// Most recent write for `name`.
    #[must_use]
    pub fn last_write(&self, name: &str) -> Option<&CookieWrite> {
        self.history.iter().rev().find(|write| write.name == name)
    }
}

impl PersistenceStore for MemoryStore {
    fn read(&self, name: &str) -> Option<String> {
        self.records.get(name).map(|record| record.value.clone())
    }

    fn write(&mut self, write: CookieWrite) {
        if write.is_delete() {
            self.records.remove(&write.name);
        } else if let Expiry::Days(expiry_days) = write.expiry {
            self.records.insert(
                write.name.clone(),
                CookieRecord {
                    name: write.name.clone(),
                    value: write.value.clone().unwrap_or_default(),
                    path: write.path.clone(),
                    expiry_days,
                },
            );
        }
        self.history.push(write);
    }
}

/// Look up the raw (still encoded) value of `name` in a `document.cookie`
/// style header: `a=1; b=2`. The first matching pair wins.
#[must_use]
pub fn parse_cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    if name.is_empty() {
        return None;
    }
    header.split(';').map(str::trim).find_map(|pair| {
        pair.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
    })
}

/// Build a cookie assignment string for `document.cookie`.
///
/// `encoded_value` must already be URI-component encoded; `expires` is a
/// pre-rendered UTC date.
#[must_use]
pub fn format_cookie(name: &str, encoded_value: &str, expires: Option<&str>, path: &str) -> String {
    let mut cookie = format!("{name}={encoded_value}");
    if let Some(expires) = expires {
        cookie.push_str("; expires=");
        cookie.push_str(expires);
    }
    if !path.is_empty() {
        cookie.push_str("; path=");
        cookie.push_str(path);
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn memory_store_reads_absent_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.read("fldt"), None);
    }

    #[test]
    fn set_then_delete_removes_record() {
        let scope = CookieScope::new("/", 10);
        let mut store = MemoryStore::new();
        store.write(scope.set("fldt", "hide"));
        assert_eq!(store.read("fldt").as_deref(), Some("hide"));
        assert_eq!(store.record("fldt").map(|r| r.expiry_days), Some(10));

        store.write(scope.delete("fldt"));
        assert_eq!(store.read("fldt"), None);
        assert_eq!(store.history().len(), 2);
        assert!(store.last_write("fldt").unwrap().expiry.is_expired());
    }

    #[test]
    fn empty_value_counts_as_delete() {
        let mut store = MemoryStore::new().with_value("fldt_active", "a");
        store.write(CookieWrite {
            name: "fldt_active".into(),
            value: Some(String::new()),
            path: "/".into(),
            expiry: Expiry::Days(10),
        });
        assert_eq!(store.read("fldt_active"), None);
    }

    #[test]
    fn expiry_offsets() {
        assert_eq!(Expiry::Days(10).offset_ms(), 10 * MS_PER_DAY);
        assert!(Expiry::Expired.offset_ms() < 0);
    }

    #[test]
    fn parse_cookie_value_matches_exact_name() {
        let header = "fldt_active=flDebugSQLPanel%3BflDebugTimerPanel; fldt=hide";
        assert_eq!(parse_cookie_value(header, "fldt"), Some("hide"));
        assert_eq!(
            parse_cookie_value(header, "fldt_active"),
            Some("flDebugSQLPanel%3BflDebugTimerPanel")
        );
        assert_eq!(parse_cookie_value(header, "fld"), None);
        assert_eq!(parse_cookie_value("", "fldt"), None);
        assert_eq!(parse_cookie_value("fldt=", "fldt"), Some(""));
    }

    #[test]
    fn format_cookie_orders_attributes() {
        assert_eq!(
            format_cookie("fldt", "hide", Some("Thu, 01 Jan 1970 00:00:00 GMT"), "/"),
            "fldt=hide; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/"
        );
        assert_eq!(format_cookie("a", "b", None, ""), "a=b");
    }
}
