#![forbid(unsafe_code)]

//! Platform-independent pieces of the web host.
//!
//! The wasm module reads raw facts out of the DOM ([`ScannedPanel`],
//! [`ClickProbe`]) and hands them to the functions here, which turn them into
//! core types. No JS/WASM types here, so all of it runs in native tests.

use fldt_core::{
    Dispatcher, Gesture, PanelEntry, PanelId, PanelRegistry, PersistenceStore, SubWindowState,
    ToolbarConfig, ToolbarError, ToolbarVisibility,
};
use serde::Serialize;

/// What the host found for one `li` of the panel list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedPanel {
    /// The `li` element's id.
    pub id: String,
    /// Class attribute of the nav link, if the `li` has one.
    pub link_class: Option<String>,
    /// Whether `#<id>-content` exists in the page.
    pub has_content_region: bool,
    /// Whether the `li` contains an active-mark switch.
    pub has_switch: bool,
    /// Whether the server rendered that switch as active.
    pub initially_active: bool,
}

/// Build the page's panel registry. Items without an id are skipped.
#[must_use]
pub fn registry_from_scan(items: impl IntoIterator<Item = ScannedPanel>) -> PanelRegistry {
    PanelRegistry::new(items.into_iter().filter_map(|item| {
        let id = item.id.trim();
        if id.is_empty() {
            return None;
        }
        let has_link = item
            .link_class
            .as_deref()
            .is_some_and(|class| !class.trim().is_empty());
        Some(
            PanelEntry::new(id)
                .with_content(has_link && item.has_content_region)
                .with_switch(item.has_switch)
                .with_rendered_active(item.has_switch && item.initially_active),
        )
    }))
}

/// Result of probing a click target against every interactive selector,
/// each via `Element.closest`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickProbe {
    /// Id of the `li` owning the clicked switch.
    pub switch_panel: Option<String>,
    pub close: bool,
    pub hide: bool,
    pub show: bool,
    /// Resolved `href` of a remote-call link.
    pub remote_href: Option<String>,
    pub back: bool,
    pub disclosure_key: Option<String>,
    /// Class attribute of a panel nav link; `Some(None)` for a link
    /// without one.
    pub panel_link: Option<Option<String>>,
}

impl ClickProbe {
    /// Pick the gesture for the innermost control. Controls never nest in
    /// the rendered markup, so a fixed order is enough.
    #[must_use]
    pub fn into_gesture(self) -> Option<Gesture> {
        if self.back {
            return Some(Gesture::BackClick);
        }
        if let Some(panel) = self.switch_panel {
            return Some(Gesture::SwitchClick {
                panel: PanelId::new(panel),
            });
        }
        if self.close {
            return Some(Gesture::CloseClick);
        }
        if self.hide {
            return Some(Gesture::HideClick);
        }
        if self.show {
            return Some(Gesture::ShowClick);
        }
        if let Some(href) = self.remote_href {
            return Some(Gesture::RemoteCallClick { href });
        }
        if let Some(key) = self.disclosure_key {
            return Some(Gesture::DisclosureClick { key });
        }
        self.panel_link.map(|class| Gesture::PanelLinkClick {
            panel: class
                .map(|class| class.trim().to_owned())
                .filter(|class| !class.is_empty())
                .map(PanelId::new),
        })
    }
}

/// Parse the optional JSON config passed to the constructor.
///
/// Falls back to defaults on any error; the error is returned so the caller
/// can log it.
#[must_use]
pub fn config_or_default(json: Option<&str>) -> (ToolbarConfig, Option<ToolbarError>) {
    match json.map(str::trim).filter(|json| !json.is_empty()) {
        None => (ToolbarConfig::default(), None),
        Some(json) => match ToolbarConfig::from_json(json) {
            Ok(config) => (config, None),
            Err(err) => (ToolbarConfig::default(), Some(err)),
        },
    }
}

/// Plain snapshot returned by `DebugToolbar.state()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarSnapshot {
    pub visibility: &'static str,
    pub phase: &'static str,
    pub open_panel: Option<String>,
    pub sub_window_open: bool,
    pub escape_bound: bool,
    pub active: Vec<String>,
    pub in_flight: Option<u64>,
    pub panels: usize,
}

impl ToolbarSnapshot {
    #[must_use]
    pub fn capture<S: PersistenceStore>(dispatcher: &Dispatcher<S>) -> Self {
        let machine = dispatcher.machine();
        let mut active: Vec<String> = dispatcher
            .active()
            .marked()
            .iter()
            .map(|id| id.as_str().to_owned())
            .collect();
        active.sort();
        Self {
            visibility: match machine.visibility() {
                ToolbarVisibility::Shown => "shown",
                ToolbarVisibility::Collapsed => "collapsed",
            },
            phase: machine.phase().label(),
            open_panel: machine.open_panel().map(|id| id.as_str().to_owned()),
            sub_window_open: machine.sub_window() == SubWindowState::Open,
            escape_bound: machine.escape_bound(),
            active,
            in_flight: dispatcher.loader().in_flight().map(|token| token.get()),
            panels: dispatcher.registry().len(),
        }
    }

    /// JSON form handed to `JSON.parse` on the JS side.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fldt_core::{ActiveMark, MemoryStore};
    use pretty_assertions::assert_eq;

    fn scanned(id: &str, class: Option<&str>, region: bool, switch: bool) -> ScannedPanel {
        ScannedPanel {
            id: id.to_owned(),
            link_class: class.map(str::to_owned),
            has_content_region: region,
            has_switch: switch,
            initially_active: false,
        }
    }

    #[test]
    fn scan_builds_registry() {
        let registry = registry_from_scan([
            scanned("flDebugVersionPanel", None, false, false),
            scanned("flDebugSQLPanel", Some("flDebugSQLPanel"), true, true),
            scanned("flDebugTimerPanel", Some("flDebugTimerPanel"), false, true),
            scanned("  ", Some("x"), true, true),
        ]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.get("flDebugVersionPanel").unwrap().has_content);
        assert!(registry.get("flDebugSQLPanel").unwrap().has_content);
        assert!(!registry.get("flDebugTimerPanel").unwrap().has_content);
        assert!(registry.get("flDebugTimerPanel").unwrap().user_enable);
    }

    #[test]
    fn server_marked_switch_starts_active_without_cookie() {
        let profiler = ScannedPanel {
            initially_active: true,
            ..scanned("flDebugProfilerPanel", Some("flDebugProfilerPanel"), true, true)
        };
        let registry = registry_from_scan([profiler]);
        let (mut dispatcher, _) =
            Dispatcher::load(ToolbarConfig::default(), registry, MemoryStore::new());
        assert_eq!(
            dispatcher.view().switch_mark("flDebugProfilerPanel"),
            Some(ActiveMark::Active)
        );
        assert_eq!(
            ToolbarSnapshot::capture(&dispatcher).active,
            ["flDebugProfilerPanel"]
        );

        let first = dispatcher.dispatch(Gesture::SwitchClick {
            panel: "flDebugProfilerPanel".into(),
        });
        assert_eq!(first.active_mark, Some(ActiveMark::Inactive));
        assert_eq!(dispatcher.store().read("fldt_active"), None);
    }

    #[test]
    fn active_class_without_switch_is_ignored() {
        let stray = ScannedPanel {
            initially_active: true,
            ..scanned("flDebugVersionPanel", None, false, false)
        };
        let registry = registry_from_scan([stray]);
        assert!(!registry.get("flDebugVersionPanel").unwrap().rendered_active);
    }

    #[test]
    fn probe_prefers_specific_controls() {
        let probe = ClickProbe {
            hide: true,
            panel_link: Some(None),
            ..ClickProbe::default()
        };
        assert_eq!(probe.into_gesture(), Some(Gesture::HideClick));

        let probe = ClickProbe {
            back: true,
            remote_href: Some("/x".into()),
            ..ClickProbe::default()
        };
        assert_eq!(probe.into_gesture(), Some(Gesture::BackClick));
    }

    #[test]
    fn probe_panel_link_class() {
        let probe = ClickProbe {
            panel_link: Some(Some(" flDebugSQLPanel ".into())),
            ..ClickProbe::default()
        };
        assert_eq!(
            probe.into_gesture(),
            Some(Gesture::PanelLinkClick {
                panel: Some("flDebugSQLPanel".into())
            })
        );

        let bare = ClickProbe {
            panel_link: Some(Some(String::new())),
            ..ClickProbe::default()
        };
        assert_eq!(
            bare.into_gesture(),
            Some(Gesture::PanelLinkClick { panel: None })
        );
        assert_eq!(ClickProbe::default().into_gesture(), None);
    }

    #[test]
    fn config_falls_back_on_bad_json() {
        let (config, err) = config_or_default(Some("{not json"));
        assert_eq!(config, ToolbarConfig::default());
        assert!(matches!(err, Some(ToolbarError::InvalidConfig(_))));

        let (config, err) = config_or_default(Some(r#"{"cookie_name":"dbg"}"#));
        assert_eq!(config.cookie_name, "dbg");
        assert_eq!(err, None);

        assert_eq!(config_or_default(Some("  ")).1, None);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let registry = registry_from_scan([scanned(
            "flDebugSQLPanel",
            Some("flDebugSQLPanel"),
            true,
            true,
        )]);
        let store = MemoryStore::new().with_value("fldt_active", "flDebugSQLPanel");
        let (mut dispatcher, _) = Dispatcher::load(ToolbarConfig::default(), registry, store);
        dispatcher.dispatch(Gesture::PanelLinkClick {
            panel: Some("flDebugSQLPanel".into()),
        });

        let snapshot = ToolbarSnapshot::capture(&dispatcher);
        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "visibility": "shown",
                "phase": "shown_panel",
                "openPanel": "flDebugSQLPanel",
                "subWindowOpen": false,
                "escapeBound": true,
                "active": ["flDebugSQLPanel"],
                "inFlight": null,
                "panels": 1,
            })
        );
    }
}
