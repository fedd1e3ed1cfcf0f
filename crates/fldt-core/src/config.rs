#![forbid(unsafe_code)]

//! Host-tunable configuration: cookie names, persistence scope and the DOM
//! names the server-rendered markup uses.

use serde::{Deserialize, Serialize};

use crate::error::ToolbarError;
use crate::persist::CookieScope;

/// Default cookie marking the toolbar as collapsed.
pub const DEFAULT_COOKIE_NAME: &str = "fldt";
/// Default cookie holding the `;`-joined active panel ids.
pub const DEFAULT_ACTIVE_COOKIE_NAME: &str = "fldt_active";
/// Default cookie path.
pub const DEFAULT_COOKIE_PATH: &str = "/";
/// Default lifetime of persisted records, in days.
pub const DEFAULT_EXPIRY_DAYS: u32 = 10;
/// Value written into the collapse cookie. Any non-empty value means collapsed.
pub const DEFAULT_COLLAPSED_MARKER: &str = "hide";

/// Element ids and class names of the rendered toolbar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomNames {
    pub root_id: String,
    pub toolbar_id: String,
    pub handle_id: String,
    pub panel_list_id: String,
    pub sub_window_id: String,
    pub hide_button_id: String,
    pub show_button_id: String,
    pub content_suffix: String,
    pub content_parent_class: String,
    pub switch_class: String,
    pub close_class: String,
    pub remote_call_class: String,
    pub back_class: String,
    pub active_class: String,
    pub inactive_class: String,
    pub sortable_table_class: String,
    pub even_class: String,
    pub odd_class: String,
    pub show_context_class: String,
    pub show_stacktrace_class: String,
    pub stacktrace_class: String,
    pub arrow_class: String,
}

impl Default for DomNames {
    fn default() -> Self {
        Self {
            root_id: "flDebug".into(),
            toolbar_id: "flDebugToolbar".into(),
            handle_id: "flDebugToolbarHandle".into(),
            panel_list_id: "flDebugPanelList".into(),
            sub_window_id: "flDebugWindow".into(),
            hide_button_id: "flDebugHideToolBarButton".into(),
            show_button_id: "flDebugShowToolBarButton".into(),
            content_suffix: "-content".into(),
            content_parent_class: "flDebugPanelContentParent".into(),
            switch_class: "flDebugSwitch".into(),
            close_class: "flDebugClose".into(),
            remote_call_class: "flDebugRemoteCall".into(),
            back_class: "flDebugBack".into(),
            active_class: "flDebugActive".into(),
            inactive_class: "flDebugInactive".into(),
            sortable_table_class: "flDebugTablesorter".into(),
            even_class: "flDebugEven".into(),
            odd_class: "flDebugOdd".into(),
            show_context_class: "flDebugTemplateShowContext".into(),
            show_stacktrace_class: "flDebugShowStacktrace".into(),
            stacktrace_class: "flDebugHideStacktraceDiv".into(),
            arrow_class: "flDebugToggleArrow".into(),
        }
    }
}

/// Toolbar configuration.
///
/// Every field has a default, so hosts only pass what they override:
///
/// ```
/// use fldt_core::config::ToolbarConfig;
///
/// let config = ToolbarConfig::from_json(r#"{"expiry_days": 3}"#).unwrap();
/// assert_eq!(config.expiry_days, 3);
/// assert_eq!(config.cookie_name, "fldt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolbarConfig {
    pub cookie_name: String,
    pub active_cookie_name: String,
    pub cookie_path: String,
    pub expiry_days: u32,
    pub collapsed_marker: String,
    pub dom: DomNames,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.into(),
            active_cookie_name: DEFAULT_ACTIVE_COOKIE_NAME.into(),
            cookie_path: DEFAULT_COOKIE_PATH.into(),
            expiry_days: DEFAULT_EXPIRY_DAYS,
            collapsed_marker: DEFAULT_COLLAPSED_MARKER.into(),
            dom: DomNames::default(),
        }
    }
}

impl ToolbarConfig {
    /// Parse and validate a JSON configuration object.
    pub fn from_json(json: &str) -> Result<Self, ToolbarError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| ToolbarError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the state machine cannot persist correctly.
    pub fn validate(&self) -> Result<(), ToolbarError> {
        if self.cookie_name.is_empty() || self.active_cookie_name.is_empty() {
            return Err(ToolbarError::InvalidConfig(
                "cookie names must not be empty".into(),
            ));
        }
        if self.cookie_name == self.active_cookie_name {
            return Err(ToolbarError::InvalidConfig(format!(
                "collapse and active cookies share the name {:?}",
                self.cookie_name
            )));
        }
        if !self.cookie_path.starts_with('/') {
            return Err(ToolbarError::InvalidConfig(format!(
                "cookie path {:?} must start with '/'",
                self.cookie_path
            )));
        }
        if self.expiry_days == 0 {
            return Err(ToolbarError::InvalidConfig(
                "expiry_days must be at least 1".into(),
            ));
        }
        if self.collapsed_marker.is_empty() {
            return Err(ToolbarError::InvalidConfig(
                "collapsed_marker must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Path and lifetime shared by every persisted record.
    #[must_use]
    pub fn scope(&self) -> CookieScope {
        CookieScope::new(self.cookie_path.clone(), self.expiry_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_rendered_markup() {
        let config = ToolbarConfig::default();
        assert_eq!(config.cookie_name, "fldt");
        assert_eq!(config.active_cookie_name, "fldt_active");
        assert_eq!(config.cookie_path, "/");
        assert_eq!(config.expiry_days, 10);
        assert_eq!(config.dom.sub_window_id, "flDebugWindow");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_nested_defaults() {
        let config = ToolbarConfig::from_json(r#"{"dom": {"root_id": "dbg"}}"#).unwrap();
        assert_eq!(config.dom.root_id, "dbg");
        assert_eq!(config.dom.toolbar_id, "flDebugToolbar");
        assert_eq!(config.cookie_name, "fldt");
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            ToolbarConfig::from_json("{not json"),
            Err(ToolbarError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validation_rejects_unusable_settings() {
        let shared = ToolbarConfig {
            active_cookie_name: "fldt".into(),
            ..ToolbarConfig::default()
        };
        assert!(shared.validate().is_err());

        let relative = ToolbarConfig {
            cookie_path: "debug".into(),
            ..ToolbarConfig::default()
        };
        assert!(relative.validate().is_err());

        let instant = ToolbarConfig {
            expiry_days: 0,
            ..ToolbarConfig::default()
        };
        assert!(instant.validate().is_err());
    }
}
