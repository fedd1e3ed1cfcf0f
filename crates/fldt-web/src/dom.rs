#![forbid(unsafe_code)]

//! Reads the rendered toolbar markup and projects [`ToolbarView`] onto it.
//!
//! Missing elements are never an error here: the affected step is skipped
//! and traced, the rest of the page keeps working.

use std::cell::Cell;

use fldt_core::config::DomNames;
use fldt_core::disclosure::DisclosureState;
use fldt_core::{ActiveMark, ContentUpdate, PanelId, PanelRegistry, RowParity, ToolbarError, ToolbarView};
use tracing::trace;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlAnchorElement, HtmlDocument, HtmlElement, NodeList};

use crate::host_core::{ClickProbe, ScannedPanel};

/// Attribute carrying the key the host assigned to a disclosure control.
const DISCLOSURE_KEY_ATTR: &str = "data-fldt-disclosure";

fn elements(list: Result<NodeList, JsValue>) -> Vec<Element> {
    let Ok(list) = list else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|index| list.get(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn closest(target: &Element, selector: &str) -> Option<Element> {
    target.closest(selector).ok().flatten()
}

fn set_visible(element: &Element, visible: bool) {
    let Some(element) = element.dyn_ref::<HtmlElement>() else {
        return;
    };
    let display = if visible { "block" } else { "none" };
    if let Err(err) = element.style().set_property("display", display) {
        trace!(target: "fldt_web::dom", error = ?err, "display update rejected");
    }
}

fn toggle_class(element: &Element, class: &str, on: bool) {
    let _ = element.class_list().toggle_with_force(class, on);
}

/// DOM side of one toolbar instance.
pub struct DomHost {
    document: Document,
    names: DomNames,
    next_disclosure: Cell<u32>,
}

impl DomHost {
    pub fn new(document: Document, names: DomNames) -> Self {
        Self {
            document,
            names,
            next_disclosure: Cell::new(0),
        }
    }

    fn by_id(&self, id: &str) -> Option<Element> {
        let element = self.document.get_element_by_id(id);
        if element.is_none() {
            trace!(target: "fldt_web::dom", id, "element not found");
        }
        element
    }

    fn class_selector(class: &str) -> String {
        format!(".{class}")
    }

    /// The `#flDebug` root, which all delegated listeners attach to.
    pub fn root(&self) -> Result<Element, ToolbarError> {
        self.document
            .get_element_by_id(&self.names.root_id)
            .ok_or_else(|| ToolbarError::MissingElement(format!("#{}", self.names.root_id)))
    }

    pub fn html_document(&self) -> Option<HtmlDocument> {
        self.document.clone().dyn_into::<HtmlDocument>().ok()
    }

    /// Collect the panel list entries in nav order.
    pub fn scan_panels(&self) -> Vec<ScannedPanel> {
        let selector = format!("#{} li", self.names.panel_list_id);
        let switch = Self::class_selector(&self.names.switch_class);
        elements(self.document.query_selector_all(&selector))
            .into_iter()
            .map(|item| {
                let id = item.id();
                let link_class = item
                    .query_selector("a")
                    .ok()
                    .flatten()
                    .map(|link| link.class_name());
                let region = PanelId::new(id.as_str()).content_region_id(&self.names.content_suffix);
                let switch = item.query_selector(&switch).ok().flatten();
                ScannedPanel {
                    has_content_region: self.document.get_element_by_id(&region).is_some(),
                    has_switch: switch.is_some(),
                    initially_active: switch
                        .is_some_and(|switch| switch.class_list().contains(&self.names.active_class)),
                    link_class,
                    id,
                }
            })
            .collect()
    }

    /// Sortable tables inside the toolbar.
    pub fn sortable_tables(&self) -> Vec<Element> {
        let Ok(root) = self.root() else {
            return Vec::new();
        };
        elements(root.query_selector_all(&format!(
            "table.{}",
            self.names.sortable_table_class
        )))
    }

    /// Resolve a click target against every interactive control.
    pub fn probe_click(&self, target: &Element) -> ClickProbe {
        let names = &self.names;
        let switch_panel = closest(target, &Self::class_selector(&names.switch_class))
            .and_then(|switch| switch.parent_element())
            .map(|item| item.id());
        let remote_href = closest(target, &format!("a.{}", names.remote_call_class)).map(|link| {
            link.dyn_ref::<HtmlAnchorElement>()
                .map(HtmlAnchorElement::href)
                .or_else(|| link.get_attribute("href"))
                .unwrap_or_default()
        });
        let disclosure_key = closest(
            target,
            &format!(
                "a.{}, a.{}",
                names.show_context_class, names.show_stacktrace_class
            ),
        )
        .map(|control| self.disclosure_key(&control));
        ClickProbe {
            switch_panel,
            close: closest(target, &format!("a.{}", names.close_class)).is_some(),
            hide: closest(target, &format!("#{}", names.hide_button_id)).is_some(),
            show: closest(target, &format!("#{}", names.show_button_id)).is_some(),
            remote_href,
            back: closest(
                target,
                &format!("#{} a.{}", names.sub_window_id, names.back_class),
            )
            .is_some(),
            disclosure_key,
            panel_link: closest(target, &format!("#{} li a", names.panel_list_id))
                .map(|link| Some(link.class_name())),
        }
    }

    fn disclosure_key(&self, control: &Element) -> String {
        if let Some(key) = control.get_attribute(DISCLOSURE_KEY_ATTR) {
            return key;
        }
        let key = self.next_disclosure.get();
        self.next_disclosure.set(key.wrapping_add(1));
        let key = key.to_string();
        let _ = control.set_attribute(DISCLOSURE_KEY_ATTR, &key);
        key
    }

    /// Make the DOM match `view`.
    pub fn render(&self, view: &ToolbarView, registry: &PanelRegistry) {
        let names = &self.names;
        if let Some(toolbar) = self.by_id(&names.toolbar_id) {
            set_visible(&toolbar, view.toolbar_visible);
        }
        if let Some(handle) = self.by_id(&names.handle_id) {
            set_visible(&handle, view.handle_visible);
        }
        if let Some(window) = self.by_id(&names.sub_window_id) {
            set_visible(&window, view.sub_window_visible);
        }
        let regions = self
            .document
            .query_selector_all(&Self::class_selector(&names.content_parent_class));
        for region in elements(regions) {
            let open = region
                .id()
                .strip_suffix(names.content_suffix.as_str())
                .is_some_and(|panel| view.content_visible(panel));
            set_visible(&region, open);
        }
        let switch = Self::class_selector(&names.switch_class);
        for entry in registry.iter() {
            let Some(item) = self.by_id(entry.id.as_str()) else {
                continue;
            };
            let highlighted = view.highlighted.as_ref() == Some(&entry.id);
            toggle_class(&item, &names.active_class, highlighted);
            let Some(mark) = view.switch_mark(entry.id.as_str()) else {
                continue;
            };
            if let Ok(Some(control)) = item.query_selector(&switch) {
                toggle_class(&control, &names.active_class, mark == ActiveMark::Active);
                toggle_class(&control, &names.inactive_class, mark == ActiveMark::Inactive);
            }
        }
    }

    pub fn show_root(&self) {
        if let Ok(root) = self.root() {
            set_visible(&root, true);
        }
    }

    /// Write fetched or cleared content.
    pub fn apply_content(&self, update: &ContentUpdate) -> Result<(), JsValue> {
        match update {
            ContentUpdate::Clear => {
                if let Some(window) = self.by_id(&self.names.sub_window_id) {
                    window.set_inner_html("");
                }
            }
            ContentUpdate::Inject(html) => {
                if let Some(window) = self.by_id(&self.names.sub_window_id) {
                    window.set_inner_html(html);
                }
            }
            ContentUpdate::ReplaceDocument(html) => {
                let Some(document) = self.html_document() else {
                    return Err(JsValue::from_str("document is not an HTML document"));
                };
                document.open()?;
                document.write(&js_sys::Array::of1(&JsValue::from_str(html)))?;
                document.close()?;
            }
        }
        Ok(())
    }

    /// Re-apply zebra classes to the body rows of `table`, by post-sort index.
    pub fn restripe(&self, table: &Element) {
        for (index, row) in elements(table.query_selector_all("tbody tr")).into_iter().enumerate() {
            let parity = RowParity::of(index);
            toggle_class(&row, &self.names.even_class, parity == RowParity::Even);
            toggle_class(&row, &self.names.odd_class, parity == RowParity::Odd);
        }
    }

    pub fn restripe_all(&self) {
        for table in self.sortable_tables() {
            self.restripe(&table);
        }
    }

    /// Show or hide the block a disclosure control governs.
    pub fn apply_disclosure(&self, state: &DisclosureState) {
        let names = &self.names;
        let selector = format!("[{DISCLOSURE_KEY_ATTR}=\"{}\"]", state.key);
        let Ok(Some(control)) = self.document.query_selector(&selector) else {
            trace!(target: "fldt_web::dom", key = %state.key, "disclosure control gone");
            return;
        };
        if control.class_list().contains(&names.show_context_class) {
            if let Ok(Some(arrow)) = control.query_selector(&Self::class_selector(&names.arrow_class)) {
                arrow.set_text_content(Some(state.arrow()));
            }
            let block = control
                .parent_element()
                .and_then(|parent| parent.next_element_sibling());
            if let Some(block) = block {
                set_visible(&block, state.expanded);
            }
        } else if let Some(row) = closest(&control, "tr") {
            for block in elements(row.query_selector_all(&Self::class_selector(&names.stacktrace_class))) {
                set_visible(&block, state.expanded);
            }
        }
    }
}
