#![cfg(target_arch = "wasm32")]
#![forbid(unsafe_code)]

use fldt_web::DebugToolbar;
use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Document, HtmlDocument, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

const MARKUP: &str = r##"
<div id="flDebug" style="display:none">
  <div id="flDebugToolbar">
    <a href="#" id="flDebugHideToolBarButton">Hide</a>
    <ul id="flDebugPanelList">
      <li id="flDebugVersionPanel"><a href="#">Versions</a></li>
      <li id="flDebugSQLPanel">
        <input type="checkbox" class="flDebugSwitch flDebugInactive">
        <a href="#" class="flDebugSQLPanel">SQL</a>
      </li>
      <li id="flDebugTemplatePanel">
        <a href="#" class="flDebugTemplatePanel">Templates</a>
      </li>
    </ul>
  </div>
  <div id="flDebugToolbarHandle">
    <a href="#" id="flDebugShowToolBarButton">FDT</a>
  </div>
  <div id="flDebugSQLPanel-content" class="flDebugPanelContentParent">
    <a href="#" class="flDebugClose">Close</a>
    <table class="flDebugTablesorter"><tbody><tr></tr><tr></tr><tr></tr></tbody></table>
  </div>
  <div id="flDebugTemplatePanel-content" class="flDebugPanelContentParent">
    <a href="#" class="flDebugClose">Close</a>
  </div>
  <div id="flDebugWindow"></div>
</div>
"##;

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn clear_cookies() {
    let doc = document().dyn_into::<HtmlDocument>().unwrap();
    for name in ["fldt", "fldt_active"] {
        doc.set_cookie(&format!(
            "{name}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/"
        ))
        .unwrap();
    }
}

fn mount() -> DebugToolbar {
    clear_cookies();
    document().body().unwrap().set_inner_html(MARKUP);
    let mut toolbar = DebugToolbar::new(None);
    toolbar.init().unwrap();
    toolbar
}

fn click(selector: &str) {
    document()
        .query_selector(selector)
        .unwrap()
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap()
        .click();
}

fn field(state: &JsValue, key: &str) -> JsValue {
    Reflect::get(state, &JsValue::from_str(key)).unwrap()
}

fn display(id: &str) -> String {
    document()
        .get_element_by_id(id)
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap()
        .style()
        .get_property_value("display")
        .unwrap()
}

#[wasm_bindgen_test]
fn init_shows_toolbar_without_open_panel() {
    let mut toolbar = mount();
    let state = toolbar.state();
    assert_eq!(field(&state, "visibility").as_string().as_deref(), Some("shown"));
    assert_eq!(field(&state, "openPanel"), JsValue::NULL);
    assert_eq!(field(&state, "panels").as_f64(), Some(3.0));
    assert_eq!(display("flDebug"), "block");
    assert_eq!(display("flDebugToolbarHandle"), "none");
    toolbar.destroy();
}

#[wasm_bindgen_test]
fn panel_link_opens_one_region_at_a_time() {
    let mut toolbar = mount();
    click("#flDebugPanelList a.flDebugSQLPanel");
    assert_eq!(display("flDebugSQLPanel-content"), "block");
    click("#flDebugPanelList a.flDebugTemplatePanel");
    assert_eq!(display("flDebugSQLPanel-content"), "none");
    assert_eq!(display("flDebugTemplatePanel-content"), "block");
    let li = document().get_element_by_id("flDebugTemplatePanel").unwrap();
    assert!(li.class_list().contains("flDebugActive"));
    toolbar.destroy();
}

#[wasm_bindgen_test]
fn close_cascade_collapses_and_persists() {
    let mut toolbar = mount();
    click("#flDebugPanelList a.flDebugSQLPanel");
    toolbar.close();
    assert_eq!(display("flDebugSQLPanel-content"), "none");
    toolbar.close();
    assert_eq!(display("flDebugToolbar"), "none");
    assert_eq!(display("flDebugToolbarHandle"), "block");

    let cookies = document().dyn_into::<HtmlDocument>().unwrap().cookie().unwrap();
    assert!(cookies.contains("fldt=hide"));

    click("#flDebugShowToolBarButton");
    let state = toolbar.state();
    assert_eq!(field(&state, "escapeBound").as_bool(), Some(true));
    toolbar.destroy();
}

#[wasm_bindgen_test]
fn switch_marks_panel_active() {
    let mut toolbar = mount();
    click("#flDebugSQLPanel .flDebugSwitch");
    let switch = document()
        .query_selector("#flDebugSQLPanel .flDebugSwitch")
        .unwrap()
        .unwrap();
    assert!(switch.class_list().contains("flDebugActive"));
    assert!(!switch.class_list().contains("flDebugInactive"));
    let cookies = document().dyn_into::<HtmlDocument>().unwrap().cookie().unwrap();
    assert!(cookies.contains("fldt_active=flDebugSQLPanel"));
    toolbar.destroy();
}

#[wasm_bindgen_test]
fn server_rendered_active_switch_survives_init() {
    clear_cookies();
    document().body().unwrap().set_inner_html(MARKUP);
    let switch = document()
        .query_selector("#flDebugSQLPanel .flDebugSwitch")
        .unwrap()
        .unwrap();
    switch.set_class_name("flDebugSwitch flDebugActive");
    let mut toolbar = DebugToolbar::new(None);
    toolbar.init().unwrap();
    assert!(switch.class_list().contains("flDebugActive"));

    click("#flDebugSQLPanel .flDebugSwitch");
    assert!(switch.class_list().contains("flDebugInactive"));
    let cookies = document().dyn_into::<HtmlDocument>().unwrap().cookie().unwrap();
    assert!(!cookies.contains("fldt_active=flDebugSQLPanel"));
    toolbar.destroy();
}

#[wasm_bindgen_test]
fn logs_record_each_dispatch() {
    let mut toolbar = mount();
    click("#flDebugHideToolBarButton");
    let logs: Vec<String> = toolbar
        .take_logs()
        .iter()
        .filter_map(|line| line.as_string())
        .collect();
    assert_eq!(logs.len(), 2);
    assert!(logs[1].contains("command=collapse outcome=applied"));
    toolbar.destroy();
}

#[wasm_bindgen_test]
fn sort_end_restripes_rows() {
    let mut toolbar = mount();
    let table = document()
        .query_selector("table.flDebugTablesorter")
        .unwrap()
        .unwrap();
    let event = web_sys::Event::new("sortEnd").unwrap();
    table.dispatch_event(&event).unwrap();
    let rows = table.query_selector_all("tbody tr").unwrap();
    let classes: Vec<String> = (0..rows.length())
        .filter_map(|i| rows.get(i))
        .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
        .map(|row| row.class_name())
        .collect();
    assert_eq!(classes, ["flDebugEven", "flDebugOdd", "flDebugEven"]);
    toolbar.destroy();
}
