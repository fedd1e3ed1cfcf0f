#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the debug toolbar.
//!
//! This module wires [`fldt_core::Dispatcher`] to the live page: one
//! delegated click listener on the toolbar root, a document `keydown`
//! listener bound only while the toolbar is shown, and a `sortEnd` listener
//! per sortable table. Only compiled on `wasm32` targets.
//!
//! The `sortEnd` listener is a native `addEventListener` callback, so the
//! sortable-table collaborator must dispatch a DOM `Event("sortEnd")` on the
//! table (`table.dispatchEvent(new Event("sortEnd"))`). jQuery's
//! `$.fn.trigger` does not reach native listeners.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use fldt_core::{
    Command, Dispatch, Dispatcher, FetchError, Gesture, ListenerChange, ToolbarConfig,
    ToolbarError,
};
use js_sys::{Array, Reflect};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, EventTarget, KeyboardEvent};

use crate::cookie::DocumentCookieStore;
use crate::dom::DomHost;
use crate::fetch::fetch_text;
use crate::host_core::{ToolbarSnapshot, config_or_default, registry_from_scan};

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn to_js_error(err: &ToolbarError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Live state shared by every listener of one toolbar.
struct Host {
    document: Document,
    root: Element,
    dom: DomHost,
    dispatcher: RefCell<Dispatcher<DocumentCookieStore>>,
    sortable_tables: Vec<Element>,
    on_click: Closure<dyn FnMut(Event)>,
    on_keydown: Closure<dyn FnMut(KeyboardEvent)>,
    on_sort_end: Closure<dyn FnMut(Event)>,
}

impl Host {
    fn run(self: &Rc<Self>, gesture: Gesture, event: Option<&Event>) {
        let dispatch = self.dispatcher.borrow_mut().dispatch(gesture);
        self.apply(dispatch, event);
    }

    fn execute(self: &Rc<Self>, command: Command) {
        let dispatch = self.dispatcher.borrow_mut().execute(command);
        self.apply(dispatch, None);
    }

    /// Carry out the host effects of one dispatch, then re-render.
    fn apply(self: &Rc<Self>, dispatch: Dispatch, event: Option<&Event>) {
        if dispatch.prevent_default {
            if let Some(event) = event {
                event.prevent_default();
            }
        }
        match dispatch.listener {
            Some(ListenerChange::BindEscape) => self.bind_escape(),
            Some(ListenerChange::UnbindEscape) => self.unbind_escape(),
            None => {}
        }
        if let Some(update) = &dispatch.content {
            if let Err(err) = self.dom.apply_content(update) {
                warn!(target: "fldt_web::dom", error = ?err, "content update failed");
            }
        }
        if dispatch.restripe {
            let table = event
                .and_then(Event::current_target)
                .and_then(|target| target.dyn_into::<Element>().ok());
            match table {
                Some(table) => self.dom.restripe(&table),
                None => self.dom.restripe_all(),
            }
        }
        if let Some(state) = &dispatch.disclosure {
            self.dom.apply_disclosure(state);
        }
        if let Some(request) = dispatch.fetch {
            let host = Rc::downgrade(self);
            spawn_local(async move {
                let result = fetch_text(&request.url).await;
                complete_fetch(&host, request.token, result);
            });
        }
        self.render();
    }

    fn render(&self) {
        let dispatcher = self.dispatcher.borrow();
        self.dom.render(&dispatcher.view(), dispatcher.registry());
    }

    fn bind_escape(&self) {
        let target: &EventTarget = self.document.as_ref();
        if let Err(err) = target
            .add_event_listener_with_callback("keydown", self.on_keydown.as_ref().unchecked_ref())
        {
            warn!(target: "fldt_web::dom", error = ?err, "escape listener not bound");
        }
    }

    fn unbind_escape(&self) {
        let target: &EventTarget = self.document.as_ref();
        let _ = target.remove_event_listener_with_callback(
            "keydown",
            self.on_keydown.as_ref().unchecked_ref(),
        );
    }

    fn attach(&self) -> Result<(), JsValue> {
        self.root
            .add_event_listener_with_callback("click", self.on_click.as_ref().unchecked_ref())?;
        for table in &self.sortable_tables {
            table.add_event_listener_with_callback(
                "sortEnd",
                self.on_sort_end.as_ref().unchecked_ref(),
            )?;
        }
        Ok(())
    }

    fn detach(&self) {
        let _ = self
            .root
            .remove_event_listener_with_callback("click", self.on_click.as_ref().unchecked_ref());
        for table in &self.sortable_tables {
            let _ = table.remove_event_listener_with_callback(
                "sortEnd",
                self.on_sort_end.as_ref().unchecked_ref(),
            );
        }
        if self.dispatcher.borrow().machine().escape_bound() {
            self.unbind_escape();
        }
    }
}

fn complete_fetch(host: &Weak<Host>, token: fldt_core::RequestToken, result: Result<String, FetchError>) {
    let Some(host) = host.upgrade() else {
        debug!(target: "fldt_web::fetch", token = token.get(), "toolbar gone before response");
        return;
    };
    let dispatch = host.dispatcher.borrow_mut().complete_fetch(token, result);
    host.apply(dispatch, None);
}

fn on_click(host: &Weak<Host>, event: Event) {
    let Some(host) = host.upgrade() else {
        return;
    };
    let Some(target) = event.target().and_then(|target| target.dyn_into::<Element>().ok()) else {
        return;
    };
    if let Some(gesture) = host.dom.probe_click(&target).into_gesture() {
        host.run(gesture, Some(&event));
    }
}

/// Debug toolbar controller exported to JavaScript.
///
/// ```js
/// const toolbar = new DebugToolbar();
/// toolbar.init();
/// ```
#[wasm_bindgen]
pub struct DebugToolbar {
    config: ToolbarConfig,
    host: Option<Rc<Host>>,
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

#[wasm_bindgen]
impl DebugToolbar {
    /// Create a toolbar controller. `config_json` is an optional JSON object
    /// overriding cookie names and DOM ids; invalid input falls back to the
    /// defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Self {
        install_panic_hook();
        let (config, err) = config_or_default(config_json.as_deref());
        if let Some(err) = err {
            warn!(target: "fldt_web::dom", error = %err, "toolbar config rejected, using defaults");
        }
        Self { config, host: None }
    }

    /// Scan the rendered markup, restore persisted state and bind listeners.
    /// Calling it again is a no-op.
    pub fn init(&mut self) -> Result<(), JsValue> {
        if self.host.is_some() {
            return Ok(());
        }
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| to_js_error(&ToolbarError::MissingElement("document".into())))?;
        let dom = DomHost::new(document.clone(), self.config.dom.clone());
        let root = dom.root().map_err(|err| to_js_error(&err))?;
        let cookies = dom
            .html_document()
            .ok_or_else(|| to_js_error(&ToolbarError::MissingElement("HTML document".into())))?;
        let registry = registry_from_scan(dom.scan_panels());
        let (dispatcher, loaded) =
            Dispatcher::load(self.config.clone(), registry, DocumentCookieStore::new(cookies));
        debug!(
            target: "fldt_web::dom",
            panels = dispatcher.registry().len(),
            "toolbar initialised"
        );
        let sortable_tables = dom.sortable_tables();

        let host = Rc::new_cyclic(|weak: &Weak<Host>| Host {
            document,
            root,
            dom,
            dispatcher: RefCell::new(dispatcher),
            sortable_tables,
            on_click: {
                let weak = weak.clone();
                Closure::new(move |event: Event| on_click(&weak, event))
            },
            on_keydown: {
                let weak = weak.clone();
                Closure::new(move |event: KeyboardEvent| {
                    let Some(host) = weak.upgrade() else {
                        return;
                    };
                    let gesture = Gesture::KeyDown {
                        key: event.key(),
                        key_code: event.key_code(),
                    };
                    let event: &Event = event.as_ref();
                    host.run(gesture, Some(event));
                })
            },
            on_sort_end: {
                let weak = weak.clone();
                Closure::new(move |event: Event| {
                    if let Some(host) = weak.upgrade() {
                        host.run(Gesture::TableSortEnd, Some(&event));
                    }
                })
            },
        });

        host.dom.show_root();
        host.attach()?;
        host.apply(loaded, None);
        self.host = Some(host);
        Ok(())
    }

    /// Plain object snapshot of the toolbar state, or `null` before `init()`.
    pub fn state(&self) -> JsValue {
        let Some(host) = &self.host else {
            return JsValue::NULL;
        };
        let snapshot = ToolbarSnapshot::capture(&*host.dispatcher.borrow());
        match snapshot.to_json() {
            Ok(json) => js_sys::JSON::parse(&json).unwrap_or(JsValue::NULL),
            Err(err) => {
                warn!(target: "fldt_web::dom", error = %err, "state snapshot failed");
                JsValue::NULL
            }
        }
    }

    /// Run the close cascade once, as the Escape key would.
    pub fn close(&self) {
        if let Some(host) = &self.host {
            host.execute(Command::Close);
        }
    }

    /// Fetch `url` and replace the whole document with the response.
    #[wasm_bindgen(js_name = replacePage)]
    pub fn replace_page(&self, url: String) {
        if let Some(host) = &self.host {
            host.execute(Command::ReplacePage(url));
        }
    }

    /// Drain the structured dispatch log.
    #[wasm_bindgen(js_name = takeLogs)]
    pub fn take_logs(&self) -> Array {
        let out = Array::new();
        if let Some(host) = &self.host {
            for line in host.dispatcher.borrow_mut().take_logs() {
                out.push(&JsValue::from_str(&line));
            }
        }
        out
    }

    /// Remove every listener. The page keeps its current appearance.
    pub fn destroy(&mut self) {
        if let Some(host) = self.host.take() {
            host.detach();
        }
    }
}

impl Drop for DebugToolbar {
    fn drop(&mut self) {
        self.destroy();
    }
}
