#![forbid(unsafe_code)]

//! `document.cookie` backed [`PersistenceStore`].

use fldt_core::persist::{CookieWrite, PersistenceStore, format_cookie, parse_cookie_value};
use tracing::{trace, warn};
use web_sys::HtmlDocument;

/// Reads and writes the page's cookies. Values are URI-component encoded.
pub struct DocumentCookieStore {
    document: HtmlDocument,
}

impl DocumentCookieStore {
    pub fn new(document: HtmlDocument) -> Self {
        Self { document }
    }
}

impl PersistenceStore for DocumentCookieStore {
    fn read(&self, name: &str) -> Option<String> {
        let header = self.document.cookie().ok()?;
        let raw = parse_cookie_value(&header, name)?;
        match js_sys::decode_uri_component(raw) {
            Ok(decoded) => Some(String::from(decoded)),
            Err(_) => {
                trace!(target: "fldt_web::cookie", cookie = name, "undecodable cookie ignored");
                None
            }
        }
    }

    fn write(&mut self, write: CookieWrite) {
        let value = write.value.as_deref().unwrap_or_default();
        let encoded = String::from(js_sys::encode_uri_component(value));
        let date = js_sys::Date::new_0();
        date.set_time(date.get_time() + write.expiry.offset_ms() as f64);
        let expires = String::from(date.to_utc_string());
        let cookie = format_cookie(&write.name, &encoded, Some(&expires), &write.path);
        if let Err(err) = self.document.set_cookie(&cookie) {
            warn!(
                target: "fldt_web::cookie",
                cookie = %write.name,
                error = ?err,
                "cookie write rejected"
            );
        }
    }
}
