#![forbid(unsafe_code)]

//! Same-origin GET of an HTML fragment or page.

use fldt_core::FetchError;
use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

fn network_error(err: JsValue) -> FetchError {
    FetchError::Network(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

/// Fetch `url` and return its body as text. Non-2xx answers are errors.
pub async fn fetch_text(url: &str) -> Result<String, FetchError> {
    let Some(window) = web_sys::window() else {
        return Err(FetchError::Network("no window".into()));
    };
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(network_error)?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| FetchError::Network("fetch resolved to a non-Response value".into()))?;
    debug!(
        target: "fldt_web::fetch",
        url,
        status = response.status(),
        "fetch answered"
    );
    if !response.ok() {
        return Err(FetchError::Status(response.status()));
    }
    let body = JsFuture::from(response.text().map_err(network_error)?)
        .await
        .map_err(network_error)?;
    body.as_string()
        .ok_or_else(|| FetchError::Network("response body is not text".into()))
}
