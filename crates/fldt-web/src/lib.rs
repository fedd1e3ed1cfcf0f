#![forbid(unsafe_code)]

//! Browser host for the fldt debug toolbar.
//!
//! This crate provides [`DebugToolbar`], a `wasm-bindgen`-exported struct
//! that drives `fldt_core::Dispatcher` from real DOM events, persists state
//! in `document.cookie` and fetches remote panel fragments.
//!
//! The DOM-free parts (panel scanning, click resolution, config fallback and
//! state snapshots) live in [`host_core`] and are tested natively.

pub mod host_core;

#[cfg(target_arch = "wasm32")]
mod cookie;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod fetch;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::DebugToolbar;
