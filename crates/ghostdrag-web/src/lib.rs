//! Ghostdrag Web
//!
//! Browser bindings for the ghostdrag engine: a DOM [`ElementHost`] and a
//! controller that feeds pointer, keyboard, window and timer events into
//! [`DragEngine`].
//!
//! [`ElementHost`]: ghostdrag_core::ElementHost
//! [`DragEngine`]: ghostdrag_core::DragEngine

pub mod events;

#[cfg(target_arch = "wasm32")]
mod bindings;
#[cfg(target_arch = "wasm32")]
mod controller;
#[cfg(target_arch = "wasm32")]
mod host;

#[cfg(target_arch = "wasm32")]
pub use bindings::{DomDragSource, DomDropTarget};
#[cfg(target_arch = "wasm32")]
pub use controller::WebDragController;
#[cfg(target_arch = "wasm32")]
pub use host::WebHost;

pub use ghostdrag_core;

/// Route panics and `log` records to the browser console.
///
/// Safe to call more than once.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: log::Level) {
    console_error_panic_hook::set_once();

    if let Err(err) = console_log::init_with_level(level) {
        web_sys::console::warn_1(&format!("Logger already initialized: {err}").into());
    }
}
