//! DOM event vocabulary for the engine's listeners.

use ghostdrag_core::{DragConfig, Listener, PointerButton};
use kurbo::Point;

/// Event fired on a drag source when the user presses on it.
pub const SOURCE_PRESS: &str = "pointerdown";
/// Native HTML drag start, suppressed on every source.
pub const SOURCE_NATIVE_DRAG: &str = "dragstart";
/// Pointer entering a drop target.
pub const TARGET_ENTER: &str = "pointerenter";
/// Pointer leaving a drop target.
pub const TARGET_LEAVE: &str = "pointerleave";

/// Object a listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventScope {
    /// The drag viewport element.
    Viewport,
    /// The browser window.
    Window,
}

/// DOM event that feeds a listener, and where to listen for it.
pub fn dom_event(listener: Listener) -> (EventScope, &'static str) {
    match listener {
        Listener::ViewportMove => (EventScope::Viewport, "pointermove"),
        Listener::ViewportUp => (EventScope::Viewport, "pointerup"),
        Listener::ViewportSecondaryDown => (EventScope::Viewport, "pointerdown"),
        Listener::WindowUp => (EventScope::Window, "pointerup"),
        Listener::WindowKeyDown => (EventScope::Window, "keydown"),
        Listener::WindowBlur => (EventScope::Window, "blur"),
        Listener::WindowResize => (EventScope::Window, "resize"),
    }
}

/// A button pressed while another one is already held.
///
/// Browsers report such a press as a `pointermove` (not a `pointerdown`)
/// whose `button` names the changed button and whose `buttons` mask still
/// holds it. Releases look the same with the bit cleared.
pub fn chorded_press(button: i16, buttons: u16) -> Option<PointerButton> {
    let bit: u16 = match button {
        1 => 4,
        2 => 2,
        3..=15 => 1 << button,
        _ => return None,
    };
    (buttons & bit != 0).then(|| PointerButton::from_dom(button))
}

/// Client-space pointer coordinates.
pub fn client_point(x: i32, y: i32) -> Point {
    Point::new(f64::from(x), f64::from(y))
}

/// Period of the timer that drives `DragEngine::tick` while a drag is live.
///
/// Follows the sampling interval. While the viewport auto-scrolls the scroll
/// interval applies too, and a zero scroll interval means as fast as the
/// browser runs timers. Never below one millisecond.
pub fn tick_interval_ms(config: &DragConfig, scrolling: bool) -> i32 {
    let mut interval = config.sample_interval_ms;
    if scrolling {
        interval = interval.min(config.scroll_interval_ms);
    }
    i32::try_from(interval).unwrap_or(i32::MAX).max(1)
}
