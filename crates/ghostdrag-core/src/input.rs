//! Pointer and listener vocabulary shared by the engine and platform bindings.

use serde::{Deserialize, Serialize};

/// Pointer button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    /// Usually the left button.
    Primary,
    /// Usually the right button.
    Secondary,
    /// Usually the wheel button.
    Auxiliary,
    Other(i16),
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` value.
    pub fn from_dom(button: i16) -> Self {
        match button {
            0 => Self::Primary,
            1 => Self::Auxiliary,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }

    /// Check if this is the primary button.
    pub fn is_primary(self) -> bool {
        self == Self::Primary
    }
}

/// Event listeners the engine arms while a drag is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Listener {
    /// Pointer movement over the viewport (sampled).
    ViewportMove,
    /// Pointer release over the viewport. Ends the drag normally.
    ViewportUp,
    /// A non-primary button pressed over the viewport. Aborts.
    ViewportSecondaryDown,
    /// Pointer release anywhere in the window. Aborts.
    WindowUp,
    /// Any key pressed. Aborts.
    WindowKeyDown,
    /// The window lost focus. Aborts.
    WindowBlur,
    /// The window was resized (debounced).
    WindowResize,
}

impl Listener {
    /// All listeners armed on activation.
    pub const ALL: [Listener; 7] = [
        Listener::ViewportMove,
        Listener::ViewportUp,
        Listener::ViewportSecondaryDown,
        Listener::WindowUp,
        Listener::WindowKeyDown,
        Listener::WindowBlur,
        Listener::WindowResize,
    ];

    /// Check if the listener removes itself after firing once.
    pub fn is_one_shot(self) -> bool {
        !matches!(self, Listener::ViewportMove | Listener::WindowResize)
    }
}
