//! Drag source adapter.
//!
//! Binds a press on one element to a registration with the engine.

use crate::config::DragSourceConfig;
use crate::element::ElementHost;
use crate::engine::DragEngine;
use crate::input::PointerButton;
use crate::record::{DraggableId, OriginEvent};
use kurbo::Point;

/// What the platform binding should do with the pointer-down event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerDownResponse {
    /// A draggable was registered. The binding must suppress the platform's
    /// native drag start and stop the event from propagating.
    Registered {
        id: DraggableId,
        prevent_default: bool,
        stop_propagation: bool,
    },
    /// Not a primary press; leave the event alone.
    Ignored,
}

/// An element that can be picked up and dragged.
#[derive(Debug, Clone)]
pub struct DragSource<E, P> {
    element: E,
    payload: P,
    config: DragSourceConfig,
}

impl<E: Clone, P: Clone> DragSource<E, P> {
    /// Create a source with default settings (threshold of 10 px, document
    /// root as viewport).
    pub fn new(element: E, payload: P) -> Self {
        Self::with_config(element, payload, DragSourceConfig::default())
    }

    pub fn with_config(element: E, payload: P, config: DragSourceConfig) -> Self {
        Self {
            element,
            payload,
            config,
        }
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Replace the payload handed to drop targets by future drags.
    pub fn set_payload(&mut self, payload: P) {
        self.payload = payload;
    }

    pub fn config(&self) -> &DragSourceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DragSourceConfig {
        &mut self.config
    }

    /// Handle a pointer-down on the source element.
    pub fn pointer_down<H>(
        &self,
        engine: &mut DragEngine<H, P>,
        button: PointerButton,
        position: Point,
    ) -> PointerDownResponse
    where
        H: ElementHost<Element = E>,
        E: 'static,
        P: 'static,
    {
        if !button.is_primary() {
            return PointerDownResponse::Ignored;
        }

        let id = engine.register_draggable(
            OriginEvent::new(position, button),
            self.element.clone(),
            self.payload.clone(),
            &self.config,
        );
        PointerDownResponse::Registered {
            id,
            prevent_default: true,
            stop_propagation: true,
        }
    }
}
