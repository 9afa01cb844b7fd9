//! Draggable record: the tracked state of one drag interaction.

use crate::input::PointerButton;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tracked draggable.
pub type DraggableId = Uuid;

/// The pointer-down that started a registration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginEvent {
    /// Pointer position in client coordinates.
    pub position: Point,
    pub button: PointerButton,
}

impl OriginEvent {
    pub fn new(position: Point, button: PointerButton) -> Self {
        Self { position, button }
    }
}

/// State of one pending or in-flight drag.
///
/// Owned by the engine; subscribers only ever see shared references.
#[derive(Debug, Clone)]
pub struct DraggableRecord<E, P> {
    pub(crate) id: DraggableId,
    pub(crate) source: E,
    pub(crate) ghost: Option<E>,
    pub(crate) payload: P,
    pub(crate) dragged_class: Option<String>,
    pub(crate) dragging_class: Option<String>,
    pub(crate) origin: OriginEvent,
    pub(crate) position: Point,
    pub(crate) grab_offset: Option<Vec2>,
    pub(crate) start_threshold: f64,
    pub(crate) is_dragging: bool,
    pub(crate) cancelled: bool,
    pub(crate) ended: bool,
}

impl<E, P> DraggableRecord<E, P> {
    /// Create a record that is not dragging yet.
    pub fn new(
        source: E,
        payload: P,
        origin: OriginEvent,
        dragged_class: Option<String>,
        dragging_class: Option<String>,
        start_threshold: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            ghost: None,
            payload,
            dragged_class,
            dragging_class,
            origin,
            position: Point::ZERO,
            grab_offset: None,
            start_threshold,
            is_dragging: false,
            cancelled: false,
            ended: false,
        }
    }

    pub fn id(&self) -> DraggableId {
        self.id
    }

    /// The element the drag started from.
    pub fn source(&self) -> &E {
        &self.source
    }

    /// The ghost following the pointer, present only while dragging.
    pub fn ghost(&self) -> Option<&E> {
        self.ghost.as_ref()
    }

    /// Application data supplied at registration.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Classes applied to the source element while it is dragged.
    pub fn dragged_class(&self) -> Option<&str> {
        self.dragged_class.as_deref()
    }

    /// Classes applied to the ghost element.
    pub fn dragging_class(&self) -> Option<&str> {
        self.dragging_class.as_deref()
    }

    pub fn origin(&self) -> &OriginEvent {
        &self.origin
    }

    /// Current top-left corner of the ghost.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Vector from the ghost's top-left corner to the grabbed point.
    /// Fixed once the ghost exists.
    pub fn grab_offset(&self) -> Option<Vec2> {
        self.grab_offset
    }

    pub fn start_threshold(&self) -> f64 {
        self.start_threshold
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    /// Whether the drag ended through an abort path. Meaningful only after
    /// the drag ended.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// Whether a live drag of this record already ended.
    pub fn has_ended(&self) -> bool {
        self.ended
    }

    /// Check if the pointer travelled past the start threshold on either axis.
    pub fn start_threshold_passed(&self, pointer: Point) -> bool {
        let dx = (pointer.x - self.origin.position.x).abs();
        let dy = (pointer.y - self.origin.position.y).abs();
        dx > self.start_threshold || dy > self.start_threshold
    }
}
