//! Ghostdrag Core Library
//!
//! Platform-agnostic drag coordination engine: pointer sampling, drag
//! threshold detection, ghost element lifecycle, viewport auto-scroll and
//! the dragging/dropping broadcast protocol that drop targets negotiate
//! through.

pub mod channel;
pub mod classes;
pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod input;
pub mod record;
pub mod source;
pub mod target;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{Channel, Subscription};
pub use classes::{add_classes, remove_classes};
pub use config::{DEFAULT_START_THRESHOLD, DragConfig, DragSourceConfig, DropTargetConfig};
pub use element::ElementHost;
pub use engine::{DragChannel, DragEngine};
pub use error::{DragError, DragResult};
pub use input::{Listener, PointerButton};
pub use record::{DraggableId, DraggableRecord, OriginEvent};
pub use source::{DragSource, PointerDownResponse};
pub use target::{DropHandler, DropOutcome, DropTarget};
