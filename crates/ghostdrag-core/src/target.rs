//! Drop target adapter.
//!
//! A drop target listens to the engine's broadcasts. When a drag starts it
//! asks its handler whether the payload is acceptable, while the drag is live
//! it tracks pointer hover over its own element and shows accept/reject
//! classes, and when the drag ends it reports a [`DropOutcome`].

use crate::channel::Subscription;
use crate::classes::{add_classes, remove_classes};
use crate::config::DropTargetConfig;
use crate::element::ElementHost;
use crate::engine::DragEngine;
use crate::record::DraggableRecord;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Final report of a drag, as seen by one drop target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropOutcome<P, D> {
    /// Payload of the dragged item.
    pub draggable: P,
    /// Identity of the drop target.
    pub droppable: D,
    /// Whether the pointer was over this target when the drag ended.
    pub is_drop_target: bool,
    /// Whether the drag was aborted.
    pub cancelled: bool,
}

/// The application side of a drop target.
pub trait DropHandler<P, D> {
    /// Decide whether the target accepts the dragged payload.
    ///
    /// Called synchronously when a drag starts. Rejects by default.
    fn test_drop(&mut self, draggable: &P, droppable: &D) -> bool {
        let _ = (draggable, droppable);
        false
    }

    /// Receive the outcome once the drag ends.
    fn on_drop(&mut self, outcome: DropOutcome<P, D>);
}

struct TargetState<H: ElementHost, P, D> {
    host: Rc<H>,
    element: H::Element,
    identity: D,
    config: DropTargetConfig,
    handler: Box<dyn DropHandler<P, D>>,
    accepts: bool,
    dragging: bool,
    pointer_over: bool,
    hover_due: Option<Instant>,
}

impl<H: ElementHost, P: Clone, D: Clone> TargetState<H, P, D> {
    fn on_drag_start(&mut self, record: &DraggableRecord<H::Element, P>) {
        self.dragging = true;
        self.accepts = self.handler.test_drop(record.payload(), &self.identity);
        log::debug!("Drop target tested {}: accepts = {}", record.id(), self.accepts);
    }

    fn on_drag_end(&mut self, record: &DraggableRecord<H::Element, P>) {
        let outcome = DropOutcome {
            draggable: record.payload().clone(),
            droppable: self.identity.clone(),
            is_drop_target: self.pointer_over,
            cancelled: record.cancelled(),
        };
        self.handler.on_drop(outcome);

        self.dragging = false;
        self.accepts = false;
        self.pointer_over = false;
        self.hover_due = None;
        self.clear_classes();
    }

    fn apply_hover(&self) {
        let (show, hide) = if self.accepts {
            (&self.config.droppable_class, &self.config.not_droppable_class)
        } else {
            (&self.config.not_droppable_class, &self.config.droppable_class)
        };
        remove_classes(self.host.as_ref(), Some(&self.element), hide.as_deref());
        add_classes(self.host.as_ref(), Some(&self.element), show.as_deref());
    }

    fn clear_classes(&self) {
        let host = self.host.as_ref();
        remove_classes(host, Some(&self.element), self.config.droppable_class.as_deref());
        remove_classes(host, Some(&self.element), self.config.not_droppable_class.as_deref());
    }
}

/// A zone that may accept dragged payloads.
///
/// Holds its channel subscriptions until [`DropTarget::dispose`] is called or
/// the target is dropped.
pub struct DropTarget<H: ElementHost, P, D> {
    state: Rc<RefCell<TargetState<H, P, D>>>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl<H, P, D> DropTarget<H, P, D>
where
    H: ElementHost + 'static,
    H::Element: 'static,
    P: Clone + 'static,
    D: Clone + 'static,
{
    /// Create a detached drop target.
    pub fn new(
        host: Rc<H>,
        element: H::Element,
        identity: D,
        config: DropTargetConfig,
        handler: impl DropHandler<P, D> + 'static,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(TargetState {
                host,
                element,
                identity,
                config,
                handler: Box::new(handler),
                accepts: false,
                dragging: false,
                pointer_over: false,
                hover_due: None,
            })),
            subscriptions: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe to an engine's dragging and dropping channels.
    ///
    /// Re-attaching releases the previous subscriptions first.
    pub fn attach(&self, engine: &DragEngine<H, P>) {
        self.dispose();

        let weak: Weak<RefCell<TargetState<H, P, D>>> = Rc::downgrade(&self.state);
        let on_dragging = engine.dragging().subscribe(move |record| {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().on_drag_start(record);
            }
        });

        let weak = Rc::downgrade(&self.state);
        let on_dropping = engine.dropping().subscribe(move |record| {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().on_drag_end(record);
            }
        });

        let mut subscriptions = self.subscriptions.borrow_mut();
        subscriptions.push(on_dragging);
        subscriptions.push(on_dropping);
    }

    /// Release both subscriptions. Idempotent.
    pub fn dispose(&self) {
        let mut subscriptions = self.subscriptions.borrow_mut();
        for subscription in subscriptions.iter_mut() {
            subscription.unsubscribe();
        }
        subscriptions.clear();
    }

    pub fn is_attached(&self) -> bool {
        self.subscriptions
            .borrow()
            .iter()
            .any(Subscription::is_active)
    }

    /// Pointer entered the target's element.
    ///
    /// Ignored unless a drag is live. Hover classes appear after the
    /// configured delay.
    pub fn pointer_enter(&self, now: Instant) {
        let mut state = self.state.borrow_mut();
        if !state.dragging {
            return;
        }
        state.pointer_over = true;
        let delay = state.config.hover_delay();
        if delay.is_zero() {
            state.apply_hover();
        } else {
            state.hover_due = Some(now + delay);
        }
    }

    /// Pointer left the target's element.
    pub fn pointer_leave(&self) {
        let mut state = self.state.borrow_mut();
        state.pointer_over = false;
        state.hover_due = None;
        state.clear_classes();
    }

    /// Apply delayed hover classes once their delay elapsed.
    pub fn tick(&self, now: Instant) {
        let mut state = self.state.borrow_mut();
        if state.hover_due.is_some_and(|due| now >= due) {
            state.hover_due = None;
            state.apply_hover();
        }
    }

    /// Whether the handler accepted the current drag.
    pub fn accepts(&self) -> bool {
        self.state.borrow().accepts
    }

    pub fn is_pointer_over(&self) -> bool {
        self.state.borrow().pointer_over
    }

    /// Whether a drag is live from this target's point of view.
    pub fn is_dragging(&self) -> bool {
        self.state.borrow().dragging
    }

    pub fn identity(&self) -> D {
        self.state.borrow().identity.clone()
    }

    pub fn element(&self) -> H::Element {
        self.state.borrow().element.clone()
    }
}

impl<H: ElementHost, P, D> std::fmt::Debug for DropTarget<H, P, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("DropTarget")
            .field("element", &state.element)
            .field("accepts", &state.accepts)
            .field("dragging", &state.dragging)
            .field("pointer_over", &state.pointer_over)
            .field("subscriptions", &self.subscriptions.borrow().len())
            .finish()
    }
}
