//! DOM listeners for drag sources and drop targets.

use crate::controller::Shared;
use crate::events::{SOURCE_NATIVE_DRAG, SOURCE_PRESS, TARGET_ENTER, TARGET_LEAVE, client_point};
use crate::host::WebHost;
use ghostdrag_core::{
    DragError, DragResult, DragSource, DragSourceConfig, DropTarget, PointerButton,
    PointerDownResponse,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, HtmlElement, MouseEvent};
use web_time::Instant;

type Handler = Closure<dyn FnMut(Event)>;

fn listen(element: &HtmlElement, event: &str, handler: &Handler) -> DragResult<()> {
    element
        .add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
        .map_err(|err| DragError::Dom(format!("failed to listen for {event}: {err:?}")))
}

fn unlisten(element: &HtmlElement, event: &str, handler: &Handler) {
    let _ = element.remove_event_listener_with_callback(event, handler.as_ref().unchecked_ref());
}

/// A draggable DOM element. Listeners are removed when this is dropped.
pub struct DomDragSource<P: 'static> {
    element: HtmlElement,
    source: Rc<RefCell<DragSource<HtmlElement, P>>>,
    on_press: Handler,
    on_native_drag: Handler,
}

impl<P: Clone + 'static> DomDragSource<P> {
    pub(crate) fn bind(
        shared: Weak<Shared<P>>,
        element: HtmlElement,
        payload: P,
        config: DragSourceConfig,
    ) -> DragResult<Self> {
        let source = Rc::new(RefCell::new(DragSource::with_config(
            element.clone(),
            payload,
            config,
        )));

        let pressed = source.clone();
        let on_press = Closure::wrap(Box::new(move |event: Event| {
            let (Some(shared), Some(pointer)) = (shared.upgrade(), event.dyn_ref::<MouseEvent>())
            else {
                return;
            };
            let button = PointerButton::from_dom(pointer.button());
            let position = client_point(pointer.client_x(), pointer.client_y());
            let Some(response) = shared
                .with_engine(|engine| pressed.borrow().pointer_down(engine, button, position))
            else {
                return;
            };
            if let PointerDownResponse::Registered {
                prevent_default,
                stop_propagation,
                ..
            } = response
            {
                if prevent_default {
                    event.prevent_default();
                }
                if stop_propagation {
                    event.stop_propagation();
                }
            }
        }) as Box<dyn FnMut(Event)>);

        let on_native_drag = Closure::wrap(Box::new(move |event: Event| {
            event.prevent_default();
        }) as Box<dyn FnMut(Event)>);

        listen(&element, SOURCE_PRESS, &on_press)?;
        if let Err(err) = listen(&element, SOURCE_NATIVE_DRAG, &on_native_drag) {
            unlisten(&element, SOURCE_PRESS, &on_press);
            return Err(err);
        }

        Ok(Self {
            element,
            source,
            on_press,
            on_native_drag,
        })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    /// Payload for the next drag.
    pub fn payload(&self) -> P {
        self.source.borrow().payload().clone()
    }

    pub fn set_payload(&self, payload: P) {
        self.source.borrow_mut().set_payload(payload);
    }

    pub fn config(&self) -> DragSourceConfig {
        self.source.borrow().config().clone()
    }

    pub fn set_config(&self, config: DragSourceConfig) {
        *self.source.borrow_mut().config_mut() = config;
    }
}

impl<P: 'static> Drop for DomDragSource<P> {
    fn drop(&mut self) {
        unlisten(&self.element, SOURCE_PRESS, &self.on_press);
        unlisten(&self.element, SOURCE_NATIVE_DRAG, &self.on_native_drag);
    }
}

/// A DOM drop zone. Drop it to stop listening and release its subscriptions.
pub struct DomDropTarget<P: 'static, D: 'static> {
    element: HtmlElement,
    target: Rc<DropTarget<WebHost, P, D>>,
    on_enter: Handler,
    on_leave: Handler,
}

impl<P: Clone + 'static, D: Clone + 'static> DomDropTarget<P, D> {
    pub(crate) fn bind(
        element: HtmlElement,
        target: Rc<DropTarget<WebHost, P, D>>,
    ) -> DragResult<Self> {
        let entered = target.clone();
        let on_enter = Closure::wrap(Box::new(move |_: Event| {
            entered.pointer_enter(Instant::now());
        }) as Box<dyn FnMut(Event)>);

        let left = target.clone();
        let on_leave = Closure::wrap(Box::new(move |_: Event| {
            left.pointer_leave();
        }) as Box<dyn FnMut(Event)>);

        listen(&element, TARGET_ENTER, &on_enter)?;
        if let Err(err) = listen(&element, TARGET_LEAVE, &on_leave) {
            unlisten(&element, TARGET_ENTER, &on_enter);
            return Err(err);
        }

        Ok(Self {
            element,
            target,
            on_enter,
            on_leave,
        })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    /// The engine-side target, for inspecting negotiation state.
    pub fn target(&self) -> &DropTarget<WebHost, P, D> {
        &self.target
    }
}

impl<P: 'static, D: 'static> Drop for DomDropTarget<P, D> {
    fn drop(&mut self) {
        unlisten(&self.element, TARGET_ENTER, &self.on_enter);
        unlisten(&self.element, TARGET_LEAVE, &self.on_leave);
    }
}
