//! Drives a [`DragEngine`] from live DOM events.
//!
//! The controller owns one closure per engine listener. A closure is added to
//! the viewport or window while the engine arms its listener and removed as
//! soon as the listener is disarmed, so repeated drags never stack duplicate
//! handlers. While the engine is active an interval timer calls
//! [`DragEngine::tick`] and advances drop target hover delays.

use crate::bindings::{DomDragSource, DomDropTarget};
use crate::events::{EventScope, chorded_press, client_point, dom_event, tick_interval_ms};
use crate::host::WebHost;
use ghostdrag_core::{
    DragConfig, DragEngine, DragError, DragResult, DragSourceConfig, DropHandler, DropTarget,
    DropTargetConfig, Listener, PointerButton,
};
use kurbo::Vec2;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, EventTarget, HtmlElement, MouseEvent, Window};
use web_time::Instant;

/// Something that needs the drag clock while a drag is live.
pub(crate) trait HoverClock {
    fn advance(&self, now: Instant);
}

impl<P: Clone + 'static, D: Clone + 'static> HoverClock for DropTarget<WebHost, P, D> {
    fn advance(&self, now: Instant) {
        self.tick(now);
    }
}

/// Handle and period of the running tick timer.
#[derive(Debug, Clone, Copy)]
struct Ticking {
    handle: i32,
    period_ms: i32,
}

/// One engine listener and the DOM object it is currently added to.
struct Binding {
    listener: Listener,
    closure: Closure<dyn FnMut(Event)>,
    attached_to: Option<EventTarget>,
}

impl Binding {
    fn attach(&mut self, target: EventTarget) {
        let (_, event) = dom_event(self.listener);
        let callback: &js_sys::Function = self.closure.as_ref().unchecked_ref();
        match target.add_event_listener_with_callback(event, callback) {
            Ok(()) => self.attached_to = Some(target),
            Err(err) => log::warn!("Failed to listen for {event}: {err:?}"),
        }
    }

    fn detach(&mut self) {
        if let Some(target) = self.attached_to.take() {
            let (_, event) = dom_event(self.listener);
            let _ = target
                .remove_event_listener_with_callback(event, self.closure.as_ref().unchecked_ref());
        }
    }
}

pub(crate) struct Shared<P: 'static> {
    engine: RefCell<DragEngine<WebHost, P>>,
    window: Window,
    bindings: RefCell<Vec<Binding>>,
    clocks: RefCell<Vec<Weak<dyn HoverClock>>>,
    ticker: Closure<dyn FnMut()>,
    interval: Cell<Option<Ticking>>,
}

impl<P: Clone + 'static> Shared<P> {
    /// Run `f` against the engine, then bring DOM listeners in line with it.
    ///
    /// Returns `None` when the engine is already borrowed, which happens if a
    /// drop handler calls back into the controller mid-broadcast.
    pub(crate) fn with_engine<R>(
        &self,
        f: impl FnOnce(&mut DragEngine<WebHost, P>) -> R,
    ) -> Option<R> {
        let result = {
            let Ok(mut engine) = self.engine.try_borrow_mut() else {
                log::warn!("Drag engine is busy, ignoring re-entrant call");
                return None;
            };
            f(&mut engine)
        };
        self.sync();
        Some(result)
    }

    pub(crate) fn add_clock(&self, clock: Weak<dyn HoverClock>) {
        self.clocks.borrow_mut().push(clock);
    }

    fn dispatch(&self, listener: Listener, event: &Event) {
        let now = Instant::now();
        let pointer = event.dyn_ref::<MouseEvent>();
        self.with_engine(|engine| match listener {
            Listener::ViewportMove => {
                let Some(pointer) = pointer else {
                    return;
                };
                // A second button pressed mid-drag arrives as a move.
                if let Some(button) = chorded_press(pointer.button(), pointer.buttons()) {
                    engine.viewport_pointer_down(button);
                } else {
                    engine.pointer_move(client_point(pointer.client_x(), pointer.client_y()), now);
                }
            }
            Listener::ViewportUp => engine.viewport_pointer_up(),
            Listener::ViewportSecondaryDown => {
                if let Some(pointer) = pointer {
                    engine.viewport_pointer_down(PointerButton::from_dom(pointer.button()));
                }
            }
            Listener::WindowUp => engine.window_pointer_up(),
            Listener::WindowKeyDown => engine.window_key_down(),
            Listener::WindowBlur => engine.window_blur(),
            Listener::WindowResize => engine.window_resized(now),
        });
    }

    fn tick(&self) {
        let now = Instant::now();
        self.with_engine(|engine| engine.tick(now));

        let mut clocks = self.clocks.borrow_mut();
        clocks.retain(|clock| match clock.upgrade() {
            Some(clock) => {
                clock.advance(now);
                true
            }
            None => false,
        });
    }

    /// Match attached DOM listeners and the tick timer to the engine state.
    fn sync(&self) {
        let Ok(engine) = self.engine.try_borrow() else {
            return;
        };
        let viewport: Option<EventTarget> = engine
            .viewport()
            .map(|el| AsRef::<EventTarget>::as_ref(el).clone());
        let window: &EventTarget = self.window.as_ref();

        for binding in self.bindings.borrow_mut().iter_mut() {
            if !engine.is_armed(binding.listener) {
                binding.detach();
                continue;
            }
            let wanted = match dom_event(binding.listener).0 {
                EventScope::Viewport => viewport.clone(),
                EventScope::Window => Some(window.clone()),
            };
            if binding.attached_to != wanted {
                binding.detach();
                if let Some(target) = wanted {
                    binding.attach(target);
                }
            }
        }

        let active = engine.is_active();
        let scrolling = engine.auto_scroll_direction() != Vec2::ZERO;
        let period_ms = tick_interval_ms(engine.config(), scrolling);
        drop(engine);

        if active {
            self.start_ticking(period_ms);
        } else {
            self.stop_ticking();
        }
    }

    /// Run the tick timer at `period_ms`, restarting it if the period changed.
    fn start_ticking(&self, period_ms: i32) {
        match self.interval.get() {
            Some(ticking) if ticking.period_ms == period_ms => return,
            Some(_) => self.stop_ticking(),
            None => {}
        }
        let callback: &js_sys::Function = self.ticker.as_ref().unchecked_ref();
        match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(callback, period_ms)
        {
            Ok(handle) => self.interval.set(Some(Ticking { handle, period_ms })),
            Err(err) => log::warn!("Failed to start drag timer: {err:?}"),
        }
    }

    fn stop_ticking(&self) {
        if let Some(ticking) = self.interval.take() {
            self.window.clear_interval_with_handle(ticking.handle);
        }
    }
}

impl<P: 'static> Drop for Shared<P> {
    fn drop(&mut self) {
        if let Some(ticking) = self.interval.take() {
            self.window.clear_interval_with_handle(ticking.handle);
        }
        for binding in self.bindings.get_mut().iter_mut() {
            binding.detach();
        }
    }
}

/// Browser front end for a drag engine.
///
/// Create one per page, then bind sources and targets through it.
pub struct WebDragController<P: 'static> {
    shared: Rc<Shared<P>>,
}

impl<P: Clone + 'static> WebDragController<P> {
    /// Create a controller over the current document with default settings.
    pub fn new() -> DragResult<Self> {
        Self::with_config(DragConfig::default())
    }

    pub fn with_config(config: DragConfig) -> DragResult<Self> {
        let host = Rc::new(WebHost::new()?);
        let window = web_sys::window().ok_or(DragError::NoWindow)?;

        let shared = Rc::new_cyclic(|weak: &Weak<Shared<P>>| {
            let bindings = Listener::ALL
                .iter()
                .map(|&listener| {
                    let weak = weak.clone();
                    let closure = Closure::wrap(Box::new(move |event: Event| {
                        if let Some(shared) = weak.upgrade() {
                            shared.dispatch(listener, &event);
                        }
                    }) as Box<dyn FnMut(Event)>);
                    Binding {
                        listener,
                        closure,
                        attached_to: None,
                    }
                })
                .collect();

            let weak = weak.clone();
            let ticker = Closure::wrap(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.tick();
                }
            }) as Box<dyn FnMut()>);

            Shared {
                engine: RefCell::new(DragEngine::with_config(host, config)),
                window,
                bindings: RefCell::new(bindings),
                clocks: RefCell::new(Vec::new()),
                ticker,
                interval: Cell::new(None),
            }
        });

        log::info!("Drag controller ready");
        Ok(Self { shared })
    }

    /// Run `f` against the engine and resync DOM listeners afterwards.
    ///
    /// Returns `None` if called from inside an engine broadcast.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut DragEngine<WebHost, P>) -> R) -> Option<R> {
        self.shared.with_engine(f)
    }

    pub fn is_active(&self) -> bool {
        self.shared
            .engine
            .try_borrow()
            .is_ok_and(|engine| engine.is_active())
    }

    /// Make `element` draggable, carrying `payload` to drop targets.
    pub fn bind_source(
        &self,
        element: HtmlElement,
        payload: P,
        config: DragSourceConfig,
    ) -> DragResult<DomDragSource<P>> {
        DomDragSource::bind(Rc::downgrade(&self.shared), element, payload, config)
    }

    /// Turn `element` into a drop target known to the handler as `identity`.
    pub fn bind_target<D: Clone + 'static>(
        &self,
        element: HtmlElement,
        identity: D,
        config: DropTargetConfig,
        handler: impl DropHandler<P, D> + 'static,
    ) -> DragResult<DomDropTarget<P, D>> {
        let host = self
            .shared
            .engine
            .try_borrow()
            .map(|engine| engine.host().clone())
            .map_err(|_| DragError::Dom("drag engine is busy".to_string()))?;
        let target = Rc::new(DropTarget::new(host, element.clone(), identity, config, handler));
        if let Ok(engine) = self.shared.engine.try_borrow() {
            target.attach(&engine);
        }
        let clock: Rc<dyn HoverClock> = target.clone();
        self.shared.add_clock(Rc::downgrade(&clock));
        DomDropTarget::bind(element, target)
    }
}

impl<P: 'static> std::fmt::Debug for WebDragController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDragController")
            .field("ticking", &self.shared.interval.get().is_some())
            .finish_non_exhaustive()
    }
}
