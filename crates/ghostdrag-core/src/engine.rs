//! Drag coordination engine.
//!
//! The engine owns every tracked [`DraggableRecord`], the viewport reference,
//! pointer sampling, ghost elements, auto-scroll timers and the two broadcast
//! channels drop targets subscribe to:
//! - `dragging`: a record passed its start threshold and its ghost is live.
//! - `dropping`: a live drag ended, normally or through an abort path.
//!
//! It is a single-threaded state machine. Platform bindings feed it input
//! events and call [`DragEngine::tick`] so deadlines (move sampling, resize
//! debounce, auto-scroll) can fire.

use crate::channel::Channel;
use crate::classes::{add_classes, remove_classes};
use crate::config::{DragConfig, DragSourceConfig};
use crate::element::ElementHost;
use crate::input::{Listener, PointerButton};
use crate::record::{DraggableId, DraggableRecord, OriginEvent};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashSet;
use std::rc::Rc;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Channel carrying draggable records to drop targets.
pub type DragChannel<E, P> = Channel<DraggableRecord<E, P>>;

/// A repeating per-axis auto-scroll nudge.
#[derive(Debug, Clone, Copy)]
struct ScrollTimer {
    /// -1.0 towards the origin, 1.0 away from it.
    direction: f64,
    next_tick: Instant,
}

/// Coordinates pointer input, ghost elements and drop-target broadcasts.
pub struct DragEngine<H: ElementHost, P> {
    host: Rc<H>,
    config: DragConfig,
    /// Pending and active drags, in registration order.
    records: Vec<DraggableRecord<H::Element, P>>,
    viewport: Option<H::Element>,
    /// Cached bounding rectangle of the viewport.
    viewport_rect: Rect,
    /// Viewport cursor before the first drag started.
    saved_cursor: Option<String>,
    last_position: Point,
    last_delta: Vec2,
    armed: HashSet<Listener>,
    /// Latest move received while the sample window was closed.
    pending_move: Option<Point>,
    /// When the next move may be processed.
    sample_open_at: Option<Instant>,
    resize_due: Option<Instant>,
    scroll_x: Option<ScrollTimer>,
    scroll_y: Option<ScrollTimer>,
    dragging: DragChannel<H::Element, P>,
    dropping: DragChannel<H::Element, P>,
}

impl<H, P> DragEngine<H, P>
where
    H: ElementHost,
    H::Element: 'static,
    P: 'static,
{
    /// Create an idle engine with default configuration.
    pub fn new(host: Rc<H>) -> Self {
        Self::with_config(host, DragConfig::default())
    }

    pub fn with_config(host: Rc<H>, config: DragConfig) -> Self {
        Self {
            host,
            config,
            records: Vec::new(),
            viewport: None,
            viewport_rect: Rect::ZERO,
            saved_cursor: None,
            last_position: Point::ZERO,
            last_delta: Vec2::ZERO,
            armed: HashSet::new(),
            pending_move: None,
            sample_open_at: None,
            resize_due: None,
            scroll_x: None,
            scroll_y: None,
            dragging: Channel::new(),
            dropping: Channel::new(),
        }
    }

    // --- Accessors ---

    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    /// Channel fired when a record starts dragging.
    pub fn dragging(&self) -> DragChannel<H::Element, P> {
        self.dragging.clone()
    }

    /// Channel fired when a live drag ends.
    pub fn dropping(&self) -> DragChannel<H::Element, P> {
        self.dropping.clone()
    }

    pub fn records(&self) -> &[DraggableRecord<H::Element, P>] {
        &self.records
    }

    pub fn record(&self, id: DraggableId) -> Option<&DraggableRecord<H::Element, P>> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn viewport(&self) -> Option<&H::Element> {
        self.viewport.as_ref()
    }

    pub fn viewport_rect(&self) -> Rect {
        self.viewport_rect
    }

    /// Last processed pointer position.
    pub fn last_position(&self) -> Point {
        self.last_position
    }

    /// Displacement of the last processed move.
    pub fn last_delta(&self) -> Vec2 {
        self.last_delta
    }

    /// Check if any listener is armed.
    pub fn is_active(&self) -> bool {
        !self.armed.is_empty()
    }

    pub fn is_armed(&self, listener: Listener) -> bool {
        self.armed.contains(&listener)
    }

    pub fn armed_listeners(&self) -> impl Iterator<Item = Listener> + '_ {
        self.armed.iter().copied()
    }

    /// Current auto-scroll direction per axis (0.0 when idle).
    pub fn auto_scroll_direction(&self) -> Vec2 {
        Vec2::new(
            self.scroll_x.map_or(0.0, |t| t.direction),
            self.scroll_y.map_or(0.0, |t| t.direction),
        )
    }

    // --- Registration ---

    /// Resolve the viewport and cache its bounding rectangle.
    ///
    /// Falls back to the document root when the selector is absent or does not
    /// resolve.
    pub fn set_viewport(&mut self, selector: Option<&str>) {
        let resolved = selector.and_then(|s| self.host.resolve(s));
        let element = match resolved {
            Some(element) => element,
            None => {
                if let Some(selector) = selector {
                    log::warn!("Viewport '{}' not found, using document root", selector);
                }
                self.host.document_root()
            }
        };
        self.viewport_rect = self.host.bounding_rect(&element);
        self.viewport = Some(element);
    }

    /// Start tracking a pressed source element.
    ///
    /// The record only starts dragging once the pointer passes its threshold.
    /// Registering while another drag is tracked adds a second record sharing
    /// the same listeners.
    pub fn register_draggable(
        &mut self,
        origin: OriginEvent,
        source: H::Element,
        payload: P,
        config: &DragSourceConfig,
    ) -> DraggableId {
        self.set_viewport(config.viewport.as_deref());

        let record = DraggableRecord::new(
            source,
            payload,
            origin,
            config.dragged_class.clone(),
            config.dragging_class.clone(),
            config.start_threshold,
        );
        let id = record.id;
        self.records.push(record);
        self.last_position = origin.position;
        self.activate();

        log::debug!(
            "Registered draggable {} at ({}, {})",
            id,
            origin.position.x,
            origin.position.y
        );
        id
    }

    fn activate(&mut self) {
        self.armed.extend(Listener::ALL);
    }

    // --- Input ---

    /// Feed a pointer move. Moves are sampled: at most one is processed per
    /// sample interval and the latest of the rest is flushed by [`tick`].
    ///
    /// [`tick`]: DragEngine::tick
    pub fn pointer_move(&mut self, position: Point, now: Instant) {
        if !self.is_armed(Listener::ViewportMove) {
            log::trace!("Ignoring pointer move, engine inactive");
            return;
        }
        match self.sample_open_at {
            Some(open_at) if now < open_at => {
                self.pending_move = Some(position);
            }
            _ => {
                self.pending_move = None;
                self.sample_open_at = Some(now + self.config.sample_interval());
                self.handle_move(position, now);
            }
        }
    }

    /// Pointer released over the viewport. Ends the drag normally.
    pub fn viewport_pointer_up(&mut self) {
        if self.fire_once(Listener::ViewportUp) {
            self.deactivate(false);
        }
    }

    /// Button pressed over the viewport. Any non-primary button aborts.
    pub fn viewport_pointer_down(&mut self, button: PointerButton) {
        if button.is_primary() {
            return;
        }
        if self.fire_once(Listener::ViewportSecondaryDown) {
            self.deactivate(true);
        }
    }

    /// Pointer released anywhere in the window. Aborts.
    pub fn window_pointer_up(&mut self) {
        if self.fire_once(Listener::WindowUp) {
            self.deactivate(true);
        }
    }

    /// Key pressed. Aborts.
    pub fn window_key_down(&mut self) {
        if self.fire_once(Listener::WindowKeyDown) {
            self.deactivate(true);
        }
    }

    /// Window lost focus. Aborts.
    pub fn window_blur(&mut self) {
        if self.fire_once(Listener::WindowBlur) {
            self.deactivate(true);
        }
    }

    /// Window resized. The viewport is measured again once resizing settles.
    pub fn window_resized(&mut self, now: Instant) {
        if self.is_armed(Listener::WindowResize) {
            self.resize_due = Some(now + self.config.resize_debounce());
        }
    }

    /// Fire every deadline that has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(position) = self.pending_move {
            if self.sample_open_at.is_none_or(|open_at| now >= open_at) {
                self.pending_move = None;
                self.sample_open_at = Some(now + self.config.sample_interval());
                self.handle_move(position, now);
            }
        }

        if self.resize_due.is_some_and(|due| now >= due) {
            self.resize_due = None;
            if let Some(viewport) = &self.viewport {
                self.viewport_rect = self.host.bounding_rect(viewport);
                log::debug!("Viewport re-measured: {:?}", self.viewport_rect);
            }
        }

        self.tick_auto_scroll(now);
    }

    fn fire_once(&mut self, listener: Listener) -> bool {
        let armed = self.armed.remove(&listener);
        if !armed {
            log::trace!("Ignoring {:?}, listener not armed", listener);
        }
        armed
    }

    fn handle_move(&mut self, position: Point, now: Instant) {
        self.scroll_viewport_as_needed(position, now);
        if self.is_mouse_outside_viewport(position) {
            log::trace!("Ignoring move outside viewport");
            return;
        }

        let delta = position - self.last_position;
        if delta == Vec2::ZERO {
            return;
        }
        self.last_position = position;
        self.last_delta = delta;

        for index in 0..self.records.len() {
            let record = &self.records[index];
            if record.ended {
                continue;
            }
            if !record.is_dragging && !record.start_threshold_passed(position) {
                continue;
            }
            self.begin_drag_at(index);
            self.move_item_at(index, position);
        }
    }

    // --- Drag lifecycle ---

    /// Start dragging a record regardless of its threshold.
    /// No-op if it is already dragging or already ended.
    pub fn begin_item_drag(&mut self, id: DraggableId) {
        if let Some(index) = self.index_of(id) {
            self.begin_drag_at(index);
        }
    }

    /// End a live drag and broadcast it on the dropping channel.
    /// No-op if the record is not dragging.
    pub fn end_item_drag(&mut self, id: DraggableId, cancelled: bool) {
        if let Some(index) = self.index_of(id) {
            self.end_drag_at(index, cancelled);
        }
    }

    fn index_of(&self, id: DraggableId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    fn begin_drag_at(&mut self, index: usize) {
        let host = &self.host;
        let record = &mut self.records[index];
        if record.is_dragging || record.ended {
            return;
        }

        if record.ghost.is_none() {
            create_ghost(host.as_ref(), &self.config, record);
        }
        if let Some(ghost) = &record.ghost {
            host.set_style(ghost, "visibility", "visible");
        }
        add_classes(host.as_ref(), Some(&record.source), record.dragged_class.as_deref());
        add_classes(host.as_ref(), record.ghost.as_ref(), record.dragging_class.as_deref());
        record.is_dragging = true;
        record.cancelled = false;

        if let Some(viewport) = &self.viewport {
            if self.saved_cursor.is_none() {
                self.saved_cursor = Some(host.style(viewport, "cursor").unwrap_or_default());
            }
            host.set_style(viewport, "cursor", &self.config.drag_cursor);
        }

        log::debug!("Drag started for {}", record.id);
        self.dragging.emit(&self.records[index]);
    }

    fn move_item_at(&mut self, index: usize, pointer: Point) {
        let record = &mut self.records[index];
        let Some(grab_offset) = record.grab_offset else {
            return;
        };
        record.position = pointer - grab_offset;
        if let Some(ghost) = &record.ghost {
            self.host.set_style(ghost, "left", &px(record.position.x));
            self.host.set_style(ghost, "top", &px(record.position.y));
        }
    }

    fn end_drag_at(&mut self, index: usize, cancelled: bool) {
        let record = &mut self.records[index];
        if !record.is_dragging {
            return;
        }
        record.is_dragging = false;
        record.cancelled = cancelled;
        record.ended = true;

        log::debug!("Drag ended for {} (cancelled: {})", record.id, cancelled);
        self.dropping.emit(&self.records[index]);
    }

    /// Tear down every tracked drag.
    ///
    /// Disarms all listeners, ends each live drag (broadcasting it), strips
    /// the dragged classes, destroys ghosts, restores the viewport cursor and
    /// stops auto-scroll. Every end path funnels through here.
    pub fn deactivate(&mut self, cancelled: bool) {
        self.armed.clear();
        self.pending_move = None;
        self.sample_open_at = None;
        self.resize_due = None;

        for index in 0..self.records.len() {
            self.end_drag_at(index, cancelled);
        }

        let layer = self.host.ghost_layer();
        for record in &mut self.records {
            remove_classes(
                self.host.as_ref(),
                Some(&record.source),
                record.dragged_class.as_deref(),
            );
            if let Some(ghost) = record.ghost.take() {
                self.host.remove_child(&layer, &ghost);
            }
        }

        if let (Some(viewport), Some(cursor)) = (&self.viewport, self.saved_cursor.take()) {
            self.host.set_style(viewport, "cursor", &cursor);
        }

        if !self.records.is_empty() {
            log::debug!(
                "Deactivated {} draggable(s) (cancelled: {})",
                self.records.len(),
                cancelled
            );
        }
        self.records.clear();
        self.stop_auto_scroll();
    }

    // --- Viewport ---

    /// Check if a pointer position lies strictly outside the cached viewport.
    pub fn is_mouse_outside_viewport(&self, pointer: Point) -> bool {
        let rect = self.viewport_rect;
        pointer.x < rect.x0 || pointer.x > rect.x1 || pointer.y < rect.y0 || pointer.y > rect.y1
    }

    /// Restart auto-scroll timers for a pointer position.
    ///
    /// Each axis scrolls while the pointer sits on (or past) an edge of the
    /// viewport and there is room to scroll that way.
    pub fn scroll_viewport_as_needed(&mut self, pointer: Point, now: Instant) {
        self.stop_auto_scroll();
        let Some(viewport) = &self.viewport else {
            return;
        };

        let rect = self.viewport_rect;
        let bias = self.config.scroll_edge_bias;
        let offset = self.host.scroll_offset(viewport);
        let max = max_scroll_offset(self.host.as_ref(), viewport);

        self.scroll_x = edge_direction(pointer.x, rect.x0, rect.x1, bias, offset.x, max.x)
            .map(|direction| ScrollTimer { direction, next_tick: now });
        self.scroll_y = edge_direction(pointer.y, rect.y0, rect.y1, bias, offset.y, max.y)
            .map(|direction| ScrollTimer { direction, next_tick: now });
    }

    fn stop_auto_scroll(&mut self) {
        self.scroll_x = None;
        self.scroll_y = None;
    }

    fn tick_auto_scroll(&mut self, now: Instant) {
        let Some(viewport) = &self.viewport else {
            return;
        };
        if self.scroll_x.is_none() && self.scroll_y.is_none() {
            return;
        }

        let step = self.config.scroll_step;
        let interval = self.config.scroll_interval();
        let max = max_scroll_offset(self.host.as_ref(), viewport);
        let mut offset = self.host.scroll_offset(viewport);
        let before = offset;

        if let Some(timer) = self.scroll_x {
            if now >= timer.next_tick {
                match nudge(offset.x, timer.direction * step, max.x) {
                    Some(next) => {
                        offset.x = next;
                        self.scroll_x = Some(ScrollTimer { next_tick: now + interval, ..timer });
                    }
                    None => self.scroll_x = None,
                }
            }
        }
        if let Some(timer) = self.scroll_y {
            if now >= timer.next_tick {
                match nudge(offset.y, timer.direction * step, max.y) {
                    Some(next) => {
                        offset.y = next;
                        self.scroll_y = Some(ScrollTimer { next_tick: now + interval, ..timer });
                    }
                    None => self.scroll_y = None,
                }
            }
        }

        if offset != before {
            self.host.set_scroll_offset(viewport, offset);
        }
    }
}

impl<H: ElementHost, P> std::fmt::Debug for DragEngine<H, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragEngine")
            .field("records", &self.records.len())
            .field("viewport", &self.viewport)
            .field("viewport_rect", &self.viewport_rect)
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}

/// Build a hidden ghost for a record and fix its grab offset.
///
/// If the host cannot clone the source, the drag goes on without a ghost.
fn create_ghost<H: ElementHost, P>(
    host: &H,
    config: &DragConfig,
    record: &mut DraggableRecord<H::Element, P>,
) {
    let rect = host.bounding_rect(&record.source);
    record.grab_offset = Some(record.origin.position - rect.origin());
    record.position = rect.origin();

    let Some(ghost) = host.clone_element(&record.source) else {
        log::warn!("Could not clone source of {}, dragging without ghost", record.id);
        return;
    };

    host.set_style(&ghost, "position", "fixed");
    host.set_style(&ghost, "left", &px(rect.x0));
    host.set_style(&ghost, "top", &px(rect.y0));
    host.set_style(&ghost, "width", &px(rect.width()));
    host.set_style(&ghost, "height", &px(rect.height()));
    host.set_style(&ghost, "margin", "0");
    host.set_style(&ghost, "box-sizing", "border-box");
    host.set_style(&ghost, "z-index", &config.ghost_z_index.to_string());
    host.set_style(&ghost, "visibility", "hidden");
    host.set_style(&ghost, "pointer-events", "none");

    // Covers the clone's content; carries no behavior yet.
    if let Some(overlay) = host.create_element() {
        host.set_style(&overlay, "position", "absolute");
        host.set_style(&overlay, "left", "0");
        host.set_style(&overlay, "top", "0");
        host.set_style(&overlay, "width", "100%");
        host.set_style(&overlay, "height", "100%");
        host.append_child(&ghost, &overlay);
    }

    host.append_child(&host.ghost_layer(), &ghost);
    record.ghost = Some(ghost);
}

/// Largest scroll offset on each axis.
fn max_scroll_offset<H: ElementHost>(host: &H, viewport: &H::Element) -> Vec2 {
    let extent = host.scroll_extent(viewport);
    let client = host.client_size(viewport);
    Vec2::new(
        (extent.width - client.width).max(0.0),
        (extent.height - client.height).max(0.0),
    )
}

/// Scroll direction for one axis, if the pointer sits on an edge with room left.
fn edge_direction(
    coord: f64,
    near: f64,
    far: f64,
    bias: f64,
    offset: f64,
    max_offset: f64,
) -> Option<f64> {
    if coord <= near && offset > 0.0 {
        Some(-1.0)
    } else if coord >= far - bias && offset < max_offset {
        Some(1.0)
    } else {
        None
    }
}

/// Scroll offset after one nudge, or `None` when there is no room left.
fn nudge(offset: f64, step: f64, max_offset: f64) -> Option<f64> {
    let next = (offset + step).clamp(0.0, max_offset);
    (next != offset).then_some(next)
}

fn px(value: f64) -> String {
    format!("{}px", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BODY, FakeElement, FakeHost, ROOT};
    use kurbo::Size;
    use std::cell::RefCell;
    use std::time::Duration;

    type Engine = DragEngine<FakeHost, &'static str>;

    struct Fixture {
        host: Rc<FakeHost>,
        viewport: FakeElement,
        source: FakeElement,
        engine: Engine,
        t0: Instant,
    }

    impl Fixture {
        fn new() -> Self {
            crate::testing::init_logging();
            let host = Rc::new(FakeHost::new());
            let viewport = host.add_selectable("#board", Rect::new(0.0, 0.0, 400.0, 300.0));
            let source = host.add_element(Rect::new(40.0, 40.0, 80.0, 70.0));
            let engine = DragEngine::new(host.clone());
            Self {
                host,
                viewport,
                source,
                engine,
                t0: Instant::now(),
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }

        fn register(&mut self) -> DraggableId {
            let config = DragSourceConfig {
                viewport: Some("#board".to_string()),
                dragged_class: Some("dragged".to_string()),
                dragging_class: Some("ghost flying".to_string()),
                ..DragSourceConfig::default()
            };
            self.engine.register_draggable(
                OriginEvent::new(Point::new(50.0, 50.0), PointerButton::Primary),
                self.source,
                "card-1",
                &config,
            )
        }

        /// Register and move past the threshold.
        fn start_drag(&mut self) -> DraggableId {
            let id = self.register();
            self.engine.pointer_move(Point::new(61.0, 50.0), self.at(0));
            id
        }

        fn ghost(&self, id: DraggableId) -> Option<FakeElement> {
            self.engine.record(id).and_then(|r| r.ghost().copied())
        }
    }

    /// Records (is_dragging, cancelled) for every emission on a channel.
    fn recorder(
        channel: &DragChannel<FakeElement, &'static str>,
    ) -> (Rc<RefCell<Vec<(bool, bool)>>>, crate::channel::Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_sub = log.clone();
        let sub = channel.subscribe(move |r| {
            log_sub.borrow_mut().push((r.is_dragging(), r.cancelled()));
        });
        (log, sub)
    }

    #[test]
    fn test_registration_arms_listeners() {
        let mut fx = Fixture::new();
        let id = fx.register();

        assert!(fx.engine.is_active());
        for listener in Listener::ALL {
            assert!(fx.engine.is_armed(listener));
        }
        let record = fx.engine.record(id).unwrap();
        assert!(!record.is_dragging());
        assert_eq!(fx.engine.viewport(), Some(&fx.viewport));
        assert_eq!(fx.engine.viewport_rect(), Rect::new(0.0, 0.0, 400.0, 300.0));
    }

    #[test]
    fn test_threshold_gates_drag_start() {
        let mut fx = Fixture::new();
        let (started, _sub) = recorder(&fx.engine.dragging());
        let id = fx.register();

        fx.engine.pointer_move(Point::new(55.0, 53.0), fx.at(0));
        assert!(!fx.engine.record(id).unwrap().is_dragging());
        assert!(fx.ghost(id).is_none());
        assert!(started.borrow().is_empty());

        fx.engine.pointer_move(Point::new(61.0, 50.0), fx.at(20));
        let record = fx.engine.record(id).unwrap();
        assert!(record.is_dragging());
        let ghost = fx.ghost(id).unwrap();
        assert_eq!(fx.host.style(&ghost, "visibility").as_deref(), Some("visible"));
        assert_eq!(*started.borrow(), vec![(true, false)]);

        fx.engine.pointer_move(Point::new(70.0, 55.0), fx.at(40));
        assert_eq!(started.borrow().len(), 1);
    }

    #[test]
    fn test_ghost_construction() {
        let mut fx = Fixture::new();
        let id = fx.start_drag();
        let ghost = fx.ghost(id).unwrap();

        assert_eq!(fx.host.parent(&ghost), Some(BODY));
        assert_ne!(ghost, fx.source);
        assert_eq!(fx.host.style(&ghost, "position").as_deref(), Some("fixed"));
        assert_eq!(fx.host.style(&ghost, "width").as_deref(), Some("40px"));
        assert_eq!(fx.host.style(&ghost, "height").as_deref(), Some("30px"));
        assert_eq!(fx.host.style(&ghost, "z-index").as_deref(), Some("10000"));
        assert_eq!(fx.host.style(&ghost, "pointer-events").as_deref(), Some("none"));
        assert_eq!(fx.host.children(&ghost).len(), 1);

        assert!(fx.host.has_class(&fx.source, "dragged"));
        assert!(fx.host.has_class(&ghost, "ghost"));
        assert!(fx.host.has_class(&ghost, "flying"));
        assert_eq!(fx.host.style(&fx.viewport, "cursor").as_deref(), Some("move"));
    }

    #[test]
    fn test_ghost_follows_pointer_with_fixed_offset() {
        let mut fx = Fixture::new();
        let id = fx.start_drag();
        let offset = fx.engine.record(id).unwrap().grab_offset().unwrap();
        assert_eq!(offset, Vec2::new(10.0, 10.0));

        let pointers = [
            Point::new(61.0, 50.0),
            Point::new(120.0, 90.0),
            Point::new(52.0, 48.0),
        ];
        for (i, pointer) in pointers.into_iter().enumerate()
        {
            fx.engine.pointer_move(pointer, fx.at(20 * (i as u64 + 1)));
            let record = fx.engine.record(id).unwrap();
            assert_eq!(record.grab_offset(), Some(offset));
            assert_eq!(record.position(), pointer - offset);
        }

        let ghost = fx.ghost(id).unwrap();
        assert_eq!(fx.host.style(&ghost, "left").as_deref(), Some("42px"));
        assert_eq!(fx.host.style(&ghost, "top").as_deref(), Some("38px"));
    }

    #[test]
    fn test_end_item_drag_is_idempotent() {
        let mut fx = Fixture::new();
        let (dropped, _sub) = recorder(&fx.engine.dropping());
        let id = fx.start_drag();

        fx.engine.end_item_drag(id, false);
        fx.engine.end_item_drag(id, false);
        assert_eq!(*dropped.borrow(), vec![(false, false)]);

        // An ended record never starts again.
        fx.engine.begin_item_drag(id);
        assert!(!fx.engine.record(id).unwrap().is_dragging());
    }

    #[test]
    fn test_end_before_threshold_broadcasts_nothing() {
        let mut fx = Fixture::new();
        let (dropped, _sub) = recorder(&fx.engine.dropping());
        fx.register();

        fx.engine.viewport_pointer_up();
        assert!(dropped.borrow().is_empty());
        assert!(fx.engine.records().is_empty());
        assert!(!fx.engine.is_active());
    }

    #[test]
    fn test_records_cross_their_own_thresholds() {
        let mut fx = Fixture::new();
        let (started, _start_sub) = recorder(&fx.engine.dragging());
        let (dropped, _drop_sub) = recorder(&fx.engine.dropping());
        let first = fx.register();

        let second_source = fx.host.add_element(Rect::new(100.0, 40.0, 160.0, 70.0));
        let config = DragSourceConfig {
            viewport: Some("#board".to_string()),
            start_threshold: 30.0,
            ..DragSourceConfig::default()
        };
        let second = fx.engine.register_draggable(
            OriginEvent::new(Point::new(110.0, 50.0), PointerButton::Primary),
            second_source,
            "card-2",
            &config,
        );

        fx.engine.pointer_move(Point::new(125.0, 50.0), fx.at(0));
        assert!(fx.engine.record(first).unwrap().is_dragging());
        assert!(!fx.engine.record(second).unwrap().is_dragging());
        assert_eq!(started.borrow().len(), 1);

        fx.engine.pointer_move(Point::new(145.0, 50.0), fx.at(20));
        let dragging: Vec<bool> = fx.engine.records().iter().map(|r| r.is_dragging()).collect();
        assert_eq!(dragging, vec![true, true]);
        assert_eq!(*started.borrow(), vec![(true, false), (true, false)]);
        assert_eq!(
            fx.engine.record(second).unwrap().position(),
            Point::new(135.0, 40.0)
        );

        let ghosts = [fx.ghost(first).unwrap(), fx.ghost(second).unwrap()];
        fx.engine.viewport_pointer_up();
        assert_eq!(*dropped.borrow(), vec![(false, false), (false, false)]);
        for ghost in ghosts {
            assert_eq!(fx.host.parent(&ghost), None);
        }
        assert!(fx.engine.records().is_empty());
    }

    #[test]
    fn test_pointer_up_ends_normally() {
        let mut fx = Fixture::new();
        let (dropped, _sub) = recorder(&fx.engine.dropping());
        fx.start_drag();

        fx.engine.viewport_pointer_up();
        assert_eq!(*dropped.borrow(), vec![(false, false)]);
        assert!(!fx.engine.is_active());

        // Listeners are gone: the opposing button does nothing.
        fx.engine.viewport_pointer_down(PointerButton::Secondary);
        fx.engine.window_pointer_up();
        assert_eq!(dropped.borrow().len(), 1);
    }

    #[test]
    fn test_key_down_cancels() {
        let mut fx = Fixture::new();
        let (dropped, _sub) = recorder(&fx.engine.dropping());
        fx.start_drag();

        fx.engine.window_key_down();
        assert_eq!(*dropped.borrow(), vec![(false, true)]);
    }

    #[test]
    fn test_primary_press_does_not_abort() {
        let mut fx = Fixture::new();
        let id = fx.start_drag();

        fx.engine.viewport_pointer_down(PointerButton::Primary);
        assert!(fx.engine.is_armed(Listener::ViewportSecondaryDown));
        assert!(fx.engine.record(id).unwrap().is_dragging());

        fx.engine.viewport_pointer_down(PointerButton::Auxiliary);
        assert!(fx.engine.records().is_empty());
    }

    #[test]
    fn test_every_end_path_tears_down() {
        let paths: [(fn(&mut Engine), bool); 5] = [
            (|e| e.viewport_pointer_up(), false),
            (|e| e.viewport_pointer_down(PointerButton::Secondary), true),
            (|e| e.window_pointer_up(), true),
            (|e| e.window_key_down(), true),
            (|e| e.window_blur(), true),
        ];

        for (end, expect_cancelled) in paths {
            let mut fx = Fixture::new();
            fx.host.set_style(&fx.viewport, "cursor", "crosshair");
            let (dropped, _sub) = recorder(&fx.engine.dropping());
            let id = fx.start_drag();
            let ghost = fx.ghost(id).unwrap();

            end(&mut fx.engine);

            assert_eq!(*dropped.borrow(), vec![(false, expect_cancelled)]);
            assert_eq!(fx.host.parent(&ghost), None);
            assert!(!fx.host.children(&BODY).contains(&ghost));
            assert!(!fx.host.has_class(&fx.source, "dragged"));
            assert_eq!(fx.host.style(&fx.viewport, "cursor").as_deref(), Some("crosshair"));
            assert!(fx.engine.records().is_empty());
            assert_eq!(fx.engine.armed_listeners().count(), 0);
            assert_eq!(fx.engine.auto_scroll_direction(), Vec2::ZERO);
        }
    }

    #[test]
    fn test_moves_outside_viewport_are_ignored() {
        let mut fx = Fixture::new();
        let id = fx.start_drag();
        let before = fx.engine.record(id).unwrap().position();

        fx.engine.pointer_move(Point::new(450.0, 100.0), fx.at(20));
        assert_eq!(fx.engine.record(id).unwrap().position(), before);
        assert_eq!(fx.engine.last_position(), Point::new(61.0, 50.0));
        assert!(fx.engine.record(id).unwrap().is_dragging());
    }

    #[test]
    fn test_outside_viewport_bounds() {
        let mut fx = Fixture::new();
        fx.register();

        assert!(!fx.engine.is_mouse_outside_viewport(Point::new(0.0, 0.0)));
        assert!(!fx.engine.is_mouse_outside_viewport(Point::new(400.0, 300.0)));
        assert!(fx.engine.is_mouse_outside_viewport(Point::new(-0.5, 10.0)));
        assert!(fx.engine.is_mouse_outside_viewport(Point::new(10.0, 300.5)));
        assert!(fx.engine.is_mouse_outside_viewport(Point::new(401.0, 10.0)));
        assert!(fx.engine.is_mouse_outside_viewport(Point::new(10.0, -1.0)));
    }

    #[test]
    fn test_zero_displacement_is_ignored() {
        let mut fx = Fixture::new();
        fx.start_drag();
        let delta = fx.engine.last_delta();
        assert_eq!(delta, Vec2::new(11.0, 0.0));

        fx.engine.pointer_move(Point::new(61.0, 50.0), fx.at(20));
        assert_eq!(fx.engine.last_delta(), delta);
    }

    #[test]
    fn test_moves_are_sampled() {
        let mut fx = Fixture::new();
        let id = fx.start_drag();

        fx.engine.pointer_move(Point::new(80.0, 60.0), fx.at(5));
        fx.engine.pointer_move(Point::new(90.0, 70.0), fx.at(10));
        assert_eq!(fx.engine.last_position(), Point::new(61.0, 50.0));

        fx.engine.tick(fx.at(12));
        assert_eq!(fx.engine.last_position(), Point::new(61.0, 50.0));

        fx.engine.tick(fx.at(16));
        assert_eq!(fx.engine.last_position(), Point::new(90.0, 70.0));
        assert_eq!(fx.engine.record(id).unwrap().position(), Point::new(80.0, 60.0));
    }

    #[test]
    fn test_auto_scroll_near_edges() {
        let mut fx = Fixture::new();
        fx.host.set_extent(&fx.viewport, Size::new(800.0, 900.0));
        fx.start_drag();

        fx.engine.pointer_move(Point::new(399.0, 150.0), fx.at(20));
        assert_eq!(fx.engine.auto_scroll_direction(), Vec2::new(1.0, 0.0));

        fx.engine.tick(fx.at(21));
        fx.engine.tick(fx.at(22));
        assert_eq!(fx.host.scroll_offset(&fx.viewport), Vec2::new(2.0, 0.0));

        // Bottom-left corner: left has room now, bottom always had.
        fx.engine.pointer_move(Point::new(0.0, 300.0), fx.at(40));
        assert_eq!(fx.engine.auto_scroll_direction(), Vec2::new(-1.0, 1.0));
        fx.engine.tick(fx.at(41));
        assert_eq!(fx.host.scroll_offset(&fx.viewport), Vec2::new(1.0, 1.0));

        // Back to the middle: timers stop.
        fx.engine.pointer_move(Point::new(200.0, 150.0), fx.at(60));
        assert_eq!(fx.engine.auto_scroll_direction(), Vec2::ZERO);
        fx.engine.tick(fx.at(61));
        assert_eq!(fx.host.scroll_offset(&fx.viewport), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_auto_scroll_needs_room() {
        let mut fx = Fixture::new();
        fx.host.set_extent(&fx.viewport, Size::new(401.0, 300.0));
        fx.start_drag();

        fx.engine.pointer_move(Point::new(0.0, 150.0), fx.at(20));
        assert_eq!(fx.engine.auto_scroll_direction(), Vec2::ZERO);

        fx.engine.pointer_move(Point::new(400.0, 150.0), fx.at(40));
        fx.engine.tick(fx.at(41));
        fx.engine.tick(fx.at(42));
        fx.engine.tick(fx.at(43));
        assert_eq!(fx.host.scroll_offset(&fx.viewport), Vec2::new(1.0, 0.0));
        assert_eq!(fx.engine.auto_scroll_direction(), Vec2::ZERO);
    }

    #[test]
    fn test_resize_is_debounced() {
        let mut fx = Fixture::new();
        fx.register();
        fx.host.set_rect(&fx.viewport, Rect::new(0.0, 0.0, 200.0, 100.0));

        fx.engine.window_resized(fx.at(0));
        fx.engine.window_resized(fx.at(50));
        fx.engine.tick(fx.at(120));
        assert_eq!(fx.engine.viewport_rect(), Rect::new(0.0, 0.0, 400.0, 300.0));

        fx.engine.tick(fx.at(150));
        assert_eq!(fx.engine.viewport_rect(), Rect::new(0.0, 0.0, 200.0, 100.0));
    }

    #[test]
    fn test_unresolved_viewport_falls_back_to_root() {
        let mut fx = Fixture::new();
        fx.engine.set_viewport(Some("#missing"));
        assert_eq!(fx.engine.viewport(), Some(&ROOT));

        fx.engine.set_viewport(None);
        assert_eq!(fx.engine.viewport(), Some(&ROOT));
        assert_eq!(fx.engine.viewport_rect(), Rect::new(0.0, 0.0, 1024.0, 768.0));
    }

    #[test]
    fn test_inactive_engine_ignores_input() {
        let mut fx = Fixture::new();
        fx.engine.pointer_move(Point::new(100.0, 100.0), fx.at(0));
        fx.engine.window_key_down();
        fx.engine.tick(fx.at(100));
        assert!(fx.engine.records().is_empty());
        assert_eq!(fx.engine.last_position(), Point::ZERO);
    }
}
