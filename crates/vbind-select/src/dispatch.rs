//! Pointer dispatch: raw pointer events → per-record selection handlers.
//!
//! Every event is mapped to world space through the camera, hit-tested
//! against each selection subscribed to that event type, and forwarded to
//! the matching records' handlers. Moves also synthesize hover-leave for
//! the previous move's matches, pan the camera when dragging empty space,
//! and feed the lasso gesture while its button is held.
//!
//! The dispatcher never holds a borrow of its own state or of a selection
//! while a handler runs, so handlers may mutate selections, subscribe new
//! ones, or replace lasso callbacks.

use crate::input::{PointerButton, PointerEvent};
use kurbo::Point;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use vbind_core::EventKind;
use vbind_render::hit::HitList;
use vbind_render::{Backend, OrthoCamera};

/// Stable identity of a selection, used to de-duplicate subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionId(pub(crate) usize);

/// What the dispatcher and context need from a selection, independent of
/// its record type.
pub(crate) trait Target {
    fn id(&self) -> SelectionId;
    /// Record indices under world point `p`.
    fn hit(&self, p: Point) -> HitList;
    /// Invoke the handler for `kind` on record `index`, if both exist.
    fn fire(&self, kind: EventKind, index: usize, event: &PointerEvent);
    fn is_dirty(&self) -> bool;
    fn flush(&self, backend: &mut dyn Backend);
    fn detach(&self, backend: &mut dyn Backend);
}

/// Lasso gesture phases a callback can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LassoEvent {
    Start,
    Move,
    End,
}

impl LassoEvent {
    fn index(&self) -> usize {
        *self as usize
    }
}

/// Receives the lasso path accumulated so far, in world coordinates.
pub type LassoHandler = Rc<dyn Fn(&[Point])>;

/// Interaction toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub zoom: bool,
    pub pan: bool,
    pub horizontal_pan: bool,
    pub lasso: bool,
    pub lasso_button: PointerButton,
}

const EVENT_KINDS: usize = 6;

pub(crate) struct Dispatcher {
    subscribers: RefCell<[Vec<Rc<dyn Target>>; EVENT_KINDS]>,
    /// Matches from the previous move, for the next move's leave pass.
    last_intersected: RefCell<Vec<(Rc<dyn Target>, HitList)>>,
    pointer: Cell<Point>,
    pointer_down: Cell<bool>,
    drag_origin: Cell<Point>,
    camera_start: Cell<Point>,
    lasso_points: RefCell<Vec<Point>>,
    lasso_active: Cell<bool>,
    lasso_handlers: RefCell<[Option<LassoHandler>; 3]>,
    interaction: Cell<Interaction>,
}

impl Dispatcher {
    pub fn new(interaction: Interaction) -> Self {
        Self {
            subscribers: RefCell::default(),
            last_intersected: RefCell::default(),
            pointer: Cell::new(Point::ZERO),
            pointer_down: Cell::new(false),
            drag_origin: Cell::new(Point::ZERO),
            camera_start: Cell::new(Point::ZERO),
            lasso_points: RefCell::default(),
            lasso_active: Cell::new(false),
            lasso_handlers: RefCell::default(),
            interaction: Cell::new(interaction),
        }
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction.get()
    }

    pub fn update(&self, f: impl FnOnce(&mut Interaction)) {
        let mut i = self.interaction.get();
        f(&mut i);
        self.interaction.set(i);
    }

    /// World position of the last pointer event.
    pub fn pointer(&self) -> Point {
        self.pointer.get()
    }

    pub fn is_pointer_down(&self) -> bool {
        self.pointer_down.get()
    }

    pub fn is_lassoing(&self) -> bool {
        self.lasso_active.get()
    }

    pub fn lasso_points(&self) -> Vec<Point> {
        self.lasso_points.borrow().clone()
    }

    // ─── Subscriptions ───────────────────────────────────────────────────

    /// Subscribe `target` to `kind`. Returns `false` if it already was.
    pub fn subscribe(&self, kind: EventKind, target: Rc<dyn Target>) -> bool {
        let mut subs = self.subscribers.borrow_mut();
        let list = &mut subs[kind.index()];
        if list.iter().any(|t| t.id() == target.id()) {
            return false;
        }
        list.push(target);
        true
    }

    /// Drop every subscription and pending leave for `id`.
    pub fn unsubscribe(&self, id: SelectionId) {
        for list in self.subscribers.borrow_mut().iter_mut() {
            list.retain(|t| t.id() != id);
        }
        self.last_intersected.borrow_mut().retain(|(t, _)| t.id() != id);
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.borrow()[kind.index()].len()
    }

    fn snapshot(&self, kind: EventKind) -> Vec<Rc<dyn Target>> {
        self.subscribers.borrow()[kind.index()].clone()
    }

    pub fn set_lasso_handler(&self, event: LassoEvent, handler: LassoHandler) {
        self.lasso_handlers.borrow_mut()[event.index()] = Some(handler);
    }

    fn fire_lasso(&self, event: LassoEvent) {
        let handler = self.lasso_handlers.borrow()[event.index()].clone();
        if let Some(handler) = handler {
            let points = self.lasso_points();
            handler(&points);
        }
    }

    // ─── Raw events ──────────────────────────────────────────────────────

    fn locate(&self, camera: &RefCell<OrthoCamera>, event: &PointerEvent) -> Point {
        let world = camera.borrow().screen_to_world(event.screen());
        self.pointer.set(world);
        world
    }

    fn lasso_held(&self, event: &PointerEvent) -> bool {
        let i = self.interaction.get();
        i.lasso && event.is_held(i.lasso_button)
    }

    fn start_lasso(&self, world: Point) {
        {
            let mut points = self.lasso_points.borrow_mut();
            points.clear();
            points.push(world);
        }
        self.lasso_active.set(true);
        self.fire_lasso(LassoEvent::Start);
    }

    /// Hit-test every `kind` subscriber and fire per match.
    /// Returns whether anything matched.
    fn dispatch(&self, kind: EventKind, world: Point, event: &PointerEvent) -> bool {
        let mut any = false;
        for target in self.snapshot(kind) {
            let hits = target.hit(world);
            any |= !hits.is_empty();
            for &i in &hits {
                target.fire(kind, i, event);
            }
        }
        any
    }

    /// Handle a move. Returns `true` if the camera panned.
    pub fn pointer_move(&self, camera: &RefCell<OrthoCamera>, event: &PointerEvent) -> bool {
        let world = self.locate(camera, event);

        if self.lasso_held(event) {
            if self.lasso_active.get() {
                self.lasso_points.borrow_mut().push(world);
                self.fire_lasso(LassoEvent::Move);
            } else {
                // Press happened elsewhere or lasso was just enabled.
                self.start_lasso(world);
            }
            return false;
        }

        let previous = std::mem::take(&mut *self.last_intersected.borrow_mut());
        for (target, hits) in &previous {
            for &i in hits {
                target.fire(EventKind::HoverLeave, i, event);
            }
        }

        let mut intersected = Vec::new();
        let mut any = false;
        let entering = self.snapshot(EventKind::HoverEnter);
        for target in &entering {
            let hits = target.hit(world);
            if hits.is_empty() {
                continue;
            }
            any = true;
            for &i in &hits {
                target.fire(EventKind::HoverEnter, i, event);
            }
            intersected.push((Rc::clone(target), hits));
        }
        // Leave-only subscribers still need to know what they are over.
        for target in self.snapshot(EventKind::HoverLeave) {
            if entering.iter().any(|t| t.id() == target.id()) {
                continue;
            }
            let hits = target.hit(world);
            if !hits.is_empty() {
                intersected.push((target, hits));
            }
        }
        self.last_intersected.borrow_mut().extend(intersected);

        any |= self.dispatch(EventKind::HoverMove, world, event);

        let i = self.interaction.get();
        if !any && self.pointer_down.get() && i.pan {
            let offset = event.screen() - self.drag_origin.get();
            camera
                .borrow_mut()
                .pan_from(self.camera_start.get(), offset, i.horizontal_pan);
            return true;
        }
        false
    }

    pub fn pointer_press(&self, camera: &RefCell<OrthoCamera>, event: &PointerEvent) {
        let world = self.locate(camera, event);
        self.drag_origin.set(event.screen());
        self.camera_start.set(camera.borrow().position);
        self.pointer_down.set(true);

        self.dispatch(EventKind::Press, world, event);

        if self.lasso_held(event) {
            self.start_lasso(world);
        } else {
            let mut points = self.lasso_points.borrow_mut();
            points.clear();
            points.push(world);
        }
    }

    pub fn pointer_release(&self, camera: &RefCell<OrthoCamera>, event: &PointerEvent) {
        let world = self.locate(camera, event);
        self.dispatch(EventKind::Release, world, event);
        self.pointer_down.set(false);

        if self.lasso_active.replace(false) {
            self.fire_lasso(LassoEvent::End);
        }
    }

    pub fn pointer_click(&self, camera: &RefCell<OrthoCamera>, event: &PointerEvent) {
        let world = self.locate(camera, event);
        self.dispatch(EventKind::Activate, world, event);
        self.pointer_down.set(false);
    }
}
