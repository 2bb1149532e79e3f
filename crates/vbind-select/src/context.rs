//! The top-level render context.
//!
//! A `Context` owns the renderer, the camera, the pointer dispatcher, and
//! every selection created through it. Selections keep only a weak handle
//! back, so dropping the context turns their operations into logged no-ops.

use crate::config::Config;
use crate::dispatch::{Dispatcher, Interaction, LassoEvent, Target};
use crate::input::PointerEvent;
use crate::selection::Selection;
use kurbo::Point;
use std::cell::RefCell;
use std::rc::Rc;
use vbind_core::EventKind;
use vbind_render::{Backend, OrthoCamera, RetainedScene};

/// State shared between a context and its selections.
pub(crate) struct Shared {
    pub backend: RefCell<Box<dyn Backend>>,
    pub camera: RefCell<OrthoCamera>,
    pub dispatcher: Dispatcher,
    /// Every live selection, in creation order. Flushed on `render`.
    pub selections: RefCell<Vec<Rc<dyn Target>>>,
    pub wheel_divisor: f64,
}

pub struct Context {
    shared: Rc<Shared>,
}

impl Context {
    pub fn new(config: Config, backend: impl Backend + 'static) -> Self {
        let mut backend: Box<dyn Backend> = Box::new(backend);
        backend.set_clear_color(config.clear_color());
        let interaction = Interaction {
            zoom: config.zoom_enabled,
            pan: config.pan_enabled,
            horizontal_pan: config.horizontal_pan_enabled,
            lasso: config.lasso_enabled,
            lasso_button: config.lasso_button,
        };
        let wheel_divisor = if config.wheel_divisor > 0.0 {
            config.wheel_divisor
        } else {
            log::warn!("wheel_divisor must be positive, got {}; using 1000", config.wheel_divisor);
            1000.0
        };
        log::debug!("context {}x{} with {interaction:?}", config.width, config.height);
        Self {
            shared: Rc::new(Shared {
                backend: RefCell::new(backend),
                camera: RefCell::new(config.camera()),
                dispatcher: Dispatcher::new(interaction),
                selections: RefCell::default(),
                wheel_divisor,
            }),
        }
    }

    /// A context drawing into a headless `RetainedScene`.
    pub fn headless(config: Config) -> Self {
        Self::new(config, RetainedScene::new())
    }

    /// Create an empty selection owned by this context.
    pub fn select_all<T: 'static>(&self) -> Selection<T> {
        let selection = Selection::new(Rc::downgrade(&self.shared));
        selection.register();
        selection
    }

    /// Detach `selection`'s primitives and forget it: it is no longer
    /// flushed and receives no more pointer events.
    pub fn remove<T: 'static>(&self, selection: &Selection<T>) {
        let id = selection.id();
        self.shared.dispatcher.unsubscribe(id);
        let removed = {
            let mut selections = self.shared.selections.borrow_mut();
            let before = selections.len();
            let mut removed = Vec::new();
            selections.retain(|t| {
                let keep = t.id() != id;
                if !keep {
                    removed.push(Rc::clone(t));
                }
                keep
            });
            log::debug!("removed selection ({} → {})", before, selections.len());
            removed
        };
        if let Ok(mut backend) = self.shared.backend.try_borrow_mut() {
            for target in removed {
                target.detach(&mut **backend);
            }
        } else {
            log::warn!("remove: renderer busy, primitives left attached");
        }
    }

    pub fn selection_count(&self) -> usize {
        self.shared.selections.borrow().len()
    }

    /// Flush every dirty selection, then draw one frame.
    pub fn render(&self) {
        let dirty: Vec<Rc<dyn Target>> = self
            .shared
            .selections
            .borrow()
            .iter()
            .filter(|t| t.is_dirty())
            .cloned()
            .collect();
        let Ok(mut backend) = self.shared.backend.try_borrow_mut() else {
            log::warn!("render: renderer busy, frame skipped");
            return;
        };
        for target in &dirty {
            target.flush(&mut **backend);
        }
        let camera = *self.shared.camera.borrow();
        backend.draw(&camera);
    }

    // ─── Interaction toggles ─────────────────────────────────────────────

    pub fn enable_zoom(&self, enabled: bool) {
        self.shared.dispatcher.update(|i| i.zoom = enabled);
    }

    pub fn enable_panning(&self, enabled: bool) {
        self.shared.dispatcher.update(|i| i.pan = enabled);
    }

    pub fn enable_horizontal_panning(&self, enabled: bool) {
        self.shared.dispatcher.update(|i| i.horizontal_pan = enabled);
    }

    pub fn enable_lasso(&self, enabled: bool) {
        self.shared.dispatcher.update(|i| i.lasso = enabled);
    }

    pub fn interaction(&self) -> Interaction {
        self.shared.dispatcher.interaction()
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Apply a wheel gesture. Returns whether the camera zoomed.
    pub fn wheel(&self, delta: f64) -> bool {
        if !self.shared.dispatcher.interaction().zoom {
            return false;
        }
        self.shared
            .camera
            .borrow_mut()
            .zoom_by(delta / self.shared.wheel_divisor);
        self.render();
        true
    }

    pub fn pointer_move(&self, event: &PointerEvent) {
        if self.shared.dispatcher.pointer_move(&self.shared.camera, event) {
            self.render();
        }
    }

    pub fn pointer_press(&self, event: &PointerEvent) {
        self.shared.dispatcher.pointer_press(&self.shared.camera, event);
    }

    pub fn pointer_release(&self, event: &PointerEvent) {
        self.shared.dispatcher.pointer_release(&self.shared.camera, event);
    }

    pub fn pointer_click(&self, event: &PointerEvent) {
        self.shared.dispatcher.pointer_click(&self.shared.camera, event);
    }

    /// Register the callback for one lasso phase, replacing any previous one.
    pub fn on_lasso(&self, event: LassoEvent, handler: impl Fn(&[Point]) + 'static) {
        self.shared.dispatcher.set_lasso_handler(event, Rc::new(handler));
    }

    // ─── Inspection ──────────────────────────────────────────────────────

    pub fn camera(&self) -> OrthoCamera {
        *self.shared.camera.borrow()
    }

    /// World position of the last pointer event.
    pub fn pointer(&self) -> Point {
        self.shared.dispatcher.pointer()
    }

    pub fn is_pointer_down(&self) -> bool {
        self.shared.dispatcher.is_pointer_down()
    }

    /// Selections currently subscribed to `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.shared.dispatcher.subscriber_count(kind)
    }

    pub fn is_lassoing(&self) -> bool {
        self.shared.dispatcher.is_lassoing()
    }

    /// The current (or last) lasso path, in world coordinates.
    pub fn lasso_points(&self) -> Vec<Point> {
        self.shared.dispatcher.lasso_points()
    }

    /// Run `f` against the renderer. `None` if it is already borrowed.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut dyn Backend) -> R) -> Option<R> {
        let mut backend = self.shared.backend.try_borrow_mut().ok()?;
        Some(f(&mut **backend))
    }

    /// Read the retained primitive state, for backends that keep one.
    pub fn inspect<R>(&self, f: impl FnOnce(&RetainedScene) -> R) -> Option<R> {
        let backend = self.shared.backend.try_borrow().ok()?;
        backend.retained().map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerButton;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use vbind_core::{Color, Value};

    #[derive(Debug)]
    struct Dot {
        x: f64,
    }

    #[test]
    fn config_reaches_camera_and_backend() {
        let cfg = Config::from_json(r#"{ "camera_x": 7, "clear_color": "black", "zoom_enabled": true }"#).unwrap();
        let ctx = Context::headless(cfg);
        assert_eq!(ctx.camera().position, Point::new(7.0, 0.0));
        assert_eq!(ctx.inspect(|s| s.clear_color()), Some(Color::BLACK));
        assert!(ctx.interaction().zoom);
    }

    #[test]
    fn render_flushes_only_dirty_selections() {
        let ctx = Context::headless(Config::default());
        let a = ctx.select_all::<Dot>();
        a.data([Dot { x: 1.0 }]).append("circle").attr("r", 2.0);
        let b = ctx.select_all::<Dot>();
        b.data([Dot { x: 2.0 }]).append("circle").attr("r", 2.0).set();

        let uploads = |sel: &Selection<Dot>| {
            let mesh = sel.mesh().unwrap();
            ctx.inspect(|s| s.primitive(mesh).unwrap().uploads).unwrap()
        };
        assert_eq!(uploads(&b), 1);
        ctx.render();
        assert_eq!(uploads(&a), 1);
        assert_eq!(uploads(&b), 1);
        assert!(!a.is_dirty());
        assert_eq!(ctx.inspect(|s| s.frames()), Some(1));
    }

    #[test]
    fn wheel_zooms_only_when_enabled() {
        let ctx = Context::headless(Config::default());
        assert!(!ctx.wheel(500.0));
        assert_eq!(ctx.camera().zoom, 1.0);

        ctx.enable_zoom(true);
        assert!(ctx.wheel(500.0));
        assert_eq!(ctx.camera().zoom, 1.5);
        assert!(ctx.wheel(-5000.0));
        assert_eq!(ctx.camera().zoom, 0.1);
        assert_eq!(ctx.inspect(|s| s.frames()), Some(2));
    }

    #[test]
    fn zero_min_zoom_cannot_collapse_the_camera() {
        let cfg = Config::from_json(r#"{ "min_zoom": 0, "zoom_enabled": true }"#).unwrap();
        let ctx = Context::headless(cfg);
        assert!(ctx.wheel(-5000.0));
        assert!(ctx.camera().zoom > 0.0);
        ctx.pointer_move(&PointerEvent::at(500.0, 200.0));
        let world = ctx.pointer();
        assert!(world.x.is_finite() && world.y.is_finite(), "{world:?}");
    }

    #[test]
    fn drag_on_empty_space_pans_and_renders() {
        let ctx = Context::headless(Config::default());
        ctx.pointer_press(&PointerEvent::primary(400.0, 300.0));
        ctx.pointer_move(&PointerEvent::primary(410.0, 320.0));
        assert_eq!(ctx.camera().position, Point::new(-10.0, 20.0));
        assert_eq!(ctx.inspect(|s| s.frames()), Some(1));

        ctx.enable_horizontal_panning(false);
        ctx.pointer_move(&PointerEvent::primary(450.0, 320.0));
        assert_eq!(ctx.camera().position, Point::new(-10.0, 20.0));
    }

    #[test]
    fn remove_forgets_selection() {
        let ctx = Context::headless(Config::default());
        let hits = Rc::new(Cell::new(0));
        let sel = ctx.select_all::<Dot>();
        let h = hits.clone();
        sel.data([Dot { x: 0.0 }])
            .append("circle")
            .attr("x", Value::computed(|d: &Dot, _| d.x))
            .attr("r", 10.0)
            .on("mousedown", move |_, _, _| h.set(h.get() + 1));
        assert_eq!(ctx.selection_count(), 1);

        let view = sel.filter(|_, _| true);
        assert_eq!(ctx.selection_count(), 1);
        drop(view);

        ctx.remove(&sel);
        assert_eq!(ctx.selection_count(), 0);
        assert_eq!(ctx.inspect(|s| s.attached_count()), Some(0));
        ctx.pointer_press(&PointerEvent::primary(400.0, 300.0));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn lasso_callbacks_receive_world_path() {
        let ctx = Context::headless(Config::default());
        let ended = Rc::new(RefCell::new(Vec::new()));
        let e = ended.clone();
        ctx.on_lasso(LassoEvent::End, move |points| e.borrow_mut().extend_from_slice(points));

        let mid = |x, y| PointerEvent::with_button(x, y, PointerButton::Middle);
        ctx.pointer_press(&mid(400.0, 300.0));
        ctx.pointer_move(&mid(410.0, 300.0));
        assert!(ctx.is_lassoing());
        ctx.pointer_release(&mid(410.0, 300.0));
        assert!(!ctx.is_lassoing());

        assert_eq!(*ended.borrow(), vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert_eq!(ctx.camera().position, Point::ZERO);
    }

    #[test]
    fn handlers_may_mutate_selections() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Dot>();
        sel.data([Dot { x: 0.0 }]).append("circle").attr("r", 5.0).set();
        let inner = sel.clone();
        sel.on("click", move |_, i, _| {
            inner.style("fill", Value::computed(move |_: &Dot, j| if i == j { "red" } else { "black" }));
        });
        ctx.pointer_click(&PointerEvent::primary(400.0, 300.0));
        assert_eq!(sel.fill(), vec![Color::rgba(1.0, 0.0, 0.0, 1.0)]);
        assert!(sel.is_dirty());
    }
}
