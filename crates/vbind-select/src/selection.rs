//! Selections: an ordered list of data records bound to visual primitives.
//!
//! A `Selection<T>` is a cheap-clone handle. Every mutating method takes
//! `&self` and returns `&Self`, so calls chain:
//!
//! ```ignore
//! ctx.select_all::<Point>()
//!     .data(points)
//!     .append("circle")
//!     .attr("x", Value::computed(|p: &Point, _| p.x))
//!     .attr("r", 5.0)
//!     .style("fill", "steelblue");
//! ```
//!
//! Records are held as `Rc<T>` and compared by identity. Unknown names and
//! mistyped values never panic: they are recorded in the selection's
//! diagnostic channel and the offending call does nothing.
//!
//! `filter` returns a view: it shares the visual state of the selection it
//! was taken from and writes through to that selection's rows.

use crate::binding::{Arrays, Binding, MeshBuffers};
use crate::context::Shared;
use crate::dispatch::{SelectionId, Target};
use crate::input::PointerEvent;
use kurbo::Point;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use vbind_core::{
    Attr, AttrValue, Color, Diagnostic, DiagnosticKind, Diagnostics, EventKind, RepresentationMode,
    ShapeKind, StyleProp, StyleValue, Value,
};
use vbind_render::factory::Visual;
use vbind_render::hit::HitList;
use vbind_render::{Backend, PrimitiveId};

/// Per-record event callback: `(record, index, raw event)`.
pub type Handler<T> = Rc<dyn Fn(&T, usize, &PointerEvent)>;

const EVENT_KINDS: usize = 6;

// ─── Binding index ───────────────────────────────────────────────────────

fn identity<T>(record: &Rc<T>) -> *const () {
    Rc::as_ptr(record).cast()
}

/// Record identity → slot and primitive → slot.
///
/// Rebuilt whenever records or visuals change. A record bound more than
/// once resolves to its first slot.
#[derive(Debug, Default)]
struct BindingIndex {
    by_record: HashMap<*const (), usize>,
    by_primitive: HashMap<PrimitiveId, usize>,
}

impl BindingIndex {
    fn build<T>(records: &[Rc<T>], visuals: &[Visual]) -> Self {
        let mut index = Self::default();
        for (slot, record) in records.iter().enumerate() {
            index.by_record.entry(identity(record)).or_insert(slot);
        }
        for (slot, visual) in visuals.iter().enumerate() {
            for id in visual.parts() {
                index.by_primitive.entry(id).or_insert(slot);
            }
        }
        index
    }
}

struct State<T> {
    records: Vec<Rc<T>>,
    index: BindingIndex,
    /// `binding.generation` when `index` was built.
    indexed: u64,
    /// Shared with every view taken by `filter`.
    binding: Rc<RefCell<Binding>>,
    /// Binding row of each record, for views. `None` maps record `i` to
    /// row `i`.
    rows: Option<Vec<usize>>,
}

impl<T> State<T> {
    /// Binding rows this selection's mutations reach, in record order.
    fn rows(&self) -> Vec<usize> {
        match &self.rows {
            Some(rows) => rows.iter().take(self.records.len()).copied().collect(),
            None => (0..self.binding.borrow().reach(self.records.len())).collect(),
        }
    }

    fn visuals(&self) -> Vec<Visual> {
        let binding = self.binding.borrow();
        match &self.rows {
            Some(rows) => binding.visuals_at(rows),
            None => binding.visuals().to_vec(),
        }
    }

    fn reindex(&mut self) {
        self.index = BindingIndex::build(&self.records, &self.visuals());
        self.indexed = self.binding.borrow().generation;
    }

    /// Rebuild the index if the shared binding was re-appended since.
    fn refresh(&mut self) {
        if self.indexed != self.binding.borrow().generation {
            self.reindex();
        }
    }

    /// Stop being a view: later appends create primitives of its own.
    fn detach_view(&mut self) {
        if self.rows.take().is_some() {
            self.binding = Rc::default();
        }
    }

    /// Record indices whose rows are in `hits`.
    fn to_records(&self, hits: HitList) -> HitList {
        match &self.rows {
            None => hits,
            Some(rows) => rows
                .iter()
                .take(self.records.len())
                .enumerate()
                .filter(|(_, row)| hits.contains(*row))
                .map(|(i, _)| i)
                .collect(),
        }
    }
}

pub(crate) struct SelectionInner<T> {
    ctx: Weak<Shared>,
    state: RefCell<State<T>>,
    handlers: RefCell<[Option<Handler<T>>; EVENT_KINDS]>,
    diagnostics: RefCell<Diagnostics>,
    /// Whether the context flushes this selection on `render`.
    registered: Cell<bool>,
}

/// A data-bound set of visual shapes.
pub struct Selection<T> {
    inner: Rc<SelectionInner<T>>,
}

impl<T> Clone for Selection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Selection<T> {
    pub(crate) fn new(ctx: Weak<Shared>) -> Self {
        Self::with_state(ctx, Vec::new(), Rc::default(), None)
    }

    fn with_state(
        ctx: Weak<Shared>,
        records: Vec<Rc<T>>,
        binding: Rc<RefCell<Binding>>,
        rows: Option<Vec<usize>>,
    ) -> Self {
        let mut state = State {
            records,
            index: BindingIndex::default(),
            indexed: 0,
            binding,
            rows,
        };
        state.reindex();
        Self {
            inner: Rc::new(SelectionInner {
                ctx,
                state: RefCell::new(state),
                handlers: RefCell::default(),
                diagnostics: RefCell::default(),
                registered: Cell::new(false),
            }),
        }
    }

    pub(crate) fn target(&self) -> Rc<dyn Target> {
        self.inner.clone()
    }

    pub fn id(&self) -> SelectionId {
        self.inner.id()
    }

    /// Add this selection to the context's flush list, once.
    pub(crate) fn register(&self) {
        if self.inner.registered.get() {
            return;
        }
        if let Some(shared) = self.inner.ctx.upgrade() {
            shared.selections.borrow_mut().push(self.target());
            self.inner.registered.set(true);
        }
    }

    /// Run `op` against the owning context's renderer. Logs and skips if
    /// the context is gone or the renderer is already borrowed.
    fn with_backend<R>(&self, op: &str, f: impl FnOnce(&mut dyn Backend) -> R) -> Option<R> {
        let Some(shared) = self.inner.ctx.upgrade() else {
            log::warn!("{op}: context dropped, ignoring");
            return None;
        };
        let Ok(mut backend) = shared.backend.try_borrow_mut() else {
            log::warn!("{op}: renderer busy, ignoring");
            return None;
        };
        Some(f(&mut **backend))
    }

    fn report(&self, diag: Diagnostic) {
        self.inner.diagnostics.borrow_mut().report(diag);
    }

    /// Resolve `value` once per record the current representation reaches,
    /// paired with the binding rows to write. No borrow is held while
    /// computed values run.
    fn resolve<V: Clone>(&self, value: &Value<T, V>) -> (Vec<usize>, Vec<V>) {
        let (rows, records) = {
            let state = self.inner.state.borrow();
            let rows = state.rows();
            let records = state.records[..rows.len()].to_vec();
            (rows, records)
        };
        let values = records
            .iter()
            .enumerate()
            .map(|(i, record)| value.resolve(record, i))
            .collect();
        (rows, values)
    }

    // ─── Data ────────────────────────────────────────────────────────────

    /// Replace the bound records. Visuals are left as they are; call
    /// `append` again to instantiate one per new record.
    ///
    /// A view taken by `filter` stops sharing visuals with its source and
    /// starts unbound.
    pub fn data<I>(&self, records: I) -> &Self
    where
        I: IntoIterator,
        I::Item: Into<Rc<T>>,
    {
        let records: Vec<Rc<T>> = records.into_iter().map(Into::into).collect();
        let mut state = self.inner.state.borrow_mut();
        let n = records.len();
        state.records = records;
        state.detach_view();
        state.binding.borrow_mut().relength(n);
        state.reindex();
        self
    }

    /// Add one record without instantiating a visual for it.
    pub fn push(&self, record: impl Into<Rc<T>>) -> &Self {
        let mut state = self.inner.state.borrow_mut();
        state.records.push(record.into());
        let n = state.records.len();
        if state.rows.is_none() {
            state.binding.borrow_mut().relength(n);
        }
        state.reindex();
        self
    }

    /// Instantiate `shape` for every current record.
    ///
    /// On a view this creates primitives of its own; the source selection's
    /// are left alone.
    pub fn append(&self, shape: &str) -> &Self {
        let Ok(kind) = shape.parse::<ShapeKind>() else {
            self.report(Diagnostic::new(
                DiagnosticKind::UnknownShape,
                shape,
                format!("shape `{shape}` does not exist"),
            ));
            return self;
        };
        let count = self.len();
        let diag = self
            .with_backend("append", |backend| {
                let mut state = self.inner.state.borrow_mut();
                if let Some(diag) = state.binding.borrow().check_shape(kind) {
                    return Some(diag);
                }
                state.detach_view();
                let diag = state.binding.borrow_mut().append(backend, kind, count);
                state.reindex();
                diag
            })
            .flatten();
        match diag {
            Some(diag) => self.report(diag),
            None => self.register(),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<Rc<T>> {
        self.inner.state.borrow().records.clone()
    }

    pub fn record(&self, index: usize) -> Option<Rc<T>> {
        self.inner.state.borrow().records.get(index).cloned()
    }

    /// Per-element visuals, in record order. Empty for shared buffers.
    ///
    /// Views re-read their source, so after the source re-appends these
    /// are the new primitives.
    pub fn visuals(&self) -> Vec<Visual> {
        self.inner.state.borrow().visuals()
    }

    /// The record displayed by `primitive` (or its wireframe).
    pub fn get_data(&self, primitive: PrimitiveId) -> Option<Rc<T>> {
        let mut state = self.inner.state.borrow_mut();
        state.refresh();
        let slot = *state.index.by_primitive.get(&primitive)?;
        state.records.get(slot).cloned()
    }

    /// The visual paired with `record`, compared by identity.
    pub fn get_visual(&self, record: &Rc<T>) -> Option<Visual> {
        let mut state = self.inner.state.borrow_mut();
        state.refresh();
        let slot = *state.index.by_record.get(&identity(record))?;
        state.visuals().get(slot).copied()
    }

    /// A view over the records `keep(record, index)` accepts.
    ///
    /// The view shares this selection's visual state: `attr`, `style`, and
    /// `text` through it write into this selection's rows, and this
    /// selection's hit tests and flushes see the result. Views are not
    /// flushed by `Context::render` themselves; their source is.
    pub fn filter(&self, keep: impl Fn(&T, usize) -> bool) -> Selection<T> {
        let (records, base) = {
            let state = self.inner.state.borrow();
            let base = match &state.rows {
                Some(rows) => rows.clone(),
                None => (0..state.records.len()).collect(),
            };
            (state.records.clone(), base)
        };
        let mut kept = Vec::new();
        let mut rows = Vec::new();
        for (i, record) in records.iter().enumerate() {
            if keep(&**record, i) {
                kept.push(Rc::clone(record));
                rows.extend(base.get(i).copied());
            }
        }
        let binding = Rc::clone(&self.inner.state.borrow().binding);
        Selection::with_state(self.inner.ctx.clone(), kept, binding, Some(rows))
    }

    // ─── Attributes and styles ───────────────────────────────────────────

    /// Set a geometric attribute on every record.
    pub fn attr(&self, name: &str, value: impl Into<Value<T, AttrValue>>) -> &Self {
        let Ok(attr) = name.parse::<Attr>() else {
            self.report(Diagnostic::new(
                DiagnosticKind::UnknownAttribute,
                name,
                format!("attribute `{name}` does not exist"),
            ));
            return self;
        };
        let (rows, values) = self.resolve(&value.into());
        let diag = self
            .with_backend("attr", |backend| {
                let state = self.inner.state.borrow();
                let mut binding = state.binding.borrow_mut();
                binding.dirty_attributes = true;
                binding.apply_attr(backend, attr, &rows, &values)
            })
            .flatten();
        if let Some(diag) = diag {
            self.report(diag);
        }
        self
    }

    /// Set a paint property on every record.
    pub fn style(&self, name: &str, value: impl Into<Value<T, StyleValue>>) -> &Self {
        let Ok(prop) = name.parse::<StyleProp>() else {
            self.report(Diagnostic::new(
                DiagnosticKind::UnknownStyle,
                name,
                format!("style `{name}` does not exist"),
            ));
            return self;
        };
        let (rows, values) = self.resolve(&value.into());
        let diag = self
            .with_backend("style", |backend| {
                let state = self.inner.state.borrow();
                let mut binding = state.binding.borrow_mut();
                binding.dirty_style = true;
                binding.apply_style(backend, prop, &rows, &values)
            })
            .flatten();
        if let Some(diag) = diag {
            self.report(diag);
        }
        self
    }

    /// Set and rasterize each record's string. Records resolving to `None`
    /// keep their current texture.
    pub fn text(&self, value: impl Into<Value<T, Option<String>>>) -> &Self {
        let (rows, values) = self.resolve(&value.into());
        let diag = self
            .with_backend("text", |backend| {
                let state = self.inner.state.borrow();
                let mut binding = state.binding.borrow_mut();
                binding.apply_text(backend, &rows, &values)
            })
            .flatten();
        if let Some(diag) = diag {
            self.report(diag);
        }
        self
    }

    /// Flush pending changes: rebuild and upload shared buffers.
    pub fn set(&self) -> &Self {
        self.with_backend("set", |backend| self.inner.flush(backend));
        self
    }

    /// Detach every primitive from the scene. Records and visuals stay
    /// bound; drop the selection (or `Context::remove` it) to forget them.
    ///
    /// A view detaches only its own records' primitives.
    pub fn remove_all(&self) -> &Self {
        let diag = self
            .with_backend("remove_all", |backend| self.inner.detach_visuals(backend))
            .flatten();
        if let Some(diag) = diag {
            self.report(diag);
        }
        self
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Register the handler for `event`, replacing any previous one, and
    /// subscribe this selection to it.
    pub fn on<F>(&self, event: &str, handler: F) -> &Self
    where
        F: Fn(&T, usize, &PointerEvent) + 'static,
    {
        let Ok(kind) = event.parse::<EventKind>() else {
            self.report(Diagnostic::new(
                DiagnosticKind::UnknownEvent,
                event,
                format!("event `{event}` does not exist"),
            ));
            return self;
        };
        self.inner.handlers.borrow_mut()[kind.index()] = Some(Rc::new(handler));
        match self.inner.ctx.upgrade() {
            Some(shared) => {
                shared.dispatcher.subscribe(kind, self.target());
            }
            None => log::warn!("on({event}): context dropped, handler will never fire"),
        }
        self
    }

    /// Run the `event` handler for record `index` as the dispatcher would.
    pub fn call(&self, event: EventKind, index: usize, pointer: &PointerEvent) -> &Self {
        self.inner.fire(event, index, pointer);
        self
    }

    // ─── Inspection ──────────────────────────────────────────────────────

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.diagnostics.borrow().as_slice().to_vec()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.diagnostics.borrow_mut().take()
    }

    pub fn shape(&self) -> Option<ShapeKind> {
        self.inner.state.borrow().binding.borrow().shape
    }

    pub fn mode(&self) -> Option<RepresentationMode> {
        self.inner.state.borrow().binding.borrow().mode()
    }

    /// Whether attributes or styles changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    /// The shared mesh of a buffer-backed selection (or its source).
    pub fn mesh(&self) -> Option<PrimitiveId> {
        self.inner.state.borrow().binding.borrow().mesh()
    }

    /// Buffers uploaded by the last flush (shared-buffer mode only).
    pub fn buffers(&self) -> Option<MeshBuffers> {
        self.inner.state.borrow().binding.borrow().buffers().cloned()
    }

    /// Record indices under world point `p`.
    pub fn hit_test(&self, p: Point) -> Vec<usize> {
        self.inner.hit(p).to_vec()
    }

    fn column<V: Clone>(&self, pick: impl FnOnce(&Arrays) -> &Vec<V>) -> Vec<V> {
        let state = self.inner.state.borrow();
        let binding = state.binding.borrow();
        let column = pick(&binding.arrays);
        match &state.rows {
            Some(rows) => rows.iter().filter_map(|&row| column.get(row).cloned()).collect(),
            None => column.clone(),
        }
    }

    pub fn x(&self) -> Vec<f64> {
        self.column(|a| &a.x)
    }

    pub fn y(&self) -> Vec<f64> {
        self.column(|a| &a.y)
    }

    pub fn z(&self) -> Vec<f64> {
        self.column(|a| &a.z)
    }

    pub fn r(&self) -> Vec<f64> {
        self.column(|a| &a.r)
    }

    pub fn fill(&self) -> Vec<Color> {
        self.column(|a| &a.fill)
    }

    pub fn stroke(&self) -> Vec<Color> {
        self.column(|a| &a.stroke)
    }

    pub fn stroke_width(&self) -> Vec<f64> {
        self.column(|a| &a.stroke_width)
    }

    pub fn opacity(&self) -> Vec<f64> {
        self.column(|a| &a.opacity)
    }

    /// Strings last set with `text`.
    pub fn texts(&self) -> Vec<Option<String>> {
        self.column(|a| &a.text)
    }
}

impl<T> SelectionInner<T> {
    fn detach_visuals(&self, backend: &mut dyn Backend) -> Option<Diagnostic> {
        let state = self.state.borrow();
        let binding = state.binding.borrow();
        match &state.rows {
            Some(rows) => binding.detach_rows(backend, rows),
            None => {
                binding.detach(backend);
                None
            }
        }
    }
}

impl<T: 'static> Target for SelectionInner<T> {
    fn id(&self) -> SelectionId {
        SelectionId(self as *const Self as *const () as usize)
    }

    fn hit(&self, p: Point) -> HitList {
        let state = self.state.borrow();
        let hits = state.binding.borrow().hit(p);
        state.to_records(hits)
    }

    fn fire(&self, kind: EventKind, index: usize, event: &PointerEvent) {
        let record = self.state.borrow().records.get(index).cloned();
        let handler = self.handlers.borrow()[kind.index()].clone();
        if let (Some(record), Some(handler)) = (record, handler) {
            handler(&*record, index, event);
        }
    }

    fn is_dirty(&self) -> bool {
        self.state.borrow().binding.borrow().is_dirty()
    }

    fn flush(&self, backend: &mut dyn Backend) {
        self.state.borrow().binding.borrow_mut().flush(backend);
    }

    fn detach(&self, backend: &mut dyn Backend) {
        if let Some(diag) = self.detach_visuals(backend) {
            log::warn!("{diag}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::context::Context;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    struct Item {
        id: u32,
    }

    fn items(n: u32) -> Vec<Item> {
        (1..=n).map(|id| Item { id }).collect()
    }

    #[test]
    fn pairing_holds_after_append() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(4)).append("rect");

        let records = sel.records();
        let visuals = sel.visuals();
        assert_eq!(records.len(), 4);
        assert_eq!(visuals.len(), 4);
        for (record, visual) in records.iter().zip(&visuals) {
            assert_eq!(sel.get_visual(record), Some(*visual));
            assert!(Rc::ptr_eq(&sel.get_data(visual.primitive).unwrap(), record));
            assert!(Rc::ptr_eq(&sel.get_data(visual.wireframe.unwrap()).unwrap(), record));
        }
    }

    #[test]
    fn lookups_use_identity_not_value() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(1)).append("path");
        let lookalike = Rc::new(Item { id: 1 });
        assert!(sel.get_visual(&lookalike).is_none());
        assert!(sel.get_data(PrimitiveId(9999)).is_none());
    }

    #[test]
    fn filter_keeps_records_and_visuals_together() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(5)).append("line");
        let all = sel.visuals();

        let odd = sel.filter(|item, _| item.id % 2 == 1);
        assert_eq!(odd.len(), 3);
        let kept: Vec<u32> = odd.records().iter().map(|r| r.id).collect();
        assert_eq!(kept, vec![1, 3, 5]);
        assert_eq!(odd.visuals(), vec![all[0], all[2], all[4]]);
        for record in odd.records() {
            let v = odd.get_visual(&record).unwrap();
            assert!(Rc::ptr_eq(&odd.get_data(v.primitive).unwrap(), &record));
        }
    }

    #[test]
    fn filter_sees_index() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(4));
        assert_eq!(sel.filter(|_, i| i < 2).len(), 2);
    }

    #[test]
    fn view_follows_source_reappend() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(3)).append("path");
        let last = sel.filter(|item, _| item.id == 3);
        sel.append("path");

        let fresh = sel.visuals()[2];
        assert_eq!(last.visuals(), vec![fresh]);
        let record = last.record(0).unwrap();
        assert_eq!(last.get_visual(&record), Some(fresh));
        assert!(Rc::ptr_eq(&last.get_data(fresh.primitive).unwrap(), &record));
        assert_eq!(ctx.inspect(|s| s.primitive_count()), Some(3));
    }

    #[test]
    fn view_remove_all_detaches_only_its_rows() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(4)).append("line");
        sel.filter(|_, i| i == 0).remove_all();
        assert_eq!(ctx.inspect(|s| s.attached_count()), Some(3));

        let dots = ctx.select_all::<Item>();
        dots.data(items(2)).append("circle");
        let first = dots.filter(|_, i| i == 0);
        first.remove_all();
        assert_eq!(first.take_diagnostics()[0].kind, DiagnosticKind::UnsupportedInMode);
    }

    #[test]
    fn view_with_new_data_gets_its_own_primitives() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(2)).append("rect");
        let view = sel.filter(|_, i| i == 0);
        view.append("circle");
        assert_eq!(view.take_diagnostics()[0].kind, DiagnosticKind::ShapeLocked);
        assert_eq!(ctx.selection_count(), 1);

        view.data(items(3)).append("circle");
        assert_eq!(view.mode(), Some(RepresentationMode::SharedBuffer));
        assert_eq!(sel.shape(), Some(ShapeKind::Rect));
        assert_eq!(sel.visuals().len(), 2);
        assert_eq!(ctx.selection_count(), 2);
    }

    #[test]
    fn unknown_attribute_is_a_single_diagnostic() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(3)).append("circle").attr("r", 2.0).set();
        let before = sel.r();

        sel.attr("bogus", 1);
        assert_eq!(sel.r(), before);
        let diags = sel.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnknownAttribute);
        assert_eq!(diags[0].identifier, "bogus");
        assert!(!sel.is_dirty());
    }

    #[test]
    fn unknown_names_each_report_once() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(2))
            .append("hexagon")
            .style("glow", 1)
            .on("dblclick", |_, _, _| {});
        let kinds: Vec<DiagnosticKind> = sel.take_diagnostics().into_iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::UnknownShape, DiagnosticKind::UnknownStyle, DiagnosticKind::UnknownEvent]
        );
        assert!(sel.diagnostics().is_empty());
        assert_eq!(sel.shape(), None);
        assert!(sel.visuals().is_empty());
    }

    #[test]
    fn computed_values_see_record_and_index() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(3))
            .append("circle")
            .attr("x", Value::computed(|d: &Item, _| d.id as f64 * 10.0))
            .attr("y", Value::computed(|_: &Item, i| i as f64));
        assert_eq!(sel.x(), vec![10.0, 20.0, 30.0]);
        assert_eq!(sel.y(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn data_relengths_parallel_arrays() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(2)).append("circle").attr("r", 3.0);
        sel.data(items(4));
        assert_eq!(sel.r(), vec![3.0, 3.0, 0.0, 0.0]);
        sel.push(Item { id: 9 });
        assert_eq!(sel.r().len(), 5);
        sel.data(items(1));
        assert_eq!(sel.r(), vec![3.0]);
    }

    #[test]
    fn shared_circle_roundtrip() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(3))
            .append("circle")
            .attr("x", Value::computed(|d: &Item, _| d.id as f64 * 20.0))
            .attr("y", -4.0)
            .attr("r", 5.0);
        assert_eq!(sel.mode(), Some(RepresentationMode::SharedBuffer));
        assert_eq!(sel.r(), vec![5.0; 3]);

        sel.set();
        let buffers = sel.buffers().unwrap();
        let per_record = vbind_core::geometry::CIRCLE_VERTICES;
        assert_eq!(buffers.positions.len(), 3 * per_record * 3);
        let xs = sel.x();
        let ys = sel.y();
        for (v, vertex) in buffers.positions.chunks_exact(3).enumerate() {
            let i = v / per_record;
            let d = ((vertex[0] as f64 - xs[i]).powi(2) + (vertex[1] as f64 - ys[i]).powi(2)).sqrt();
            assert!(d <= 5.0 + 1e-4, "vertex {v} is {d} from record {i}");
        }
    }

    #[test]
    fn second_flush_changes_nothing() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(2)).append("circle").attr("r", 1.0);
        sel.style("fill", "#ff0000");
        assert!(sel.is_dirty());

        sel.set();
        assert!(!sel.is_dirty());
        let first = sel.buffers();
        sel.set();
        assert!(!sel.is_dirty());
        assert_eq!(sel.buffers(), first);
    }

    #[test]
    fn per_element_set_is_a_noop() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(1)).append("rect").attr("width", 10.0);
        sel.set();
        assert!(sel.is_dirty());
        assert!(sel.buffers().is_none());
    }

    #[test]
    fn remove_all_detaches_but_keeps_bookkeeping() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(3)).append("rect");
        assert_eq!(ctx.inspect(|s| s.attached_count()), Some(6));

        sel.remove_all();
        assert_eq!(ctx.inspect(|s| s.attached_count()), Some(0));
        assert_eq!(sel.len(), 3);
        assert_eq!(sel.visuals().len(), 3);
    }

    #[test]
    fn handler_replaced_by_later_on() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        let hits = Rc::new(Cell::new(0));
        sel.data(items(1)).append("circle");
        sel.on("click", |_, _, _| panic!("replaced handler must not run"));
        let h = hits.clone();
        sel.on("click", move |_, _, _| h.set(h.get() + 1));
        sel.call(EventKind::Activate, 0, &PointerEvent::at(0.0, 0.0));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn text_fill_rerasterizes() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        sel.data(items(2))
            .append("text")
            .text(Value::computed(|d: &Item, _| format!("#{}", d.id)))
            .style("fill", "red");
        assert_eq!(sel.texts(), vec![Some("#1".to_string()), Some("#2".to_string())]);

        let prim = sel.visuals()[1].primitive;
        let texture = ctx
            .inspect(|s| s.primitive(prim).unwrap().texture.clone())
            .flatten()
            .unwrap();
        assert_eq!(texture.text, "#2");
        assert_eq!(texture.color, Color::rgba(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn dropped_context_degrades_to_noop() {
        let ctx = Context::headless(Config::default());
        let sel = ctx.select_all::<Item>();
        drop(ctx);
        sel.data(items(2)).append("rect").attr("x", 1.0);
        assert_eq!(sel.len(), 2);
        assert!(sel.visuals().is_empty());
        assert!(sel.diagnostics().is_empty());
    }
}
