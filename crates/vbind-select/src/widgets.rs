//! Small interactive widgets built from selections.

use crate::context::Context;
use crate::selection::Selection;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type ChangeHandler = Rc<dyn Fn(bool)>;

const FRAME_RADIUS: f64 = 5.0;
const MARK_RADIUS: f64 = 3.0;

/// A round toggle: a white, black-outlined circle whose inner dot shows
/// when selected. Activating the frame flips the state and notifies the
/// change handler.
pub struct CheckBox {
    selected: Rc<Cell<bool>>,
    on_change: Rc<RefCell<Option<ChangeHandler>>>,
    frame: Selection<()>,
    mark: Selection<()>,
}

impl CheckBox {
    pub fn new(ctx: &Context) -> Self {
        let selected = Rc::new(Cell::new(false));
        let on_change: Rc<RefCell<Option<ChangeHandler>>> = Rc::default();

        let mark = ctx.select_all::<()>();
        mark.data([()])
            .append("circle")
            .attr("r", MARK_RADIUS)
            .attr("z", 1.0)
            .style("fill", "#000000")
            .style("opacity", 0.0);

        let frame = ctx.select_all::<()>();
        {
            let selected = Rc::clone(&selected);
            let on_change = Rc::clone(&on_change);
            let mark = mark.clone();
            frame
                .data([()])
                .append("circle")
                .attr("r", FRAME_RADIUS)
                .style("fill", "#fff")
                .style("stroke", "#000000")
                .on("click", move |_, _, _| {
                    let now = !selected.get();
                    selected.set(now);
                    mark.style("opacity", if now { 1.0 } else { 0.0 });
                    let handler = on_change.borrow().clone();
                    if let Some(handler) = handler {
                        handler(now);
                    }
                });
        }

        Self {
            selected,
            on_change,
            frame,
            mark,
        }
    }

    /// Position the widget. Only `x` and `y` are recognized; anything else
    /// is reported on the frame selection.
    pub fn attr(&self, name: &str, value: f64) -> &Self {
        self.frame.attr(name, value);
        if matches!(name, "x" | "y") {
            self.mark.attr(name, value);
        }
        self
    }

    /// Replace the handler called with the new state after every toggle.
    pub fn on_change(&self, handler: impl Fn(bool) + 'static) -> &Self {
        *self.on_change.borrow_mut() = Some(Rc::new(handler));
        self
    }

    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    /// The outer circle, for styling or removal.
    pub fn frame(&self) -> &Selection<()> {
        &self.frame
    }

    pub fn mark(&self) -> &Selection<()> {
        &self.mark
    }
}
