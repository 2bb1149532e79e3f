//! Data-bound selections over an orthographic renderer.
//!
//! Create a [`Context`], make selections with [`Context::select_all`], bind
//! records with `data`, instantiate shapes with `append`, and drive their
//! geometry and paint with `attr`/`style`. Feed pointer input to the
//! context; it hit-tests subscribed selections and calls their handlers
//! with the matched records.

pub mod binding;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod input;
pub mod selection;
pub mod widgets;

pub use binding::MeshBuffers;
pub use config::Config;
pub use context::Context;
pub use dispatch::{Interaction, LassoEvent, LassoHandler, SelectionId};
pub use input::{PointerButton, PointerEvent};
pub use selection::{Handler, Selection};
pub use widgets::CheckBox;

pub use vbind_core::{Color, DiagnosticKind, EventKind, RepresentationMode, ShapeKind, Value};
