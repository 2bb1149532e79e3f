pub mod color;
pub mod curve;
pub mod diag;
pub mod geometry;
pub mod model;
pub mod value;

pub use color::parse_color;
pub use curve::{BSpline, Degree, curve};
pub use diag::{Diagnostic, DiagnosticKind, Diagnostics};
pub use model::*;
pub use value::{AttrValue, StyleValue, Value};
