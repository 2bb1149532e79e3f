//! Non-fatal diagnostics.
//!
//! Bad identifiers and mistyped values never abort a call chain. They are
//! recorded on the selection that received them and mirrored to the `log`
//! facade, and the offending operation degrades to a no-op.

use std::fmt;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnknownShape,
    UnknownAttribute,
    UnknownStyle,
    UnknownEvent,
    /// A value of the wrong type for the attribute or style it was given to.
    InvalidValue,
    /// A known name that the selection's current representation can't apply.
    UnsupportedInMode,
    /// `append` with a different shape than the one already bound.
    ShapeLocked,
}

impl DiagnosticKind {
    /// Short rule identifier (e.g. "unknown-attribute").
    pub fn rule(&self) -> &'static str {
        match self {
            DiagnosticKind::UnknownShape => "unknown-shape",
            DiagnosticKind::UnknownAttribute => "unknown-attribute",
            DiagnosticKind::UnknownStyle => "unknown-style",
            DiagnosticKind::UnknownEvent => "unknown-event",
            DiagnosticKind::InvalidValue => "invalid-value",
            DiagnosticKind::UnsupportedInMode => "unsupported-in-mode",
            DiagnosticKind::ShapeLocked => "shape-locked",
        }
    }
}

/// A single diagnostic raised by a selection operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The name the caller passed (shape, attribute, style, or event).
    pub identifier: String,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Log through the `log` facade at error level.
    pub fn emit(&self) {
        log::error!("[{}] {}", self.kind.rule(), self.message);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.rule(), self.message)
    }
}

/// Ordered, append-only diagnostic channel.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a diagnostic.
    pub fn report(&mut self, diag: Diagnostic) {
        diag.emit();
        self.items.push(diag);
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drain everything recorded so far.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.items)
    }
}
