//! Pointer input as delivered by the host surface.
//!
//! Coordinates are screen pixels (y-down). The dispatcher converts them to
//! world space through the camera before hit testing.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Which pointer button is held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// A raw pointer event, passed unchanged to selection handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    /// Held button, `None` for plain hover.
    pub button: Option<PointerButton>,
}

impl PointerEvent {
    /// Hover with no button held.
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, button: None }
    }

    pub fn with_button(x: f64, y: f64, button: PointerButton) -> Self {
        Self {
            x,
            y,
            button: Some(button),
        }
    }

    /// Primary-button event (mouse left, touch, pen contact).
    pub fn primary(x: f64, y: f64) -> Self {
        Self::with_button(x, y, PointerButton::Primary)
    }

    pub fn screen(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_held(&self, button: PointerButton) -> bool {
        self.button == Some(button)
    }
}
