//! Context configuration.

use crate::input::PointerButton;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use vbind_core::{Color, parse_color};
use vbind_render::OrthoCamera;
use vbind_render::camera::DEFAULT_MIN_ZOOM;

/// Initial camera, surface, and interaction settings for a `Context`.
///
/// Every key is optional when deserializing; missing keys take the
/// defaults below and unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Render surface size in pixels. Default: 800 × 600.
    pub width: f64,
    pub height: f64,
    /// Initial camera position in world space.
    pub camera_x: f64,
    pub camera_y: f64,
    pub camera_z: f64,
    pub zoom: f64,
    pub min_zoom: f64,
    /// Wheel delta units per unit of zoom.
    pub wheel_divisor: f64,
    /// Screen position of the render surface's top-left corner.
    pub viewport_x: f64,
    pub viewport_y: f64,
    /// Background color, in any form `parse_color` accepts.
    pub clear_color: String,
    /// Button that turns a drag into a lasso gesture.
    pub lasso_button: PointerButton,
    /// Wheel zoom. Default: **false** until enabled on the context.
    pub zoom_enabled: bool,
    pub pan_enabled: bool,
    /// Whether dragging also pans along x.
    pub horizontal_pan_enabled: bool,
    pub lasso_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            camera_x: 0.0,
            camera_y: 0.0,
            camera_z: 100.0,
            zoom: 1.0,
            min_zoom: DEFAULT_MIN_ZOOM,
            wheel_divisor: 1000.0,
            viewport_x: 0.0,
            viewport_y: 0.0,
            clear_color: "#ffffff".to_string(),
            lasso_button: PointerButton::Middle,
            zoom_enabled: false,
            pan_enabled: true,
            horizontal_pan_enabled: true,
            lasso_enabled: true,
        }
    }
}

impl Config {
    /// Parse a JSON configuration object.
    ///
    /// # Errors
    /// Returns the `serde_json` message if the input is not a valid object
    /// or a key has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    /// Camera described by this configuration. A `min_zoom` that is not
    /// positive falls back to `DEFAULT_MIN_ZOOM`.
    pub fn camera(&self) -> OrthoCamera {
        let mut cam = OrthoCamera::new(self.width, self.height);
        cam.position = Point::new(self.camera_x, self.camera_y);
        cam.z = self.camera_z;
        cam.min_zoom = if self.min_zoom > 0.0 {
            self.min_zoom
        } else {
            log::warn!("min_zoom must be positive, got {}; using {DEFAULT_MIN_ZOOM}", self.min_zoom);
            DEFAULT_MIN_ZOOM
        };
        cam.zoom = self.zoom.max(cam.min_zoom);
        cam.viewport_origin = Point::new(self.viewport_x, self.viewport_y);
        cam
    }

    /// The parsed background color; white if `clear_color` is malformed.
    pub fn clear_color(&self) -> Color {
        parse_color(&self.clear_color).unwrap_or_else(|| {
            log::warn!("invalid clear_color `{}`, using white", self.clear_color);
            Color::WHITE
        })
    }
}
