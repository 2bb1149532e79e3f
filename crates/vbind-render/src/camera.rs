//! Orthographic camera: screen ↔ world mapping, wheel zoom, and drag pan.
//!
//! World space is y-up and centered on the camera position. Screen space
//! is y-down pixels, offset by where the render surface sits on screen.

use kurbo::{Affine, Point, Vec2};

/// Lower bound applied when no explicit minimum zoom is configured.
pub const DEFAULT_MIN_ZOOM: f64 = 0.1;

/// An orthographic camera looking down the z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoCamera {
    /// Frustum edges relative to the camera position, at zoom 1.
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    /// Camera position in world space (x, y).
    pub position: Point,
    pub z: f64,
    pub zoom: f64,
    pub min_zoom: f64,
    /// Screen-space origin of the render surface.
    pub viewport_origin: Point,
}

impl OrthoCamera {
    /// Camera whose frustum covers a `width × height` pixel surface at zoom 1.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            left: -width / 2.0,
            right: width / 2.0,
            top: height / 2.0,
            bottom: -height / 2.0,
            position: Point::ZERO,
            z: 100.0,
            zoom: 1.0,
            min_zoom: DEFAULT_MIN_ZOOM,
            viewport_origin: Point::ZERO,
        }
    }

    /// Map a screen pixel to world coordinates.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            self.position.x + self.left / self.zoom + (screen.x - self.viewport_origin.x) / self.zoom,
            self.position.y + self.top / self.zoom - (screen.y - self.viewport_origin.y) / self.zoom,
        )
    }

    /// Map a world point to screen pixels.
    pub fn world_to_screen(&self, world: Point) -> Point {
        let view = self.world_to_view() * world;
        view + self.viewport_origin.to_vec2()
    }

    /// Affine from world space to surface pixels (y-down, origin top-left).
    pub fn world_to_view(&self) -> Affine {
        let z = self.zoom;
        Affine::new([
            z,
            0.0,
            0.0,
            -z,
            -z * self.position.x - self.left,
            z * self.position.y + self.top,
        ])
    }

    /// The zoom floor: `min_zoom`, or `DEFAULT_MIN_ZOOM` if that is not a
    /// positive number.
    pub fn zoom_floor(&self) -> f64 {
        if self.min_zoom > 0.0 { self.min_zoom } else { DEFAULT_MIN_ZOOM }
    }

    /// Apply a wheel gesture: `zoom += delta`, clamped to the zoom floor.
    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).max(self.zoom_floor());
    }

    /// Pan from a snapshot of the camera position taken at press time, by a
    /// screen-space drag `offset`. The x component only moves when
    /// `horizontal` is set.
    pub fn pan_from(&mut self, start: Point, offset: Vec2, horizontal: bool) {
        if horizontal {
            self.position.x = start.x - offset.x / self.zoom;
        }
        self.position.y = start.y + offset.y / self.zoom;
    }
}

impl Default for OrthoCamera {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn surface_center_is_camera_position() {
        let cam = OrthoCamera::new(800.0, 600.0);
        assert_eq!(cam.screen_to_world(Point::new(400.0, 300.0)), Point::ZERO);
        assert_eq!(cam.screen_to_world(Point::ZERO), Point::new(-400.0, 300.0));
    }

    #[test]
    fn zoom_and_pan_affect_mapping() {
        let mut cam = OrthoCamera::new(800.0, 600.0);
        cam.zoom = 2.0;
        cam.position = Point::new(10.0, 20.0);
        cam.viewport_origin = Point::new(50.0, 40.0);
        let w = cam.screen_to_world(Point::new(450.0, 340.0));
        assert!(close(w, Point::new(10.0, 20.0)), "got {w:?}");
    }

    #[test]
    fn world_screen_roundtrip() {
        let mut cam = OrthoCamera::new(640.0, 480.0);
        cam.zoom = 1.5;
        cam.position = Point::new(-30.0, 12.5);
        cam.viewport_origin = Point::new(8.0, 16.0);
        let world = Point::new(17.0, -42.0);
        assert!(close(cam.screen_to_world(cam.world_to_screen(world)), world));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = OrthoCamera::default();
        cam.zoom_by(-5.0);
        assert_eq!(cam.zoom, DEFAULT_MIN_ZOOM);
        cam.zoom_by(0.4);
        assert!((cam.zoom - 0.5).abs() < 1e-12);
    }

    #[test]
    fn nonpositive_min_zoom_keeps_zoom_positive() {
        for floor in [0.0, -1.0, f64::NAN] {
            let mut cam = OrthoCamera::default();
            cam.min_zoom = floor;
            cam.zoom_by(-5.0);
            assert_eq!(cam.zoom, DEFAULT_MIN_ZOOM);
            let world = cam.screen_to_world(Point::new(500.0, 200.0));
            assert!(world.x.is_finite() && world.y.is_finite());
        }
    }

    #[test]
    fn pan_respects_horizontal_flag() {
        let mut cam = OrthoCamera::default();
        cam.zoom = 2.0;
        cam.pan_from(Point::new(5.0, 5.0), Vec2::new(20.0, 10.0), false);
        assert_eq!(cam.position, Point::new(0.0, 10.0));
        cam.pan_from(Point::new(5.0, 5.0), Vec2::new(20.0, 10.0), true);
        assert_eq!(cam.position, Point::new(-5.0, 10.0));
    }
}
