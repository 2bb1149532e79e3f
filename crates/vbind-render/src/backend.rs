//! The boundary with the host renderer.
//!
//! Selections never draw anything themselves. They create primitives,
//! attach them to the scene, and push transforms, paint, and geometry
//! through this trait. A backend decides what "drawing a frame" means.

use crate::camera::OrthoCamera;
use crate::scene::RetainedScene;
use vbind_core::{Color, Point};

/// Opaque handle to a primitive owned by a backend.
///
/// Backends may hand out a destroyed primitive's id again. Selections
/// resolve ids through their binding on every lookup; an id kept across a
/// re-`append` can name an unrelated primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub u32);

/// What a primitive is, as far as the renderer is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// One mesh holding triangles for many records, with per-vertex colors.
    BufferMesh,
    /// Filled shape built from its outline (rectangle bodies).
    Rect,
    /// Open polyline (paths, lines, rectangle wireframes).
    Line,
    /// Filled, double-sided polygon.
    Polygon,
    /// Plane textured with a rasterized string.
    Text,
}

/// Transform axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Pixel size of a rasterized string, used to size the text plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

/// Operations the binding layer issues against a renderer.
///
/// All calls on an unknown `PrimitiveId` are ignored.
pub trait Backend {
    fn create(&mut self, kind: PrimitiveKind) -> PrimitiveId;
    fn destroy(&mut self, id: PrimitiveId);

    fn attach(&mut self, id: PrimitiveId);
    fn detach(&mut self, id: PrimitiveId);

    fn set_position(&mut self, id: PrimitiveId, axis: Axis, value: f64);
    fn set_scale(&mut self, id: PrimitiveId, axis: Axis, value: f64);
    /// Rotation about the z axis, in radians.
    fn set_rotation(&mut self, id: PrimitiveId, radians: f64);

    fn set_color(&mut self, id: PrimitiveId, color: Color);
    fn set_opacity(&mut self, id: PrimitiveId, opacity: f32);
    fn set_line_width(&mut self, id: PrimitiveId, width: f32);

    /// Replace the vertex list of a polyline.
    fn set_vertices(&mut self, id: PrimitiveId, points: &[Point]);
    /// Replace the outline of a filled shape.
    fn set_outline(&mut self, id: PrimitiveId, points: &[Point]);

    /// Upload flat buffers: 3 floats per vertex position, 4 per vertex color.
    fn upload_buffers(&mut self, id: PrimitiveId, positions: &[f32], colors: &[f32]);

    /// Rasterize `text` in `color`, bind it as the primitive's texture, and
    /// resize its plane to fit. Returns the rendered size.
    fn rasterize_text(&mut self, id: PrimitiveId, text: &str, color: Color) -> TextExtent;

    /// Background color for subsequent frames.
    fn set_clear_color(&mut self, color: Color);

    /// Draw one frame of everything attached.
    fn draw(&mut self, camera: &OrthoCamera);

    /// Primitive state, for backends that keep it in a `RetainedScene`.
    fn retained(&self) -> Option<&RetainedScene> {
        None
    }
}
