//! Retained scene → Vello drawing commands.
//!
//! `VelloBackend` keeps all primitive state in a [`RetainedScene`] and, on
//! every `draw`, re-encodes the attached primitives into a fresh
//! `vello::Scene` through the camera's world → view transform. The caller
//! presents that scene with its own renderer/surface.

use crate::backend::{Axis, Backend, PrimitiveId, PrimitiveKind, TextExtent};
use crate::camera::OrthoCamera;
use crate::scene::{Primitive, RetainedScene};
use kurbo::{Affine, BezPath, Point, Rect, Stroke};
use peniko::Fill;
use vbind_core::Color;
use vello::Scene;

/// A `Backend` that paints with Vello.
#[derive(Default)]
pub struct VelloBackend {
    retained: RetainedScene,
    scene: Scene,
}

impl VelloBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The scene encoded by the last `draw`.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

impl Backend for VelloBackend {
    fn create(&mut self, kind: PrimitiveKind) -> PrimitiveId {
        self.retained.create(kind)
    }

    fn destroy(&mut self, id: PrimitiveId) {
        self.retained.destroy(id);
    }

    fn attach(&mut self, id: PrimitiveId) {
        self.retained.attach(id);
    }

    fn detach(&mut self, id: PrimitiveId) {
        self.retained.detach(id);
    }

    fn set_position(&mut self, id: PrimitiveId, axis: Axis, value: f64) {
        self.retained.set_position(id, axis, value);
    }

    fn set_scale(&mut self, id: PrimitiveId, axis: Axis, value: f64) {
        self.retained.set_scale(id, axis, value);
    }

    fn set_rotation(&mut self, id: PrimitiveId, radians: f64) {
        self.retained.set_rotation(id, radians);
    }

    fn set_color(&mut self, id: PrimitiveId, color: Color) {
        self.retained.set_color(id, color);
    }

    fn set_opacity(&mut self, id: PrimitiveId, opacity: f32) {
        self.retained.set_opacity(id, opacity);
    }

    fn set_line_width(&mut self, id: PrimitiveId, width: f32) {
        self.retained.set_line_width(id, width);
    }

    fn set_vertices(&mut self, id: PrimitiveId, points: &[Point]) {
        self.retained.set_vertices(id, points);
    }

    fn set_outline(&mut self, id: PrimitiveId, points: &[Point]) {
        self.retained.set_outline(id, points);
    }

    fn upload_buffers(&mut self, id: PrimitiveId, positions: &[f32], colors: &[f32]) {
        self.retained.upload_buffers(id, positions, colors);
    }

    fn rasterize_text(&mut self, id: PrimitiveId, text: &str, color: Color) -> TextExtent {
        self.retained.rasterize_text(id, text, color)
    }

    fn set_clear_color(&mut self, color: Color) {
        self.retained.set_clear_color(color);
    }

    fn draw(&mut self, camera: &OrthoCamera) {
        self.retained.draw(camera);
        self.scene.reset();
        paint_scene(&mut self.scene, &self.retained, camera);
    }

    fn retained(&self) -> Option<&RetainedScene> {
        Some(&self.retained)
    }
}

/// Paint every attached primitive of `retained`, back to front.
///
/// Call once per frame with a freshly-reset `Scene`.
pub fn paint_scene(scene: &mut Scene, retained: &RetainedScene, camera: &OrthoCamera) {
    let view = camera.world_to_view();
    let surface = Rect::new(0.0, 0.0, camera.right - camera.left, camera.top - camera.bottom);
    scene.fill(
        Fill::NonZero,
        Affine::IDENTITY,
        to_peniko(retained.clear_color(), 1.0),
        None,
        &surface,
    );

    for (id, prim) in retained.attached() {
        let transform = view * local_transform(prim);
        match prim.kind {
            PrimitiveKind::Rect | PrimitiveKind::Polygon => paint_outline(scene, transform, prim),
            PrimitiveKind::Line => paint_polyline(scene, transform, prim),
            PrimitiveKind::BufferMesh => paint_mesh(scene, transform, prim),
            PrimitiveKind::Text => {
                if let Some(tex) = &prim.texture {
                    log::trace!(
                        "TEXT {:?} {:?} at ({}, {}) {}x{}",
                        id,
                        tex.text,
                        prim.position[0],
                        prim.position[1],
                        tex.extent.width,
                        tex.extent.height
                    );
                }
                // Glyph shaping needs a font context; the texture is not encoded.
            }
        }
    }
}

fn local_transform(prim: &Primitive) -> Affine {
    Affine::translate((prim.position[0], prim.position[1]))
        * Affine::rotate(prim.rotation)
        * Affine::scale_non_uniform(prim.scale[0], prim.scale[1])
}

// ─── Shape painters ──────────────────────────────────────────────────────────

fn polyline(points: &[Point], close: bool) -> Option<BezPath> {
    let (first, rest) = points.split_first()?;
    let mut path = BezPath::new();
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    if close {
        path.close_path();
    }
    Some(path)
}

fn paint_outline(scene: &mut Scene, transform: Affine, prim: &Primitive) {
    if prim.vertices.len() < 3 {
        return;
    }
    if let Some(shape) = polyline(&prim.vertices, true) {
        let color = to_peniko(prim.color, prim.opacity);
        scene.fill(Fill::NonZero, transform, color, None, &shape);
    }
}

fn paint_polyline(scene: &mut Scene, transform: Affine, prim: &Primitive) {
    if prim.vertices.len() < 2 {
        return;
    }
    if let Some(shape) = polyline(&prim.vertices, false) {
        let stroke = Stroke::new(prim.line_width as f64);
        let color = to_peniko(prim.color, prim.opacity);
        scene.stroke(&stroke, transform, color, None, &shape);
    }
}

/// Fill each triangle of a shared mesh with its first vertex's color.
fn paint_mesh(scene: &mut Scene, transform: Affine, prim: &Primitive) {
    let triangles = prim.positions.chunks_exact(9);
    let colors = prim.colors.chunks_exact(12);
    for (tri, rgba) in triangles.zip(colors) {
        let corner = |i: usize| Point::new(tri[i * 3] as f64, tri[i * 3 + 1] as f64);
        let Some(shape) = polyline(&[corner(0), corner(1), corner(2)], true) else {
            continue;
        };
        let color = Color::rgba(rgba[0], rgba[1], rgba[2], rgba[3]);
        scene.fill(Fill::NonZero, transform, to_peniko(color, prim.opacity), None, &shape);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn to_peniko(c: Color, opacity: f32) -> peniko::Color {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    let alpha = opacity.clamp(0.0, 1.0);
    peniko::Color::from_rgba8(channel(c.r), channel(c.g), channel(c.b), channel(c.a * alpha))
}
