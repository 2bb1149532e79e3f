//! Per-selection visual state, independent of the record type.
//!
//! A `Binding` knows which shape was appended, how records are represented
//! in the renderer, and the parallel per-record arrays. It applies resolved
//! attribute/style values, rebuilds shared buffers on flush, and answers
//! hit tests from its cached geometry without querying the renderer.

use kurbo::{Rect, Vec2};
use vbind_core::geometry::{add_buffered_circle, make_buffer_3f, make_buffer_4f};
use vbind_core::{
    Attr, AttrValue, Color, Diagnostic, DiagnosticKind, Point, RepresentationMode, ShapeKind,
    StyleProp, StyleValue,
};
use vbind_render::factory::{self, Instance, Visual, centered_extent};
use vbind_render::hit::{self, HitList};
use vbind_render::scene::TEXT_SIZE;
use vbind_render::{Axis, Backend, PrimitiveId};

/// Flat buffers last uploaded to a shared mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    /// 3 floats per vertex.
    pub positions: Vec<f32>,
    /// 4 floats per vertex.
    pub colors: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Representation {
    /// No shape appended yet.
    Unbound,
    PerElement {
        visuals: Vec<Visual>,
    },
    SharedBuffer {
        mesh: PrimitiveId,
        buffers: MeshBuffers,
    },
}

/// Parallel per-record arrays. Authoritative in shared-buffer mode, a cache
/// of last-set values otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Arrays {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub r: Vec<f64>,
    pub fill: Vec<Color>,
    pub stroke: Vec<Color>,
    pub stroke_width: Vec<f64>,
    pub opacity: Vec<f64>,
    pub scale: Vec<[f64; 3]>,
    /// Degrees.
    pub rotation: Vec<f64>,
    /// Local vertices of paths, lines, polygons, and rectangles.
    pub vertices: Vec<Vec<Point>>,
    /// Local box for rectangles and text, before scaling.
    pub extent: Vec<Option<Rect>>,
    pub text: Vec<Option<String>>,
}

impl Arrays {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Truncate, or pad with the defaults of a fresh `shape` record.
    pub fn resize(&mut self, n: usize, shape: ShapeKind) {
        self.x.resize(n, 0.0);
        self.y.resize(n, 0.0);
        self.z.resize(n, 0.0);
        self.r.resize(n, 0.0);
        self.fill.resize(n, Color::BLACK);
        self.stroke.resize(n, Color::BLACK);
        self.stroke_width.resize(n, 1.0);
        self.opacity.resize(n, 1.0);
        self.scale.resize(n, [1.0; 3]);
        self.rotation.resize(n, 0.0);
        self.vertices.resize_with(n, || factory::initial_vertices(shape));
        self.extent.resize(n, factory::initial_extent(shape));
        self.text.resize(n, None);
    }

    fn position(&self, i: usize) -> Point {
        Point::new(self.x[i], self.y[i])
    }
}

/// The visual half of a selection.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Binding {
    pub shape: Option<ShapeKind>,
    pub repr: Representation,
    pub arrays: Arrays,
    pub dirty_attributes: bool,
    pub dirty_style: bool,
    /// Bumped whenever `append` replaces the primitives.
    pub generation: u64,
}

impl Default for Binding {
    fn default() -> Self {
        Self {
            shape: None,
            repr: Representation::Unbound,
            arrays: Arrays::default(),
            dirty_attributes: false,
            dirty_style: false,
            generation: 0,
        }
    }
}

fn invalid_value(name: &str, expected: &str) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::InvalidValue,
        name,
        format!("`{name}` expects {expected}; mismatched records were skipped"),
    )
}

fn unsupported(name: &str, mode: &str) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::UnsupportedInMode,
        name,
        format!("`{name}` cannot be applied to a {mode} selection"),
    )
}

impl Binding {
    pub fn mode(&self) -> Option<RepresentationMode> {
        match self.repr {
            Representation::Unbound => None,
            Representation::PerElement { .. } => Some(RepresentationMode::PerElement),
            Representation::SharedBuffer { .. } => Some(RepresentationMode::SharedBuffer),
        }
    }

    pub fn visuals(&self) -> &[Visual] {
        match &self.repr {
            Representation::PerElement { visuals } => visuals,
            _ => &[],
        }
    }

    /// Visuals of `rows`, in order, stopping at the first unpaired row.
    pub fn visuals_at(&self, rows: &[usize]) -> Vec<Visual> {
        let visuals = self.visuals();
        rows.iter().map_while(|&row| visuals.get(row).copied()).collect()
    }

    pub fn mesh(&self) -> Option<PrimitiveId> {
        match &self.repr {
            Representation::SharedBuffer { mesh, .. } => Some(*mesh),
            _ => None,
        }
    }

    pub fn buffers(&self) -> Option<&MeshBuffers> {
        match &self.repr {
            Representation::SharedBuffer { buffers, .. } => Some(buffers),
            _ => None,
        }
    }

    /// Rows a mutation can reach: every row for shared buffers, the paired
    /// prefix for per-element visuals.
    fn capacity(&self) -> usize {
        match &self.repr {
            Representation::Unbound => 0,
            Representation::PerElement { visuals } => visuals.len().min(self.arrays.len()),
            Representation::SharedBuffer { .. } => self.arrays.len(),
        }
    }

    /// How many of `records` leading records a mutation reaches.
    pub fn reach(&self, records: usize) -> usize {
        self.capacity().min(records)
    }

    /// Reject a shape other than the bound one.
    pub fn check_shape(&self, shape: ShapeKind) -> Option<Diagnostic> {
        let bound = self.shape.filter(|&bound| bound != shape)?;
        Some(Diagnostic::new(
            DiagnosticKind::ShapeLocked,
            shape.as_str(),
            format!("selection is bound to `{bound}`; cannot append `{shape}`"),
        ))
    }

    /// Instantiate `shape` for `count` records.
    ///
    /// Re-appending the bound shape rebuilds its primitives; a different
    /// shape is rejected.
    pub fn append(&mut self, backend: &mut dyn Backend, shape: ShapeKind, count: usize) -> Option<Diagnostic> {
        if let Some(diag) = self.check_shape(shape) {
            return Some(diag);
        }

        self.release(backend);
        self.repr = match factory::instantiate(backend, shape, count) {
            Instance::PerElement(visuals) => Representation::PerElement { visuals },
            Instance::Shared(mesh) => Representation::SharedBuffer {
                mesh,
                buffers: MeshBuffers::default(),
            },
        };
        self.generation += 1;
        self.shape = Some(shape);
        self.arrays = Arrays::default();
        self.arrays.resize(count, shape);
        None
    }

    fn release(&mut self, backend: &mut dyn Backend) {
        match &self.repr {
            Representation::Unbound => {}
            Representation::PerElement { visuals } => factory::destroy_visuals(backend, visuals),
            Representation::SharedBuffer { mesh, .. } => {
                backend.detach(*mesh);
                backend.destroy(*mesh);
            }
        }
    }

    /// Keep the arrays as long as the record list.
    pub fn relength(&mut self, count: usize) {
        if let Some(shape) = self.shape {
            self.arrays.resize(count, shape);
        }
    }

    // ─── Attributes ──────────────────────────────────────────────────────

    /// Apply `values[k]` to row `rows[k]`. Rows out of reach are skipped.
    pub fn apply_attr(
        &mut self,
        backend: &mut dyn Backend,
        attr: Attr,
        rows: &[usize],
        values: &[AttrValue],
    ) -> Option<Diagnostic> {
        let shape = self.shape?;
        let capacity = self.capacity();
        match &self.repr {
            Representation::Unbound => None,
            Representation::SharedBuffer { .. } => self.shared_attr(attr, rows, values),
            Representation::PerElement { visuals } => {
                let visuals = visuals.clone();
                let mut invalid = false;
                for (&row, value) in rows.iter().zip(values) {
                    if row >= capacity {
                        continue;
                    }
                    if !self.element_attr(backend, shape, &visuals[row], row, attr, value) {
                        invalid = true;
                    }
                }
                let expected = if attr.takes_points() { "a point list" } else { "a number" };
                invalid.then(|| invalid_value(attr.as_str(), expected))
            }
        }
    }

    fn shared_attr(&mut self, attr: Attr, rows: &[usize], values: &[AttrValue]) -> Option<Diagnostic> {
        let column = match attr {
            Attr::X => &mut self.arrays.x,
            Attr::Y => &mut self.arrays.y,
            Attr::Z => &mut self.arrays.z,
            Attr::R => &mut self.arrays.r,
            _ => return Some(unsupported(attr.as_str(), "shared-buffer")),
        };
        let mut invalid = false;
        for (&row, value) in rows.iter().zip(values) {
            let Some(slot) = column.get_mut(row) else {
                continue;
            };
            match value.as_number() {
                Some(n) => *slot = n,
                None => invalid = true,
            }
        }
        invalid.then(|| invalid_value(attr.as_str(), "a number"))
    }

    /// Apply one record's attribute to its primitive and companion.
    /// Returns `false` if the value has the wrong type.
    fn element_attr(
        &mut self,
        backend: &mut dyn Backend,
        shape: ShapeKind,
        visual: &Visual,
        i: usize,
        attr: Attr,
        value: &AttrValue,
    ) -> bool {
        let a = &mut self.arrays;
        let number = value.as_number();
        match attr {
            Attr::D | Attr::Points => {
                let Some(points) = value.as_points() else {
                    return false;
                };
                a.vertices[i] = points.to_vec();
                push_geometry(backend, shape, visual, &a.vertices[i]);
            }
            Attr::X | Attr::Y | Attr::Z => {
                let Some(v) = number else { return false };
                let (axis, column) = match attr {
                    Attr::X => (Axis::X, &mut a.x),
                    Attr::Y => (Axis::Y, &mut a.y),
                    _ => (Axis::Z, &mut a.z),
                };
                column[i] = v;
                for id in visual.parts() {
                    backend.set_position(id, axis, v);
                }
            }
            Attr::X1 | Attr::Y1 | Attr::X2 | Attr::Y2 => {
                let Some(v) = number else { return false };
                let verts = &mut a.vertices[i];
                if verts.len() < 2 {
                    verts.resize(2, Point::ZERO);
                }
                match attr {
                    Attr::X1 => verts[0].x = v,
                    Attr::Y1 => verts[0].y = v,
                    Attr::X2 => verts[1].x = v,
                    _ => verts[1].y = v,
                }
                push_geometry(backend, shape, visual, verts);
            }
            Attr::R => {
                let Some(v) = number else { return false };
                a.r[i] = v;
                a.scale[i] = [v; 3];
                for id in visual.parts() {
                    for axis in [Axis::X, Axis::Y, Axis::Z] {
                        backend.set_scale(id, axis, v);
                    }
                }
            }
            Attr::Width | Attr::ScaleX | Attr::Height | Attr::ScaleY | Attr::Depth => {
                let Some(v) = number else { return false };
                let axis = match attr {
                    Attr::Width | Attr::ScaleX => Axis::X,
                    Attr::Height | Attr::ScaleY => Axis::Y,
                    _ => Axis::Z,
                };
                a.scale[i][axis.index()] = v;
                for id in visual.parts() {
                    backend.set_scale(id, axis, v);
                }
            }
            Attr::Rotation => {
                let Some(v) = number else { return false };
                a.rotation[i] = v;
                for id in visual.parts() {
                    backend.set_rotation(id, v.to_radians());
                }
            }
        }
        true
    }

    // ─── Styles ──────────────────────────────────────────────────────────

    /// Apply `values[k]` to row `rows[k]`. Rows out of reach are skipped.
    pub fn apply_style(
        &mut self,
        backend: &mut dyn Backend,
        prop: StyleProp,
        rows: &[usize],
        values: &[StyleValue],
    ) -> Option<Diagnostic> {
        let shape = self.shape?;
        let capacity = self.capacity();
        match &self.repr {
            Representation::Unbound => None,
            Representation::SharedBuffer { .. } => self.shared_style(prop, rows, values),
            Representation::PerElement { visuals } => {
                let visuals = visuals.clone();
                let mut invalid = false;
                for (&row, value) in rows.iter().zip(values) {
                    if row >= capacity {
                        continue;
                    }
                    if !self.element_style(backend, shape, &visuals[row], row, prop, value) {
                        invalid = true;
                    }
                }
                let expected = if prop.takes_color() { "a color" } else { "a number" };
                invalid.then(|| invalid_value(prop.as_str(), expected))
            }
        }
    }

    fn shared_style(&mut self, prop: StyleProp, rows: &[usize], values: &[StyleValue]) -> Option<Diagnostic> {
        let a = &mut self.arrays;
        let mut invalid = false;
        match prop {
            StyleProp::Fill | StyleProp::Stroke => {
                let column = if prop == StyleProp::Fill { &mut a.fill } else { &mut a.stroke };
                for (&row, value) in rows.iter().zip(values) {
                    let Some(slot) = column.get_mut(row) else {
                        continue;
                    };
                    match value.to_color() {
                        Some(c) => *slot = c,
                        None => invalid = true,
                    }
                }
                invalid.then(|| invalid_value(prop.as_str(), "a color"))
            }
            StyleProp::Opacity | StyleProp::StrokeWidth => {
                let column = if prop == StyleProp::Opacity { &mut a.opacity } else { &mut a.stroke_width };
                for (&row, value) in rows.iter().zip(values) {
                    let Some(slot) = column.get_mut(row) else {
                        continue;
                    };
                    match value.to_number() {
                        Some(n) => *slot = n,
                        None => invalid = true,
                    }
                }
                invalid.then(|| invalid_value(prop.as_str(), "a number"))
            }
            StyleProp::FontSize => Some(unsupported(prop.as_str(), "shared-buffer")),
        }
    }

    fn element_style(
        &mut self,
        backend: &mut dyn Backend,
        shape: ShapeKind,
        visual: &Visual,
        i: usize,
        prop: StyleProp,
        value: &StyleValue,
    ) -> bool {
        let a = &mut self.arrays;
        match prop {
            StyleProp::Fill => {
                let Some(c) = value.to_color() else { return false };
                a.fill[i] = c;
                if shape == ShapeKind::Text {
                    if let Some(text) = &a.text[i] {
                        let e = backend.rasterize_text(visual.primitive, text, c);
                        a.extent[i] = Some(centered_extent(e.width, e.height));
                    }
                } else {
                    backend.set_color(visual.primitive, c);
                }
            }
            StyleProp::Stroke => {
                let Some(c) = value.to_color() else { return false };
                a.stroke[i] = c;
                backend.set_color(visual.wireframe.unwrap_or(visual.primitive), c);
            }
            StyleProp::Opacity => {
                let Some(n) = value.to_number() else { return false };
                a.opacity[i] = n;
                for id in visual.parts() {
                    backend.set_opacity(id, n as f32);
                }
            }
            StyleProp::StrokeWidth => {
                let Some(n) = value.to_number() else { return false };
                a.stroke_width[i] = n;
                backend.set_line_width(visual.wireframe.unwrap_or(visual.primitive), n as f32);
            }
            StyleProp::FontSize => {
                let Some(n) = value.to_number() else { return false };
                let s = n / TEXT_SIZE;
                a.scale[i][0] = s;
                a.scale[i][1] = s;
                backend.set_scale(visual.primitive, Axis::X, s);
                backend.set_scale(visual.primitive, Axis::Y, s);
            }
        }
        true
    }

    // ─── Text ────────────────────────────────────────────────────────────

    /// Set and rasterize per-row strings; `None` entries are skipped.
    pub fn apply_text(&mut self, backend: &mut dyn Backend, rows: &[usize], values: &[Option<String>]) -> Option<Diagnostic> {
        let shape = self.shape?;
        let capacity = self.capacity();
        match &self.repr {
            Representation::Unbound => None,
            Representation::SharedBuffer { .. } => Some(unsupported("text", "shared-buffer")),
            Representation::PerElement { .. } if shape != ShapeKind::Text => {
                Some(unsupported("text", shape.as_str()))
            }
            Representation::PerElement { visuals } => {
                let a = &mut self.arrays;
                for (&row, value) in rows.iter().zip(values) {
                    if row >= capacity {
                        continue;
                    }
                    a.text[row] = value.clone();
                    let Some(text) = value else { continue };
                    let e = backend.rasterize_text(visuals[row].primitive, text, a.fill[row]);
                    a.extent[row] = Some(centered_extent(e.width, e.height));
                }
                None
            }
        }
    }

    // ─── Flush ───────────────────────────────────────────────────────────

    pub fn is_dirty(&self) -> bool {
        self.dirty_attributes || self.dirty_style
    }

    /// Rebuild and upload shared buffers from the arrays.
    ///
    /// Per-element bindings have nothing to reconcile and keep their flags.
    pub fn flush(&mut self, backend: &mut dyn Backend) {
        let Representation::SharedBuffer { mesh, buffers } = &mut self.repr else {
            return;
        };
        let a = &self.arrays;
        let mut vertices = Vec::with_capacity(a.len() * vbind_core::geometry::CIRCLE_VERTICES);
        let mut colors = Vec::with_capacity(vertices.capacity());
        for i in 0..a.len() {
            let fill = a.fill[i];
            add_buffered_circle(
                &mut vertices,
                a.x[i] as f32,
                a.y[i] as f32,
                a.z[i] as f32,
                a.r[i] as f32,
                &mut colors,
                [fill.r, fill.g, fill.b, a.opacity[i] as f32],
            );
        }
        buffers.positions = make_buffer_3f(&vertices);
        buffers.colors = make_buffer_4f(&colors);
        backend.upload_buffers(*mesh, &buffers.positions, &buffers.colors);
        log::debug!("uploaded {} circles to mesh {mesh:?}", a.len());
        self.dirty_attributes = false;
        self.dirty_style = false;
    }

    /// Detach everything this binding displays. Bookkeeping is kept.
    pub fn detach(&self, backend: &mut dyn Backend) {
        match &self.repr {
            Representation::Unbound => {}
            Representation::PerElement { visuals } => factory::detach_visuals(backend, visuals),
            Representation::SharedBuffer { mesh, .. } => backend.detach(*mesh),
        }
    }

    /// Detach the visuals of `rows` only. A shared mesh can't be split.
    pub fn detach_rows(&self, backend: &mut dyn Backend, rows: &[usize]) -> Option<Diagnostic> {
        match &self.repr {
            Representation::Unbound => None,
            Representation::PerElement { .. } => {
                factory::detach_visuals(backend, &self.visuals_at(rows));
                None
            }
            Representation::SharedBuffer { .. } => Some(unsupported("remove_all", "filtered shared-buffer")),
        }
    }

    // ─── Hit testing ─────────────────────────────────────────────────────

    /// Rows under world point `p`.
    pub fn hit(&self, p: Point) -> HitList {
        let Some(shape) = self.shape else {
            return HitList::new();
        };
        let a = &self.arrays;
        let n = a.len();
        match shape {
            ShapeKind::Circle => hit::hit_circles(&a.x, &a.y, &a.r, p),
            ShapeKind::Rect | ShapeKind::Text => hit::hit_boxes(
                (0..n).map(|i| match a.extent[i] {
                    Some(extent) => {
                        let [sx, sy, _] = a.scale[i];
                        hit::world_box(a.position(i), extent, Vec2::new(sx, sy))
                    }
                    // Never contains anything, keeps indices aligned.
                    None => Rect::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN),
                }),
                p,
            ),
            ShapeKind::Path => hit::hit_paths((0..n).map(|i| (a.position(i), a.vertices[i].as_slice())), p),
            ShapeKind::Line => hit::hit_lines(
                (0..n).map(|i| match a.vertices[i].as_slice() {
                    [start, end, ..] => (a.position(i), *start, *end),
                    _ => {
                        let nowhere = Point::new(f64::NAN, f64::NAN);
                        (a.position(i), nowhere, nowhere)
                    }
                }),
                p,
            ),
            ShapeKind::Polygon => hit::hit_polygons((0..n).map(|i| (a.position(i), a.vertices[i].as_slice())), p),
        }
    }
}

/// Send a record's local vertices to its primitive and companion.
fn push_geometry(backend: &mut dyn Backend, shape: ShapeKind, visual: &Visual, points: &[Point]) {
    match shape {
        ShapeKind::Rect | ShapeKind::Polygon => backend.set_outline(visual.primitive, points),
        _ => backend.set_vertices(visual.primitive, points),
    }
    if let Some(frame) = visual.wireframe {
        backend.set_vertices(frame, points);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vbind_core::geometry::CIRCLE_VERTICES;
    use vbind_render::RetainedScene;

    fn bound(scene: &mut RetainedScene, shape: ShapeKind, n: usize) -> Binding {
        let mut b = Binding::default();
        assert!(b.append(scene, shape, n).is_none());
        b
    }

    fn numbers(v: f64, n: usize) -> Vec<AttrValue> {
        vec![AttrValue::Number(v); n]
    }

    fn all(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn shared_arrays_take_constants() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Circle, 3);
        assert!(b.apply_attr(&mut scene, Attr::R, &all(3), &numbers(5.0, 3)).is_none());
        assert_eq!(b.arrays.r, vec![5.0; 3]);
    }

    #[test]
    fn shared_flush_tessellates_every_record() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Circle, 2);
        b.apply_attr(&mut scene, Attr::R, &all(2), &numbers(2.0, 2));
        b.apply_attr(&mut scene, Attr::X, &all(2), &[AttrValue::Number(10.0), AttrValue::Number(-10.0)]);
        b.dirty_attributes = true;
        b.flush(&mut scene);
        assert!(!b.is_dirty());

        let mesh = scene.primitive(b.mesh().unwrap()).unwrap();
        assert_eq!(mesh.positions.len(), 2 * CIRCLE_VERTICES * 3);
        assert_eq!(mesh.colors.len(), 2 * CIRCLE_VERTICES * 4);
        assert_eq!(mesh.uploads, 1);
    }

    #[test]
    fn shared_mode_rejects_geometry_attrs() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Circle, 1);
        let d = b.apply_attr(&mut scene, Attr::Width, &all(1), &numbers(1.0, 1)).unwrap();
        assert_eq!(d.kind, DiagnosticKind::UnsupportedInMode);
    }

    #[test]
    fn rect_attrs_reach_wireframe() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Rect, 1);
        b.apply_attr(&mut scene, Attr::X, &all(1), &numbers(7.0, 1));
        b.apply_attr(&mut scene, Attr::Width, &all(1), &numbers(30.0, 1));
        let v = b.visuals()[0];
        let frame = scene.primitive(v.wireframe.unwrap()).unwrap();
        assert_eq!(frame.position[0], 7.0);
        assert_eq!(frame.scale[0], 30.0);
        assert_eq!(b.arrays.x, vec![7.0]);
        assert_eq!(b.arrays.scale[0], [30.0, 1.0, 1.0]);
    }

    #[test]
    fn stroke_prefers_wireframe() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Rect, 1);
        let red = Color::rgba(1.0, 0.0, 0.0, 1.0);
        b.apply_style(&mut scene, StyleProp::Stroke, &all(1), &[StyleValue::Color(red)]);
        let v = b.visuals()[0];
        assert_eq!(scene.primitive(v.wireframe.unwrap()).unwrap().color, red);
        assert_eq!(scene.primitive(v.primitive).unwrap().color, Color::BLACK);
    }

    #[test]
    fn rotation_is_degrees() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Path, 1);
        b.apply_attr(&mut scene, Attr::Rotation, &all(1), &numbers(180.0, 1));
        let p = scene.primitive(b.visuals()[0].primitive).unwrap();
        assert!((p.rotation - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn mistyped_values_are_reported_once() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Path, 3);
        let d = b.apply_attr(&mut scene, Attr::D, &all(3), &numbers(1.0, 3)).unwrap();
        assert_eq!(d.kind, DiagnosticKind::InvalidValue);
        assert_eq!(d.identifier, "d");
    }

    #[test]
    fn line_endpoints_edit_cached_vertices() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Line, 1);
        b.apply_attr(&mut scene, Attr::X2, &all(1), &numbers(20.0, 1));
        assert_eq!(b.arrays.vertices[0], vec![Point::new(-10.0, 0.0), Point::new(20.0, 10.0)]);
        let p = scene.primitive(b.visuals()[0].primitive).unwrap();
        assert_eq!(p.vertices, b.arrays.vertices[0]);
    }

    #[test]
    fn text_sets_extent_for_hits() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Text, 2);
        b.apply_text(&mut scene, &all(2), &[Some("ab".into()), None]);
        let e = b.arrays.extent[0].unwrap();
        assert_eq!(e.height(), TEXT_SIZE);
        assert_eq!(b.arrays.extent[1], factory::initial_extent(ShapeKind::Text));
        assert_eq!(b.hit(Point::new(0.0, 0.0)).as_slice(), &[0, 1]);
        assert_eq!(b.hit(Point::new(0.0, 40.0)).as_slice(), &[1]);
    }

    #[test]
    fn reappend_other_shape_is_locked() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Rect, 2);
        let d = b.append(&mut scene, ShapeKind::Circle, 2).unwrap();
        assert_eq!(d.kind, DiagnosticKind::ShapeLocked);
        assert_eq!(b.shape, Some(ShapeKind::Rect));

        assert!(b.append(&mut scene, ShapeKind::Rect, 1).is_none());
        assert_eq!(scene.primitive_count(), 2);
        assert_eq!(scene.attached_count(), 2);
    }

    #[test]
    fn row_subset_writes_only_those_rows() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Circle, 3);
        let red = Color::rgba(1.0, 0.0, 0.0, 1.0);
        assert!(b.apply_style(&mut scene, StyleProp::Fill, &[2], &[StyleValue::Color(red)]).is_none());
        assert!(b.apply_attr(&mut scene, Attr::X, &[0, 2, 9], &numbers(4.0, 3)).is_none());
        assert_eq!(b.arrays.fill, vec![Color::BLACK, Color::BLACK, red]);
        assert_eq!(b.arrays.x, vec![4.0, 0.0, 4.0]);
    }

    #[test]
    fn element_rows_move_cached_geometry() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Rect, 2);
        b.apply_attr(&mut scene, Attr::X, &[1], &numbers(100.0, 1));
        assert_eq!(b.arrays.x, vec![0.0, 100.0]);
        let moved = scene.primitive(b.visuals()[1].primitive).unwrap();
        assert_eq!(moved.position[0], 100.0);
        assert_eq!(b.hit(Point::new(100.5, -0.5)).as_slice(), &[1]);
        assert_eq!(b.hit(Point::new(0.5, -0.5)).as_slice(), &[0]);
    }

    #[test]
    fn shared_rows_cannot_detach_separately() {
        let mut scene = RetainedScene::new();
        let b = bound(&mut scene, ShapeKind::Circle, 2);
        let d = b.detach_rows(&mut scene, &[1]).unwrap();
        assert_eq!(d.kind, DiagnosticKind::UnsupportedInMode);
        assert_eq!(scene.attached_count(), 1);
    }

    #[test]
    fn append_bumps_generation() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Path, 1);
        assert_eq!(b.generation, 1);
        b.append(&mut scene, ShapeKind::Path, 1);
        assert_eq!(b.generation, 2);
        b.append(&mut scene, ShapeKind::Line, 1);
        assert_eq!(b.generation, 2);
    }

    #[test]
    fn polygon_hits_use_outline() {
        let mut scene = RetainedScene::new();
        let mut b = bound(&mut scene, ShapeKind::Polygon, 1);
        let tri = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)];
        b.apply_attr(&mut scene, Attr::Points, &all(1), &[AttrValue::Points(tri)]);
        assert_eq!(b.hit(Point::new(1.0, 1.0)).as_slice(), &[0]);
        assert!(b.hit(Point::new(9.0, 9.0)).is_empty());
    }
}
