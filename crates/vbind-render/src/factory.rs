//! Visual-primitive factory.
//!
//! Turns a shape kind and a record count into attached renderer
//! primitives: one per record, or a single shared mesh for buffer-backed
//! shapes. Initial geometry and paint match what a freshly appended
//! selection assumes before any `attr`/`style` call.

use crate::backend::{Axis, Backend, PrimitiveId, PrimitiveKind};
use kurbo::Rect;
use vbind_core::{Color, Point, RepresentationMode, ShapeKind};

/// Rectangle body outline in local space: a unit square hanging down-right
/// from the origin, closed.
pub const UNIT_SQUARE: [Point; 5] = [
    Point::new(0.0, 0.0),
    Point::new(0.0, -1.0),
    Point::new(1.0, -1.0),
    Point::new(1.0, 0.0),
    Point::new(0.0, 0.0),
];

/// Segment a fresh line starts with.
pub const DEFAULT_LINE: [Point; 2] = [Point::new(-10.0, 0.0), Point::new(0.0, 10.0)];

/// Size of a text plane before its string is first rasterized.
pub const TEXT_PLANE: (f64, f64) = (1000.0, 100.0);

/// Depth of rectangle bodies and shared meshes.
const BODY_Z: f64 = 1.0;
/// Rectangle wireframes sit just in front of their body.
const WIREFRAME_Z: f64 = 1.1;

/// One record's renderer primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Visual {
    pub primitive: PrimitiveId,
    /// Outline companion (rectangles only).
    pub wireframe: Option<PrimitiveId>,
}

impl Visual {
    /// The primitive plus its companion, if any.
    pub fn parts(&self) -> impl Iterator<Item = PrimitiveId> {
        std::iter::once(self.primitive).chain(self.wireframe)
    }
}

/// What `instantiate` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instance {
    PerElement(Vec<Visual>),
    Shared(PrimitiveId),
}

/// Create and attach the primitives for `count` records of `shape`.
pub fn instantiate(backend: &mut dyn Backend, shape: ShapeKind, count: usize) -> Instance {
    match shape.representation() {
        RepresentationMode::SharedBuffer => {
            let mesh = backend.create(PrimitiveKind::BufferMesh);
            backend.set_position(mesh, Axis::Z, BODY_Z);
            backend.attach(mesh);
            log::debug!("instantiated shared {shape} mesh {mesh:?} for {count} records");
            Instance::Shared(mesh)
        }
        RepresentationMode::PerElement => {
            let visuals: Vec<Visual> = (0..count).map(|_| create_visual(backend, shape)).collect();
            log::debug!("instantiated {} {shape} primitives", visuals.len());
            Instance::PerElement(visuals)
        }
    }
}

fn create_visual(backend: &mut dyn Backend, shape: ShapeKind) -> Visual {
    let kind = match shape {
        ShapeKind::Rect => PrimitiveKind::Rect,
        ShapeKind::Path | ShapeKind::Line => PrimitiveKind::Line,
        ShapeKind::Polygon => PrimitiveKind::Polygon,
        ShapeKind::Text => PrimitiveKind::Text,
        ShapeKind::Circle => PrimitiveKind::BufferMesh,
    };
    let primitive = backend.create(kind);
    backend.set_color(primitive, Color::BLACK);

    let wireframe = match shape {
        ShapeKind::Rect => {
            backend.set_outline(primitive, &UNIT_SQUARE);
            backend.set_position(primitive, Axis::Z, BODY_Z);

            let frame = backend.create(PrimitiveKind::Line);
            backend.set_vertices(frame, &UNIT_SQUARE);
            backend.set_color(frame, Color::BLACK);
            backend.set_position(frame, Axis::Z, WIREFRAME_Z);
            Some(frame)
        }
        ShapeKind::Line => {
            backend.set_vertices(primitive, &DEFAULT_LINE);
            None
        }
        _ => None,
    };

    let visual = Visual { primitive, wireframe };
    for id in visual.parts() {
        backend.attach(id);
    }
    visual
}

/// Detach every part of `visuals` from the scene.
pub fn detach_visuals(backend: &mut dyn Backend, visuals: &[Visual]) {
    for id in visuals.iter().flat_map(Visual::parts) {
        backend.detach(id);
    }
}

/// Detach and free every part of `visuals`.
pub fn destroy_visuals(backend: &mut dyn Backend, visuals: &[Visual]) {
    for id in visuals.iter().flat_map(Visual::parts) {
        backend.detach(id);
        backend.destroy(id);
    }
}

/// Local vertices a fresh primitive of `shape` starts with.
pub fn initial_vertices(shape: ShapeKind) -> Vec<Point> {
    match shape {
        ShapeKind::Rect => UNIT_SQUARE.to_vec(),
        ShapeKind::Line => DEFAULT_LINE.to_vec(),
        _ => Vec::new(),
    }
}

/// Local extent used for box hit testing, before scaling.
pub fn initial_extent(shape: ShapeKind) -> Option<Rect> {
    match shape {
        ShapeKind::Rect => Some(Rect::new(0.0, -1.0, 1.0, 0.0)),
        ShapeKind::Text => Some(centered_extent(TEXT_PLANE.0, TEXT_PLANE.1)),
        _ => None,
    }
}

/// A `w × h` box centered on the origin (text planes after rasterizing).
pub fn centered_extent(w: f64, h: f64) -> Rect {
    Rect::new(-w / 2.0, -h / 2.0, w / 2.0, h / 2.0)
}
