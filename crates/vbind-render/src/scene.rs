//! Retained scene: a headless `Backend` that keeps every primitive's state.
//!
//! Primitives are nodes of a `StableDiGraph`; attaching a primitive adds an
//! edge from the root, detaching removes it. Nothing is rasterized here. The
//! Vello painter reads this state to encode a frame, and tests read it to
//! observe what the binding layer asked the renderer to do.

use crate::backend::{Axis, Backend, PrimitiveId, PrimitiveKind, TextExtent};
use crate::camera::OrthoCamera;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use vbind_core::{Color, Point};

/// Font size, in points, strings are rasterized at.
pub const TEXT_SIZE: f64 = 30.0;

/// Advance per character used to measure rasterized strings.
const GLYPH_ADVANCE: f64 = TEXT_SIZE * 0.6;

/// A string rendered into a primitive's texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextTexture {
    pub text: String,
    pub color: Color,
    pub extent: TextExtent,
}

/// Everything the renderer knows about one primitive.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub position: [f64; 3],
    pub scale: [f64; 3],
    pub rotation: f64,
    pub color: Color,
    pub opacity: f32,
    pub line_width: f32,
    /// Polyline vertices or filled outline, in local space.
    pub vertices: Vec<Point>,
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub texture: Option<TextTexture>,
    /// Number of `upload_buffers` calls received.
    pub uploads: u32,
}

impl Primitive {
    fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            position: [0.0; 3],
            scale: [1.0; 3],
            rotation: 0.0,
            color: Color::BLACK,
            opacity: 1.0,
            line_width: 1.0,
            vertices: Vec::new(),
            positions: Vec::new(),
            colors: Vec::new(),
            texture: None,
            uploads: 0,
        }
    }
}

#[derive(Debug, Clone)]
enum SceneNode {
    Root,
    Primitive(Box<Primitive>),
}

/// Headless retained-mode renderer.
#[derive(Debug, Clone)]
pub struct RetainedScene {
    graph: StableDiGraph<SceneNode, ()>,
    root: NodeIndex,
    clear_color: Color,
    frames: u64,
}

impl Default for RetainedScene {
    fn default() -> Self {
        Self::new()
    }
}

impl RetainedScene {
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(SceneNode::Root);
        Self {
            graph,
            root,
            clear_color: Color::WHITE,
            frames: 0,
        }
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn index(id: PrimitiveId) -> NodeIndex {
        NodeIndex::new(id.0 as usize)
    }

    /// Look up a primitive (attached or not).
    pub fn primitive(&self, id: PrimitiveId) -> Option<&Primitive> {
        match self.graph.node_weight(Self::index(id)) {
            Some(SceneNode::Primitive(p)) => Some(p.as_ref()),
            _ => None,
        }
    }

    fn primitive_mut(&mut self, id: PrimitiveId) -> Option<&mut Primitive> {
        match self.graph.node_weight_mut(Self::index(id)) {
            Some(SceneNode::Primitive(p)) => Some(p.as_mut()),
            _ => None,
        }
    }

    pub fn is_attached(&self, id: PrimitiveId) -> bool {
        self.graph.find_edge(self.root, Self::index(id)).is_some()
    }

    /// Attached primitives in paint order: back to front by z, then by id.
    pub fn attached(&self) -> Vec<(PrimitiveId, &Primitive)> {
        let mut out: Vec<(PrimitiveId, &Primitive)> = self
            .graph
            .neighbors(self.root)
            .filter_map(|idx| {
                let id = PrimitiveId(idx.index() as u32);
                self.primitive(id).map(|p| (id, p))
            })
            .collect();
        out.sort_by(|(ia, a), (ib, b)| a.position[2].total_cmp(&b.position[2]).then(ia.cmp(ib)));
        out
    }

    /// Number of primitives currently attached.
    pub fn attached_count(&self) -> usize {
        self.graph.neighbors(self.root).count()
    }

    /// Number of primitives alive, attached or not.
    pub fn primitive_count(&self) -> usize {
        self.graph.node_count() - 1
    }
}

impl Backend for RetainedScene {
    fn create(&mut self, kind: PrimitiveKind) -> PrimitiveId {
        let idx = self
            .graph
            .add_node(SceneNode::Primitive(Box::new(Primitive::new(kind))));
        PrimitiveId(idx.index() as u32)
    }

    fn destroy(&mut self, id: PrimitiveId) {
        if self.primitive(id).is_some() {
            self.graph.remove_node(Self::index(id));
        }
    }

    fn attach(&mut self, id: PrimitiveId) {
        if self.primitive(id).is_some() && !self.is_attached(id) {
            self.graph.add_edge(self.root, Self::index(id), ());
        }
    }

    fn detach(&mut self, id: PrimitiveId) {
        if let Some(edge) = self.graph.find_edge(self.root, Self::index(id)) {
            self.graph.remove_edge(edge);
        }
    }

    fn set_position(&mut self, id: PrimitiveId, axis: Axis, value: f64) {
        if let Some(p) = self.primitive_mut(id) {
            p.position[axis.index()] = value;
        }
    }

    fn set_scale(&mut self, id: PrimitiveId, axis: Axis, value: f64) {
        if let Some(p) = self.primitive_mut(id) {
            p.scale[axis.index()] = value;
        }
    }

    fn set_rotation(&mut self, id: PrimitiveId, radians: f64) {
        if let Some(p) = self.primitive_mut(id) {
            p.rotation = radians;
        }
    }

    fn set_color(&mut self, id: PrimitiveId, color: Color) {
        if let Some(p) = self.primitive_mut(id) {
            p.color = color;
        }
    }

    fn set_opacity(&mut self, id: PrimitiveId, opacity: f32) {
        if let Some(p) = self.primitive_mut(id) {
            p.opacity = opacity;
        }
    }

    fn set_line_width(&mut self, id: PrimitiveId, width: f32) {
        if let Some(p) = self.primitive_mut(id) {
            p.line_width = width;
        }
    }

    fn set_vertices(&mut self, id: PrimitiveId, points: &[Point]) {
        if let Some(p) = self.primitive_mut(id) {
            p.vertices = points.to_vec();
        }
    }

    fn set_outline(&mut self, id: PrimitiveId, points: &[Point]) {
        if let Some(p) = self.primitive_mut(id) {
            p.vertices = points.to_vec();
        }
    }

    fn upload_buffers(&mut self, id: PrimitiveId, positions: &[f32], colors: &[f32]) {
        if let Some(p) = self.primitive_mut(id) {
            p.positions = positions.to_vec();
            p.colors = colors.to_vec();
            p.uploads += 1;
        }
    }

    fn rasterize_text(&mut self, id: PrimitiveId, text: &str, color: Color) -> TextExtent {
        let extent = TextExtent {
            width: text.chars().count() as f64 * GLYPH_ADVANCE,
            height: TEXT_SIZE,
        };
        if let Some(p) = self.primitive_mut(id) {
            p.texture = Some(TextTexture {
                text: text.to_string(),
                color,
                extent,
            });
        }
        extent
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn draw(&mut self, camera: &OrthoCamera) {
        self.frames += 1;
        log::trace!(
            "frame {}: {} attached, camera at ({}, {}) zoom {}",
            self.frames,
            self.attached_count(),
            camera.position.x,
            camera.position.y,
            camera.zoom
        );
    }

    fn retained(&self) -> Option<&RetainedScene> {
        Some(self)
    }
}
