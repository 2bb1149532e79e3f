//! Hit testing: world point → record indices.
//!
//! Pure geometry over per-record state cached by a selection. Each test
//! returns the indices of the records under the pointer, in record order.

use kurbo::{BezPath, Point, Rect, Shape, Vec2};
use smallvec::SmallVec;

/// Squared distance under which a pointer touches a path segment.
pub const SEGMENT_HIT_THRESHOLD_SQ: f64 = 3.0;

/// Indices of hit records.
pub type HitList = SmallVec<[usize; 4]>;

/// Records whose circle `(x[i], y[i], r[i])` contains `p` (boundary included).
pub fn hit_circles(xs: &[f64], ys: &[f64], rs: &[f64], p: Point) -> HitList {
    xs.iter()
        .zip(ys)
        .zip(rs)
        .enumerate()
        .filter(|(_, ((x, y), r))| (p - Point::new(**x, **y)).hypot() <= **r)
        .map(|(i, _)| i)
        .collect()
}

/// World-space box of a primitive: its local `extent` scaled, then
/// translated to `position`.
pub fn world_box(position: Point, extent: Rect, scale: Vec2) -> Rect {
    let p0 = Point::new(extent.x0 * scale.x, extent.y0 * scale.y);
    let p1 = Point::new(extent.x1 * scale.x, extent.y1 * scale.y);
    Rect::from_points(p0, p1) + position.to_vec2()
}

/// Inclusive on every edge.
fn box_contains(b: &Rect, p: Point) -> bool {
    p.x >= b.x0 && p.x <= b.x1 && p.y >= b.y0 && p.y <= b.y1
}

/// Records whose world box contains `p`.
pub fn hit_boxes<I>(boxes: I, p: Point) -> HitList
where
    I: IntoIterator<Item = Rect>,
{
    boxes
        .into_iter()
        .enumerate()
        .filter(|(_, b)| box_contains(b, p))
        .map(|(i, _)| i)
        .collect()
}

/// Squared distance from `p` to the segment `v`–`w`.
pub fn dist_to_segment_squared(p: Point, v: Point, w: Point) -> f64 {
    let l2 = (w - v).hypot2();
    if l2 == 0.0 {
        return (p - v).hypot2();
    }
    let t = (p - v).dot(w - v) / l2;
    if t < 0.0 {
        return (p - v).hypot2();
    }
    if t > 1.0 {
        return (p - w).hypot2();
    }
    (p - v.lerp(w, t)).hypot2()
}

/// Whether `p` touches the segment `a`–`b`.
pub fn hit_segment(a: Point, b: Point, p: Point) -> bool {
    dist_to_segment_squared(p, a, b) < SEGMENT_HIT_THRESHOLD_SQ
}

/// First record whose polyline (local vertices offset by the record's
/// position) passes within the threshold of `p`.
///
/// The search stops at the first matching record, so at most one index is
/// returned even when paths overlap.
pub fn hit_paths<'a, I>(paths: I, p: Point) -> HitList
where
    I: IntoIterator<Item = (Point, &'a [Point])>,
{
    let mut hits = HitList::new();
    for (i, (origin, vertices)) in paths.into_iter().enumerate() {
        let offset = origin.to_vec2();
        let touched = vertices
            .windows(2)
            .any(|seg| hit_segment(seg[0] + offset, seg[1] + offset, p));
        if touched {
            hits.push(i);
            break;
        }
    }
    hits
}

/// Records whose segment (local endpoints offset by position) touches `p`.
pub fn hit_lines<I>(lines: I, p: Point) -> HitList
where
    I: IntoIterator<Item = (Point, Point, Point)>,
{
    lines
        .into_iter()
        .enumerate()
        .filter(|(_, (origin, a, b))| {
            let offset = origin.to_vec2();
            hit_segment(*a + offset, *b + offset, p)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Whether `p` lies inside the closed polygon `outline` (non-zero winding).
pub fn polygon_contains(outline: &[Point], p: Point) -> bool {
    if outline.len() < 3 {
        return false;
    }
    let mut path = BezPath::new();
    path.move_to(outline[0]);
    for v in &outline[1..] {
        path.line_to(*v);
    }
    path.close_path();
    path.contains(p)
}

/// Records whose polygon outline (offset by position) contains `p`.
pub fn hit_polygons<'a, I>(polygons: I, p: Point) -> HitList
where
    I: IntoIterator<Item = (Point, &'a [Point])>,
{
    polygons
        .into_iter()
        .enumerate()
        .filter(|(_, (origin, outline))| polygon_contains(outline, p - origin.to_vec2()))
        .map(|(i, _)| i)
        .collect()
}
