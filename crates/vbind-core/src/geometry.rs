//! Flat vertex/color buffer builders.
//!
//! Shapes are tessellated into triangle lists: each vertex is `[x, y, z]`,
//! each color `[r, g, b, a]`, and every vertex pushed has a matching color.
//! The `make_buffer_*` functions flatten those lists for upload.

use crate::model::Point;

/// Triangle fan segments used to approximate a circle.
pub const CIRCLE_SEGMENTS: usize = 11;

/// Vertices emitted per circle (`CIRCLE_SEGMENTS` triangles).
pub const CIRCLE_VERTICES: usize = CIRCLE_SEGMENTS * 3;

pub type Vertex = [f32; 3];
pub type Rgba = [f32; 4];

/// Axis-aligned rectangle centered on `(x, y)`, as two triangles.
#[allow(clippy::too_many_arguments)]
pub fn add_buffered_rect(
    vertices: &mut Vec<Vertex>,
    x: f32,
    y: f32,
    z: f32,
    width: f32,
    height: f32,
    colors: &mut Vec<Rgba>,
    c: Rgba,
) {
    let w = width / 2.0;
    let h = height / 2.0;
    vertices.extend_from_slice(&[
        [x - w, y - h, z],
        [x + w, y - h, z],
        [x + w, y + h, z],
        [x + w, y + h, z],
        [x - w, y + h, z],
        [x - w, y - h, z],
    ]);
    colors.extend_from_slice(&[c; 6]);
}

/// Circle centered on `(x, y)` as a fan of `CIRCLE_SEGMENTS` triangles.
///
/// The angular step is `2π / CIRCLE_SEGMENTS`, so the fan closes exactly.
pub fn add_buffered_circle(
    vertices: &mut Vec<Vertex>,
    x: f32,
    y: f32,
    z: f32,
    radius: f32,
    colors: &mut Vec<Rgba>,
    c: Rgba,
) {
    let step = std::f32::consts::PI / (CIRCLE_SEGMENTS as f32 / 2.0);
    for i in 0..CIRCLE_SEGMENTS {
        let a0 = i as f32 * step;
        let a1 = (i + 1) as f32 * step;
        vertices.push([x + a0.cos() * radius, y + a0.sin() * radius, z]);
        vertices.push([x + a1.cos() * radius, y + a1.sin() * radius, z]);
        vertices.push([x, y, z]);
    }
    colors.extend(std::iter::repeat_n(c, CIRCLE_VERTICES));
}

/// Diamond (rhombus) centered on `(x, y)`, as two triangles.
#[allow(clippy::too_many_arguments)]
pub fn add_buffered_diamond(
    vertices: &mut Vec<Vertex>,
    x: f32,
    y: f32,
    z: f32,
    width: f32,
    height: f32,
    colors: &mut Vec<Rgba>,
    c: Rgba,
) {
    let w = width / 2.0;
    let h = height / 2.0;
    vertices.extend_from_slice(&[
        [x - w, y, z],
        [x, y - h, z],
        [x + w, y, z],
        [x + w, y, z],
        [x, y + h, z],
        [x - w, y, z],
    ]);
    colors.extend_from_slice(&[c; 6]);
}

/// Closed outline of a `w × h` rectangle centered on the origin.
pub fn rect_frame(w: f64, h: f64) -> Vec<Point> {
    let (w, h) = (w / 2.0, h / 2.0);
    vec![
        Point::new(-w, -h),
        Point::new(-w, h),
        Point::new(w, h),
        Point::new(w, -h),
        Point::new(-w, -h),
    ]
}

/// Rectangle outline plus both diagonals, as one polyline.
pub fn diagonal_cross(w: f64, h: f64) -> Vec<Point> {
    let (w, h) = (w / 2.0, h / 2.0);
    vec![
        Point::new(-w, -h),
        Point::new(-w, h),
        Point::new(w, h),
        Point::new(w, -h),
        Point::new(-w, -h),
        Point::new(w, h),
        Point::new(0.0, 0.0),
        Point::new(-w, h),
        Point::new(w, -h),
    ]
}

/// Flatten `[x, y, z]` vertices.
pub fn make_buffer_3f(vertices: &[Vertex]) -> Vec<f32> {
    vertices.iter().flatten().copied().collect()
}

/// Flatten `[r, g, b, a]` colors.
pub fn make_buffer_4f(colors: &[Rgba]) -> Vec<f32> {
    colors.iter().flatten().copied().collect()
}

/// Repeat each value `stretch` times (one per-vertex alpha per record).
pub fn make_alpha_buffer(values: &[f32], stretch: usize) -> Vec<f32> {
    values
        .iter()
        .flat_map(|v| std::iter::repeat_n(*v, stretch))
        .collect()
}

/// Overwrite `buffer` in place from fixed-size rows, `size` components each.
/// Rows that would overrun `buffer` are ignored.
pub fn update_buffer<const N: usize>(buffer: &mut [f32], rows: &[[f32; N]], size: usize) {
    let size = size.min(N);
    for (i, row) in rows.iter().enumerate() {
        for (j, v) in row.iter().take(size).enumerate() {
            if let Some(slot) = buffer.get_mut(i * size + j) {
                *slot = *v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BLUE: Rgba = [0.0, 0.0, 1.0, 0.5];

    #[test]
    fn rect_is_two_triangles() {
        let (mut v, mut c) = (Vec::new(), Vec::new());
        add_buffered_rect(&mut v, 0.0, 0.0, 0.0, 10.0, 4.0, &mut c, BLUE);
        assert_eq!(v.len(), 6);
        assert_eq!(c.len(), 6);
        assert_eq!(v[0], [-5.0, -2.0, 0.0]);
        assert_eq!(v[2], [5.0, 2.0, 0.0]);
    }

    #[test]
    fn circle_vertices_stay_within_radius() {
        let (mut v, mut c) = (Vec::new(), Vec::new());
        add_buffered_circle(&mut v, 3.0, -2.0, 1.0, 5.0, &mut c, BLUE);
        assert_eq!(v.len(), CIRCLE_VERTICES);
        assert_eq!(c.len(), CIRCLE_VERTICES);
        for [x, y, z] in &v {
            let d = ((x - 3.0).powi(2) + (y + 2.0).powi(2)).sqrt();
            assert!(d <= 5.0 + 1e-4, "vertex ({x}, {y}) is {d} from center");
            assert_eq!(*z, 1.0);
        }
        // The fan closes: last outer vertex returns to angle 0.
        let last_outer = v[CIRCLE_VERTICES - 2];
        assert!((last_outer[0] - 8.0).abs() < 1e-4);
        assert!((last_outer[1] + 2.0).abs() < 1e-4);
    }

    #[test]
    fn diamond_touches_axes() {
        let (mut v, mut c) = (Vec::new(), Vec::new());
        add_buffered_diamond(&mut v, 0.0, 0.0, 0.0, 2.0, 6.0, &mut c, BLUE);
        assert_eq!(v[0], [-1.0, 0.0, 0.0]);
        assert_eq!(v[1], [0.0, -3.0, 0.0]);
        assert_eq!(v[4], [0.0, 3.0, 0.0]);
    }

    #[test]
    fn flatten_buffers() {
        assert_eq!(
            make_buffer_3f(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
        assert_eq!(make_buffer_4f(&[BLUE]), vec![0.0, 0.0, 1.0, 0.5]);
        assert_eq!(make_alpha_buffer(&[0.5, 1.0], 3), vec![0.5, 0.5, 0.5, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn update_buffer_in_place() {
        let mut buf = vec![0.0; 6];
        update_buffer(&mut buf, &[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]], 3);
        assert_eq!(buf, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn frames_are_closed() {
        let frame = rect_frame(4.0, 2.0);
        assert_eq!(frame.first(), frame.last());
        assert_eq!(frame.len(), 5);
        assert_eq!(diagonal_cross(4.0, 2.0).len(), 9);
    }
}
