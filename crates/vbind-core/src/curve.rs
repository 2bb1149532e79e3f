//! Smooth curves through point sequences.
//!
//! A uniform B-spline over the control points, with each end padded by
//! `degree + 1` copies of the end point so the curve starts and ends on
//! the first and last points.

use crate::model::Point;

/// Number of parameter steps sampled by [`curve`]; yields `CURVE_STEPS + 1` points.
pub const CURVE_STEPS: usize = 100;

/// Supported spline degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Degree {
    Quadratic,
    #[default]
    Cubic,
}

impl Degree {
    fn order(&self) -> usize {
        match self {
            Degree::Quadratic => 2,
            Degree::Cubic => 3,
        }
    }

    /// Half-width of the basis function support, in knot units.
    fn support(&self) -> i64 {
        2
    }

    fn basis(&self, x: f64) -> f64 {
        match self {
            Degree::Quadratic => {
                if (-1.5..-0.5).contains(&x) {
                    0.5 * (x + 1.5) * (x + 1.5)
                } else if (-0.5..0.5).contains(&x) {
                    0.75 - x * x
                } else if (0.5..1.5).contains(&x) {
                    0.5 * (x - 1.5) * (x - 1.5)
                } else {
                    0.0
                }
            }
            Degree::Cubic => {
                if (-2.0..-1.0).contains(&x) {
                    (2.0 + x).powi(3) / 6.0
                } else if (-1.0..0.0).contains(&x) {
                    (4.0 - 6.0 * x * x - 3.0 * x * x * x) / 6.0
                } else if (0.0..1.0).contains(&x) {
                    (4.0 - 6.0 * x * x + 3.0 * x * x * x) / 6.0
                } else if (1.0..2.0).contains(&x) {
                    (2.0 - x).powi(3) / 6.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// A uniform B-spline over a fixed set of control points.
#[derive(Debug, Clone)]
pub struct BSpline {
    points: Vec<Point>,
    degree: Degree,
}

impl BSpline {
    /// Returns `None` when `points` is empty.
    pub fn new(points: Vec<Point>, degree: Degree) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Self { points, degree })
    }

    fn margin(&self) -> usize {
        self.degree.order() + 1
    }

    /// Control point for knot `n`, clamped to the padded ends.
    fn control(&self, n: i64) -> Point {
        let margin = self.margin() as i64;
        let last = self.points.len() - 1;
        if n < margin {
            self.points[0]
        } else if n >= self.points.len() as i64 + margin {
            self.points[last]
        } else {
            self.points[(n - margin) as usize]
        }
    }

    /// Evaluate the curve at `t ∈ [0, 1]`.
    pub fn at(&self, t: f64) -> Point {
        let span = (self.margin() * 2 + self.points.len()) as f64;
        let t = t.clamp(0.0, 1.0) * span;
        let t_int = t.floor() as i64;
        let support = self.degree.support();

        let (mut x, mut y) = (0.0, 0.0);
        for i in (t_int - support)..=(t_int + support) {
            let w = self.degree.basis(t - i as f64);
            if w != 0.0 {
                let p = self.control(i);
                x += p.x * w;
                y += p.y * w;
            }
        }
        Point::new(x, y)
    }

    /// Sample `steps + 1` evenly spaced points, `t = i / steps`.
    pub fn sample(&self, steps: usize) -> Vec<Point> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| self.at(i as f64 / steps as f64))
            .collect()
    }
}

/// Fit a cubic B-spline through `points` and sample it.
///
/// Points with a NaN coordinate are skipped. An empty (or all-NaN)
/// input produces an empty curve.
pub fn curve(points: &[Point]) -> Vec<Point> {
    let valid: Vec<Point> = points
        .iter()
        .copied()
        .filter(|p| !p.x.is_nan() && !p.y.is_nan())
        .collect();

    match BSpline::new(valid, Degree::Cubic) {
        Some(spline) => spline.sample(CURVE_STEPS),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn empty_input_yields_empty_curve() {
        assert!(curve(&[]).is_empty());
        assert!(curve(&[Point::new(f64::NAN, 1.0)]).is_empty());
    }

    #[test]
    fn endpoints_are_clamped() {
        let pts = [Point::new(0.0, 0.0), Point::new(5.0, 10.0), Point::new(10.0, 0.0)];
        let out = curve(&pts);
        assert_eq!(out.len(), CURVE_STEPS + 1);
        assert!(close(out[0], pts[0]));
        assert!(close(out[CURVE_STEPS], pts[2]));
    }

    #[test]
    fn single_point_is_constant() {
        let p = Point::new(3.0, -4.0);
        for q in curve(&[p]) {
            assert!(close(q, p));
        }
    }

    #[test]
    fn collinear_points_stay_on_line() {
        let pts: Vec<Point> = (0..5).map(|i| Point::new(i as f64, 2.0 * i as f64)).collect();
        for q in curve(&pts) {
            assert!((q.y - 2.0 * q.x).abs() < 1e-9, "({}, {}) off line", q.x, q.y);
        }
    }

    #[test]
    fn nan_points_are_skipped() {
        let with_nan = [Point::new(0.0, 0.0), Point::new(f64::NAN, 1.0), Point::new(4.0, 0.0)];
        let without = [Point::new(0.0, 0.0), Point::new(4.0, 0.0)];
        assert_eq!(curve(&with_nan), curve(&without));
    }

    #[test]
    fn quadratic_basis_partitions_unity() {
        let spline = BSpline::new(vec![Point::new(1.0, 1.0); 4], Degree::Quadratic).unwrap();
        for q in spline.sample(20) {
            assert!(close(q, Point::new(1.0, 1.0)));
        }
    }
}
