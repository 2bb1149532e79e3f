//! Constant-or-computed values passed to `attr`, `style`, and `text`.

use crate::color::parse_color;
use crate::model::{Color, Point};
use std::fmt;

/// A value applied to every record of a selection: either one constant,
/// or a function of `(record, index)` evaluated once per record.
pub enum Value<R, V> {
    Constant(V),
    Computed(Box<dyn Fn(&R, usize) -> V>),
}

impl<R, V: Clone> Value<R, V> {
    /// Wrap a per-record function. The closure may return anything
    /// convertible into `V` (e.g. `f64` for attribute values).
    pub fn computed<F, O>(f: F) -> Self
    where
        F: Fn(&R, usize) -> O + 'static,
        O: Into<V>,
    {
        Value::Computed(Box::new(move |record, index| f(record, index).into()))
    }

    /// Resolve the value for one record.
    pub fn resolve(&self, record: &R, index: usize) -> V {
        match self {
            Value::Constant(v) => v.clone(),
            Value::Computed(f) => f(record, index),
        }
    }
}

impl<R, V: fmt::Debug> fmt::Debug for Value<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Value::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

// ─── Attribute values ────────────────────────────────────────────────────

/// A resolved geometric attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Number(f64),
    Points(Vec<Point>),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Points(_) => None,
        }
    }

    pub fn as_points(&self) -> Option<&[Point]> {
        match self {
            AttrValue::Points(p) => Some(p),
            AttrValue::Number(_) => None,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        AttrValue::Number(n as f64)
    }
}

impl From<Vec<Point>> for AttrValue {
    fn from(points: Vec<Point>) -> Self {
        AttrValue::Points(points)
    }
}

impl From<&[Point]> for AttrValue {
    fn from(points: &[Point]) -> Self {
        AttrValue::Points(points.to_vec())
    }
}

// ─── Style values ────────────────────────────────────────────────────────

/// A resolved paint value. Strings are interpreted per property:
/// parsed as a color for `fill`/`stroke`, as a number otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Number(f64),
    Color(Color),
    Text(String),
}

impl StyleValue {
    /// Interpret as a color. Numbers are packed `0xRRGGBB` integers.
    pub fn to_color(&self) -> Option<Color> {
        match self {
            StyleValue::Color(c) => Some(*c),
            StyleValue::Text(s) => parse_color(s),
            StyleValue::Number(n) if *n >= 0.0 && *n <= 16_777_215.0 => {
                Some(Color::from_packed(*n as u32))
            }
            StyleValue::Number(_) => None,
        }
    }

    /// Interpret as a number. Numeric strings are accepted.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            StyleValue::Number(n) => Some(*n),
            StyleValue::Text(s) => s.trim().parse().ok(),
            StyleValue::Color(_) => None,
        }
    }
}

impl From<f64> for StyleValue {
    fn from(n: f64) -> Self {
        StyleValue::Number(n)
    }
}

impl From<i32> for StyleValue {
    fn from(n: i32) -> Self {
        StyleValue::Number(n as f64)
    }
}

impl From<Color> for StyleValue {
    fn from(c: Color) -> Self {
        StyleValue::Color(c)
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        StyleValue::Text(s.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(s: String) -> Self {
        StyleValue::Text(s)
    }
}

// ─── Constant conversions ────────────────────────────────────────────────

impl<R> From<f64> for Value<R, AttrValue> {
    fn from(n: f64) -> Self {
        Value::Constant(n.into())
    }
}

impl<R> From<i32> for Value<R, AttrValue> {
    fn from(n: i32) -> Self {
        Value::Constant(n.into())
    }
}

impl<R> From<Vec<Point>> for Value<R, AttrValue> {
    fn from(points: Vec<Point>) -> Self {
        Value::Constant(points.into())
    }
}

impl<R> From<f64> for Value<R, StyleValue> {
    fn from(n: f64) -> Self {
        Value::Constant(n.into())
    }
}

impl<R> From<i32> for Value<R, StyleValue> {
    fn from(n: i32) -> Self {
        Value::Constant(n.into())
    }
}

impl<R> From<Color> for Value<R, StyleValue> {
    fn from(c: Color) -> Self {
        Value::Constant(c.into())
    }
}

impl<R> From<&str> for Value<R, StyleValue> {
    fn from(s: &str) -> Self {
        Value::Constant(s.into())
    }
}

impl<R> From<String> for Value<R, StyleValue> {
    fn from(s: String) -> Self {
        Value::Constant(s.into())
    }
}

impl<R> From<&str> for Value<R, Option<String>> {
    fn from(s: &str) -> Self {
        Value::Constant(Some(s.to_string()))
    }
}

impl<R> From<String> for Value<R, Option<String>> {
    fn from(s: String) -> Self {
        Value::Constant(Some(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Row {
        weight: f64,
    }

    #[test]
    fn constant_resolves_identically() {
        let v: Value<Row, AttrValue> = 5.0.into();
        let row = Row { weight: 1.0 };
        assert_eq!(v.resolve(&row, 0), AttrValue::Number(5.0));
        assert_eq!(v.resolve(&row, 9), AttrValue::Number(5.0));
    }

    #[test]
    fn computed_sees_record_and_index() {
        let v: Value<Row, AttrValue> = Value::computed(|r: &Row, i| r.weight * i as f64);
        let row = Row { weight: 2.5 };
        assert_eq!(v.resolve(&row, 4), AttrValue::Number(10.0));
    }

    #[test]
    fn style_value_interpretation() {
        assert_eq!(
            StyleValue::from("#ff0000").to_color(),
            Some(Color::rgba(1.0, 0.0, 0.0, 1.0))
        );
        assert_eq!(StyleValue::from(0x0000FF).to_color(), Some(Color::from_packed(0xFF)));
        assert_eq!(StyleValue::from("0.5").to_number(), Some(0.5));
        assert_eq!(StyleValue::from(Color::BLACK).to_number(), None);
        assert_eq!(StyleValue::from(-1.0).to_color(), None);
    }

    #[test]
    fn text_values_may_be_absent() {
        let v: Value<Row, Option<String>> =
            Value::computed(|r: &Row, _| (r.weight > 1.0).then(|| "heavy".to_string()));
        assert_eq!(v.resolve(&Row { weight: 0.5 }, 0), None);
        assert_eq!(v.resolve(&Row { weight: 3.0 }, 0), Some("heavy".to_string()));
    }
}
