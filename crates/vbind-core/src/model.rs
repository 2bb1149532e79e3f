//! Core data model for bound visualizations.
//!
//! Identifiers that callers pass as strings (shape kinds, attribute names,
//! style names, event names) are parsed into closed enums here, so every
//! dispatch site downstream is an exhaustive `match` and there is exactly
//! one place where an unknown identifier is detected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use kurbo::Point;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build an opaque color from a packed `0xRRGGBB` integer.
    pub fn from_packed(rgb: u32) -> Self {
        let r = ((rgb >> 16) & 0xFF) as f32 / 255.0;
        let g = ((rgb >> 8) & 0xFF) as f32 / 255.0;
        let b = (rgb & 0xFF) as f32 / 255.0;
        Self::rgba(r, g, b, 1.0)
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (channel(self.r), channel(self.g), channel(self.b), channel(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// The same color with its alpha replaced.
    #[must_use]
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// `[r, g, b, a]` as stored in per-vertex color buffers.
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// ─── Identifiers ─────────────────────────────────────────────────────────

/// Returned by the `FromStr` impls below for names outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownIdentifier(pub String);

impl fmt::Display for UnknownIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown identifier `{}`", self.0)
    }
}

impl std::error::Error for UnknownIdentifier {}

/// Declares a string-keyed enum with `as_str`, `ALL`, `Display`, and `FromStr`.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $($text:literal)|+ ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical name, as accepted by `from_str`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => named_enum!(@first $($text)|+), )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownIdentifier;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $($text)|+ => Ok($name::$variant), )+
                    other => Err(UnknownIdentifier(other.to_string())),
                }
            }
        }
    };
    (@first $first:literal $(| $rest:literal)*) => { $first };
}

named_enum! {
    /// The visual shape a selection instantiates per record.
    ShapeKind {
        Circle => "circle",
        Rect => "rect",
        Path => "path",
        Polygon => "polygon",
        Line => "line",
        Text => "text",
    }
}

impl ShapeKind {
    /// How records of this shape are represented in the renderer.
    pub fn representation(&self) -> RepresentationMode {
        match self {
            ShapeKind::Circle => RepresentationMode::SharedBuffer,
            _ => RepresentationMode::PerElement,
        }
    }
}

/// One renderer primitive per record, or one shared mesh for all records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepresentationMode {
    PerElement,
    SharedBuffer,
}

named_enum! {
    /// Per-record geometric attributes accepted by `attr`.
    Attr {
        X => "x",
        Y => "y",
        Z => "z",
        X1 => "x1",
        Y1 => "y1",
        X2 => "x2",
        Y2 => "y2",
        R => "r",
        Width => "width",
        Height => "height",
        Depth => "depth",
        Rotation => "rotation",
        ScaleX => "scaleX",
        ScaleY => "scaleY",
        /// Path vertices.
        D => "d",
        /// Polygon outline.
        Points => "points",
    }
}

impl Attr {
    /// Whether the attribute takes a point list rather than a number.
    pub fn takes_points(&self) -> bool {
        matches!(self, Attr::D | Attr::Points)
    }
}

named_enum! {
    /// Per-record paint properties accepted by `style`.
    StyleProp {
        Fill => "fill",
        Stroke => "stroke",
        Opacity => "opacity",
        StrokeWidth => "stroke-width" | "strokewidth",
        FontSize => "font-size" | "fontsize",
    }
}

impl StyleProp {
    /// Whether the property takes a color rather than a number.
    pub fn takes_color(&self) -> bool {
        matches!(self, StyleProp::Fill | StyleProp::Stroke)
    }
}

named_enum! {
    /// Pointer event types a selection can subscribe to.
    EventKind {
        HoverEnter => "mouseover" | "hover-enter",
        HoverMove => "mousemove" | "hover-move",
        HoverLeave => "mouseout" | "hover-leave",
        Press => "mousedown" | "press",
        Release => "mouseup" | "release",
        Activate => "click" | "activate",
    }
}

impl EventKind {
    /// Dense index for per-kind tables.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hex_roundtrip() {
        let c = Color::from_hex("#ff8000").unwrap();
        assert_eq!(c.to_hex(), "#FF8000");
        let short = Color::from_hex("f00").unwrap();
        assert_eq!(short, Color::rgba(1.0, 0.0, 0.0, 1.0));
        assert!(Color::from_hex("#12345").is_none());
    }

    #[test]
    fn packed_color() {
        assert_eq!(Color::from_packed(0x0000FF), Color::rgba(0.0, 0.0, 1.0, 1.0));
        assert_eq!(Color::from_packed(0x000000), Color::BLACK);
    }

    #[test]
    fn identifiers_parse() {
        assert_eq!("circle".parse::<ShapeKind>(), Ok(ShapeKind::Circle));
        assert_eq!("scaleX".parse::<Attr>(), Ok(Attr::ScaleX));
        assert_eq!("stroke-width".parse::<StyleProp>(), Ok(StyleProp::StrokeWidth));
        assert_eq!("strokewidth".parse::<StyleProp>(), Ok(StyleProp::StrokeWidth));
        assert_eq!("click".parse::<EventKind>(), Ok(EventKind::Activate));
        assert_eq!(
            "bogus".parse::<Attr>(),
            Err(UnknownIdentifier("bogus".to_string()))
        );
    }

    #[test]
    fn canonical_names() {
        assert_eq!(StyleProp::StrokeWidth.as_str(), "stroke-width");
        assert_eq!(EventKind::HoverEnter.to_string(), "mouseover");
        for attr in Attr::ALL {
            assert_eq!(attr.as_str().parse::<Attr>(), Ok(*attr));
        }
    }

    #[test]
    fn only_circles_share_a_buffer() {
        for shape in ShapeKind::ALL {
            let expected = if *shape == ShapeKind::Circle {
                RepresentationMode::SharedBuffer
            } else {
                RepresentationMode::PerElement
            };
            assert_eq!(shape.representation(), expected);
        }
    }
}
