//! Color string parser for style values.
//!
//! Built on `winnow` 0.7. Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
//! `0xrrggbb`, `rgb(r, g, b)`, `rgba(r, g, b, a)`, and a handful of
//! named colors.

use crate::model::Color;
use winnow::ascii::{digit1, space0};
use winnow::combinator::{alt, delimited, opt, preceded, separated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

/// Parse a color string. Surrounding whitespace is ignored.
/// Returns `None` for anything unrecognized.
pub fn parse_color(input: &str) -> Option<Color> {
    let mut rest = input.trim();
    let color = alt((parse_hash, parse_packed_hex, parse_functional, parse_named))
        .parse_next(&mut rest)
        .ok()?;
    rest.is_empty().then_some(color)
}

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}

fn parse_hash(input: &mut &str) -> ModalResult<Color> {
    let digits: &str = preceded('#', take_while(3..=8, |c: char| c.is_ascii_hexdigit()))
        .parse_next(input)?;
    Color::from_hex(digits).ok_or_else(backtrack)
}

fn parse_packed_hex(input: &mut &str) -> ModalResult<Color> {
    let digits: &str = preceded(
        alt(("0x", "0X")),
        take_while(1..=6, |c: char| c.is_ascii_hexdigit()),
    )
    .parse_next(input)?;
    let packed = u32::from_str_radix(digits, 16).map_err(|_| backtrack())?;
    Ok(Color::from_packed(packed))
}

fn parse_functional(input: &mut &str) -> ModalResult<Color> {
    let name = alt(("rgba", "rgb")).parse_next(input)?;
    let args: Vec<f32> = delimited(
        ('(', space0),
        separated(3..=4, parse_number, (space0, ',', space0)),
        (space0, ')'),
    )
    .parse_next(input)?;

    match (name, args.as_slice()) {
        ("rgb", [r, g, b]) => Ok(Color::rgba(r / 255.0, g / 255.0, b / 255.0, 1.0)),
        ("rgba", [r, g, b, a]) => Ok(Color::rgba(r / 255.0, g / 255.0, b / 255.0, *a)),
        _ => Err(backtrack()),
    }
}

fn parse_number(input: &mut &str) -> ModalResult<f32> {
    (digit1, opt(('.', digit1)))
        .take()
        .parse_to()
        .parse_next(input)
}

fn parse_named(input: &mut &str) -> ModalResult<Color> {
    let name: &str = take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    named_color(&name.to_ascii_lowercase()).ok_or_else(backtrack)
}

fn named_color(name: &str) -> Option<Color> {
    let packed = match name {
        "black" => 0x000000,
        "white" => 0xFFFFFF,
        "red" => 0xFF0000,
        "green" => 0x008000,
        "blue" => 0x0000FF,
        "gray" | "grey" => 0x808080,
        "steelblue" => 0x4682B4,
        "orange" => 0xFFA500,
        "transparent" => return Some(Color::rgba(0.0, 0.0, 0.0, 0.0)),
        _ => return None,
    };
    Some(Color::from_packed(packed))
}
