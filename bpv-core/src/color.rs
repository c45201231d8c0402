/// Color selection and hex parsing
use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while_m_n},
    combinator::{all_consuming, map_res, opt},
    sequence::preceded,
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::error::ColorParseError;

/// A concrete 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const DEFAULT_SOLID: Rgb = Rgb(0x00ff00);
    pub const WHITE: Rgb = Rgb(0xffffff);

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Parse `#rrggbb`, `0xrrggbb` or bare `rrggbb`
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        match all_consuming(hex_color)(input.trim()) {
            Ok((_, rgb)) => Ok(rgb),
            Err(_) => Err(ColorParseError::InvalidHex(input.to_string())),
        }
    }

    pub fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn b(self) -> u8 {
        self.0 as u8
    }

    /// Scale every channel by `factor`, clamped to [0, 1]
    pub fn shade(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * factor).round() as u8;
        Rgb::new(scale(self.r()), scale(self.g()), scale(self.b()))
    }

    /// CSS form, e.g. `#00ff00`
    pub fn to_css(self) -> String {
        format!("#{:06x}", self.0 & 0xff_ffff)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

fn hex_color(input: &str) -> IResult<&str, Rgb> {
    preceded(
        opt(alt((tag("#"), tag_no_case("0x")))),
        map_res(
            take_while_m_n(6, 6, |c: char| c.is_ascii_hexdigit()),
            |digits: &str| u32::from_str_radix(digits, 16).map(Rgb),
        ),
    )(input)
}

/// The color selected for a blueprint: the `none` sentinel or a hex string
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColorSpec {
    #[default]
    None,
    Hex(String),
}

impl ColorSpec {
    pub const NONE_SENTINEL: &'static str = "none";

    /// Interpret a raw color value as sent by the API or a color picker
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(Self::NONE_SENTINEL) {
            ColorSpec::None
        } else {
            ColorSpec::Hex(trimmed.to_string())
        }
    }

    /// Resolve to a concrete color; unparsable hex falls back to `default`
    pub fn resolve(&self, default: Rgb) -> Rgb {
        match self {
            ColorSpec::None => default,
            ColorSpec::Hex(hex) => match Rgb::from_hex(hex) {
                Ok(rgb) => rgb,
                Err(err) => {
                    tracing::debug!(%err, "falling back to default color");
                    default
                }
            },
        }
    }
}

impl From<String> for ColorSpec {
    fn from(raw: String) -> Self {
        ColorSpec::parse(&raw)
    }
}

impl From<&str> for ColorSpec {
    fn from(raw: &str) -> Self {
        ColorSpec::parse(raw)
    }
}

impl From<ColorSpec> for String {
    fn from(spec: ColorSpec) -> Self {
        match spec {
            ColorSpec::None => ColorSpec::NONE_SENTINEL.to_string(),
            ColorSpec::Hex(hex) => hex,
        }
    }
}

impl fmt::Display for ColorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSpec::None => f.write_str(Self::NONE_SENTINEL),
            ColorSpec::Hex(hex) => f.write_str(hex),
        }
    }
}
