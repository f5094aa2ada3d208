//! Stroke styling and the live tool selection.

use crate::error::ColorError;
use peniko::Color;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width used for pen strokes unless configured otherwise.
pub const DEFAULT_PEN_WIDTH: f64 = 2.0;

/// Width used for eraser strokes unless configured otherwise.
pub const DEFAULT_ERASER_WIDTH: f64 = 20.0;

/// Available drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
}

/// An RGBA8 stroke color, serialized as a `#RRGGBB` (or `#RRGGBBAA`) hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StrokeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl StrokeColor {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(input: &str) -> Result<Self, ColorError> {
        let digits = input
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorError::MissingHash(input.to_string()))?;
        if !digits.is_ascii() {
            return Err(ColorError::BadDigit(input.to_string()));
        }

        let byte = |s: &str| {
            u8::from_str_radix(s, 16).map_err(|_| ColorError::BadDigit(input.to_string()))
        };

        match digits.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (i, c) in digits.chars().enumerate() {
                    let v = c
                        .to_digit(16)
                        .ok_or_else(|| ColorError::BadDigit(input.to_string()))?;
                    // `v` is a single hex digit, so `v * 17` fits in a byte
                    channels[i] = (v * 17) as u8;
                }
                Ok(Self::rgb(channels[0], channels[1], channels[2]))
            }
            6 => Ok(Self::rgb(byte(&digits[0..2])?, byte(&digits[2..4])?, byte(&digits[4..6])?)),
            8 => Ok(Self::rgba(
                byte(&digits[0..2])?,
                byte(&digits[2..4])?,
                byte(&digits[4..6])?,
                byte(&digits[6..8])?,
            )),
            _ => Err(ColorError::BadLength(input.to_string())),
        }
    }

    /// Hex form; the alpha pair is only written when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for StrokeColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for StrokeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for StrokeColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for StrokeColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<StrokeColor> for String {
    fn from(color: StrokeColor) -> Self {
        color.to_hex()
    }
}

impl From<StrokeColor> for Color {
    fn from(color: StrokeColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

fn default_width() -> f64 {
    DEFAULT_PEN_WIDTH
}

/// Zero, negative, non-finite and `null` widths fall back to the pen default.
fn deserialize_width<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let width = Option::<f64>::deserialize(deserializer)?;
    Ok(width.filter(|w| w.is_finite() && *w > 0.0).unwrap_or(DEFAULT_PEN_WIDTH))
}

/// Visual attributes of a stroke.
///
/// `is_eraser` switches the renderer to subtractive compositing; `color` is
/// then irrelevant to the pixels produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeStyle {
    #[serde(default)]
    pub color: StrokeColor,
    #[serde(
        rename = "strokeWidth",
        default = "default_width",
        deserialize_with = "deserialize_width"
    )]
    pub width: f64,
    #[serde(default)]
    pub is_eraser: bool,
}

impl StrokeStyle {
    pub fn pen(color: StrokeColor, width: f64) -> Self {
        Self { color, width, is_eraser: false }
    }

    pub fn eraser(width: f64) -> Self {
        Self { color: StrokeColor::WHITE, width, is_eraser: true }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::pen(StrokeColor::BLACK, DEFAULT_PEN_WIDTH)
    }
}

/// A single change published by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigChange {
    Tool(Tool),
    Color(StrokeColor),
    Width(f64),
}

/// Live drawing settings read on every input event.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub tool: Tool,
    pub color: StrokeColor,
    pub pen_width: f64,
    pub eraser_width: f64,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            tool: Tool::Pen,
            color: StrokeColor::BLACK,
            pen_width: DEFAULT_PEN_WIDTH,
            eraser_width: DEFAULT_ERASER_WIDTH,
        }
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a toolbar change. Non-positive or non-finite widths are rejected.
    pub fn apply(&mut self, change: ConfigChange) {
        match change {
            ConfigChange::Tool(tool) => self.tool = tool,
            ConfigChange::Color(color) => self.color = color,
            ConfigChange::Width(width) if width.is_finite() && width > 0.0 => {
                self.pen_width = width;
            }
            ConfigChange::Width(width) => {
                log::warn!("Ignoring invalid stroke width {}", width);
            }
        }
    }

    /// Style for a segment drawn right now with the selected tool.
    pub fn active_style(&self) -> StrokeStyle {
        match self.tool {
            Tool::Pen => StrokeStyle::pen(self.color, self.pen_width),
            Tool::Eraser => StrokeStyle::eraser(self.eraser_width),
        }
    }
}
