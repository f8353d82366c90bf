//! sRGB colors as picked in the UI.
//!
//! [`Color`] stores 8-bit sRGB channels, which is what colour pickers hand out
//! (`#4a4a4a`). Materials and shaders work in linear space, so conversions in
//! both directions are provided.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// A single RGB value in sRGB space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseColorError {
    #[error("colour '{0}' must have 3 or 6 hex digits")]
    Length(String),
    #[error("colour '{0}' contains non-hex characters")]
    Digit(String),
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a colour from a packed `0xRRGGBB` value.
    pub const fn from_u32(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Parse `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB`.
    pub fn from_hex(hex: &str) -> Result<Self, ParseColorError> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseColorError::Digit(hex.to_string()));
        }
        let expanded: String = match digits.len() {
            6 => digits.to_string(),
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            _ => return Err(ParseColorError::Length(hex.to_string())),
        };
        let packed = u32::from_str_radix(&expanded, 16)
            .map_err(|_| ParseColorError::Digit(hex.to_string()))?;
        Ok(Self::from_u32(packed))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear RGB in `[0, 1]`, the space glTF factors and shaders use.
    pub fn to_linear(&self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }

    pub fn from_linear(rgb: [f32; 3]) -> Self {
        Self::rgb(
            linear_to_srgb(rgb[0]),
            linear_to_srgb(rgb[1]),
            linear_to_srgb(rgb[2]),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(channel: f32) -> u8 {
    let c = channel.clamp(0.0, 1.0);
    let s = if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (s * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Color::from_hex("#FF0000"), Ok(Color::rgb(255, 0, 0)));
        assert_eq!(Color::from_hex("4a4a4a"), Ok(Color::rgb(0x4a, 0x4a, 0x4a)));
        assert_eq!(Color::from_hex("#0f8"), Ok(Color::rgb(0x00, 0xff, 0x88)));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(matches!(
            Color::from_hex("#12345"),
            Err(ParseColorError::Length(_))
        ));
        assert!(matches!(
            Color::from_hex("#zzzzzz"),
            Err(ParseColorError::Digit(_))
        ));
        assert!("".parse::<Color>().is_err());
    }

    #[test]
    fn formats_lowercase_hex() {
        assert_eq!(Color::from_u32(0x4A4A4A).to_hex(), "#4a4a4a");
        assert_eq!(Color::rgb(1, 2, 3).to_string(), "#010203");
    }

    #[test]
    fn linear_conversion_is_stable_for_every_channel_value() {
        for v in 0..=255u8 {
            let c = Color::rgb(v, v, v);
            assert_eq!(Color::from_linear(c.to_linear()), c);
        }
    }
}
