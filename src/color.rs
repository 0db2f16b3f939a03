//! Color conversion for SNES palettes and user supplied colors
//!
//! SNES colors are 15-bit words laid out as `0bbbbbgggggrrrrr`. User facing
//! colors (sheet borders, config overrides) are hex strings:
//! `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`.

use image::Rgba;
use thiserror::Error;

/// Fully transparent pixel.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Input string doesn't start with '#'
    #[error("color must start with '#'")]
    MissingHash,
    /// Invalid length (must be 3, 4, 6, or 8 hex chars after #)
    #[error("invalid color length {0}, expected 3, 4, 6, or 8")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
}

/// Convert a 15-bit SNES color to opaque RGBA.
///
/// Each 5-bit channel is shifted left by 3, so full intensity is 248.
pub fn rgb555_to_rgba(color: u16) -> Rgba<u8> {
    let channel = |shift: u16| (((color >> shift) & 0b11111) << 3) as u8;
    Rgba([channel(0), channel(5), channel(10), 0xFF])
}

/// Convert a list of SNES colors.
pub fn rgb555_slice_to_rgba(colors: &[u16]) -> Vec<Rgba<u8>> {
    colors.iter().copied().map(rgb555_to_rgba).collect()
}

/// Parse a hex color string into RGBA.
///
/// # Examples
///
/// ```
/// use romsprite::color::parse_hex_color;
///
/// assert_eq!(parse_hex_color("#F00").unwrap(), image::Rgba([255, 0, 0, 255]));
/// assert_eq!(parse_hex_color("#40404080").unwrap(), image::Rgba([64, 64, 64, 128]));
/// ```
pub fn parse_hex_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    if s.is_empty() {
        return Err(ColorError::Empty);
    }
    let hex = s.strip_prefix('#').ok_or(ColorError::MissingHash)?;

    let digits = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8).ok_or(ColorError::InvalidHex(c)))
        .collect::<Result<Vec<u8>, _>>()?;

    let channels: Vec<u8> = match digits.len() {
        // Short forms double each digit
        3 | 4 => digits.iter().map(|d| d * 17).collect(),
        6 | 8 => digits.chunks(2).map(|pair| pair[0] * 16 + pair[1]).collect(),
        n => return Err(ColorError::InvalidLength(n)),
    };

    let alpha = channels.get(3).copied().unwrap_or(0xFF);
    Ok(Rgba([channels[0], channels[1], channels[2], alpha]))
}

/// Format a color as `#RRGGBBAA`.
pub fn to_hex(color: Rgba<u8>) -> String {
    let Rgba([r, g, b, a]) = color;
    format!("#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
}
