use thiserror::Error;

/// Straight-alpha, sRGB-encoded RGBA color.
///
/// Invariant:
/// - channels produced by the constructors are finite and within `[0, 1]`.
///
/// The gradient only consumes RGB; alpha is carried so that colors can be
/// round-tripped through the packed `0xAARRGGBB` form hosts hand over.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// A color string that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color {input:?}: {reason}")]
pub struct ColorParseError {
    pub input: String,
    pub reason: String,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    /// CSS `green` (`#008000`), not full-intensity green.
    pub const GREEN: Color = Color::rgb(0.0, 128.0 / 255.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates an opaque color from sRGB bytes.
    #[inline]
    pub fn from_rgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba_u8(r, g, b, 255)
    }

    #[inline]
    pub fn from_rgba_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Decodes a packed `0xAARRGGBB` integer.
    ///
    /// Each of R, G, B is `byte / 255`.
    #[inline]
    pub fn from_argb_u32(argb: u32) -> Self {
        let [a, r, g, b] = argb.to_be_bytes();
        Self::from_rgba_u8(r, g, b, a)
    }

    /// Packs the color into `0xAARRGGBB`, rounding each channel to the nearest byte.
    pub fn to_argb_u32(self) -> u32 {
        let c = self.clamped();
        u32::from_be_bytes([to_u8(c.a), to_u8(c.r), to_u8(c.g), to_u8(c.b)])
    }

    /// Parses CSS color syntax: named colors, `#rgb`, `#rrggbb`, `#rrggbbaa`,
    /// `rgb()`, `hsl()` and friends.
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let parsed: csscolorparser::Color =
            input.trim().parse().map_err(|e: csscolorparser::ParseColorError| {
                ColorParseError {
                    input: input.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let [r, g, b, a] = parsed.to_rgba8();
        Ok(Self::from_rgba_u8(r, g, b, a))
    }

    /// RGB channels as uploaded to the shader.
    #[inline]
    pub fn rgb_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Converts encoded channels to linear light (alpha unchanged).
    pub fn to_linear(self) -> Self {
        Self {
            r: srgb_to_linear(self.r),
            g: srgb_to_linear(self.g),
            b: srgb_to_linear(self.b),
            a: self.a,
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Clamps all channels to `[0, 1]`. Non-finite channels become 0.
    #[inline]
    pub fn clamped(self) -> Self {
        let c = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self { r: c(self.r), g: c(self.g), b: c(self.b), a: c(self.a) }
    }
}

impl std::str::FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v * 255.0).round() as u8
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool { (a - b).abs() < 1e-6 }

    #[test]
    fn argb_decodes_channels() {
        let c = Color::from_argb_u32(0xFF76_9CDF);
        assert!(close(c.r, 0x76 as f32 / 255.0));
        assert!(close(c.g, 0x9C as f32 / 255.0));
        assert!(close(c.b, 0xDF as f32 / 255.0));
        assert!(close(c.a, 1.0));
    }

    #[test]
    fn argb_round_trips() {
        for v in [0xFF00_0000u32, 0xFFFF_5449, 0x80A2_88A6, 0x0000_0000] {
            assert_eq!(Color::from_argb_u32(v).to_argb_u32(), v);
        }
    }

    #[test]
    fn parse_named_colors() {
        assert_eq!(Color::parse("red").unwrap(), Color::RED);
        assert_eq!(Color::parse("yellow").unwrap(), Color::YELLOW);
        assert_eq!(Color::parse("green").unwrap(), Color::GREEN);
        assert_eq!(Color::parse("blue").unwrap(), Color::BLUE);
    }

    #[test]
    fn parse_hex() {
        let c: Color = "#FF5449".parse().unwrap();
        assert_eq!(c.to_argb_u32(), 0xFFFF_5449);

        let short = Color::parse(" #fff ").unwrap();
        assert_eq!(short, Color::WHITE);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = Color::parse("not-a-color").unwrap_err();
        assert_eq!(err.input, "not-a-color");
        assert!(err.to_string().contains("not-a-color"));
    }

    #[test]
    fn linear_conversion_endpoints() {
        let black = Color::BLACK.to_linear();
        let white = Color::WHITE.to_linear();
        assert!(close(black.r, 0.0));
        assert!(close(white.g, 1.0));

        // Mid-grey encodes to roughly 21.4% linear light.
        let mid = Color::rgb(0.5, 0.5, 0.5).to_linear();
        assert!((mid.b - 0.214).abs() < 1e-3);
    }

    #[test]
    fn clamped_handles_out_of_range() {
        let c = Color { r: 2.0, g: -1.0, b: f32::NAN, a: 0.5 }.clamped();
        assert_eq!(c, Color { r: 1.0, g: 0.0, b: 0.0, a: 0.5 });
    }
}
