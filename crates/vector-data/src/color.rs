use std::fmt;

/// A packed 32-bit ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0x0000_0000);
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const RED: Color = Color(0xFFFF_0000);
    pub const GREEN: Color = Color(0xFF00_FF00);
    pub const BLUE: Color = Color(0xFF00_00FF);

    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn argb(self) -> u32 {
        self.0
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        Color((self.0 & 0x00FF_FFFF) | ((alpha as u32) << 24))
    }

    /// Parses `#A`, `#RGB`, `#RRGGBB` and `#AARRGGBB`.
    ///
    /// `#A` repeats its single digit across all eight nibbles and `#RGB`
    /// doubles each digit into an opaque color. Any other shape, or a
    /// literal with non-hex digits, yields [`Color::TRANSPARENT`].
    pub fn parse_literal(literal: &str) -> Color {
        let literal = literal.trim();
        let Some(digits) = literal.strip_prefix('#') else {
            return Color::TRANSPARENT;
        };
        let expanded: String = match digits.len() {
            1 => digits.repeat(8),
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => digits.to_string(),
            _ => return Color::TRANSPARENT,
        };
        match u32::from_str_radix(&expanded, 16) {
            Ok(v) if expanded.len() == 6 => Color(0xFF00_0000 | v),
            Ok(v) => Color(v),
            Err(_) => Color::TRANSPARENT,
        }
    }

    /// Whether `value` is written as a color literal.
    pub fn is_literal(value: &str) -> bool {
        value.trim_start().starts_with('#')
    }

    /// Interpolates in linear light. Channels are decoded with a 2.2 gamma,
    /// mixed, and re-encoded; alpha is mixed directly.
    pub fn lerp_argb(self, end: Color, fraction: f32) -> Color {
        let channel = |c: u8| c as f32 / 255.0;
        let to_linear = |c: u8| channel(c).powf(2.2);

        let a = channel(self.alpha()) + fraction * (channel(end.alpha()) - channel(self.alpha()));
        let r = to_linear(self.red()) + fraction * (to_linear(end.red()) - to_linear(self.red()));
        let g = to_linear(self.green())
            + fraction * (to_linear(end.green()) - to_linear(self.green()));
        let b =
            to_linear(self.blue()) + fraction * (to_linear(end.blue()) - to_linear(self.blue()));

        let encode = |v: f32| (v.max(0.0).powf(1.0 / 2.2) * 255.0).round().clamp(0.0, 255.0) as u8;
        Color::from_argb(
            (a * 255.0).round().clamp(0.0, 255.0) as u8,
            encode(r),
            encode(g),
            encode(b),
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

impl From<u32> for Color {
    fn from(argb: u32) -> Self {
        Color(argb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_shapes() {
        assert_eq!(Color::parse_literal("#FF0000"), Color(0xFFFF0000));
        assert_eq!(Color::parse_literal("#80FF0000"), Color(0x80FF0000));
        assert_eq!(Color::parse_literal("#F00"), Color::parse_literal("#FFFF0000"));
        assert_eq!(Color::parse_literal("#8"), Color(0x88888888));
        assert_eq!(Color::parse_literal("#12345"), Color::TRANSPARENT);
        assert_eq!(Color::parse_literal("#GGGGGG"), Color::TRANSPARENT);
        assert_eq!(Color::parse_literal("red"), Color::TRANSPARENT);
    }

    #[test]
    fn test_channels() {
        let c = Color::from_argb(0x11, 0x22, 0x33, 0x44);
        assert_eq!(c.argb(), 0x11223344);
        assert_eq!((c.alpha(), c.red(), c.green(), c.blue()), (0x11, 0x22, 0x33, 0x44));
        assert_eq!(c.with_alpha(0xFF), Color(0xFF223344));
        assert_eq!(c.to_string(), "#11223344");
    }

    #[test]
    fn test_lerp_argb_endpoints_and_gamma() {
        let start = Color::BLACK;
        let end = Color::WHITE;
        assert_eq!(start.lerp_argb(end, 0.0), start);
        assert_eq!(start.lerp_argb(end, 1.0), end);
        // Halfway in linear light is brighter than the sRGB midpoint.
        let mid = start.lerp_argb(end, 0.5);
        assert!(mid.red() > 128, "got {}", mid);
        assert_eq!(mid.alpha(), 0xFF);
    }
}
