// Imports
use serde::{Deserialize, Serialize};

/// A rgba color.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(default, rename = "color")]
pub struct Color {
    /// Red, ranging [0.0, 1.0].
    #[serde(rename = "r")]
    pub r: f64,
    /// Green, ranging [0.0, 1.0].
    #[serde(rename = "g")]
    pub g: f64,
    /// Blue, ranging [0.0, 1.0].
    #[serde(rename = "b")]
    pub b: f64,
    /// Alpha, ranging [0.0, 1.0].
    #[serde(rename = "a")]
    pub a: f64,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    /// Black.
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    /// Red, the default annotation color.
    pub const RED: Self = Self {
        r: 1.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    /// Yellow, the default highlight color.
    pub const YELLOW: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 0.0,
        a: 1.0,
    };

    /// A new color. The components get clamped to [0.0, 1.0].
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: crate::coordspace::clamp_unit(r),
            g: crate::coordspace::clamp_unit(g),
            b: crate::coordspace::clamp_unit(b),
            a: crate::coordspace::clamp_unit(a),
        }
    }

    /// Parses a `#rrggbb` or `#rrggbbaa` hex string.
    pub fn from_hex_str(hex: &str) -> anyhow::Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
            return Err(anyhow::anyhow!("invalid hex color `{hex}`"));
        }
        let component = |i: usize| -> anyhow::Result<f64> {
            Ok(f64::from(u8::from_str_radix(&digits[i..i + 2], 16)?) / 255.0)
        };
        let a = if digits.len() == 8 { component(6)? } else { 1.0 };

        Ok(Self::new(component(0)?, component(2)?, component(4)?, a))
    }

    /// The color as `#rrggbbaa` hex string.
    pub fn to_hex_string(&self) -> String {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            byte(self.r),
            byte(self.g),
            byte(self.b),
            byte(self.a)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parse_hex() {
        let color = Color::from_hex_str("#ff8000").unwrap();
        assert_relative_eq!(color.r, 1.0);
        assert_relative_eq!(color.g, 128.0 / 255.0);
        assert_relative_eq!(color.b, 0.0);
        assert_relative_eq!(color.a, 1.0);
        assert_eq!(color.to_hex_string(), "#ff8000ff");

        assert!(Color::from_hex_str("#ff80").is_err());
        assert!(Color::from_hex_str("#gg0000").is_err());
    }
}
