//! Hex and HSL color encodings.
//!
//! Custom colors are entered as `#rrggbb` hex while style variables are
//! exposed in the space separated `"<h> <s>% <l>%"` form.

use eframe::egui;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid hex color '{0}'")]
    InvalidHex(String),
    #[error("invalid HSL value '{0}'")]
    InvalidHsl(String),
}

/// Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    /// Parse `"<h> <s>% <l>%"`. The percent signs are optional.
    pub fn parse(value: &str) -> Result<Self, ColorError> {
        let invalid = || ColorError::InvalidHsl(value.to_string());
        let mut parts = value.split_whitespace();
        let (Some(h), Some(s), Some(l), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        let number = |part: &str| -> Result<f64, ColorError> {
            let n: f64 = part.trim_end_matches('%').parse().map_err(|_| invalid())?;
            if n.is_finite() {
                Ok(n)
            } else {
                Err(invalid())
            }
        };
        let hsl = Hsl {
            h: number(h)?,
            s: number(s)?,
            l: number(l)?,
        };
        if !(0.0..=100.0).contains(&hsl.s) || !(0.0..=100.0).contains(&hsl.l) {
            return Err(invalid());
        }
        Ok(hsl)
    }

    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        let r = r as f64 / 255.0;
        let g = g as f64 / 255.0;
        let b = b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        if max == min {
            return Hsl {
                h: 0.0,
                s: 0.0,
                l: l * 100.0,
            };
        }
        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        Hsl {
            h: h * 60.0,
            s: s * 100.0,
            l: l * 100.0,
        }
    }

    pub fn to_rgb(&self) -> [u8; 3] {
        let s = self.s / 100.0;
        let l = self.l / 100.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = self.h.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let (r, g, b) = match hp as u8 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        [channel(r), channel(g), channel(b)]
    }

    pub fn to_hex(&self) -> String {
        format!("#{}", hex::encode(self.to_rgb()))
    }

    /// Whole-number components, as produced by hex conversion.
    pub fn rounded(&self) -> Self {
        Hsl {
            h: self.h.round(),
            s: self.s.round(),
            l: self.l.round(),
        }
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}% {}%", self.h, self.s, self.l)
    }
}

/// Parse `#rgb` or `#rrggbb` (leading `#` optional) into RGB bytes.
pub fn parse_hex(value: &str) -> Result<[u8; 3], ColorError> {
    let invalid = || ColorError::InvalidHex(value.to_string());
    let digits = value.trim().trim_start_matches('#');
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(invalid()),
    };
    let bytes = hex::decode(expanded).map_err(|_| invalid())?;
    match bytes.as_slice() {
        [r, g, b] => Ok([*r, *g, *b]),
        _ => Err(invalid()),
    }
}

/// Lowercase `#rrggbb` form of a valid hex color.
pub fn normalize_hex(value: &str) -> Result<String, ColorError> {
    parse_hex(value).map(|rgb| format!("#{}", hex::encode(rgb)))
}

/// `#rrggbb` to `"<h> <s>% <l>%"` with integer components.
pub fn hex_to_hsl(value: &str) -> Result<String, ColorError> {
    let rgb = parse_hex(value)?;
    Ok(Hsl::from_rgb(rgb).rounded().to_string())
}

/// `"<h> <s>% <l>%"` to `#rrggbb`.
pub fn hsl_to_hex(value: &str) -> Result<String, ColorError> {
    Ok(Hsl::parse(value)?.to_hex())
}

pub fn hsl_to_color32(value: &str) -> Result<egui::Color32, ColorError> {
    let [r, g, b] = Hsl::parse(value)?.to_rgb();
    Ok(egui::Color32::from_rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_known_values() {
        assert_eq!(hex_to_hsl("#faf7f5").unwrap(), "24 33% 97%");
        assert_eq!(hex_to_hsl("#09090b").unwrap(), "240 10% 4%");
        assert_eq!(hex_to_hsl("#ff0000").unwrap(), "0 100% 50%");
        assert_eq!(hex_to_hsl("#ffffff").unwrap(), "0 0% 100%");
        assert_eq!(hsl_to_hex("0 100% 50%").unwrap(), "#ff0000");
        assert_eq!(hsl_to_hex("24 33% 97%").unwrap(), "#faf7f5");
    }

    #[test]
    fn accepts_fractional_table_values() {
        assert_eq!(hsl_to_hex("0 0% 98%").unwrap(), "#fafafa");
        assert!(hsl_to_hex("240 10% 3.9%").is_ok());
        assert!(hsl_to_hex("346.8 77.2% 49.8%").is_ok());
    }

    #[test]
    fn round_trip_stays_close() {
        let samples = [
            "#faf7f5", "#09090b", "#a7c5bd", "#b9c8c5", "#123456", "#ff8800", "#00ffcc",
            "#7f7f7f", "#010203", "#fefdfc", "#336699", "#c0ffee",
        ];
        for hex in samples {
            let back = hsl_to_hex(&hex_to_hsl(hex).unwrap()).unwrap();
            let a = parse_hex(hex).unwrap();
            let b = parse_hex(&back).unwrap();
            for (x, y) in a.iter().zip(b.iter()) {
                assert!(
                    (*x as i16 - *y as i16).abs() <= 5,
                    "{hex} came back as {back}"
                );
            }
        }
    }

    #[test]
    fn short_hex_is_expanded() {
        assert_eq!(parse_hex("#fff").unwrap(), [255, 255, 255]);
        assert_eq!(normalize_hex("#ABC").unwrap(), "#aabbcc");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#gggggg").is_err());
        assert!(Hsl::parse("1 2").is_err());
        assert!(Hsl::parse("1 200% 3%").is_err());
        assert!(Hsl::parse("a b c").is_err());
    }

    #[test]
    fn hsl_maps_to_egui_color() {
        assert_eq!(hsl_to_color32("0 0% 100%").unwrap(), egui::Color32::WHITE);
        assert_eq!(hsl_to_color32("0 100% 50%").unwrap(), egui::Color32::from_rgb(255, 0, 0));
        assert!(hsl_to_color32("red").is_err());
    }
}
