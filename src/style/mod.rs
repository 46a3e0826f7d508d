mod classify;
pub mod scale;

pub use classify::{classify, DEFAULT_MARKER};
pub use scale::{Bound, BreakpointTable, CategoricalTable, PARTY_COLORS, RENTER_RADII, SHELTER_COST_COLORS};

use std::fmt;

/// 24-bit color, written as CSS hex
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Build from a 0xRRGGBB literal
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Format with `digits` decimals, rounding exact ties away from zero.
/// `{:.N}` alone rounds exact ties to even.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if value.is_finite() && is_decimal_tie(value, digits) {
        // The next float out is past the midpoint, so it rounds away
        let away = f64::from_bits(value.to_bits() + 1);
        return format!("{away:.digits$}");
    }
    format!("{value:.digits$}")
}

/// Whether `value` lies exactly halfway between two `digits`-decimal numbers.
///
/// With `value = m * 2^e`, that holds iff `value * 2 * 10^digits` is an odd
/// integer, i.e. the powers of two cancel exactly.
fn is_decimal_tie(value: f64, digits: usize) -> bool {
    let bits = value.to_bits();
    let exp_field = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if exp_field == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exp_field - 1075)
    };
    if mantissa == 0 {
        return false;
    }
    mantissa.trailing_zeros() as i64 + exp + 1 + digits as i64 == 0
}

/// Stroke and fill for line and polygon geometry
#[derive(Clone, Debug, PartialEq)]
pub struct VectorStyle {
    pub stroke: Rgb,
    pub weight: f32,
    /// Stroke opacity in [0, 1]
    pub opacity: f64,
    /// `None` means the fill (if any) reuses the stroke color
    pub fill: Option<Rgb>,
    pub fill_opacity: f64,
}

impl VectorStyle {
    /// The color used for the polygon interior
    pub fn fill_color(&self) -> Rgb {
        self.fill.unwrap_or(self.stroke)
    }
}

/// Point symbol: a filled circle with an optional centred label
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerStyle {
    pub fill: Rgb,
    /// Radius in screen pixels at the original map scale
    pub radius: f64,
    pub label: Option<String>,
}

impl MarkerStyle {
    pub fn diameter(&self) -> f64 {
        self.radius * 2.0
    }
}

/// Output of classification: exactly one shape per feature
#[derive(Clone, Debug, PartialEq)]
pub enum StyleDescriptor {
    Vector(VectorStyle),
    Marker(MarkerStyle),
}

impl StyleDescriptor {
    pub fn as_vector(&self) -> Option<&VectorStyle> {
        match self {
            StyleDescriptor::Vector(style) => Some(style),
            StyleDescriptor::Marker(_) => None,
        }
    }

    pub fn as_marker(&self) -> Option<&MarkerStyle> {
        match self {
            StyleDescriptor::Marker(marker) => Some(marker),
            StyleDescriptor::Vector(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_display() {
        assert_eq!(Rgb::hex(0x69399a).to_string(), "#69399a");
        assert_eq!(Rgb::hex(0xF37021).to_string(), "#f37021");
    }

    #[test]
    fn test_to_fixed_rounds_ties_away_from_zero() {
        assert_eq!(to_fixed(42.5, 0), "43");
        assert_eq!(to_fixed(0.5, 0), "1");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(-2.5, 0), "-3");
        assert_eq!(to_fixed(41.25, 1), "41.3");
        assert_eq!(to_fixed(0.25, 1), "0.3");
    }

    #[test]
    fn test_to_fixed_non_ties_unchanged() {
        assert_eq!(to_fixed(42.4, 0), "42");
        assert_eq!(to_fixed(45.0, 1), "45.0");
        assert_eq!(to_fixed(55.27, 1), "55.3");
        // 1.005 is stored just below the midpoint
        assert_eq!(to_fixed(1.005, 2), "1.00");
        // 0.15 is stored just below 0.15, not a tie
        assert_eq!(to_fixed(0.15, 1), "0.1");
        assert_eq!(to_fixed(0.0, 1), "0.0");
    }

    #[test]
    fn test_fill_defaults_to_stroke() {
        let style = VectorStyle {
            stroke: Rgb::hex(0x000000),
            weight: 2.0,
            opacity: 1.0,
            fill: None,
            fill_opacity: 0.0,
        };
        assert_eq!(style.fill_color(), Rgb::hex(0x000000));
    }
}
