//! Breakpoint tables shared by classification and the legend.
//!
//! Each table is a single constant: `classify` looks values up in it and
//! `build_legend` lists its rows, so the two can never drift apart.

use super::Rgb;

/// Test applied to a numeric value by one table row
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bound {
    /// `value <= x`
    AtMost(f64),
    /// `value < x`
    Below(f64),
    /// `value >= x`
    AtLeast(f64),
}

impl Bound {
    #[inline]
    pub fn matches(self, value: f64) -> bool {
        match self {
            Bound::AtMost(x) => value <= x,
            Bound::Below(x) => value < x,
            Bound::AtLeast(x) => value >= x,
        }
    }
}

/// One classification row: predicate, output and legend label
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Breakpoint<T: 'static> {
    pub bound: Bound,
    pub output: T,
    pub label: &'static str,
}

/// Ordered numeric classification, evaluated top to bottom.
///
/// `fallback` answers missing or non-finite input. `unmatched` answers a
/// finite value that no row accepts; for the shipped tables it is
/// unreachable but still part of the table.
#[derive(Debug)]
pub struct BreakpointTable<T: 'static> {
    pub rows: &'static [Breakpoint<T>],
    pub fallback: T,
    pub unmatched: T,
}

impl<T: 'static> BreakpointTable<T> {
    /// Index of the first row accepting `value`, if any
    pub fn row_index(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        self.rows.iter().position(|row| row.bound.matches(value))
    }

    /// Classify a possibly-missing value
    pub fn lookup(&self, value: Option<f64>) -> &T {
        match value {
            Some(v) if v.is_finite() => match self.row_index(v) {
                Some(idx) => &self.rows[idx].output,
                None => &self.unmatched,
            },
            _ => &self.fallback,
        }
    }

    pub fn outputs(&self) -> impl Iterator<Item = &T> + '_ {
        self.rows.iter().map(|row| &row.output)
    }
}

/// Code → output lookup with a default for unknown codes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Category<T: 'static> {
    pub code: &'static str,
    pub label: &'static str,
    pub output: T,
}

#[derive(Debug)]
pub struct CategoricalTable<T: 'static> {
    pub entries: &'static [Category<T>],
    pub default: T,
}

impl<T: 'static> CategoricalTable<T> {
    /// Exact match on the trimmed code; empty or unknown codes get the default
    pub fn lookup(&self, code: Option<&str>) -> &T {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return &self.default;
        };
        self.entries
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| &entry.output)
            .unwrap_or(&self.default)
    }
}

/// Share of renter households spending 30%+ of income on shelter.
///
/// The first row uses `<=` while the legend says "< 11%", and the last row
/// makes `unmatched` unreachable. Both are kept as-is.
pub static SHELTER_COST_COLORS: BreakpointTable<Rgb> = BreakpointTable {
    rows: &[
        Breakpoint { bound: Bound::AtMost(11.0), output: Rgb::hex(0xe8e5f0), label: "< 11%" },
        Breakpoint { bound: Bound::Below(32.0), output: Rgb::hex(0xbeacd3), label: "11–32%" },
        Breakpoint { bound: Bound::Below(41.0), output: Rgb::hex(0x9373b7), label: "32-41%" },
        Breakpoint { bound: Bound::Below(51.0), output: Rgb::hex(0x69399a), label: "41-51%" },
        Breakpoint { bound: Bound::AtLeast(51.0), output: Rgb::hex(0x3f007d), label: "≥ 51%" },
    ],
    fallback: Rgb::hex(0xf0f0f0),
    unmatched: Rgb::hex(0xf16913),
};

/// Marker radius by percent of households that rent.
///
/// Non-numeric input lands in the largest bucket, same as `>= 60`.
pub static RENTER_RADII: BreakpointTable<f64> = BreakpointTable {
    rows: &[
        Breakpoint { bound: Bound::Below(30.0), output: 20.0, label: "< 30%" },
        Breakpoint { bound: Bound::Below(40.0), output: 30.0, label: "30–40%" },
        Breakpoint { bound: Bound::Below(50.0), output: 40.0, label: "40–50%" },
        Breakpoint { bound: Bound::Below(60.0), output: 50.0, label: "50–60%" },
        Breakpoint { bound: Bound::AtLeast(60.0), output: 60.0, label: "≥ 60%" },
    ],
    fallback: 60.0,
    unmatched: 60.0,
};

/// MPP party colors
pub static PARTY_COLORS: CategoricalTable<Rgb> = CategoricalTable {
    entries: &[
        Category { code: "PC", label: "Progressive Conservative", output: Rgb::hex(0x1a4782) },
        Category { code: "OLP", label: "Liberal", output: Rgb::hex(0xd71920) },
        Category { code: "NDP", label: "NDP", output: Rgb::hex(0xf37021) },
    ],
    default: Rgb::hex(0x666666),
};
