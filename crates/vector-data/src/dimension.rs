use crate::metrics::DisplayMetrics;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionUnit {
    Px,
    Dip,
    Sp,
    Pt,
    In,
    Mm,
}

impl DimensionUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "px" => Some(DimensionUnit::Px),
            "dip" | "dp" => Some(DimensionUnit::Dip),
            "sp" => Some(DimensionUnit::Sp),
            "pt" => Some(DimensionUnit::Pt),
            "in" => Some(DimensionUnit::In),
            "mm" => Some(DimensionUnit::Mm),
            _ => None,
        }
    }
}

/// A number with a unit suffix, e.g. `24dp`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    pub value: f32,
    pub unit: DimensionUnit,
}

impl Dimension {
    /// Converts to pixels under the given metrics.
    pub fn to_px(&self, metrics: &DisplayMetrics) -> f32 {
        match self.unit {
            DimensionUnit::Px => self.value,
            DimensionUnit::Dip => self.value * metrics.density,
            DimensionUnit::Sp => self.value * metrics.scaled_density,
            DimensionUnit::Pt => self.value * metrics.xdpi / 72.0,
            DimensionUnit::In => self.value * metrics.xdpi,
            DimensionUnit::Mm => self.value * metrics.xdpi / 25.4,
        }
    }
}

impl FromStr for Dimension {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or(())?;
        let (number, suffix) = s.split_at(split);
        let unit = DimensionUnit::from_suffix(&suffix.to_ascii_lowercase()).ok_or(())?;
        let value = number.trim().parse::<f32>().map_err(|_| ())?;
        Ok(Dimension { value, unit })
    }
}

/// Reads the numeric part of a dimension string, ignoring its unit.
/// Plain numbers are accepted as-is.
pub fn dimension_value(raw: &str) -> Option<f32> {
    match raw.parse::<Dimension>() {
        Ok(d) => Some(d.value),
        Err(()) => raw.trim().parse::<f32>().ok(),
    }
}
