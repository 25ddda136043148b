//! Named size presets.
//!
//! A preset fills in the unit and both values of a [`SizeSpec`]; the DPI is
//! left to the caller. Explicit values given alongside a preset win.

use crate::resolve::{SizeSpec, Unit};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// A4 paper, portrait, in centimeters.
    A4,
    FullHd,
    UltraHd,
    Square,
    Story,
    /// Pixels with empty values, which resolve to the pixel defaults.
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::A4,
        Preset::FullHd,
        Preset::UltraHd,
        Preset::Square,
        Preset::Story,
        Preset::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::A4 => "a4",
            Preset::FullHd => "full-hd",
            Preset::UltraHd => "4k",
            Preset::Square => "square",
            Preset::Story => "story",
            Preset::Custom => "custom",
        }
    }

    /// `(unit, value_a, value_b)`.
    pub fn values(self) -> (Unit, &'static str, &'static str) {
        match self {
            Preset::A4 => (Unit::Centimeters, "21", "29.7"),
            Preset::FullHd => (Unit::Pixels, "1920", "1080"),
            Preset::UltraHd => (Unit::Pixels, "3840", "2160"),
            Preset::Square => (Unit::Pixels, "1080", "1080"),
            Preset::Story => (Unit::Pixels, "1080", "1920"),
            Preset::Custom => (Unit::Pixels, "", ""),
        }
    }

    /// Build a size request from this preset at `dpi`.
    pub fn size_spec(self, dpi: &str) -> SizeSpec {
        let (unit, a, b) = self.values();
        SizeSpec::new(unit.as_str(), a, b, dpi)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Preset::ALL.iter().map(|p| p.name()).collect();
                format!("unknown preset '{s}' (expected one of: {})", names.join(", "))
            })
    }
}
