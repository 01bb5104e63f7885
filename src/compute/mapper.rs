//! Mapping of normalized genes onto physical parameter ranges.

use std::fmt;
use std::str::FromStr;

/// Physical quantities encoded by genes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Multiplier over the minimum enclosure area.
    Enlargement,
    /// Width to height ratio.
    AspectRatio,
    /// Degrees.
    Orientation,
    Density,
    Access,
    Ventilation,
    /// Meters.
    CorridorWidth,
    LayoutStyle,
    MainAccess,
    Connectivity,
}

impl Parameter {
    pub const ALL: [Parameter; 10] = [
        Parameter::Enlargement,
        Parameter::AspectRatio,
        Parameter::Orientation,
        Parameter::Density,
        Parameter::Access,
        Parameter::Ventilation,
        Parameter::CorridorWidth,
        Parameter::LayoutStyle,
        Parameter::MainAccess,
        Parameter::Connectivity,
    ];

    /// Inclusive (min, max) range of the parameter.
    pub const fn range(self) -> (f64, f64) {
        match self {
            Parameter::Enlargement => (1.0, 4.0),
            Parameter::AspectRatio => (0.5, 2.0),
            Parameter::Orientation => (0.0, 360.0),
            Parameter::Density => (0.8, 1.2),
            Parameter::CorridorWidth => (1.5, 4.0),
            Parameter::Access
            | Parameter::Ventilation
            | Parameter::LayoutStyle
            | Parameter::MainAccess
            | Parameter::Connectivity => (0.0, 1.0),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Parameter::Enlargement => "enlargement",
            Parameter::AspectRatio => "aspect_ratio",
            Parameter::Orientation => "orientation",
            Parameter::Density => "density",
            Parameter::Access => "access",
            Parameter::Ventilation => "ventilation",
            Parameter::CorridorWidth => "corridor_width",
            Parameter::LayoutStyle => "layout_style",
            Parameter::MainAccess => "main_access",
            Parameter::Connectivity => "connectivity",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parameter::ALL.into_iter().find(|p| p.name() == s).ok_or(())
    }
}

/// Map a normalized value in [0, 1] linearly onto the parameter's range.
#[inline]
pub fn map(parameter: Parameter, normalized: f64) -> f64 {
    let (min, max) = parameter.range();
    min + (max - min) * normalized
}

/// Map by parameter name. Unknown names pass the value through unchanged.
pub fn map_named(name: &str, normalized: f64) -> f64 {
    match name.parse::<Parameter>() {
        Ok(parameter) => map(parameter, normalized),
        Err(()) => normalized,
    }
}
