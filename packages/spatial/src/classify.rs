//! Intensity classification and per-hazard color tables.

use hazard_map_hazard_models::{HazardType, IntensityBand};

/// Blue scale, lightest first.
const RAINFALL_PALETTE: [&str; 6] = [
    "#e6f2ff", "#caf0f8", "#90e0ef", "#00b4d8", "#0077b6", "#03045e",
];

/// Blue to red, coolest first.
const TEMPERATURE_PALETTE: [&str; 6] = [
    "#118ab2", "#06d6a0", "#ffd166", "#fb8b24", "#e36414", "#9a031e",
];

/// A band together with the color it is drawn in for a given hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorClass {
    pub band: IntensityBand,
    /// `#rrggbb`.
    pub color: &'static str,
}

/// Classifies a normalized intensity for `hazard`.
///
/// Both hazards share the band boundaries (`> 0.9`, `> 0.7`, `> 0.5`,
/// `> 0.3`, `> 0.1`, else); only the palette differs.
#[must_use]
pub fn classify(intensity: f64, hazard: HazardType) -> ColorClass {
    let band = IntensityBand::from_normalized(intensity);
    ColorClass {
        band,
        color: color(band, hazard),
    }
}

/// Color of `band` in the palette of `hazard`.
#[must_use]
pub const fn color(band: IntensityBand, hazard: HazardType) -> &'static str {
    palette(hazard)[band as usize]
}

/// The six colors used for `hazard`, coolest band first.
#[must_use]
pub const fn palette(hazard: HazardType) -> &'static [&'static str; 6] {
    match hazard {
        HazardType::Rainfall => &RAINFALL_PALETTE,
        HazardType::Temperature => &TEMPERATURE_PALETTE,
    }
}

/// Min-max normalization of a raw value into `[0, 1]`.
///
/// Callers pass a range from [`hazard_map_hazard_models::Raster::value_range`],
/// which never has `min == max`.
#[must_use]
pub fn normalize_to_range(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}
