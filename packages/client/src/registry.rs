//! Compile-time catalog of hazard datasets.
//!
//! Each hazard is described by a TOML file under `hazards/` (display title,
//! unit and the periods it can be viewed at). The catalog embeds these at
//! compile time and exposes them via [`all_hazards`] and [`hazard`].

use hazard_map_hazard_models::{HazardType, Period};
use serde::Deserialize;

/// A hazard dataset as offered to users.
#[derive(Debug, Clone, Deserialize)]
pub struct HazardDefinition {
    pub slug: HazardType,
    /// Human-readable name.
    pub title: String,
    /// Unit of raster and series values (e.g., `"mm"`).
    pub unit: String,
    /// Selectable periods, in display order.
    pub periods: Vec<PeriodOption>,
}

/// One selectable period of a hazard.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodOption {
    pub label: String,
    pub value: Period,
    /// Whether a date must be picked before data can be requested.
    /// Seasonal views pick a season key instead.
    #[serde(default = "default_true")]
    pub needs_date: bool,
}

const fn default_true() -> bool {
    true
}

impl HazardDefinition {
    /// Returns the option for `period`, if this hazard offers it.
    #[must_use]
    pub fn period(&self, period: Period) -> Option<&PeriodOption> {
        self.periods.iter().find(|p| p.value == period)
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const HAZARD_TOMLS: &[(&str, &str)] = &[
    ("rainfall", include_str!("../hazards/rainfall.toml")),
    ("temperature", include_str!("../hazards/temperature.toml")),
];

/// Returns every hazard definition, in catalog order.
///
/// # Panics
///
/// Panics if any TOML definition is malformed (this is a compile-time
/// guarantee since the definitions are embedded).
#[must_use]
pub fn all_hazards() -> Vec<HazardDefinition> {
    HAZARD_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse hazard definition '{name}': {e}"))
        })
        .collect()
}

/// Returns the definition of `slug`.
#[must_use]
pub fn hazard(slug: HazardType) -> Option<HazardDefinition> {
    all_hazards().into_iter().find(|h| h.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_hazard_type_has_a_definition() {
        let hazards = all_hazards();
        assert_eq!(hazards.len(), HazardType::all().len());
        for slug in HazardType::all() {
            assert!(hazard(*slug).is_some(), "missing definition for {slug}");
        }
    }

    #[test]
    fn definitions_offer_every_period_once() {
        for def in all_hazards() {
            for period in Period::all() {
                let count = def.periods.iter().filter(|p| p.value == *period).count();
                assert_eq!(count, 1, "{} offers {period} {count} times", def.slug);
            }
        }
    }

    #[test]
    fn only_seasonal_skips_the_date_picker() {
        let rainfall = hazard(HazardType::Rainfall).unwrap();
        assert_eq!(rainfall.unit, "mm");
        assert!(!rainfall.period(Period::Seasonal).unwrap().needs_date);
        assert!(rainfall.period(Period::Daily).unwrap().needs_date);

        let temperature = hazard(HazardType::Temperature).unwrap();
        assert_eq!(temperature.title, "Temperature");
    }
}
