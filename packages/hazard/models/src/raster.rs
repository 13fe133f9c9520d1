//! Raster payloads as received from the hazard API and their validated form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::LatLngBounds;

/// Descriptive statistics returned alongside a raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub sum: f64,
}

impl Stats {
    /// Computes statistics over the given values.
    ///
    /// Returns `None` when `values` is empty.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let sum: f64 = sorted.iter().sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / sorted.len() as f64;
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            f64::midpoint(sorted[mid - 1], sorted[mid])
        } else {
            sorted[mid]
        };

        Some(Self {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean,
            median,
            sum,
        })
    }
}

/// A raster response exactly as the API sends it.
///
/// Every field is optional on the wire; [`Raster::try_from`] decides whether
/// the payload is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RasterResponse {
    /// Row-major grid; row 0 is the northernmost row.
    #[serde(default)]
    pub data: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub bounds: Option<LatLngBounds>,
    #[serde(default)]
    pub stats: Option<Stats>,
}

/// Reason a raster payload cannot be converted into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedRaster {
    #[error("raster payload has no data grid")]
    MissingData,
    #[error("raster payload has no bounds")]
    MissingBounds,
    #[error("raster grid is empty")]
    EmptyGrid,
    #[error("raster bounds do not span a positive area")]
    InvertedBounds,
}

/// A validated raster: non-empty grid plus a bounding box with positive area.
///
/// Rows may be ragged; [`Raster::cols`] is the width of the first row and
/// consumers treat missing trailing cells as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    pub values: Vec<Vec<Option<f64>>>,
    pub bounds: LatLngBounds,
    /// Server-provided stats, or re-derived from the grid when absent.
    pub stats: Option<Stats>,
}

impl Raster {
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }

    /// Iterates over every non-null value in row-major order.
    pub fn present_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flatten().filter_map(|v| *v)
    }

    /// Observed `(min, max)` over non-null cells.
    ///
    /// A degenerate range is widened to `(min, min + 1)` so min-max
    /// normalization never divides by zero. An all-null grid yields
    /// `(0, 1)`.
    #[must_use]
    pub fn value_range(&self) -> (f64, f64) {
        let (min, max) = self
            .present_values()
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 1.0));

        if (max - min).abs() < f64::EPSILON {
            (min, min + 1.0)
        } else {
            (min, max)
        }
    }
}

impl TryFrom<RasterResponse> for Raster {
    type Error = MalformedRaster;

    fn try_from(response: RasterResponse) -> Result<Self, Self::Error> {
        let values = response.data.ok_or(MalformedRaster::MissingData)?;
        let bounds = response.bounds.ok_or(MalformedRaster::MissingBounds)?;

        if values.first().is_none_or(Vec::is_empty) {
            return Err(MalformedRaster::EmptyGrid);
        }
        if !bounds.has_area() {
            return Err(MalformedRaster::InvertedBounds);
        }

        let mut raster = Self {
            values,
            bounds,
            stats: response.stats,
        };

        if raster.stats.is_none() {
            let present: Vec<f64> = raster.present_values().collect();
            raster.stats = Stats::from_values(&present);
        }

        Ok(raster)
    }
}
