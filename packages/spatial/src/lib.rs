#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geospatial transformations for hazard layers.
//!
//! The pipeline from a fetched raster to something a map can draw:
//!
//! 1. [`grid::to_points`] turns a raster grid plus its bounding box into
//!    geolocated cell-center points, dropping empty cells.
//! 2. [`binning::bin`] re-aggregates points into a regular grid of fixed
//!    cell size (one pass over the points) and normalizes each cell's
//!    mean against the dataset maximum.
//! 3. [`classify::classify`] maps a normalized intensity to one of six
//!    ordered bands and the hazard's color for that band.
//!
//! [`bounds::compute_bounds`] derives the map extent from region boundary
//! polygons, and [`export::cells_to_feature_collection`] renders binned
//! cells as `GeoJSON`.

pub mod binning;
pub mod bounds;
pub mod classify;
pub mod export;
pub mod grid;

pub use binning::{ETHIOPIA_EXTENT, bin};
pub use bounds::compute_bounds;
pub use classify::{ColorClass, classify};
pub use export::cells_to_feature_collection;
pub use grid::to_points;

use thiserror::Error;

/// Errors from spatial operations on caller-supplied parameters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SpatialError {
    /// Cell size must be a finite, strictly positive number of degrees.
    #[error("Invalid cell size: {cell_size}")]
    InvalidCellSize {
        /// The rejected cell size.
        cell_size: f64,
    },

    /// The binning extent does not span a positive area.
    #[error("Binning extent has no area")]
    EmptyExtent,
}
