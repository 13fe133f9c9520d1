//! Re-aggregation of points into a regular geographic grid.

use std::collections::BTreeMap;

use hazard_map_hazard_models::{Cell, IntensityBand, LatLngBounds, Point};

use crate::SpatialError;

/// Ethiopia plus padding: the default binning extent.
pub const ETHIOPIA_EXTENT: LatLngBounds = LatLngBounds::new(3.0, 32.5, 15.5, 48.5);

/// Absorbs floating point noise when counting grid steps, so an extent that
/// is an exact multiple of the cell size does not gain an empty extra row.
const STEP_EPSILON: f64 = 1e-9;

/// Running `(sum, count)` of one cell, keyed by `(row, col)`.
type Buckets = BTreeMap<(usize, usize), (f64, usize)>;

/// Bins points into square cells of `cell_size` degrees covering `extent`
/// (defaults to [`ETHIOPIA_EXTENT`]).
///
/// The grid starts at the extent's south-west corner and has as many rows
/// and columns as it takes to cover the extent, so the last row and column
/// may reach past its north and east edges. A cell starting at `(lat, lng)`
/// collects the points in `[lat, lat + size) x [lng, lng + size)`; points
/// outside the grid are ignored. Empty cells are omitted. Each cell's mean
/// is normalized against the maximum value over *all* input points and
/// clamped to `[0, 1]`; a non-positive maximum normalizes everything to `0`.
///
/// Each point is visited once, so the cost does not depend on how fine the
/// grid is. Output is ordered south to north, then west to east.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidCellSize`] if `cell_size` is not a finite
/// positive number, or [`SpatialError::EmptyExtent`] if `extent` has no
/// area.
pub fn bin(
    points: &[Point],
    cell_size: f64,
    extent: Option<LatLngBounds>,
) -> Result<Vec<Cell>, SpatialError> {
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(SpatialError::InvalidCellSize { cell_size });
    }

    let extent = extent.unwrap_or(ETHIOPIA_EXTENT);
    if !extent.has_area() {
        return Err(SpatialError::EmptyExtent);
    }

    if points.is_empty() {
        return Ok(Vec::new());
    }

    let max_intensity = points
        .iter()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);

    let rows = steps(extent.lat_span(), cell_size);
    let cols = steps(extent.lng_span(), cell_size);

    let mut buckets = Buckets::new();
    for point in points {
        let Some(row) = cell_index(point.lat, extent.min_lat, cell_size, rows) else {
            continue;
        };
        let Some(col) = cell_index(point.lng, extent.min_lng, cell_size, cols) else {
            continue;
        };
        let (sum, count) = buckets.entry((row, col)).or_insert((0.0, 0));
        *sum += point.value;
        *count += 1;
    }

    let cells: Vec<Cell> = buckets
        .into_iter()
        .map(|((row, col), (sum, count))| {
            let lat = cell_origin(extent.min_lat, row, cell_size);
            let lng = cell_origin(extent.min_lng, col, cell_size);

            #[allow(clippy::cast_precision_loss)]
            let mean_value = sum / count as f64;
            let normalized_intensity = normalize_to_max(mean_value, max_intensity);

            Cell {
                bounds: LatLngBounds::new(lat, lng, lat + cell_size, lng + cell_size),
                mean_value,
                normalized_intensity,
                band: IntensityBand::from_normalized(normalized_intensity),
                point_count: count,
            }
        })
        .collect();

    log::debug!(
        "Binned {} points into {} cells ({rows}x{cols} grid, {cell_size} deg)",
        points.len(),
        cells.len()
    );

    Ok(cells)
}

/// `value / max`, clamped to `[0, 1]`; `0` when `max` is not positive.
#[must_use]
pub fn normalize_to_max(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn steps(span: f64, cell_size: f64) -> usize {
    (span / cell_size - STEP_EPSILON).ceil().max(0.0) as usize
}

/// Index of the grid step containing `value`, or `None` outside
/// `0..count`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cell_index(value: f64, start: f64, cell_size: f64, count: usize) -> Option<usize> {
    let offset = ((value - start) / cell_size).floor();
    if !offset.is_finite() || offset < 0.0 {
        return None;
    }

    // division can round across a boundary; cell origins are authoritative
    let mut index = offset as usize;
    if index > 0 && value < cell_origin(start, index, cell_size) {
        index -= 1;
    } else if value >= cell_origin(start, index + 1, cell_size) {
        index += 1;
    }

    (index < count).then_some(index)
}

#[allow(clippy::cast_precision_loss)]
fn cell_origin(start: f64, index: usize, cell_size: f64) -> f64 {
    (index as f64).mul_add(cell_size, start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_points(cells: &[Cell]) -> usize {
        cells.iter().map(|c| c.point_count).sum()
    }

    fn sample_points() -> Vec<Point> {
        let mut points = Vec::new();
        for i in 0..40 {
            let f = f64::from(i);
            points.push(Point::new(f.mul_add(0.3, 3.23), f.mul_add(0.37, 33.07), 1.0 + f));
        }
        points
    }

    #[test]
    fn averages_points_sharing_a_cell() {
        let points = vec![
            Point::new(9.1, 38.0, 2.0),
            Point::new(9.4, 38.4, 4.0),
            Point::new(12.2, 40.2, 8.0),
        ];
        let cells = bin(&points, 1.0, None).unwrap();

        assert_eq!(cells.len(), 2);
        assert_eq!(total_points(&cells), 3);

        let shared = &cells[0];
        assert_eq!(shared.point_count, 2);
        assert!((shared.mean_value - 3.0).abs() < 1e-12);
        assert!((shared.normalized_intensity - 3.0 / 8.0).abs() < 1e-12);
        assert!((shared.bounds.min_lat - 9.0).abs() < 1e-9);
        assert!((shared.bounds.max_lat - 10.0).abs() < 1e-9);
        assert!((shared.bounds.min_lng - 37.5).abs() < 1e-9);
        assert_eq!(shared.band, IntensityBand::Low);

        assert!((cells[1].normalized_intensity - 1.0).abs() < 1e-12);
        assert_eq!(cells[1].band, IntensityBand::VeryHigh);
    }

    #[test]
    fn cells_are_half_open() {
        let extent = LatLngBounds::new(0.0, 0.0, 2.0, 2.0);
        let points = vec![Point::new(1.0, 1.0, 1.0), Point::new(0.5, 0.5, 1.0)];
        let cells = bin(&points, 1.0, Some(extent)).unwrap();

        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| c.point_count == 1));
        assert!((cells[1].bounds.min_lat - 1.0).abs() < 1e-12);
        assert!((cells[1].bounds.min_lng - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ignores_points_outside_extent() {
        let points = vec![Point::new(20.0, 40.0, 5.0), Point::new(9.0, 40.0, 1.0)];
        let cells = bin(&points, 0.5, None).unwrap();

        assert_eq!(total_points(&cells), 1);
        // the maximum still comes from every input point
        assert!((cells[0].normalized_intensity - 0.2).abs() < 1e-12);
    }

    #[test]
    fn coarser_cells_never_represent_more_points() {
        let points = sample_points();
        let fine = bin(&points, 0.1, None).unwrap();
        let coarse = bin(&points, 0.5, None).unwrap();
        let coarser = bin(&points, 3.0, None).unwrap();

        assert!(total_points(&coarse) <= total_points(&fine));
        assert!(total_points(&coarser) <= total_points(&coarse));
        assert_eq!(total_points(&fine), points.len());
    }

    #[test]
    fn intensities_stay_in_unit_interval() {
        let mut points = sample_points();
        points.push(Point::new(7.0, 36.0, -12.0));
        for cell in bin(&points, 0.25, None).unwrap() {
            assert!((0.0..=1.0).contains(&cell.normalized_intensity));
        }
    }

    #[test]
    fn non_positive_maximum_normalizes_to_zero() {
        let points = vec![Point::new(9.0, 40.0, -1.0), Point::new(10.0, 41.0, -4.0)];
        for cell in bin(&points, 1.0, None).unwrap() {
            assert!(cell.normalized_intensity.abs() < f64::EPSILON);
            assert_eq!(cell.band, IntensityBand::Minimal);
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let points = sample_points();
        assert_eq!(
            bin(&points, 0.0, None),
            Err(SpatialError::InvalidCellSize { cell_size: 0.0 })
        );
        assert!(bin(&points, f64::NAN, None).is_err());
        assert_eq!(
            bin(&points, 1.0, Some(LatLngBounds::new(5.0, 5.0, 5.0, 6.0))),
            Err(SpatialError::EmptyExtent)
        );
    }

    #[test]
    fn last_row_spans_a_full_cell() {
        // 12.5 degrees of latitude is not a multiple of 0.3
        let points = vec![Point::new(15.55, 40.05, 2.0), Point::new(15.5, 40.05, 2.0)];
        let cells = bin(&points, 0.3, None).unwrap();

        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].point_count, 2);
        assert!((cells[0].bounds.min_lat - 15.3).abs() < 1e-9);
        assert!((cells[0].bounds.max_lat - 15.6).abs() < 1e-9);
        assert!((cells[0].bounds.min_lng - 40.0).abs() < 1e-9);

        // beyond the last row
        assert!(bin(&[Point::new(15.7, 40.05, 2.0)], 0.3, None).unwrap().is_empty());
    }

    #[test]
    fn fine_cells_only_cost_per_point() {
        // 125000 x 160000 grid
        let points = vec![Point::new(9.030_05, 38.740_05, 5.0), Point::new(3.0, 32.5, 1.0)];
        let cells = bin(&points, 0.000_1, None).unwrap();

        assert_eq!(cells.len(), 2);
        assert!((cells[0].bounds.min_lat - 3.0).abs() < 1e-9);
        let b = cells[1].bounds;
        assert!(b.min_lat < 9.030_05 && 9.030_05 < b.max_lat);
        assert!(b.min_lng < 38.740_05 && 38.740_05 < b.max_lng);
    }

    #[test]
    fn binning_is_deterministic() {
        let points = sample_points();
        assert_eq!(bin(&points, 0.2, None), bin(&points, 0.2, None));
    }
}
