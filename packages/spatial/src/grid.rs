//! Raster grid to point conversion.

use hazard_map_hazard_models::{Point, Raster};

/// Converts a raster into one point per non-empty cell, at the cell center.
///
/// Row 0 is taken to be the northernmost row, so latitude decreases with the
/// row index while longitude increases with the column index. Cells that are
/// null or exactly zero are treated as "no data" and skipped. Rows shorter
/// than the first row contribute only the cells they have.
///
/// An empty grid yields no points and is logged rather than reported as an
/// error, so a bad payload renders as an empty layer.
#[must_use]
#[allow(clippy::float_cmp, clippy::cast_precision_loss)]
pub fn to_points(raster: &Raster) -> Vec<Point> {
    let rows = raster.rows();
    let cols = raster.cols();

    if rows == 0 || cols == 0 {
        log::warn!("Raster grid is empty ({rows}x{cols}); no points produced");
        return Vec::new();
    }

    let b = &raster.bounds;
    let cell_height = b.lat_span() / rows as f64;
    let cell_width = b.lng_span() / cols as f64;

    let mut points = Vec::new();

    for (row, values) in raster.values.iter().enumerate() {
        let lat = (row as f64 + 0.5).mul_add(-cell_height, b.max_lat);

        for (col, value) in values.iter().take(cols).enumerate() {
            let Some(value) = *value else {
                continue;
            };
            if value == 0.0 {
                continue;
            }

            let lng = (col as f64 + 0.5).mul_add(cell_width, b.min_lng);
            points.push(Point::new(lat, lng, value));
        }
    }

    log::debug!(
        "Converted {rows}x{cols} raster into {} points",
        points.len()
    );

    points
}
