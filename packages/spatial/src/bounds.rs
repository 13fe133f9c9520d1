//! Map extent of a region boundary collection.

use geo::{BoundingRect, Coord, MultiPoint};
use geojson::{Feature, FeatureCollection};
use hazard_map_hazard_models::LatLngBounds;

/// Axis-aligned bounds of every region in `collection`.
///
/// `Point` features contribute their coordinate, `Polygon` features their
/// outer ring and `MultiPolygon` features the outer ring of each member.
/// Holes and other geometry types are ignored and no projection correction
/// is applied. Returns `None` when nothing contributed a coordinate.
#[must_use]
pub fn compute_bounds(collection: &FeatureCollection) -> Option<LatLngBounds> {
    let coords: Vec<Coord<f64>> = collection.features.iter().flat_map(outer_coords).collect();

    if coords.is_empty() {
        log::debug!(
            "No usable coordinates in {} region features",
            collection.features.len()
        );
        return None;
    }

    let rect = MultiPoint::from(coords).bounding_rect()?;

    // GeoJSON positions are (lng, lat)
    Some(LatLngBounds::new(
        rect.min().y,
        rect.min().x,
        rect.max().y,
        rect.max().x,
    ))
}

fn outer_coords(feature: &Feature) -> Vec<Coord<f64>> {
    let Some(geometry) = feature.geometry.clone() else {
        return Vec::new();
    };

    let geometry: geo::Geometry<f64> = match geometry.try_into() {
        Ok(g) => g,
        Err(e) => {
            log::warn!("Skipping region with unreadable geometry: {e}");
            return Vec::new();
        }
    };

    match geometry {
        geo::Geometry::Point(p) => vec![p.0],
        geo::Geometry::Polygon(p) => p.exterior().coords().copied().collect(),
        geo::Geometry::MultiPolygon(mp) => mp
            .iter()
            .flat_map(|p| p.exterior().coords().copied())
            .collect(),
        _ => Vec::new(),
    }
}
