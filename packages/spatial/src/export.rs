//! `GeoJSON` rendering of binned cells.

use geo::Rect;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use hazard_map_hazard_models::{Cell, HazardType};

use crate::classify::color;

/// Renders cells as a `FeatureCollection` of square polygons.
///
/// Each feature carries `meanValue`, `normalizedIntensity`, `band`,
/// `color` and `pointCount` properties for styling and popups.
#[must_use]
pub fn cells_to_feature_collection(cells: &[Cell], hazard: HazardType) -> FeatureCollection {
    let features = cells
        .iter()
        .map(|cell| {
            let b = cell.bounds;
            let polygon = Rect::new((b.min_lng, b.min_lat), (b.max_lng, b.max_lat)).to_polygon();

            let mut properties = JsonObject::new();
            properties.insert("meanValue".to_string(), cell.mean_value.into());
            properties.insert(
                "normalizedIntensity".to_string(),
                cell.normalized_intensity.into(),
            );
            properties.insert("band".to_string(), cell.band.to_string().into());
            properties.insert("color".to_string(), color(cell.band, hazard).into());
            properties.insert("pointCount".to_string(), cell.point_count.into());

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&polygon))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let mut foreign_members = JsonObject::new();
    foreign_members.insert("hazard".to_string(), hazard.to_string().into());

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    }
}

#[cfg(test)]
mod tests {
    use hazard_map_hazard_models::{IntensityBand, LatLngBounds};

    use super::*;

    #[test]
    fn renders_cells_as_closed_squares() {
        let cells = vec![Cell {
            bounds: LatLngBounds::new(9.0, 38.0, 9.5, 38.5),
            mean_value: 12.0,
            normalized_intensity: 0.75,
            band: IntensityBand::High,
            point_count: 3,
        }];

        let fc = cells_to_feature_collection(&cells, HazardType::Rainfall);
        assert_eq!(fc.features.len(), 1);

        let feature = &fc.features[0];
        let props = feature.properties.as_ref().unwrap();
        assert_eq!(props["color"], serde_json::json!("#0077b6"));
        assert_eq!(props["band"], serde_json::json!("HIGH"));
        assert_eq!(props["pointCount"], serde_json::json!(3));

        let json = serde_json::to_value(feature).unwrap();
        let ring = &json["geometry"]["coordinates"][0];
        assert_eq!(ring.as_array().unwrap().len(), 5);
        assert_eq!(ring[0], ring[4]);
    }

    #[test]
    fn empty_cells_render_empty_collection() {
        let fc = cells_to_feature_collection(&[], HazardType::Temperature);
        assert!(fc.features.is_empty());
    }
}
