//! Minimal GeoJSON types for map overlays.
//!
//! Only the geometry kinds the map draws are modelled: points (selected
//! location, search hits) and line strings (routes).

use serde::{Deserialize, Serialize};

use crate::location::Coordinates;
use crate::search::SearchResultSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
}

impl Geometry {
    #[must_use]
    pub fn point(at: Coordinates) -> Self {
        Geometry::Point {
            coordinates: at.position(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl From<&SearchResultSet> for FeatureCollection {
    fn from(set: &SearchResultSet) -> Self {
        let features = set
            .results
            .iter()
            .map(|result| {
                let mut properties = serde_json::Map::new();
                properties.insert("label".to_owned(), result.label.clone().into());
                properties.insert(
                    "relevanceScore".to_owned(),
                    serde_json::json!(result.relevance_score),
                );
                Feature {
                    id: Some(result.id.clone()),
                    geometry: Geometry::point(result.coordinates),
                    properties,
                }
            })
            .collect();
        Self { features }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchResult;

    #[test]
    fn feature_collection_serializes_with_type_tags() {
        let c = Coordinates::new(10.8, 106.7).unwrap();
        let fc = FeatureCollection::new(vec![Feature {
            id: None,
            geometry: Geometry::point(c),
            properties: serde_json::Map::new(),
        }]);
        let v = serde_json::to_value(&fc).unwrap();
        assert_eq!(v["type"], "FeatureCollection");
        assert_eq!(v["features"][0]["type"], "Feature");
        assert_eq!(v["features"][0]["geometry"]["type"], "Point");
        assert_eq!(
            v["features"][0]["geometry"]["coordinates"],
            serde_json::json!([106.7, 10.8])
        );
    }

    #[test]
    fn line_string_parses() {
        let g: Geometry = serde_json::from_value(serde_json::json!({
            "type": "LineString",
            "coordinates": [[106.7, 10.8], [106.71, 10.81]]
        }))
        .unwrap();
        assert!(matches!(g, Geometry::LineString { ref coordinates } if coordinates.len() == 2));
    }

    #[test]
    fn search_results_become_point_features() {
        let set = SearchResultSet {
            results: vec![SearchResult {
                id: "l-1".to_owned(),
                label: "Studio".to_owned(),
                coordinates: Coordinates::new(10.77, 106.69).unwrap(),
                relevance_score: 0.9,
            }],
            explanation: None,
        };
        let fc = FeatureCollection::from(&set);
        assert_eq!(fc.len(), 1);
        assert_eq!(fc.features[0].id.as_deref(), Some("l-1"));
        assert_eq!(fc.features[0].properties["label"], "Studio");
    }
}
