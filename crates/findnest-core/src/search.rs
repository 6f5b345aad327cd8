//! AI search payloads and the transient result set shown in the search panel.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::location::Coordinates;
use crate::CoreError;

/// `{lat, lng}` pair as used by the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinates`] for non-finite or
    /// out-of-range values.
    pub fn to_coordinates(self) -> Result<Coordinates, CoreError> {
        Coordinates::new(self.lat, self.lng)
    }
}

impl From<Coordinates> for LatLng {
    fn from(c: Coordinates) -> Self {
        Self {
            lat: c.latitude(),
            lng: c.longitude(),
        }
    }
}

/// One listing recommended by the AI search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecommendation {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub address: String,
    pub location: Option<LatLng>,
    #[serde(default)]
    pub relevance_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub recommendations: Vec<SearchRecommendation>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// A selectable search hit with pre-resolved coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: String,
    pub label: String,
    pub coordinates: Coordinates,
    pub relevance_score: f64,
}

/// Ordered results of one search. Replaced wholesale by the next search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResultSet {
    pub results: Vec<SearchResult>,
    pub explanation: Option<String>,
}

impl SearchResultSet {
    /// Builds a result set from the endpoint response, preserving the
    /// server's ordering.
    ///
    /// Recommendations without a usable location cannot be placed on the map
    /// and are dropped.
    #[must_use]
    pub fn from_response(response: SearchResponse) -> Self {
        let results = response
            .recommendations
            .into_iter()
            .filter_map(|rec| {
                let coordinates = rec.location?.to_coordinates().ok()?;
                let label = if rec.title.trim().is_empty() {
                    rec.address
                } else {
                    rec.title
                };
                Some(SearchResult {
                    id: rec.id,
                    label,
                    coordinates,
                    relevance_score: rec.relevance_score,
                })
            })
            .collect();
        Self {
            results,
            explanation: response.explanation,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SearchResult> {
        self.results.iter().find(|r| r.id == id)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
