//! Location model shared by the form, the reconciler and the map.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A WGS84 point.
///
/// Both components are always present and finite; a missing location is
/// `Option<Coordinates>`, never a half-filled value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

/// Ben Thanh, Ho Chi Minh City. Initial map center when none is configured.
pub const DEFAULT_MAP_CENTER: Coordinates = Coordinates {
    latitude: 10.7769,
    longitude: 106.7009,
};

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = CoreError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinates {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinates`] if either component is not
    /// finite or falls outside the valid latitude/longitude range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(CoreError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// GeoJSON position order: `[lng, lat]`.
    #[must_use]
    pub fn position(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// One editable field of an [`AddressDraft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressField {
    Street,
    Ward,
    District,
    City,
}

/// Free-text address as typed into the listing form.
///
/// `street`, `district` and `city` must be non-blank before the draft is
/// eligible for geocoding; `ward` is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDraft {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub ward: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub city: String,
}

impl AddressDraft {
    pub fn set(&mut self, field: AddressField, value: impl Into<String>) {
        let value = value.into();
        match field {
            AddressField::Street => self.street = value,
            AddressField::Ward => self.ward = value,
            AddressField::District => self.district = value,
            AddressField::City => self.city = value,
        }
    }

    #[must_use]
    pub fn get(&self, field: AddressField) -> &str {
        match field {
            AddressField::Street => &self.street,
            AddressField::Ward => &self.ward,
            AddressField::District => &self.district,
            AddressField::City => &self.city,
        }
    }

    #[must_use]
    pub fn is_eligible(&self) -> bool {
        [&self.street, &self.district, &self.city]
            .iter()
            .all(|part| !part.trim().is_empty())
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        [&self.street, &self.ward, &self.district, &self.city]
            .iter()
            .all(|part| part.trim().is_empty())
    }

    /// Comma-joined address string sent to the geocoder, skipping blank parts.
    #[must_use]
    pub fn to_query(&self) -> String {
        [&self.street, &self.ward, &self.district, &self.city]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Provenance of the current selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionSource {
    Address,
    MapPick,
    AiSearch,
    #[default]
    None,
}

impl std::fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionSource::Address => write!(f, "address"),
            SelectionSource::MapPick => write!(f, "map-pick"),
            SelectionSource::AiSearch => write!(f, "ai-search"),
            SelectionSource::None => write!(f, "none"),
        }
    }
}

/// Authoritative merged location for one form session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSelection {
    pub coordinates: Option<Coordinates>,
    pub source: SelectionSource,
    /// `true` while an address geocode or a reverse geocode is pending.
    /// Search progress is tracked separately.
    pub resolving: bool,
    pub label: String,
}

impl LocationSelection {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.coordinates.is_some() && !self.resolving
    }
}

/// The single live marker on a map instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerState {
    pub coordinates: Coordinates,
    pub draggable: bool,
}
