use serde::{Deserialize, Serialize};

use crate::location::{AddressDraft, Coordinates, LocationSelection};
use crate::CoreError;

/// Location portion of a listing create/edit submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingLocation {
    pub address: AddressDraft,
    pub location: Coordinates,
}

impl ListingLocation {
    /// Gate for listing submission: the form may only submit once the
    /// selection holds coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingCoordinates`] if the selection has no
    /// coordinates.
    pub fn from_selection(
        address: &AddressDraft,
        selection: &LocationSelection,
    ) -> Result<Self, CoreError> {
        let location = selection.coordinates.ok_or(CoreError::MissingCoordinates)?;
        Ok(Self {
            address: address.clone(),
            location,
        })
    }
}
