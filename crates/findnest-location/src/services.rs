use std::sync::Arc;

use findnest_geo::{FindNestApiClient, Geocoder, PlaceSearch, ReverseGeocoder, RouteProvider};

/// The remote collaborators one reconciler talks to.
#[derive(Clone)]
pub struct LocationServices {
    pub geocoder: Arc<dyn Geocoder>,
    pub reverse_geocoder: Arc<dyn ReverseGeocoder>,
    pub search: Arc<dyn PlaceSearch>,
    pub routes: Arc<dyn RouteProvider>,
}

impl LocationServices {
    /// All four services backed by one FindNest API client.
    #[must_use]
    pub fn from_client(client: &Arc<FindNestApiClient>) -> Self {
        Self {
            geocoder: Arc::clone(client) as Arc<dyn Geocoder>,
            reverse_geocoder: Arc::clone(client) as Arc<dyn ReverseGeocoder>,
            search: Arc::clone(client) as Arc<dyn PlaceSearch>,
            routes: Arc::clone(client) as Arc<dyn RouteProvider>,
        }
    }
}
