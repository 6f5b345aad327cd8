use findnest_core::{AddressDraft, AddressField, Coordinates, SearchResult, SearchResultSet};
use findnest_geo::Route;
use findnest_map::MapEvent;

use crate::error::LocationError;
use crate::generation::Generation;

/// Every input the reconciler reacts to, user-driven or settled network
/// responses alike.
#[derive(Debug, Clone)]
pub enum LocationEvent {
    AddressFieldChanged { field: AddressField, value: String },
    /// A click on the map or the end of a marker drag.
    MapPicked(Coordinates),
    SearchSubmitted { query: String },
    SearchResultChosen(SearchResult),
    /// Draw a route from the current selection to `destination`.
    RouteRequested { destination: Coordinates },
    /// The debounce deadline passed.
    DebounceElapsed,
    Settled(Settled),
    /// The hosting form was cancelled or closed.
    Reset,
}

impl From<MapEvent> for LocationEvent {
    fn from(event: MapEvent) -> Self {
        match event {
            MapEvent::Clicked(at) | MapEvent::MarkerDragged(at) => LocationEvent::MapPicked(at),
        }
    }
}

/// A network response, tagged with the generation it was issued under.
#[derive(Debug, Clone)]
pub enum Settled {
    Geocode {
        generation: Generation,
        query: String,
        result: Result<Coordinates, LocationError>,
    },
    ReverseGeocode {
        generation: Generation,
        result: Result<AddressDraft, LocationError>,
    },
    Search {
        generation: Generation,
        query: String,
        result: Result<SearchResultSet, LocationError>,
    },
    Route {
        generation: Generation,
        result: Result<Route, LocationError>,
    },
}
