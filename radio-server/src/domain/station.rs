//! Stations and the places they broadcast from.

/// A city/state/coordinate reference record.
///
/// Places are loaded once from an external dataset and never modified by
/// the application.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id: i64,
    pub city: String,
    /// Two-letter state code.
    pub state: String,
    pub lat: f64,
    pub lng: f64,
}

/// A radio station.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: i64,
    pub name: String,
    /// Call sign, e.g. "KEXP".
    pub call: String,
    pub place_id: Option<i64>,
    pub url_stream: Option<String>,
    pub url_site: Option<String>,
    /// Broadcast frequency as displayed, e.g. "90.3 FM".
    pub freq: Option<String>,
    /// Transmitter power in watts.
    pub power: Option<i64>,
}

/// A station joined with its place.
///
/// The place is absent when the station has no `place_id` or the id does
/// not resolve. Predicates on place fields never match such records.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    pub station: Station,
    pub place: Option<Place>,
}

impl StationRecord {
    pub fn new(station: Station, place: Option<Place>) -> Self {
        Self { station, place }
    }

    /// Station id, the ordering key within a query branch.
    pub fn id(&self) -> i64 {
        self.station.id
    }
}
