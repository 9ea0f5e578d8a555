//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::domain::{Place, StationRecord};

/// `GET /search`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Free-text query
    pub q: Option<String>,
}

/// `GET /update`
#[derive(Debug, Deserialize)]
pub struct UpdateParams {
    /// South-west corner, "lat,lng"
    pub sw: Option<String>,

    /// North-east corner, "lat,lng"
    pub ne: Option<String>,
}

/// `GET /lookup`
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub city: Option<String>,
    pub state: Option<String>,
    pub stream: Option<String>,
}

/// Status flags shown on HTML pages after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub sort: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub deleted: Option<String>,
}

/// `POST /favourite`: exactly one of `add` or `delete` holds a station id.
#[derive(Debug, Deserialize)]
pub struct FavouriteForm {
    pub add: Option<String>,
    pub delete: Option<String>,
}

/// `POST /register`
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirmation: Option<String>,
}

/// `POST /login`
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,

    /// Path of the page the form was submitted from
    pub submit: Option<String>,
}

/// A station as returned by the JSON endpoints.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationJson {
    pub station_id: i64,
    pub name: String,
    pub call: String,
    pub url_site: Option<String>,
    pub url_stream: Option<String>,
    pub freq: Option<String>,

    /// Watts, as a decimal string
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub power: Option<i64>,

    pub place: Option<PlaceJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceJson {
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
}

impl From<&Place> for PlaceJson {
    fn from(place: &Place) -> Self {
        Self {
            city: place.city.clone(),
            state: place.state.clone(),
            lat: place.lat,
            lng: place.lng,
        }
    }
}

impl From<&StationRecord> for StationJson {
    fn from(record: &StationRecord) -> Self {
        let station = &record.station;
        Self {
            station_id: station.id,
            name: station.name.clone(),
            call: station.call.clone(),
            url_site: station.url_site.clone(),
            url_stream: station.url_stream.clone(),
            freq: station.freq.clone(),
            power: station.power,
            place: record.place.as_ref().map(PlaceJson::from),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::Station;

    fn record() -> StationRecord {
        StationRecord::new(
            Station {
                id: 7,
                name: "KEXP".into(),
                call: "KEXP".into(),
                place_id: Some(1),
                url_stream: Some("http://live.kexp.org/kexp128.mp3".into()),
                url_site: None,
                freq: Some("90.3 FM".into()),
                power: Some(720),
            },
            Some(Place {
                id: 1,
                city: "Seattle".into(),
                state: "WA".into(),
                lat: 47.61,
                lng: -122.33,
            }),
        )
    }

    #[test]
    fn wire_format() {
        let value = serde_json::to_value(StationJson::from(&record())).unwrap();

        assert_eq!(
            value,
            json!({
                "station_id": 7,
                "name": "KEXP",
                "call": "KEXP",
                "url_site": null,
                "url_stream": "http://live.kexp.org/kexp128.mp3",
                "freq": "90.3 FM",
                "power": "720",
                "place": {"city": "Seattle", "state": "WA", "lat": 47.61, "lng": -122.33}
            })
        );
    }

    #[test]
    fn wire_format_round_trips() {
        let station = StationJson::from(&record());
        let text = serde_json::to_string(&station).unwrap();
        let back: StationJson = serde_json::from_str(&text).unwrap();
        assert_eq!(back, station);
    }

    #[test]
    fn absent_power_and_place_are_null() {
        let mut record = record();
        record.station.power = None;
        record.place = None;

        let value = serde_json::to_value(StationJson::from(&record)).unwrap();
        assert_eq!(value["power"], serde_json::Value::Null);
        assert_eq!(value["place"], serde_json::Value::Null);
    }
}
