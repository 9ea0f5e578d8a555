//! Map viewport bounding boxes.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::error::QueryError;
use super::predicate::{NumberField, Predicate};

static COORDINATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9]+(?:\.[0-9]+)?,-?[0-9]+(?:\.[0-9]+)?$").expect("valid coordinate regex")
});

/// Error returned when parsing an invalid `lat,lng` pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinate: {reason}")]
pub struct InvalidCoordinate {
    reason: &'static str,
}

/// A `lat,lng` pair as sent by the map client.
///
/// Only plain decimal notation is accepted: no exponents, no leading `+`,
/// no whitespace.
///
/// # Examples
///
/// ```
/// use radio_server::query::Coordinate;
///
/// let c: Coordinate = "47.6,-122.3".parse().unwrap();
/// assert_eq!(c.lat, 47.6);
/// assert_eq!(c.lng, -122.3);
///
/// assert!("abc".parse::<Coordinate>().is_err());
/// assert!("47.6, -122.3".parse::<Coordinate>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl FromStr for Coordinate {
    type Err = InvalidCoordinate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !COORDINATE.is_match(s) {
            return Err(InvalidCoordinate {
                reason: "expected lat,lng in decimal degrees",
            });
        }

        let (lat, lng) = s.split_once(',').ok_or(InvalidCoordinate {
            reason: "missing comma",
        })?;
        let lat = lat.parse().map_err(|_| InvalidCoordinate {
            reason: "latitude is not a number",
        })?;
        let lng = lng.parse().map_err(|_| InvalidCoordinate {
            reason: "longitude is not a number",
        })?;

        Ok(Coordinate { lat, lng })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// The visible map area, from its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub sw: Coordinate,
    pub ne: Coordinate,
}

impl BoundingBox {
    /// Parse the `sw` and `ne` request parameters.
    pub fn parse(sw: &str, ne: &str) -> Result<Self, QueryError> {
        let sw = sw
            .parse()
            .map_err(|e: InvalidCoordinate| QueryError::invalid("sw", e.to_string()))?;
        let ne = ne
            .parse()
            .map_err(|e: InvalidCoordinate| QueryError::invalid("ne", e.to_string()))?;
        Ok(Self { sw, ne })
    }

    /// Whether the box wraps around the ±180° meridian.
    ///
    /// The map reports corners as seen, so a view over the Pacific has a
    /// western edge (e.g. 170) east of its eastern edge (e.g. -170).
    pub fn crosses_antimeridian(&self) -> bool {
        self.sw.lng > self.ne.lng
    }

    /// Predicate selecting places inside the box.
    pub fn predicate(&self) -> Predicate {
        let latitude = Predicate::between(NumberField::Lat, self.sw.lat, self.ne.lat);

        let longitude = if self.crosses_antimeridian() {
            Predicate::Or(vec![
                Predicate::AtLeast(NumberField::Lng, self.sw.lng),
                Predicate::AtMost(NumberField::Lng, self.ne.lng),
            ])
        } else {
            Predicate::between(NumberField::Lng, self.sw.lng, self.ne.lng)
        };

        Predicate::And(vec![latitude, longitude])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Place, Station, StationRecord};

    fn at(lat: f64, lng: f64) -> StationRecord {
        StationRecord::new(
            Station {
                id: 1,
                name: "Test".into(),
                call: "TEST".into(),
                place_id: Some(1),
                url_stream: None,
                url_site: None,
                freq: None,
                power: None,
            },
            Some(Place {
                id: 1,
                city: "Somewhere".into(),
                state: "ZZ".into(),
                lat,
                lng,
            }),
        )
    }

    #[test]
    fn parse_valid_coordinates() {
        assert!("10,20".parse::<Coordinate>().is_ok());
        assert!("-10.5,170.25".parse::<Coordinate>().is_ok());
        assert!("0,-0".parse::<Coordinate>().is_ok());
    }

    #[test]
    fn reject_malformed_coordinates() {
        for bad in ["abc", "", "10", "10,", ",20", "10;20", "1e5,2", "+1,2", "1.,2", ".5,2", "10, 20"] {
            assert!(bad.parse::<Coordinate>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn reject_non_ascii_digits() {
        assert!("١٠,٢٠".parse::<Coordinate>().is_err());
    }

    #[test]
    fn invalid_parameter_names_the_corner() {
        assert_eq!(
            BoundingBox::parse("abc", "20,10"),
            Err(QueryError::invalid("sw", "invalid coordinate: expected lat,lng in decimal degrees"))
        );
        assert!(matches!(
            BoundingBox::parse("10,10", "x"),
            Err(QueryError::InvalidParameter { name: "ne", .. })
        ));
    }

    #[test]
    fn normal_box() {
        let bbox = BoundingBox::parse("10,-10", "20,10").unwrap();
        assert!(!bbox.crosses_antimeridian());

        let p = bbox.predicate();
        assert!(p.matches(&at(15.0, 0.0)));
        assert!(!p.matches(&at(15.0, 20.0)));
        assert!(!p.matches(&at(25.0, 0.0)));
        assert!(p.matches(&at(10.0, -10.0)));
        assert!(p.matches(&at(20.0, 10.0)));
    }

    #[test]
    fn antimeridian_box() {
        let bbox = BoundingBox::parse("10,170", "20,-170").unwrap();
        assert!(bbox.crosses_antimeridian());

        let p = bbox.predicate();
        assert!(p.matches(&at(15.0, 175.0)));
        assert!(p.matches(&at(15.0, -175.0)));
        assert!(!p.matches(&at(15.0, 0.0)));
        assert!(!p.matches(&at(30.0, 175.0)));
    }

    #[test]
    fn display() {
        let c: Coordinate = "47.5,-122.25".parse().unwrap();
        assert_eq!(c.to_string(), "47.5,-122.25");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{Place, Station, StationRecord};
    use proptest::prelude::*;

    fn at(lat: f64, lng: f64) -> StationRecord {
        let place = Place {
            id: 1,
            city: "Somewhere".into(),
            state: "ZZ".into(),
            lat,
            lng,
        };
        let station = Station {
            id: 1,
            name: "Test".into(),
            call: "TEST".into(),
            place_id: Some(1),
            url_stream: None,
            url_site: None,
            freq: None,
            power: None,
        };
        StationRecord::new(station, Some(place))
    }

    proptest! {
        /// Display then parse returns the original coordinate
        #[test]
        fn roundtrip(lat in -90i32..=90, lng in -180i32..=180, frac in 0u8..100) {
            let s = format!("{lat}.{frac:02},{lng}");
            let c: Coordinate = s.parse().unwrap();
            prop_assert_eq!(c.to_string().parse::<Coordinate>().unwrap(), c);
        }

        /// A wrapping box selects exactly the longitudes outside the gap between its edges
        #[test]
        fn wrapping_box_selects_outside_gap(west in 1i32..179, east in -179i32..-1, lng in -180i32..=180) {
            let bbox = BoundingBox::parse(&format!("0,{west}"), &format!("10,{east}")).unwrap();
            prop_assert!(bbox.crosses_antimeridian());

            let lng = f64::from(lng);
            let in_gap = lng > f64::from(east) && lng < f64::from(west);
            prop_assert_eq!(bbox.predicate().matches(&at(5.0, lng)), !in_gap);
        }
    }
}
