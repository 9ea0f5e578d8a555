//! Exact lookups and station list ordering.

use std::str::FromStr;

use super::error::QueryError;
use super::predicate::{Predicate, TextField};

/// Exact-match lookup, used when a map marker or a playing stream is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// All stations broadcasting from a city.
    Place { city: String, state: String },
    /// The station with this stream URL. Stations without a place are
    /// never returned.
    Stream(String),
}

impl Lookup {
    /// Build from the optional `city`, `state` and `stream` parameters.
    ///
    /// `stream` takes precedence when both forms are supplied. Empty values
    /// count as missing.
    pub fn from_params(
        city: Option<&str>,
        state: Option<&str>,
        stream: Option<&str>,
    ) -> Result<Self, QueryError> {
        let present = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);

        if let Some(stream) = present(stream) {
            return Ok(Lookup::Stream(stream));
        }

        match (present(city), present(state)) {
            (Some(city), Some(state)) => Ok(Lookup::Place { city, state }),
            (Some(_), None) => Err(QueryError::missing("state")),
            _ => Err(QueryError::invalid("city", "expected city and state, or stream")),
        }
    }

    pub fn predicate(&self) -> Predicate {
        match self {
            Lookup::Place { city, state } => Predicate::And(vec![
                Predicate::equals(TextField::City, city.as_str()),
                Predicate::equals(TextField::State, state.as_str()),
            ]),
            Lookup::Stream(url) => Predicate::And(vec![
                Predicate::equals(TextField::Stream, url.as_str()),
                Predicate::HasPlace,
            ]),
        }
    }
}

/// Ordering of the full station list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StationSort {
    /// By state, then city.
    #[default]
    Place,
    Name,
    Call,
    Freq,
    Power,
}

impl StationSort {
    pub fn as_str(self) -> &'static str {
        match self {
            StationSort::Place => "place",
            StationSort::Name => "name",
            StationSort::Call => "call",
            StationSort::Freq => "freq",
            StationSort::Power => "power",
        }
    }

    /// SQL `ORDER BY` terms; station id breaks ties.
    pub fn order_by(self) -> &'static str {
        match self {
            StationSort::Place => "p.state, p.city, s.id",
            StationSort::Name => "s.name, s.id",
            StationSort::Call => "s.\"call\", s.id",
            StationSort::Freq => "s.freq, s.id",
            StationSort::Power => "s.power, s.id",
        }
    }
}

impl FromStr for StationSort {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "place" => Ok(StationSort::Place),
            "name" => Ok(StationSort::Name),
            "call" => Ok(StationSort::Call),
            "freq" => Ok(StationSort::Freq),
            "power" => Ok(StationSort::Power),
            other => Err(QueryError::invalid("sort", format!("unknown sort key {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_wins_over_place() {
        let lookup = Lookup::from_params(Some("Seattle"), Some("WA"), Some("http://x/s")).unwrap();
        assert_eq!(lookup, Lookup::Stream("http://x/s".into()));
    }

    #[test]
    fn place_needs_both_parts() {
        assert_eq!(
            Lookup::from_params(Some("Seattle"), Some("WA"), None).unwrap(),
            Lookup::Place {
                city: "Seattle".into(),
                state: "WA".into()
            }
        );
        assert_eq!(
            Lookup::from_params(Some("Seattle"), None, None),
            Err(QueryError::missing("state"))
        );
        assert!(Lookup::from_params(None, Some("WA"), None).is_err());
        assert!(Lookup::from_params(None, None, Some("")).is_err());
    }

    #[test]
    fn stream_lookup_needs_a_place() {
        let predicate = Lookup::Stream("http://x/s".into()).predicate();
        assert_eq!(
            predicate,
            Predicate::And(vec![
                Predicate::equals(TextField::Stream, "http://x/s"),
                Predicate::HasPlace,
            ])
        );
    }

    #[test]
    fn sort_parses_known_keys() {
        for key in ["place", "name", "call", "freq", "power"] {
            let sort: StationSort = key.parse().unwrap();
            assert_eq!(sort.as_str(), key);
        }
    }

    #[test]
    fn sort_rejects_arbitrary_columns() {
        assert!("password".parse::<StationSort>().is_err());
        assert!("name; DROP TABLE users".parse::<StationSort>().is_err());
    }

    #[test]
    fn default_sort_is_place() {
        assert_eq!(StationSort::default(), StationSort::Place);
    }
}
