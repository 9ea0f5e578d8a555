//! Boolean predicates over joined station/place records.
//!
//! The planners build predicates; repositories evaluate them. The SQLite
//! store renders them to SQL, the in-memory store calls [`Predicate::matches`].
//! Both must agree, so matching follows SQLite's `LIKE`: ASCII
//! case-insensitive, with `%` only ever appearing as the trailing wildcard of
//! a term.

use crate::domain::StationRecord;

/// Text columns a predicate can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    City,
    State,
    Name,
    Call,
    Stream,
}

impl TextField {
    /// The qualified column in the `stations s LEFT JOIN places p` query.
    pub fn column(self) -> &'static str {
        match self {
            TextField::City => "p.city",
            TextField::State => "p.state",
            TextField::Name => "s.name",
            TextField::Call => "s.\"call\"",
            TextField::Stream => "s.url_stream",
        }
    }

    /// The field's value on a record, `None` when absent or NULL.
    pub fn value(self, record: &StationRecord) -> Option<&str> {
        let place = record.place.as_ref();
        match self {
            TextField::City => place.map(|p| p.city.as_str()),
            TextField::State => place.map(|p| p.state.as_str()),
            TextField::Name => Some(record.station.name.as_str()),
            TextField::Call => Some(record.station.call.as_str()),
            TextField::Stream => record.station.url_stream.as_deref(),
        }
    }
}

/// Numeric place columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberField {
    Lat,
    Lng,
}

impl NumberField {
    pub fn column(self) -> &'static str {
        match self {
            NumberField::Lat => "p.lat",
            NumberField::Lng => "p.lng",
        }
    }

    pub fn value(self, record: &StationRecord) -> Option<f64> {
        let place = record.place.as_ref()?;
        match self {
            NumberField::Lat => Some(place.lat),
            NumberField::Lng => Some(place.lng),
        }
    }
}

/// A LIKE pattern built from one or more wildcarded terms.
///
/// `Pattern::prefix("new")` is `new%`. Concatenating terms keeps each
/// term's wildcard, so `Pattern::concat(&["new", "york"])` is `new%york%`:
/// the value starts with "new" and contains "york" somewhere after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<String>,
}

impl Pattern {
    /// A single-term prefix pattern.
    pub fn prefix(term: &str) -> Self {
        Self {
            segments: vec![term.to_string()],
        }
    }

    /// Several wildcarded terms concatenated in order.
    pub fn concat(terms: &[&str]) -> Self {
        Self {
            segments: terms.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    /// The SQL LIKE operand, e.g. `new%york%`.
    pub fn to_like(&self) -> String {
        let mut like = String::new();
        for segment in &self.segments {
            like.push_str(segment);
            like.push('%');
        }
        like
    }

    /// Whether `value` matches this pattern under LIKE semantics.
    pub fn matches(&self, value: &str) -> bool {
        let value = value.to_ascii_lowercase();
        let mut segments = self.segments.iter().map(|s| s.to_ascii_lowercase());

        let Some(first) = segments.next() else {
            return true;
        };
        if !value.starts_with(&first) {
            return false;
        }

        // Leftmost match of each later segment leaves the most room for the rest.
        let mut rest = &value[first.len()..];
        for segment in segments {
            match rest.find(&segment) {
                Some(at) => rest = &rest[at + segment.len()..],
                None => return false,
            }
        }
        true
    }
}

/// A boolean expression over a station record.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Text field matches a LIKE pattern.
    Like(TextField, Pattern),
    /// Text field equals a value exactly.
    Equals(TextField, String),
    /// Numeric field is greater than or equal to a bound.
    AtLeast(NumberField, f64),
    /// Numeric field is less than or equal to a bound.
    AtMost(NumberField, f64),
    /// The station is linked to a place.
    HasPlace,
    /// All sub-predicates hold (true when empty).
    And(Vec<Predicate>),
    /// Any sub-predicate holds (false when empty).
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn like(field: TextField, pattern: Pattern) -> Self {
        Predicate::Like(field, pattern)
    }

    pub fn equals(field: TextField, value: impl Into<String>) -> Self {
        Predicate::Equals(field, value.into())
    }

    pub fn between(field: NumberField, low: f64, high: f64) -> Self {
        Predicate::And(vec![
            Predicate::AtLeast(field, low),
            Predicate::AtMost(field, high),
        ])
    }

    /// Evaluate against a record. Absent fields never match.
    pub fn matches(&self, record: &StationRecord) -> bool {
        match self {
            Predicate::Like(field, pattern) => {
                field.value(record).is_some_and(|v| pattern.matches(v))
            }
            Predicate::Equals(field, expected) => {
                field.value(record).is_some_and(|v| v == expected)
            }
            Predicate::AtLeast(field, bound) => field.value(record).is_some_and(|v| v >= *bound),
            Predicate::AtMost(field, bound) => field.value(record).is_some_and(|v| v <= *bound),
            Predicate::HasPlace => record.place.is_some(),
            Predicate::And(all) => all.iter().all(|p| p.matches(record)),
            Predicate::Or(any) => any.iter().any(|p| p.matches(record)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Place, Station};

    fn record(name: &str, call: &str, place: Option<(&str, &str, f64, f64)>) -> StationRecord {
        let place = place.map(|(city, state, lat, lng)| Place {
            id: 1,
            city: city.into(),
            state: state.into(),
            lat,
            lng,
        });
        StationRecord::new(
            Station {
                id: 1,
                name: name.into(),
                call: call.into(),
                place_id: place.as_ref().map(|p| p.id),
                url_stream: Some("http://stream.example/kexp".into()),
                url_site: None,
                freq: None,
                power: None,
            },
            place,
        )
    }

    #[test]
    fn prefix_pattern_like_operand() {
        assert_eq!(Pattern::prefix("sea").to_like(), "sea%");
        assert_eq!(Pattern::concat(&["new", "york"]).to_like(), "new%york%");
    }

    #[test]
    fn prefix_is_case_insensitive() {
        let pattern = Pattern::prefix("sea");
        assert!(pattern.matches("Seattle"));
        assert!(pattern.matches("SEATAC"));
        assert!(!pattern.matches("Olympia"));
        assert!(!pattern.matches("se"));
    }

    #[test]
    fn concat_matches_with_or_without_gap() {
        let pattern = Pattern::concat(&["new", "york"]);
        assert!(pattern.matches("New York"));
        assert!(pattern.matches("Newyork"));
        assert!(pattern.matches("New York Mills"));
        assert!(!pattern.matches("Newark"));
        assert!(!pattern.matches("York"));
    }

    #[test]
    fn concat_segments_must_not_overlap() {
        // "aa%a%" needs three a's, two at the start.
        let pattern = Pattern::concat(&["aa", "a"]);
        assert!(!pattern.matches("aa"));
        assert!(!pattern.matches("aab"));
        assert!(pattern.matches("aaa"));
        assert!(pattern.matches("aaba"));
    }

    #[test]
    fn non_ascii_is_compared_exactly() {
        let pattern = Pattern::prefix("é");
        assert!(pattern.matches("école"));
        assert!(!pattern.matches("École"));
    }

    #[test]
    fn place_fields_absent_never_match() {
        let r = record("KEXP", "KEXP", None);
        assert!(!Predicate::like(TextField::City, Pattern::prefix("")).matches(&r));
        assert!(!Predicate::AtLeast(NumberField::Lat, -90.0).matches(&r));
        assert!(Predicate::like(TextField::Name, Pattern::prefix("kex")).matches(&r));
    }

    #[test]
    fn boolean_combinators() {
        let r = record("KEXP", "KEXP", Some(("Seattle", "WA", 47.6, -122.3)));
        let city = Predicate::like(TextField::City, Pattern::prefix("sea"));
        let state = Predicate::like(TextField::State, Pattern::prefix("or"));

        assert!(Predicate::Or(vec![city.clone(), state.clone()]).matches(&r));
        assert!(!Predicate::And(vec![city, state]).matches(&r));
        assert!(Predicate::And(vec![]).matches(&r));
        assert!(!Predicate::Or(vec![]).matches(&r));
    }

    #[test]
    fn between_is_inclusive() {
        let r = record("KEXP", "KEXP", Some(("Seattle", "WA", 47.6, -122.3)));
        assert!(Predicate::between(NumberField::Lat, 47.6, 48.0).matches(&r));
        assert!(Predicate::between(NumberField::Lng, -123.0, -122.3).matches(&r));
        assert!(!Predicate::between(NumberField::Lat, 40.0, 47.5).matches(&r));
    }

    #[test]
    fn equals_is_exact() {
        let r = record("KEXP", "KEXP", Some(("Seattle", "WA", 47.6, -122.3)));
        assert!(Predicate::equals(TextField::City, "Seattle").matches(&r));
        assert!(!Predicate::equals(TextField::City, "seattle").matches(&r));
        assert!(
            Predicate::equals(TextField::Stream, "http://stream.example/kexp").matches(&r)
        );
    }
}
