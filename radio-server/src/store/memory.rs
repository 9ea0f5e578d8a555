//! In-memory station repository.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::{Place, Station, StationRecord};
use crate::query::{Predicate, StationSort};

use super::StationRepository;
use super::error::StoreError;

/// Stations held in memory, evaluated with [`Predicate::matches`].
///
/// Orders results the way [`SqliteStore`](super::SqliteStore) does:
/// absent values sort first and station id breaks ties.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<StationRecord>,
}

impl MemoryStore {
    /// Join stations to places by `place_id`. Unresolved ids leave the
    /// record without a place.
    pub fn new(places: Vec<Place>, stations: Vec<Station>) -> Self {
        let places: HashMap<i64, Place> = places.into_iter().map(|p| (p.id, p)).collect();

        let records = stations
            .into_iter()
            .map(|station| {
                let place = station.place_id.and_then(|id| places.get(&id).cloned());
                StationRecord::new(station, place)
            })
            .collect();

        Self { records }
    }

    pub fn from_records(records: Vec<StationRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn compare(sort: StationSort, a: &StationRecord, b: &StationRecord) -> Ordering {
    let place = |r: &StationRecord| r.place.as_ref().map(|p| (p.state.clone(), p.city.clone()));

    let primary = match sort {
        StationSort::Place => place(a).cmp(&place(b)),
        StationSort::Name => a.station.name.cmp(&b.station.name),
        StationSort::Call => a.station.call.cmp(&b.station.call),
        StationSort::Freq => a.station.freq.cmp(&b.station.freq),
        StationSort::Power => a.station.power.cmp(&b.station.power),
    };

    primary.then_with(|| a.id().cmp(&b.id()))
}

impl StationRepository for MemoryStore {
    async fn find(&self, predicate: &Predicate) -> Result<Vec<StationRecord>, StoreError> {
        let mut found: Vec<StationRecord> = self
            .records
            .iter()
            .filter(|r| predicate.matches(r))
            .cloned()
            .collect();
        found.sort_by_key(StationRecord::id);
        Ok(found)
    }

    async fn list(&self, sort: StationSort) -> Result<Vec<StationRecord>, StoreError> {
        let mut all = self.records.clone();
        all.sort_by(|a, b| compare(sort, a, b));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Pattern, TextField};

    fn station(id: i64, name: &str, place_id: Option<i64>, power: Option<i64>) -> Station {
        Station {
            id,
            name: name.into(),
            call: name.to_uppercase(),
            place_id,
            url_stream: None,
            url_site: None,
            freq: None,
            power,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new(
            vec![
                Place {
                    id: 1,
                    city: "Seattle".into(),
                    state: "WA".into(),
                    lat: 47.61,
                    lng: -122.33,
                },
                Place {
                    id: 2,
                    city: "Austin".into(),
                    state: "TX".into(),
                    lat: 30.27,
                    lng: -97.74,
                },
            ],
            vec![
                station(3, "kexp", Some(1), Some(5_000)),
                station(1, "kut", Some(2), None),
                station(2, "lost", Some(99), Some(100)),
            ],
        )
    }

    #[test]
    fn unresolved_place_is_absent() {
        let store = store();
        assert_eq!(store.len(), 3);
        let lost = store.records.iter().find(|r| r.id() == 2).unwrap();
        assert!(lost.place.is_none());
    }

    #[tokio::test]
    async fn find_orders_by_id() {
        let store = store();
        let p = Predicate::like(TextField::Name, Pattern::prefix("k"));
        let ids: Vec<i64> = store.find(&p).await.unwrap().iter().map(StationRecord::id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn list_puts_absent_values_first() {
        let store = store();

        let by_place: Vec<i64> = store
            .list(StationSort::Place)
            .await
            .unwrap()
            .iter()
            .map(StationRecord::id)
            .collect();
        assert_eq!(by_place, vec![2, 1, 3]);

        let by_power: Vec<i64> = store
            .list(StationSort::Power)
            .await
            .unwrap()
            .iter()
            .map(StationRecord::id)
            .collect();
        assert_eq!(by_power, vec![1, 2, 3]);
    }
}
