//! Users and their saved stations.

use super::StationRecord;

/// Maximum number of favourites a single user may keep.
pub const FAVOURITE_LIMIT: usize = 5;

/// A registered user.
///
/// `password` holds the PHC-format hash, never the plain password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
}

/// A user's saved association to a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favourite {
    pub id: i64,
    pub user_id: i64,
    pub station_id: i64,
}

/// A favourite joined with the station it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct FavouriteStation {
    pub favourite_id: i64,
    pub record: StationRecord,
}
