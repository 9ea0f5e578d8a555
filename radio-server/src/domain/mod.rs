//! Domain types for the radio station directory.
//!
//! Places and stations are reference data; users and favourites are the
//! only records the application writes.

mod account;
mod error;
mod station;

pub use account::{FAVOURITE_LIMIT, Favourite, FavouriteStation, User};
pub use error::FavouriteError;
pub use station::{Place, Station, StationRecord};
