//! Station storage.
//!
//! Query planners hand a [`Predicate`] to a [`StationRepository`]. The
//! production repository is [`SqliteStore`]; [`MemoryStore`] evaluates the
//! same predicates over in-memory records for tests and offline use.

mod error;
mod memory;
mod sqlite;

use std::future::Future;

use crate::domain::StationRecord;
use crate::query::{Predicate, StationSort};

pub use error::{SaveFavouriteError, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Read access to stations joined with their places.
pub trait StationRepository: Send + Sync {
    /// Stations matching `predicate`, ordered by station id.
    fn find(
        &self,
        predicate: &Predicate,
    ) -> impl Future<Output = Result<Vec<StationRecord>, StoreError>> + Send;

    /// Every station in the given order.
    fn list(
        &self,
        sort: StationSort,
    ) -> impl Future<Output = Result<Vec<StationRecord>, StoreError>> + Send;
}
