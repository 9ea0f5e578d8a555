//! Query planning for the station directory.
//!
//! Request parameters are turned into [`Predicate`] values here, without
//! touching storage. The free-text planner ([`SearchQuery`]) produces one
//! predicate per guess about what the user typed; the viewport selector
//! ([`BoundingBox`]) produces a single predicate that copes with views
//! spanning the antimeridian.

mod bbox;
mod error;
mod lookup;
mod predicate;
mod terms;

pub use bbox::{BoundingBox, Coordinate, InvalidCoordinate};
pub use error::{QueryError, require};
pub use lookup::{Lookup, StationSort};
pub use predicate::{NumberField, Pattern, Predicate, TextField};
pub use terms::{MAX_TERMS, SearchQuery};
