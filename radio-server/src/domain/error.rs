//! Domain error types.
//!
//! These errors represent violated invariants of the favourites model.
//! They are distinct from storage errors, which wrap them.

use super::FAVOURITE_LIMIT;

/// Reasons a favourite cannot be saved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FavouriteError {
    /// The user already has the maximum number of favourites
    #[error("favourite limit of {limit} stations reached", limit = FAVOURITE_LIMIT)]
    LimitExceeded,

    /// The station is already one of the user's favourites
    #[error("station {0} is already a favourite")]
    AlreadyExists(i64),

    /// No station with this id exists
    #[error("station {0} does not exist")]
    UnknownStation(i64),
}

impl FavouriteError {
    /// Short code used in redirect query strings.
    pub fn code(&self) -> &'static str {
        match self {
            FavouriteError::LimitExceeded => "limit",
            FavouriteError::AlreadyExists(_) => "taken",
            FavouriteError::UnknownStation(_) => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FavouriteError::LimitExceeded;
        assert_eq!(err.to_string(), "favourite limit of 5 stations reached");

        let err = FavouriteError::AlreadyExists(7);
        assert_eq!(err.to_string(), "station 7 is already a favourite");

        let err = FavouriteError::UnknownStation(99);
        assert_eq!(err.to_string(), "station 99 does not exist");
    }

    #[test]
    fn redirect_codes() {
        assert_eq!(FavouriteError::LimitExceeded.code(), "limit");
        assert_eq!(FavouriteError::AlreadyExists(1).code(), "taken");
        assert_eq!(FavouriteError::UnknownStation(1).code(), "unknown");
    }
}
