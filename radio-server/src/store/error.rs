//! Storage error types.

use crate::domain::FavouriteError;

/// Errors from the underlying database.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Query or connection failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed at startup
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// SQLite primary result codes for lock contention.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl StoreError {
    /// Whether the statement lost a race for the database write lock.
    pub fn is_busy(&self) -> bool {
        let StoreError::Database(sqlx::Error::Database(db)) = self else {
            return false;
        };
        db.code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
    }
}

/// Errors from saving a favourite.
#[derive(Debug, thiserror::Error)]
pub enum SaveFavouriteError {
    /// The favourites model refused the write
    #[error(transparent)]
    Rejected(#[from] FavouriteError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SaveFavouriteError {
    pub fn is_busy(&self) -> bool {
        matches!(self, SaveFavouriteError::Store(e) if e.is_busy())
    }
}

impl From<sqlx::Error> for SaveFavouriteError {
    fn from(e: sqlx::Error) -> Self {
        SaveFavouriteError::Store(StoreError::Database(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::Database(sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("database error:"));

        let err = SaveFavouriteError::Rejected(FavouriteError::LimitExceeded);
        assert_eq!(err.to_string(), "favourite limit of 5 stations reached");
    }

    #[test]
    fn only_database_errors_are_busy() {
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_busy());
        assert!(!SaveFavouriteError::Rejected(FavouriteError::LimitExceeded).is_busy());
    }
}
