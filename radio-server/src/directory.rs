//! Station directory queries.
//!
//! Turns request parameters into predicates and runs them against a
//! [`StationRepository`].

use futures::future::try_join_all;
use tracing::debug;

use crate::domain::StationRecord;
use crate::query::{BoundingBox, Lookup, QueryError, SearchQuery, StationSort};
use crate::store::{StationRepository, StoreError};

/// Error from a directory query.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The request parameters were rejected
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The repository failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read-only station queries over a repository.
pub struct Directory<'a, R> {
    repo: &'a R,
}

impl<'a, R: StationRepository> Directory<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Free-text search.
    ///
    /// Each branch of the plan is queried concurrently and the results are
    /// concatenated in branch order. A station matching several branches
    /// appears once per branch.
    pub async fn search(&self, q: &str) -> Result<Vec<StationRecord>, DirectoryError> {
        let query = SearchQuery::parse(q)?;
        let plan = query.plan();

        debug!(terms = ?query.terms(), branches = plan.len(), "planned search");

        let branches = try_join_all(plan.iter().map(|p| self.repo.find(p))).await?;
        Ok(branches.into_iter().flatten().collect())
    }

    /// Stations inside a map viewport.
    pub async fn within(&self, bbox: &BoundingBox) -> Result<Vec<StationRecord>, DirectoryError> {
        debug!(
            sw = %bbox.sw,
            ne = %bbox.ne,
            wraps = bbox.crosses_antimeridian(),
            "bounding box query"
        );
        Ok(self.repo.find(&bbox.predicate()).await?)
    }

    /// Exact lookup by place or stream URL.
    pub async fn lookup(&self, lookup: &Lookup) -> Result<Vec<StationRecord>, DirectoryError> {
        Ok(self.repo.find(&lookup.predicate()).await?)
    }

    /// Every station, in the requested order.
    pub async fn all(&self, sort: StationSort) -> Result<Vec<StationRecord>, DirectoryError> {
        Ok(self.repo.list(sort).await?)
    }
}
