//! Query parameter errors.

use super::MAX_TERMS;

/// Errors caused by malformed or missing request parameters.
///
/// These are always the client's fault and map to HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// A required parameter is missing or malformed
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The search string splits into more terms than any template handles
    #[error("too many search terms: {0} (at most {max})", max = MAX_TERMS)]
    TooManyTerms(usize),
}

impl QueryError {
    pub fn missing(name: &'static str) -> Self {
        QueryError::InvalidParameter {
            name,
            reason: "missing".to_string(),
        }
    }

    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        QueryError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Require a non-empty parameter value.
pub fn require<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, QueryError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| QueryError::missing(name))
}
