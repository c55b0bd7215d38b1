use thiserror::Error;
use tide::StatusCode;

use crate::models::Rank;

/**
 * Problems with a submitted ballot that the voter can fix and resubmit
 */
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name and rankings are required")]
    MissingFields,

    #[error("All three rankings must be provided ({0} is missing)")]
    MissingRank(Rank),

    #[error("Each trip must have a unique ranking")]
    DuplicateRank,

    #[error("Rankings must be one of the configured trip ids: {allowed}")]
    UnknownTrip { value: i64, allowed: String },

    #[error("Comments must be at most {max} characters")]
    CommentsTooLong { max: usize },
}

/**
 * Everything that can go wrong while recording or reading votes
 */
#[derive(Debug, Error)]
pub enum VoteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A vote has already been submitted with this name")]
    DuplicateName(String),

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl VoteError {
    pub fn status(&self) -> StatusCode {
        match self {
            VoteError::Validation(_) => StatusCode::BadRequest,
            VoteError::DuplicateName(_) => StatusCode::Conflict,
            VoteError::Storage(_) => StatusCode::InternalServerError,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("unsupported DATABASE_URL {0:?}, expected a sqlite: or postgres: url")]
    UnsupportedDatabase(String),

    #[error("failed to read trip options from {path}: {source}")]
    CatalogIo {
        path: String,
        source: std::io::Error,
    },

    #[error("trip options are not valid JSON: {0}")]
    CatalogParse(#[from] serde_json::Error),

    #[error("trip catalog is invalid: {0}")]
    InvalidCatalog(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            VoteError::from(ValidationError::DuplicateRank).status(),
            StatusCode::BadRequest
        );
        assert_eq!(
            VoteError::DuplicateName("Alex".into()).status(),
            StatusCode::Conflict
        );
        assert_eq!(
            VoteError::from(sqlx::Error::PoolTimedOut).status(),
            StatusCode::InternalServerError
        );
    }

    #[test]
    fn validation_messages_pass_through() {
        let err = VoteError::from(ValidationError::MissingRank(Rank::Second));
        assert_eq!(
            err.to_string(),
            "All three rankings must be provided (second_choice is missing)"
        );
    }
}
