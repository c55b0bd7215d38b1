use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::models::{NewVote, Rank, TripCatalog, TripId, Vote};

/// Longest comment a voter may leave, counted in characters.
pub const MAX_COMMENT_CHARS: usize = 500;

/**
 * User-provided ballot, exactly as it arrived in the request body
 *
 * Every field is optional here so that a missing value turns into a
 * specific validation error rather than a deserialization failure.
 */
#[derive(Debug, Default, Deserialize)]
pub struct Ballot {
    /**
     * Some self-identifying name for the voter
     */
    pub name: Option<String>,
    pub rankings: Option<Rankings>,
    pub comments: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Rankings {
    pub first_choice: Option<i64>,
    pub second_choice: Option<i64>,
    pub third_choice: Option<i64>,
}

impl Ballot {
    /**
     * Check the ballot against the trip catalog and produce a storable vote
     *
     * Checks run in a fixed order: name and rankings present, each rank
     * present, ranks distinct, ranks known, comments short enough.
     */
    pub fn validate(self, trips: &TripCatalog) -> Result<NewVote, ValidationError> {
        let name = trimmed(self.name);
        let (name, rankings) = match (name, self.rankings) {
            (Some(name), Some(rankings)) => (name, rankings),
            _ => return Err(ValidationError::MissingFields),
        };

        let first = rankings
            .first_choice
            .ok_or(ValidationError::MissingRank(Rank::First))?;
        let second = rankings
            .second_choice
            .ok_or(ValidationError::MissingRank(Rank::Second))?;
        let third = rankings
            .third_choice
            .ok_or(ValidationError::MissingRank(Rank::Third))?;

        if first == second || first == third || second == third {
            return Err(ValidationError::DuplicateRank);
        }

        let first_choice = trips.resolve(first)?;
        let second_choice = trips.resolve(second)?;
        let third_choice = trips.resolve(third)?;

        let comments = trimmed(self.comments);
        if let Some(comments) = &comments {
            if comments.chars().count() > MAX_COMMENT_CHARS {
                return Err(ValidationError::CommentsTooLong {
                    max: MAX_COMMENT_CHARS,
                });
            }
        }

        Ok(NewVote {
            name,
            first_choice,
            second_choice,
            third_choice,
            comments,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/**
 * Results across every vote cast so far
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Results {
    pub total_votes: usize,
    pub trip_scores: BTreeMap<TripId, u32>,
    pub first_choice_count: BTreeMap<TripId, u32>,
    pub all_votes: Vec<Vote>,
    /**
     * Trips ordered from the highest score down
     */
    pub standings: Vec<Standing>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub trip_id: TripId,
    pub title: String,
    pub score: u32,
    pub first_choice_count: u32,
    pub first_choice_percent: u32,
}

#[derive(Debug, Serialize)]
pub struct ClearedVotes {
    pub deleted: u64,
}
