use std::collections::HashSet;
use std::convert::TryFrom;
use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigError, ValidationError};

pub type TripId = i32;

/// Trip options compiled into the binary.
const EMBEDDED_TRIP_OPTIONS: &str = include_str!("../data/trip_options.json");

/**
 * Generate a new identifier for a vote
 */
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/**
 * One of the candidate trips being voted on
 */
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TripOption {
    pub id: TripId,
    pub title: String,
    pub description: String,
    pub details: TripDetails,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    pub duration: String,
    pub location: String,
    pub activities: Vec<String>,
    pub accommodation: String,
    pub estimated_cost: String,
    pub highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenges: Option<Vec<String>>,
}

/**
 * The fixed set of trip options, loaded once at startup and shared read-only
 *
 * Construction checks that there are enough options to fill a three-way
 * ranking and that no two options share an id.
 */
#[derive(Clone, Debug)]
pub struct TripCatalog {
    options: Vec<TripOption>,
}

impl TripCatalog {
    pub fn new(options: Vec<TripOption>) -> Result<Self, ConfigError> {
        if options.len() < 3 {
            return Err(ConfigError::InvalidCatalog(format!(
                "at least 3 trip options are needed for a ranking, found {}",
                options.len()
            )));
        }

        let mut seen = HashSet::new();
        for option in options.iter() {
            if option.id <= 0 {
                return Err(ConfigError::InvalidCatalog(format!(
                    "trip id {} is not a positive integer",
                    option.id
                )));
            }
            if !seen.insert(option.id) {
                return Err(ConfigError::InvalidCatalog(format!(
                    "trip id {} appears more than once",
                    option.id
                )));
            }
        }

        Ok(Self { options })
    }

    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(EMBEDDED_TRIP_OPTIONS)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Vec<TripOption> = serde_json::from_str(json)?;
        Self::new(options)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::CatalogIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn options(&self) -> &[TripOption] {
        &self.options
    }

    pub fn contains(&self, id: TripId) -> bool {
        self.options.iter().any(|option| option.id == id)
    }

    /**
     * Map a raw ranking value onto a configured trip id
     */
    pub fn resolve(&self, value: i64) -> Result<TripId, ValidationError> {
        match TripId::try_from(value) {
            Ok(id) if self.contains(id) => Ok(id),
            _ => Err(ValidationError::UnknownTrip {
                value,
                allowed: self.id_list(),
            }),
        }
    }

    /// Comma separated ids, for error messages.
    pub fn id_list(&self) -> String {
        self.options
            .iter()
            .map(|option| option.id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/**
 * Position within a ballot
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rank {
    First,
    Second,
    Third,
}

impl Rank {
    /// Points a trip earns for being ranked in this position.
    pub fn points(self) -> u32 {
        match self {
            Rank::First => 3,
            Rank::Second => 2,
            Rank::Third => 1,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self {
            Rank::First => "first_choice",
            Rank::Second => "second_choice",
            Rank::Third => "third_choice",
        };
        f.write_str(field)
    }
}

/**
 * A validated ballot, ready to be stored
 */
#[derive(Clone, Debug, PartialEq)]
pub struct NewVote {
    pub name: String,
    pub first_choice: TripId,
    pub second_choice: TripId,
    pub third_choice: TripId,
    pub comments: Option<String>,
}

/**
 * A stored vote. Votes are never updated once written.
 */
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Vote {
    pub id: Uuid,
    pub name: String,
    pub first_choice: TripId,
    pub second_choice: TripId,
    pub third_choice: TripId,
    pub comments: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl Vote {
    /**
     * Every choice on the ballot along with the position it was ranked in
     */
    pub fn ranked(&self) -> [(Rank, TripId); 3] {
        [
            (Rank::First, self.first_choice),
            (Rank::Second, self.second_choice),
            (Rank::Third, self.third_choice),
        ]
    }
}
