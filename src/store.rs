use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use log::*;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::config::{Backend, DatabaseConfig};
use crate::error::VoteError;
use crate::models::{generate_uuid, NewVote, Vote};
use crate::schema;

/**
 * Durable collection of votes, unique by voter name
 *
 * The backend is chosen by configuration. Both keep name uniqueness in the
 * database itself, so concurrent submissions under one name resolve to a
 * single stored vote without any locking here.
 */
#[derive(Clone, Debug)]
pub enum VoteStore {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

impl VoteStore {
    /**
     * Create the connection pool and make sure the votes table exists
     */
    pub async fn connect(database: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let store = match database.backend {
            Backend::Sqlite => {
                let options =
                    SqliteConnectOptions::from_str(&database.url)?.create_if_missing(true);
                let pool = if database.is_in_memory() {
                    // Every connection would get its own empty database, so
                    // hold exactly one open for the life of the pool.
                    SqlitePoolOptions::new()
                        .max_connections(1)
                        .idle_timeout(None::<Duration>)
                        .max_lifetime(None::<Duration>)
                        .connect_with(options)
                        .await?
                } else {
                    SqlitePoolOptions::new()
                        .max_connections(5)
                        .connect_with(options)
                        .await?
                };
                VoteStore::Sqlite(pool)
            }
            Backend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&database.url)
                    .await?;
                VoteStore::Postgres(pool)
            }
        };

        store.migrate().await?;
        info!("Vote store ready ({:?})", database.backend);
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), sqlx::Error> {
        match self {
            VoteStore::Sqlite(pool) => {
                sqlx::query(schema::sqlite::CREATE_VOTES_TABLE)
                    .execute(pool)
                    .await?;
            }
            VoteStore::Postgres(pool) => {
                sqlx::query(schema::postgres::CREATE_VOTES_TABLE)
                    .execute(pool)
                    .await?;
            }
        }
        Ok(())
    }

    /**
     * Record a validated vote, assigning its id and submission time
     *
     * A second vote under an existing name fails with
     * `VoteError::DuplicateName`.
     */
    pub async fn submit(&self, new_vote: NewVote) -> Result<Vote, VoteError> {
        let vote = Vote {
            id: generate_uuid(),
            name: new_vote.name,
            first_choice: new_vote.first_choice,
            second_choice: new_vote.second_choice,
            third_choice: new_vote.third_choice,
            comments: new_vote.comments,
            // Postgres keeps microseconds, trimming here keeps the returned
            // record identical to what a later read sees.
            submitted_at: Utc::now().trunc_subsecs(6),
        };

        let inserted = match self {
            VoteStore::Sqlite(pool) => sqlx::query(schema::sqlite::INSERT_VOTE)
                .bind(vote.id.to_string())
                .bind(&vote.name)
                .bind(vote.first_choice)
                .bind(vote.second_choice)
                .bind(vote.third_choice)
                .bind(vote.comments.as_deref())
                .bind(vote.submitted_at)
                .execute(pool)
                .await
                .map(drop)
                .map_err(|err| classify(err, &vote.name, schema::sqlite::UNIQUE_VIOLATION)),
            VoteStore::Postgres(pool) => sqlx::query(schema::postgres::INSERT_VOTE)
                .bind(vote.id)
                .bind(&vote.name)
                .bind(vote.first_choice)
                .bind(vote.second_choice)
                .bind(vote.third_choice)
                .bind(vote.comments.as_deref())
                .bind(vote.submitted_at)
                .execute(pool)
                .await
                .map(drop)
                .map_err(|err| classify(err, &vote.name, schema::postgres::UNIQUE_VIOLATION)),
        };
        inserted?;

        debug!("Recorded vote {} for {:?}", vote.id, vote.name);
        Ok(vote)
    }

    /**
     * Every stored vote, newest first
     */
    pub async fn list_all(&self) -> Result<Vec<Vote>, VoteError> {
        let votes = match self {
            VoteStore::Sqlite(pool) => sqlx::query(schema::SELECT_VOTES)
                .fetch_all(pool)
                .await?
                .iter()
                .map(sqlite_vote)
                .collect::<Result<Vec<_>, _>>()?,
            VoteStore::Postgres(pool) => sqlx::query(schema::SELECT_VOTES)
                .fetch_all(pool)
                .await?
                .iter()
                .map(pg_vote)
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(votes)
    }

    /**
     * Delete every vote, returning how many were removed. There is no undo.
     */
    pub async fn clear_all(&self) -> Result<u64, VoteError> {
        let deleted = match self {
            VoteStore::Sqlite(pool) => sqlx::query(schema::DELETE_VOTES)
                .execute(pool)
                .await?
                .rows_affected(),
            VoteStore::Postgres(pool) => sqlx::query(schema::DELETE_VOTES)
                .execute(pool)
                .await?
                .rows_affected(),
        };
        warn!("Cleared {} votes", deleted);
        Ok(deleted)
    }
}

/**
 * Turn a unique-constraint failure into `DuplicateName`, anything else is a
 * storage failure
 */
fn classify(err: sqlx::Error, name: &str, unique_violation: &str) -> VoteError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(unique_violation) {
            return VoteError::DuplicateName(name.to_string());
        }
    }
    VoteError::Storage(err)
}

fn sqlite_vote(row: &SqliteRow) -> Result<Vote, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id).map_err(|err| sqlx::Error::ColumnDecode {
        index: "id".to_string(),
        source: Box::new(err),
    })?;

    Ok(Vote {
        id,
        name: row.try_get("name")?,
        first_choice: row.try_get("first_choice")?,
        second_choice: row.try_get("second_choice")?,
        third_choice: row.try_get("third_choice")?,
        comments: row.try_get("comments")?,
        submitted_at: row.try_get::<DateTime<Utc>, _>("submitted_at")?,
    })
}

fn pg_vote(row: &PgRow) -> Result<Vote, sqlx::Error> {
    Ok(Vote {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        first_choice: row.try_get("first_choice")?,
        second_choice: row.try_get("second_choice")?,
        third_choice: row.try_get("third_choice")?,
        comments: row.try_get("comments")?,
        submitted_at: row.try_get("submitted_at")?,
    })
}
