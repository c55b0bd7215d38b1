//! Table definitions and statements for each storage backend
//!
//! Both backends share one logical layout: a `votes` table keyed by a
//! generated id, with a uniqueness constraint on `name`.

pub mod sqlite {
    pub const CREATE_VOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS votes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    first_choice INTEGER NOT NULL,
    second_choice INTEGER NOT NULL,
    third_choice INTEGER NOT NULL,
    comments TEXT,
    submitted_at TEXT NOT NULL
)
"#;

    pub const INSERT_VOTE: &str = "INSERT INTO votes \
        (id, name, first_choice, second_choice, third_choice, comments, submitted_at) \
        VALUES (?, ?, ?, ?, ?, ?, ?)";

    /// Extended result code for SQLITE_CONSTRAINT_UNIQUE.
    pub const UNIQUE_VIOLATION: &str = "2067";
}

pub mod postgres {
    pub const CREATE_VOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS votes (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    first_choice INTEGER NOT NULL,
    second_choice INTEGER NOT NULL,
    third_choice INTEGER NOT NULL,
    comments TEXT,
    submitted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

    pub const INSERT_VOTE: &str = "INSERT INTO votes \
        (id, name, first_choice, second_choice, third_choice, comments, submitted_at) \
        VALUES ($1, $2, $3, $4, $5, $6, $7)";

    pub const UNIQUE_VIOLATION: &str = "23505";
}

pub const SELECT_VOTES: &str = "SELECT id, name, first_choice, second_choice, third_choice, \
    comments, submitted_at FROM votes ORDER BY submitted_at DESC, name ASC";

pub const DELETE_VOTES: &str = "DELETE FROM votes";
