//! Database migrations for survey-sync
//!
//! This module contains SQL migrations for the SQLite database schema.

/// SQL statement to create the initial database schema
pub const CREATE_SCHEMA: &str = r#"
-- Survey responses table
CREATE TABLE IF NOT EXISTS survey_responses (
    id TEXT PRIMARY KEY,
    farmer_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    answers_json TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    retry_count INTEGER NOT NULL DEFAULT 0,
    last_attempt_at INTEGER,
    media_paths TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS idx_responses_status ON survey_responses(status);
CREATE INDEX IF NOT EXISTS idx_responses_created ON survey_responses(created_at, id);
"#;

/// Get the migration version
pub fn migration_version() -> i32 {
    1
}
