//! SQL schema for the Ranked SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per identity-provider subject.
CREATE TABLE IF NOT EXISTS profiles (
    id            TEXT PRIMARY KEY,
    subject_id    TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL,
    display_name  TEXT,
    avatar_url    TEXT,
    rating        INTEGER NOT NULL,      -- set on insert; only the rating paths update it
    is_admin      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,         -- ISO 8601 UTC
    updated_at    TEXT NOT NULL,
    last_seen_at  TEXT NOT NULL
);

PRAGMA user_version = 1;
";

/// Column list shared by every query that materialises a full profile.
pub const PROFILE_COLUMNS: &str = "id, subject_id, email, display_name, \
  avatar_url, rating, is_admin, created_at, updated_at, last_seen_at";
