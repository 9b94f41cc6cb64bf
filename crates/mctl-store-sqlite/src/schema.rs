//! SQL schema for the Mission Control SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS sessions (
    session_id        TEXT PRIMARY KEY,
    mission_id        TEXT NOT NULL,
    mission_name      TEXT NOT NULL,
    agency            TEXT NOT NULL,
    launch_date       TEXT NOT NULL,   -- RFC 3339 UTC
    status            TEXT NOT NULL,   -- MissionStatus, lowercase
    vehicle           TEXT NOT NULL,
    payload           TEXT NOT NULL,
    destination       TEXT NOT NULL,
    launch_site       TEXT NOT NULL,
    live_stream_url   TEXT,
    mission_patch_url TEXT,
    is_live           INTEGER NOT NULL DEFAULT 0,
    iss_feed_enabled  INTEGER NOT NULL DEFAULT 1,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    expires_at        TEXT NOT NULL
);

-- Single-row pointer to the active session. Moving it is the supersede.
CREATE TABLE IF NOT EXISTS active_session (
    slot       INTEGER PRIMARY KEY CHECK (slot = 1),
    session_id TEXT NOT NULL
);

-- Sub-resources reference their session weakly: no foreign keys, so they
-- survive the deletion of a superseded session.

-- Append-only. No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS mission_updates (
    id          TEXT PRIMARY KEY,
    session_id  TEXT NOT NULL,
    update_type TEXT NOT NULL,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    author      TEXT NOT NULL,
    priority    TEXT NOT NULL,
    is_public   INTEGER NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS milestones (
    id          TEXT PRIMARY KEY,
    session_id  TEXT NOT NULL,
    name        TEXT NOT NULL,
    time_offset TEXT NOT NULL,
    status      TEXT NOT NULL,
    description TEXT NOT NULL,
    sort_order  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS weather (
    id             TEXT PRIMARY KEY,
    session_id     TEXT NOT NULL,
    temperature    REAL NOT NULL,
    wind_speed     REAL NOT NULL,
    wind_direction TEXT NOT NULL,
    visibility     REAL NOT NULL,
    humidity       REAL NOT NULL,
    conditions     TEXT NOT NULL,
    go_no_go       TEXT NOT NULL,  -- 'GO' | 'NO-GO' | 'CONDITIONAL'
    source         TEXT NOT NULL,
    recorded_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS objectives (
    session_id TEXT NOT NULL,
    objective  TEXT NOT NULL,
    sort_order INTEGER NOT NULL,
    PRIMARY KEY (session_id, sort_order)
);

-- One overlay slot and one override slot per session.
CREATE TABLE IF NOT EXISTS video_overlays (
    session_id   TEXT PRIMARY KEY,
    overlay_type TEXT NOT NULL,
    custom_text  TEXT,
    is_active    INTEGER NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS video_overrides (
    session_id TEXT PRIMARY KEY,
    url        TEXT,
    is_active  INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS iss_feeds (
    feed_id     TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    youtube_url TEXT,
    embed_url   TEXT NOT NULL,
    is_active   INTEGER NOT NULL,
    is_default  INTEGER NOT NULL,
    priority    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS launch_feed_schedules (
    launch_id           TEXT PRIMARY KEY,
    launch_name         TEXT NOT NULL,
    launch_date         TEXT NOT NULL,
    feed_url            TEXT,
    feed_id             TEXT,
    switch_time_minutes INTEGER NOT NULL,
    is_switched         INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS updates_session_idx    ON mission_updates(session_id, created_at);
CREATE INDEX IF NOT EXISTS milestones_session_idx ON milestones(session_id, sort_order);
CREATE INDEX IF NOT EXISTS weather_session_idx    ON weather(session_id, recorded_at);

PRAGMA user_version = 1;
";
