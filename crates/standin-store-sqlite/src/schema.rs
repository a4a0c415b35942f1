//! SQL schema for the Standin SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    role        TEXT NOT NULL DEFAULT 'member',  -- 'admin' | 'host' | 'member'
    created_at  TEXT NOT NULL,
    attributes  TEXT NOT NULL DEFAULT '{}'       -- JSON object of custom values
);

-- Assignment history; appended in the same transaction as the job update.
CREATE TABLE IF NOT EXISTS assignments (
    user_id        TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    job_id         TEXT NOT NULL,
    meeting_title  TEXT NOT NULL,
    assigned_at    TEXT NOT NULL,
    PRIMARY KEY (user_id, job_id)
);

CREATE TABLE IF NOT EXISTS attribute_definitions (
    key            TEXT PRIMARY KEY,
    label          TEXT NOT NULL,
    attr_type      TEXT NOT NULL,
    options        TEXT NOT NULL DEFAULT '[]',
    user_editable  INTEGER NOT NULL DEFAULT 0,
    source         TEXT NOT NULL DEFAULT 'custom',
    active         INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS constraints (
    constraint_id  TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    description    TEXT,
    field_source   TEXT NOT NULL,
    field_key      TEXT NOT NULL,
    operator       TEXT NOT NULL,
    value_json     TEXT NOT NULL,
    required       INTEGER NOT NULL DEFAULT 0,
    active         INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS constraint_groups (
    group_id  TEXT PRIMARY KEY,
    name      TEXT NOT NULL
);

-- No foreign key on constraint_id: groups outlive deleted constraints.
CREATE TABLE IF NOT EXISTS constraint_group_members (
    group_id       TEXT NOT NULL REFERENCES constraint_groups(group_id) ON DELETE CASCADE,
    constraint_id  TEXT NOT NULL,
    position       INTEGER NOT NULL,
    PRIMARY KEY (group_id, constraint_id)
);

CREATE TABLE IF NOT EXISTS meetings (
    meeting_id                    TEXT PRIMARY KEY,
    title                         TEXT NOT NULL,
    event_id                      TEXT NOT NULL,
    recurring_event_id            TEXT,
    legacy_event_id               TEXT,
    starts_at                     TEXT NOT NULL,
    ends_at                       TEXT NOT NULL,
    workload_balance_window_days  INTEGER,
    fields                        TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS meeting_constraint_groups (
    meeting_id  TEXT NOT NULL REFERENCES meetings(meeting_id) ON DELETE CASCADE,
    group_id    TEXT NOT NULL,
    position    INTEGER NOT NULL,
    PRIMARY KEY (meeting_id, group_id)
);

-- The meeting snapshot is flattened into the job row.
CREATE TABLE IF NOT EXISTS jobs (
    job_id                     TEXT PRIMARY KEY,
    active                     INTEGER NOT NULL,
    title                      TEXT NOT NULL,
    event_id                   TEXT NOT NULL,
    recurring_event_id         TEXT,
    legacy_event_id            TEXT,
    starts_at                  TEXT NOT NULL,
    ends_at                    TEXT NOT NULL,
    created_by                 TEXT NOT NULL,
    created_at                 TEXT NOT NULL,
    assigned_to                TEXT,
    assigned_at                TEXT,
    posted_notice_sent         INTEGER NOT NULL DEFAULT 0,
    no_applicants_notice_sent  INTEGER NOT NULL DEFAULT 0,
    CHECK (assigned_to IS NULL OR active = 0)
);

CREATE TABLE IF NOT EXISTS applications (
    job_id      TEXT NOT NULL REFERENCES jobs(job_id) ON DELETE CASCADE,
    user_id     TEXT NOT NULL,
    applied_at  TEXT NOT NULL,
    PRIMARY KEY (job_id, user_id)
);

CREATE TABLE IF NOT EXISTS system_settings (
    key          TEXT PRIMARY KEY,
    value_json   TEXT NOT NULL,
    kind         TEXT NOT NULL DEFAULT 'string',
    description  TEXT,
    updated_at   TEXT NOT NULL
);

-- At most one active job per meeting instance and creator.
CREATE UNIQUE INDEX IF NOT EXISTS jobs_open_instance_idx
    ON jobs(event_id, starts_at, created_by) WHERE active = 1;

CREATE INDEX IF NOT EXISTS jobs_active_idx          ON jobs(active, created_at);
CREATE INDEX IF NOT EXISTS jobs_recurring_idx       ON jobs(recurring_event_id);
CREATE INDEX IF NOT EXISTS jobs_legacy_idx          ON jobs(legacy_event_id);
CREATE INDEX IF NOT EXISTS meetings_event_idx       ON meetings(event_id);
CREATE INDEX IF NOT EXISTS meetings_recurring_idx   ON meetings(recurring_event_id);
CREATE INDEX IF NOT EXISTS meetings_legacy_idx      ON meetings(legacy_event_id);
CREATE INDEX IF NOT EXISTS assignments_user_idx     ON assignments(user_id, assigned_at);

PRAGMA user_version = 1;
";
