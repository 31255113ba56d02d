//! SQL schema for the rescue SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One table for all three account kinds; uniqueness is scoped per kind.
CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    kind          TEXT NOT NULL,   -- 'informant' | 'rescuer' | 'organization'
    email         TEXT NOT NULL,
    phone_number  TEXT NOT NULL,
    handle        TEXT,            -- username / rescuer name; NULL for orgs
    org_id        TEXT,            -- a rescuer's organization
    password_hash TEXT NOT NULL,
    refresh_token TEXT,
    profile_json  TEXT NOT NULL,   -- JSON-encoded Profile
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    UNIQUE (kind, email),
    UNIQUE (kind, phone_number),
    UNIQUE (kind, handle)
);

CREATE TABLE IF NOT EXISTS animals (
    animal_id      TEXT PRIMARY KEY,
    animal_type    TEXT NOT NULL,
    breed          TEXT,
    age            INTEGER,
    gender         TEXT NOT NULL,
    health_status  TEXT NOT NULL,
    location       TEXT NOT NULL,
    animal_picture TEXT NOT NULL,
    rescue_status  INTEGER NOT NULL DEFAULT 0 CHECK (rescue_status IN (0, 1)),
    informant_id   TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- Once rescued, always rescued.
CREATE TRIGGER IF NOT EXISTS animals_rescue_is_final
BEFORE UPDATE OF rescue_status ON animals
WHEN OLD.rescue_status = 1 AND NEW.rescue_status = 0
BEGIN
    SELECT RAISE(ABORT, 'rescue status cannot be reverted');
END;

-- Append-only. rescuer_id and org_id are weak references: removing a
-- rescuer from a roster keeps their rescue history.
CREATE TABLE IF NOT EXISTS rescue_assignments (
    assignment_id TEXT PRIMARY KEY,
    animal_id     TEXT NOT NULL REFERENCES animals(animal_id),
    rescuer_id    TEXT NOT NULL,
    org_id        TEXT NOT NULL,
    rescued_at    TEXT NOT NULL,
    UNIQUE (animal_id)
);

CREATE TABLE IF NOT EXISTS rescue_reports (
    report_id          TEXT PRIMARY KEY,
    animal_id          TEXT NOT NULL REFERENCES animals(animal_id),
    org_id             TEXT NOT NULL,
    description        TEXT NOT NULL,
    rescued_animal_pic TEXT NOT NULL,
    created_at         TEXT NOT NULL,
    UNIQUE (animal_id)
);

CREATE INDEX IF NOT EXISTS accounts_org_idx        ON accounts(org_id);
CREATE INDEX IF NOT EXISTS animals_created_idx     ON animals(created_at);
CREATE INDEX IF NOT EXISTS animals_status_idx      ON animals(rescue_status, created_at);
CREATE INDEX IF NOT EXISTS animals_informant_idx   ON animals(informant_id);
CREATE INDEX IF NOT EXISTS assignments_rescuer_idx ON rescue_assignments(rescuer_id);
CREATE INDEX IF NOT EXISTS assignments_org_idx     ON rescue_assignments(org_id);

PRAGMA user_version = 1;
";
