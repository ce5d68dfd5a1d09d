//! SQL schema for the canvass SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- The searchable roster. Rows are written only by the import reconciler.
-- full_name is derived from the name parts on every write, never set
-- directly.
CREATE TABLE IF NOT EXISTS records (
    record_id             TEXT PRIMARY KEY,  -- external id from the roster file
    first_name            TEXT NOT NULL DEFAULT '',
    middle_name           TEXT NOT NULL DEFAULT '',
    last_name             TEXT NOT NULL DEFAULT '',
    suffix                TEXT NOT NULL DEFAULT '',
    full_name             TEXT NOT NULL DEFAULT '',
    address               TEXT NOT NULL DEFAULT '',
    address_zip           TEXT NOT NULL DEFAULT '',  -- five digits
    address_city          TEXT NOT NULL DEFAULT '',
    address_state         TEXT NOT NULL DEFAULT '',
    address_house_num     TEXT NOT NULL DEFAULT '',
    address_street        TEXT NOT NULL DEFAULT '',
    address_street_suffix TEXT NOT NULL DEFAULT '',
    address_unit          TEXT NOT NULL DEFAULT '',
    phone                 TEXT NOT NULL DEFAULT '',
    email                 TEXT NOT NULL DEFAULT '',
    curr_reg_date         TEXT NOT NULL DEFAULT '',
    orig_reg_date         TEXT NOT NULL DEFAULT '',
    reg_status            TEXT NOT NULL DEFAULT '',  -- 'A'|'I'|'C'|'P'|''
    reg_status_reason     TEXT NOT NULL DEFAULT '',
    gender                TEXT NOT NULL DEFAULT '',
    party                 TEXT NOT NULL DEFAULT '',
    language              TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS campaigns (
    campaign_id INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    goal        INTEGER NOT NULL DEFAULT 1000
);

CREATE TABLE IF NOT EXISTS campaign_members (
    campaign_id  INTEGER NOT NULL REFERENCES campaigns(campaign_id),
    validator_id TEXT NOT NULL,
    UNIQUE (campaign_id, validator_id)
);

-- At most one confirmation per (campaign, record) pair, enforced here rather
-- than by application-level check-then-act. The constraint rides on the
-- denormalized key columns, so it survives nulling of the live links.
CREATE TABLE IF NOT EXISTS confirmations (
    confirmation_id    TEXT PRIMARY KEY,
    validator_id       TEXT,
    campaign_id        INTEGER REFERENCES campaigns(campaign_id),
    campaign_key       INTEGER NOT NULL,
    record_id          TEXT REFERENCES records(record_id),
    record_external_id TEXT NOT NULL,
    record_full_name   TEXT NOT NULL DEFAULT '',
    record_address     TEXT NOT NULL DEFAULT '',
    last_updated       TEXT NOT NULL,  -- ISO 8601 UTC
    UNIQUE (campaign_key, record_external_id)
);

CREATE INDEX IF NOT EXISTS records_zip_idx    ON records(address_zip);
CREATE INDEX IF NOT EXISTS records_status_idx ON records(reg_status);
CREATE INDEX IF NOT EXISTS records_name_idx   ON records(full_name);
CREATE INDEX IF NOT EXISTS confirmations_record_idx  ON confirmations(record_id);
CREATE INDEX IF NOT EXISTS confirmations_updated_idx ON confirmations(last_updated);

PRAGMA user_version = 1;
";
