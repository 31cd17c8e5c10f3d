//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Identity provider ---------------------------------------------------------

CREATE TABLE IF NOT EXISTS accounts (
    account_id      TEXT PRIMARY KEY,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,      -- argon2 PHC string
    created_at      TEXT NOT NULL,
    failed_attempts INTEGER NOT NULL DEFAULT 0,
    locked_until    TEXT                -- RFC 3339 or NULL
);

CREATE TABLE IF NOT EXISTS password_resets (
    token_digest TEXT PRIMARY KEY,      -- hex SHA-256 of the issued token
    account_id   TEXT NOT NULL REFERENCES accounts(account_id),
    expires_at   TEXT NOT NULL,
    used_at      TEXT
);

-- Document store ------------------------------------------------------------

CREATE TABLE IF NOT EXISTS employees (
    employee_id     TEXT PRIMARY KEY,
    uid             TEXT NOT NULL UNIQUE,
    email           TEXT NOT NULL UNIQUE,
    employment_type TEXT,               -- 'FTE' | 'Intern' | NULL
    profile_json    TEXT NOT NULL,
    password_hash   TEXT,               -- legacy copy, never used to sign in
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS attendance (
    attendance_id TEXT PRIMARY KEY,
    employee_id   TEXT NOT NULL REFERENCES employees(employee_id),
    date          TEXT NOT NULL,        -- YYYY-MM-DD
    status        TEXT NOT NULL,        -- 'present' | 'absent' | 'late' | 'half-day'
    time          TEXT NOT NULL,        -- HH:MM
    captured_at   TEXT NOT NULL,
    UNIQUE (employee_id, date)
);

CREATE TABLE IF NOT EXISTS leave_requests (
    leave_id    TEXT PRIMARY KEY,
    employee_id TEXT NOT NULL REFERENCES employees(employee_id),
    start_date  TEXT NOT NULL,
    end_date    TEXT NOT NULL,
    reason      TEXT NOT NULL,
    status      TEXT NOT NULL,          -- 'pending' | 'approved' | 'rejected'
    created_at  TEXT NOT NULL,
    reviewed_at TEXT,
    CHECK (start_date <= end_date)
);

-- One row per employee, overwritten on every salary change.
CREATE TABLE IF NOT EXISTS salary_current (
    employee_id       TEXT PRIMARY KEY REFERENCES employees(employee_id),
    basic_salary      TEXT NOT NULL,    -- decimal strings
    allowances        TEXT NOT NULL,
    deductions        TEXT NOT NULL,
    in_hand_salary    TEXT NOT NULL,
    pay_date          TEXT NOT NULL,
    increment_percent TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

-- Strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS salary_history (
    entry_id          TEXT PRIMARY KEY,
    employee_id       TEXT NOT NULL REFERENCES employees(employee_id),
    basic_salary      TEXT NOT NULL,
    allowances        TEXT NOT NULL,
    deductions        TEXT NOT NULL,
    in_hand_salary    TEXT NOT NULL,
    pay_date          TEXT NOT NULL,
    increment_percent TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS attendance_date_idx     ON attendance(date);
CREATE INDEX IF NOT EXISTS leave_employee_idx      ON leave_requests(employee_id);
CREATE INDEX IF NOT EXISTS leave_status_idx        ON leave_requests(status);
CREATE INDEX IF NOT EXISTS salary_history_emp_idx  ON salary_history(employee_id);

PRAGMA user_version = 1;
";
