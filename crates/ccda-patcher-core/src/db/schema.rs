//! SQLite schema definition.

/// Host tables read by the patcher, with only the columns it uses.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Demographics
-- ============================================================================

CREATE TABLE IF NOT EXISTS facility (
    id INTEGER PRIMARY KEY,
    name TEXT
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    facility_id INTEGER REFERENCES facility(id)
);

CREATE TABLE IF NOT EXISTS patient_data (
    pid TEXT PRIMARY KEY,
    fname TEXT NOT NULL DEFAULT '',
    mname TEXT,
    lname TEXT NOT NULL DEFAULT '',
    dob TEXT,                                     -- YYYY-MM-DD
    sex TEXT,
    providerID INTEGER REFERENCES users(id)
);

-- ============================================================================
-- Clinic intake form (one row per submission, newest = highest id)
-- ============================================================================

CREATE TABLE IF NOT EXISTS form_sji_intake_core_variables (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pid TEXT NOT NULL,
    date TEXT,
    sexual_identity TEXT,
    gender_identity TEXT
);

CREATE INDEX IF NOT EXISTS idx_intake_pid ON form_sji_intake_core_variables(pid, id);

-- ============================================================================
-- Per-visit billing form
-- ============================================================================

CREATE TABLE IF NOT EXISTS form_sji_visit (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pid TEXT NOT NULL,
    date TEXT NOT NULL,                           -- visit date, may carry a time
    cpt_codes TEXT,                               -- pipe-separated entries
    icd9_primary_code TEXT,
    icd9_secondary_code TEXT,
    icd10_primary_code TEXT,
    icd10_secondary_code TEXT
);

CREATE INDEX IF NOT EXISTS idx_visit_pid_date ON form_sji_visit(pid, date);
"#;
