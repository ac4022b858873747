//! Intake form database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::IntakeForm;
use crate::repository::IntakeFormRepository;

impl Database {
    /// Insert an intake form submission, returning its row id.
    pub fn insert_intake_form(
        &self,
        pid: &str,
        date: Option<&str>,
        sexual_identity: Option<&str>,
        gender_identity: Option<&str>,
    ) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO form_sji_intake_core_variables (
                pid, date, sexual_identity, gender_identity
            ) VALUES (?1, ?2, ?3, ?4)
            "#,
            params![pid, date, sexual_identity, gender_identity],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get the newest intake form for a patient.
    pub fn get_latest_intake_form(&self, pid: &str) -> DbResult<Option<IntakeForm>> {
        self.conn
            .query_row(
                r#"
                SELECT id, pid, date, sexual_identity, gender_identity
                FROM form_sji_intake_core_variables
                WHERE pid = ?1
                  AND id = (SELECT MAX(id) FROM form_sji_intake_core_variables WHERE pid = ?1)
                "#,
                [pid],
                |row| {
                    Ok(IntakeForm {
                        id: row.get(0)?,
                        pid: row.get(1)?,
                        date: row.get(2)?,
                        sexual_identity: row.get(3)?,
                        gender_identity: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

impl IntakeFormRepository for Database {
    fn latest_for(&self, pid: &str) -> DbResult<Option<IntakeForm>> {
        self.get_latest_intake_form(pid)
    }
}
