//! Patient database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::PatientRecord;
use crate::repository::PatientRepository;

impl Database {
    /// Insert or replace a patient.
    pub fn upsert_patient(&self, patient: &PatientRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO patient_data (
                pid, fname, mname, lname, dob, sex, providerID
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                patient.pid,
                patient.first_name,
                patient.middle_name,
                patient.last_name,
                patient.date_of_birth,
                patient.sex,
                patient.provider_id,
            ],
        )?;
        Ok(())
    }

    /// Register a provider and the facility they work at.
    pub fn upsert_provider(&self, provider_id: i64, facility_id: Option<i64>) -> DbResult<()> {
        if let Some(facility_id) = facility_id {
            self.conn.execute(
                "INSERT OR IGNORE INTO facility (id) VALUES (?)",
                [facility_id],
            )?;
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO users (id, facility_id) VALUES (?, ?)",
            params![provider_id, facility_id],
        )?;
        Ok(())
    }

    /// Get a patient with the facility of their primary provider.
    pub fn get_patient(&self, pid: &str) -> DbResult<Option<PatientRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT p.pid, p.fname, p.mname, p.lname, p.dob, p.sex,
                       p.providerID, f.id
                FROM patient_data AS p
                LEFT JOIN users AS d ON p.providerID = d.id
                LEFT JOIN facility AS f ON f.id = d.facility_id
                WHERE p.pid = ?
                LIMIT 1
                "#,
                [pid],
                |row| {
                    Ok(PatientRecord {
                        pid: row.get(0)?,
                        first_name: row.get(1)?,
                        middle_name: row.get(2)?,
                        last_name: row.get(3)?,
                        date_of_birth: row.get(4)?,
                        sex: row.get(5)?,
                        provider_id: row.get(6)?,
                        facility_id: row.get(7)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

impl PatientRepository for Database {
    fn get_by_id(&self, pid: &str) -> DbResult<Option<PatientRecord>> {
        self.get_patient(pid)
    }
}
