//! Billing form database operations.

use chrono::NaiveDate;
use rusqlite::params;

use super::{Database, DbResult};
use crate::models::BillingForm;
use crate::repository::BillingFormRepository;

impl Database {
    /// Insert a billing form, returning its row id. The form's `id` is ignored.
    pub fn insert_billing_form(&self, form: &BillingForm) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO form_sji_visit (
                pid, date, cpt_codes,
                icd9_primary_code, icd9_secondary_code,
                icd10_primary_code, icd10_secondary_code
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                form.pid,
                form.date,
                form.cpt_codes,
                form.icd9_primary_code,
                form.icd9_secondary_code,
                form.icd10_primary_code,
                form.icd10_secondary_code,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Billing forms for a patient on a calendar day, oldest first.
    pub fn list_billing_forms_for_visit(&self, pid: &str, date: NaiveDate) -> DbResult<Vec<BillingForm>> {
        let day = date.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, pid, substr(date, 1, 10), cpt_codes,
                   icd9_primary_code, icd9_secondary_code,
                   icd10_primary_code, icd10_secondary_code
            FROM form_sji_visit
            WHERE pid = ? AND substr(date, 1, 10) = ?
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![pid, day], |row| {
            Ok(BillingForm {
                id: row.get(0)?,
                pid: row.get(1)?,
                date: row.get(2)?,
                cpt_codes: row.get(3)?,
                icd9_primary_code: row.get(4)?,
                icd9_secondary_code: row.get(5)?,
                icd10_primary_code: row.get(6)?,
                icd10_secondary_code: row.get(7)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl BillingFormRepository for Database {
    fn for_visit(&self, pid: &str, date: NaiveDate) -> DbResult<Vec<BillingForm>> {
        self.list_billing_forms_for_visit(pid, date)
    }
}
