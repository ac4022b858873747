//! In-memory host store.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::{BillingFormRepository, IntakeFormRepository, PatientRepository};
use crate::db::DbResult;
use crate::models::{BillingForm, IntakeForm, PatientRecord};

/// Host data held in memory, for tests and embedders without a database.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    patients: HashMap<String, PatientRecord>,
    intake_forms: Vec<IntakeForm>,
    billing_forms: Vec<BillingForm>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_patient(&mut self, patient: PatientRecord) {
        self.patients.insert(patient.pid.clone(), patient);
    }

    pub fn insert_intake_form(&mut self, form: IntakeForm) {
        self.intake_forms.push(form);
    }

    pub fn insert_billing_form(&mut self, form: BillingForm) {
        self.billing_forms.push(form);
    }
}

impl PatientRepository for MemoryStore {
    fn get_by_id(&self, pid: &str) -> DbResult<Option<PatientRecord>> {
        Ok(self.patients.get(pid).cloned())
    }
}

impl IntakeFormRepository for MemoryStore {
    fn latest_for(&self, pid: &str) -> DbResult<Option<IntakeForm>> {
        Ok(self
            .intake_forms
            .iter()
            .filter(|f| f.pid == pid)
            .max_by_key(|f| f.id)
            .cloned())
    }
}

impl BillingFormRepository for MemoryStore {
    fn for_visit(&self, pid: &str, date: NaiveDate) -> DbResult<Vec<BillingForm>> {
        let day = date.format("%Y-%m-%d").to_string();
        let mut forms: Vec<BillingForm> = self
            .billing_forms
            .iter()
            .filter(|f| f.pid == pid && f.date.get(..10).unwrap_or(&f.date) == day)
            .cloned()
            .collect();
        forms.sort_by_key(|f| f.id);
        Ok(forms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_intake_form_is_highest_id() {
        let mut store = MemoryStore::new();
        let mut older = IntakeForm::new(3, "42");
        older.sexual_identity = Some("Gay".into());
        let mut newer = IntakeForm::new(9, "42");
        newer.sexual_identity = Some("Queer".into());
        store.insert_intake_form(newer);
        store.insert_intake_form(older);
        store.insert_intake_form(IntakeForm::new(20, "other"));

        let latest = store.latest_for("42").unwrap().unwrap();
        assert_eq!(latest.id, 9);
        assert_eq!(latest.sexual_identity(), Some("Queer"));
        assert!(store.latest_for("missing").unwrap().is_none());
    }

    #[test]
    fn test_for_visit_matches_exact_date() {
        let mut store = MemoryStore::new();
        store.insert_billing_form(BillingForm::new(1, "42", "2022-03-07"));
        store.insert_billing_form(BillingForm::new(2, "42", "2022-03-08"));

        let date = NaiveDate::from_ymd_opt(2022, 3, 7).unwrap();
        let forms = store.for_visit("42", date).unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].id, 1);
    }
}
