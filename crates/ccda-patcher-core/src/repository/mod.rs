//! Narrow read interfaces onto host-owned data.
//!
//! The patcher never talks to the host database directly; handlers depend on these traits.
//! [`crate::db::Database`] implements them over SQLite and [`MemoryStore`] in memory.

mod memory;

pub use memory::*;

use chrono::NaiveDate;

use crate::db::DbResult;
use crate::models::{BillingForm, IntakeForm, PatientRecord};

/// Patient demographics lookup.
pub trait PatientRepository {
    fn get_by_id(&self, pid: &str) -> DbResult<Option<PatientRecord>>;
}

/// Clinic intake form lookup.
pub trait IntakeFormRepository {
    /// The newest intake form for the patient, if any.
    fn latest_for(&self, pid: &str) -> DbResult<Option<IntakeForm>>;
}

/// Per-visit billing form lookup.
pub trait BillingFormRepository {
    /// Billing forms filed for the patient on exactly `date`.
    fn for_visit(&self, pid: &str, date: NaiveDate) -> DbResult<Vec<BillingForm>>;
}

/// Everything the standard handler chain reads.
pub trait HostStore: PatientRepository + IntakeFormRepository + BillingFormRepository {}

impl<T> HostStore for T where T: PatientRepository + IntakeFormRepository + BillingFormRepository {}
