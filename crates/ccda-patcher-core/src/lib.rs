//! C-CDA Patcher Core Library
//!
//! Post-processes C-CDA documents produced by an EHR host before they are saved, adding the
//! social-history and encounter detail the host generator leaves out.
//!
//! # Architecture
//!
//! ```text
//! Host pre-save event { CCDA, pid }
//!             │
//!             ▼
//!       HandlerChain ──── PatcherConfig (locator, enabled handlers)
//!             │
//!   ┌─────────┼──────────────┬──────────────┬──────────────┐
//!   ▼         ▼              ▼              ▼              ▼
//! Sexual    Gender        Birth sex     Encounters     Schema
//! orientation identity    (Social       (CPT codes,    repairs
//! (Social   (Social       History)      diagnoses)
//! History)  History)
//!   │         │              │              │
//!   └─────────┴──── HostStore (patients, intake forms, billing forms)
//! ```
//!
//! Every handler parses the current document, patches it and writes it back, so later
//! handlers see earlier patches.
//!
//! # Modules
//!
//! - [`xml`]: owned XML tree with a `quick-xml` reader/writer
//! - [`coding`]: static intake-answer vocabularies
//! - [`models`]: host records and the save-event payload
//! - [`repository`]: read interfaces onto host data, plus an in-memory store
//! - [`db`]: SQLite implementation of the repositories
//! - [`patch`]: section lookup, social history, encounters, schema repairs
//! - [`handlers`]: save handlers and the dispatch chain
//! - [`config`]: startup configuration

pub mod coding;
pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod patch;
pub mod repository;
pub mod xml;

// Re-export commonly used types
pub use coding::{CodeMapping, CodedValue, BIRTH_SEX, GENDER_IDENTITY, SEXUAL_ORIENTATION};
pub use config::{ConfigError, PatcherConfig};
pub use db::{Database, DbError};
pub use handlers::{DocumentPatcher, HandlerChain, Operation, SaveHandler};
pub use models::{BillingForm, IntakeForm, PatientRecord, SaveEvent};
pub use patch::{LocatorStrategy, PatchError, PatchResult, SectionKind, SectionLocator};
pub use repository::{
    BillingFormRepository, HostStore, IntakeFormRepository, MemoryStore, PatientRepository,
};
pub use xml::{Document, Element, XmlError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CcdaPatcherError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Document missing: {0}")]
    DocumentMissing(String),

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for CcdaPatcherError {
    fn from(e: db::DbError) -> Self {
        CcdaPatcherError::DatabaseError(e.to_string())
    }
}

impl From<PatchError> for CcdaPatcherError {
    fn from(e: PatchError) -> Self {
        match e {
            PatchError::Database(e) => e.into(),
            PatchError::Xml(e) => CcdaPatcherError::XmlError(e.to_string()),
            PatchError::DocumentMissing(pid) => CcdaPatcherError::DocumentMissing(pid),
        }
    }
}

impl From<serde_json::Error> for CcdaPatcherError {
    fn from(e: serde_json::Error) -> Self {
        CcdaPatcherError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for CcdaPatcherError {
    fn from(e: config::ConfigError) -> Self {
        CcdaPatcherError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for CcdaPatcherError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CcdaPatcherError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path, with every handler enabled.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<CcdaPatcherCore>, CcdaPatcherError> {
    let db = Database::open(&path)?;
    Ok(CcdaPatcherCore::wrap(db, PatcherConfig::default()))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<CcdaPatcherCore>, CcdaPatcherError> {
    let db = Database::open_in_memory()?;
    Ok(CcdaPatcherCore::wrap(db, PatcherConfig::default()))
}

/// Open the database and handler set named by the `CCDA_PATCHER_*` environment.
#[uniffi::export]
pub fn open_from_env() -> Result<Arc<CcdaPatcherCore>, CcdaPatcherError> {
    let config = PatcherConfig::from_env()?;
    let db = match config.db_path() {
        Some(path) => Database::open(path)?,
        None => Database::open_in_memory()?,
    };
    Ok(CcdaPatcherCore::wrap(db, config))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct CcdaPatcherCore {
    db: Arc<Mutex<Database>>,
    config: PatcherConfig,
}

impl CcdaPatcherCore {
    fn wrap(db: Database, config: PatcherConfig) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        })
    }

    fn dispatch(&self, event: &mut SaveEvent) -> Result<(), CcdaPatcherError> {
        let db = self.db.lock()?;
        HandlerChain::standard(&self.config, &*db).dispatch(event)?;
        Ok(())
    }
}

#[uniffi::export]
impl CcdaPatcherCore {
    // =========================================================================
    // Patching
    // =========================================================================

    /// Run the handler chain over a document, returning the patched document.
    pub fn patch_document(&self, ccda: String, pid: String) -> Result<String, CcdaPatcherError> {
        let mut event = SaveEvent::new(ccda, pid);
        self.dispatch(&mut event)?;
        Ok(event.ccda)
    }

    /// Run the handler chain over a JSON save event (`{"CCDA": ..., "pid": ...}`).
    pub fn patch_event_json(&self, json: String) -> Result<String, CcdaPatcherError> {
        let mut event = SaveEvent::from_json(&json)?;
        self.dispatch(&mut event)?;
        Ok(event.to_json()?)
    }

    /// Names of the registered handlers, in run order.
    pub fn handler_names(&self) -> Vec<String> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.config.is_enabled(*op))
            .map(|op| op.name().to_string())
            .collect()
    }

    // =========================================================================
    // Host Data Seeding
    // =========================================================================

    /// Add or update a patient.
    pub fn upsert_patient(&self, patient: FfiPatient) -> Result<(), CcdaPatcherError> {
        let db = self.db.lock()?;
        db.upsert_patient(&patient.into())?;
        Ok(())
    }

    /// Get a patient by host id.
    pub fn get_patient(&self, pid: String) -> Result<Option<FfiPatient>, CcdaPatcherError> {
        let db = self.db.lock()?;
        Ok(db.get_patient(&pid)?.map(|p| p.into()))
    }

    /// Record an intake form submission, returning its id.
    pub fn record_intake_form(&self, form: FfiIntakeForm) -> Result<i64, CcdaPatcherError> {
        if form.pid.trim().is_empty() {
            return Err(CcdaPatcherError::InvalidInput("intake form has no pid".into()));
        }
        let db = self.db.lock()?;
        Ok(db.insert_intake_form(
            &form.pid,
            form.date.as_deref(),
            form.sexual_identity.as_deref(),
            form.gender_identity.as_deref(),
        )?)
    }

    /// Record a visit billing form, returning its id.
    pub fn record_billing_form(&self, form: FfiBillingForm) -> Result<i64, CcdaPatcherError> {
        if form.pid.trim().is_empty() {
            return Err(CcdaPatcherError::InvalidInput("billing form has no pid".into()));
        }
        let db = self.db.lock()?;
        Ok(db.insert_billing_form(&form.into())?)
    }
}

// =========================================================================
// FFI Record Types
// =========================================================================

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub pid: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub date_of_birth: Option<String>,
    pub sex: Option<String>,
    pub provider_id: Option<i64>,
}

impl From<PatientRecord> for FfiPatient {
    fn from(p: PatientRecord) -> Self {
        Self {
            pid: p.pid,
            first_name: p.first_name,
            middle_name: p.middle_name,
            last_name: p.last_name,
            date_of_birth: p.date_of_birth,
            sex: p.sex,
            provider_id: p.provider_id,
        }
    }
}

impl From<FfiPatient> for PatientRecord {
    fn from(p: FfiPatient) -> Self {
        Self {
            pid: p.pid,
            first_name: p.first_name,
            middle_name: p.middle_name,
            last_name: p.last_name,
            date_of_birth: p.date_of_birth,
            sex: p.sex,
            provider_id: p.provider_id,
            facility_id: None,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIntakeForm {
    pub pid: String,
    pub date: Option<String>,
    pub sexual_identity: Option<String>,
    pub gender_identity: Option<String>,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBillingForm {
    pub pid: String,
    pub date: String,
    pub cpt_codes: Option<String>,
    pub icd9_primary_code: Option<String>,
    pub icd9_secondary_code: Option<String>,
    pub icd10_primary_code: Option<String>,
    pub icd10_secondary_code: Option<String>,
}

impl From<FfiBillingForm> for BillingForm {
    fn from(f: FfiBillingForm) -> Self {
        Self {
            id: 0,
            pid: f.pid,
            date: f.date,
            cpt_codes: f.cpt_codes,
            icd9_primary_code: f.icd9_primary_code,
            icd9_secondary_code: f.icd9_secondary_code,
            icd10_primary_code: f.icd10_primary_code,
            icd10_secondary_code: f.icd10_secondary_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<ClinicalDocument xmlns="urn:hl7-org:v3"><component><structuredBody><component><section><title>Social History</title><text/></section></component></structuredBody></component></ClinicalDocument>"#;

    fn seeded() -> Arc<CcdaPatcherCore> {
        let core = open_database_in_memory().unwrap();
        core.upsert_patient(FfiPatient {
            pid: "42".into(),
            first_name: "Ada".into(),
            middle_name: None,
            last_name: "Lovelace".into(),
            date_of_birth: Some("1980-01-01".into()),
            sex: Some("Female".into()),
            provider_id: None,
        })
        .unwrap();
        core
    }

    #[test]
    fn test_patch_document_over_ffi() {
        let core = seeded();
        let patched = core.patch_document(DOC.into(), "42".into()).unwrap();
        assert!(patched.contains("<td ID=\"social1\">Birth Sex</td><td>Female</td><td>1980-01-01</td>"));
        assert!(patched.contains("code=\"76689-9\""));
    }

    #[test]
    fn test_patch_event_json_round_trip() {
        let core = seeded();
        let json = SaveEvent::new(DOC, "42").to_json().unwrap();
        let patched = SaveEvent::from_json(&core.patch_event_json(json).unwrap()).unwrap();
        assert_eq!(patched.pid, "42");
        assert!(patched.ccda.contains("Birth Sex"));
    }

    #[test]
    fn test_unknown_patient_leaves_document() {
        let core = open_database_in_memory().unwrap();
        let patched = core.patch_document(DOC.into(), "7".into()).unwrap();
        assert_eq!(patched, DOC);
    }

    #[test]
    fn test_empty_document_surfaces() {
        let core = seeded();
        let err = core.patch_document(String::new(), "42".into()).unwrap_err();
        assert!(matches!(err, CcdaPatcherError::DocumentMissing(_)));
    }

    #[test]
    fn test_seeded_forms_reach_handlers() {
        let core = seeded();
        let id = core
            .record_intake_form(FfiIntakeForm {
                pid: "42".into(),
                date: Some("2022-03-01".into()),
                sexual_identity: Some("Pansexual".into()),
                gender_identity: None,
            })
            .unwrap();
        assert!(id > 0);

        let patched = core.patch_document(DOC.into(), "42".into()).unwrap();
        assert!(patched.contains("code=\"76690-7\""));
        assert!(patched.contains("code=\"OTH\""));

        let err = core
            .record_billing_form(FfiBillingForm {
                pid: " ".into(),
                date: "2022-03-07".into(),
                cpt_codes: None,
                icd9_primary_code: None,
                icd9_secondary_code: None,
                icd10_primary_code: None,
                icd10_secondary_code: None,
            })
            .unwrap_err();
        assert!(matches!(err, CcdaPatcherError::InvalidInput(_)));
    }

    #[test]
    fn test_handler_names_default() {
        let core = open_database_in_memory().unwrap();
        assert_eq!(core.handler_names().len(), 5);
    }
}
