//! Per-visit billing forms.

use serde::{Deserialize, Serialize};

/// One billing form filed for a visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingForm {
    /// Form row id
    pub id: i64,
    /// Host patient identifier
    pub pid: String,
    /// Visit date, `YYYY-MM-DD`
    pub date: String,
    /// Pipe-separated CPT entries, each free text containing a code
    /// (e.g. "Individual therapy 90834")
    pub cpt_codes: Option<String>,
    pub icd9_primary_code: Option<String>,
    pub icd9_secondary_code: Option<String>,
    pub icd10_primary_code: Option<String>,
    pub icd10_secondary_code: Option<String>,
}

impl BillingForm {
    /// Create a billing form with no codes.
    pub fn new(id: i64, pid: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id,
            pid: pid.into(),
            date: date.into(),
            cpt_codes: None,
            icd9_primary_code: None,
            icd9_secondary_code: None,
            icd10_primary_code: None,
            icd10_secondary_code: None,
        }
    }

    /// Individual CPT entries.
    pub fn cpt_entries(&self) -> Vec<&str> {
        self.cpt_codes
            .as_deref()
            .unwrap_or("")
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Diagnosis codes, preferring ICD-10 and falling back to ICD-9.
    pub fn diagnosis_codes(&self) -> Vec<&str> {
        let icd10 = present_codes([&self.icd10_primary_code, &self.icd10_secondary_code]);
        if !icd10.is_empty() {
            return icd10;
        }
        present_codes([&self.icd9_primary_code, &self.icd9_secondary_code])
    }
}

fn present_codes<'a>(codes: [&'a Option<String>; 2]) -> Vec<&'a str> {
    codes
        .into_iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}
