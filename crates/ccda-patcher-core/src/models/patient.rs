//! Patient demographics.

use serde::{Deserialize, Serialize};

/// Read-only projection of a host patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    /// Host patient identifier
    pub pid: String,
    /// Given name
    pub first_name: String,
    /// Middle name
    pub middle_name: Option<String>,
    /// Family name
    pub last_name: String,
    /// Date of birth, `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
    /// Administrative sex as recorded by the host (e.g. "Female", "F")
    pub sex: Option<String>,
    /// Primary provider user id
    pub provider_id: Option<i64>,
    /// Facility of the primary provider
    pub facility_id: Option<i64>,
}

impl PatientRecord {
    /// Create a patient record with required fields.
    pub fn new(pid: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            pid: pid.into(),
            first_name: first_name.into(),
            middle_name: None,
            last_name: last_name.into(),
            date_of_birth: None,
            sex: None,
            provider_id: None,
            facility_id: None,
        }
    }

    /// Label used in log messages: `"<first> <last> (<pid>) <dob>"`.
    pub fn display_label(&self) -> String {
        format!(
            "{} {} ({}) {}",
            self.first_name,
            self.last_name,
            self.pid,
            self.date_of_birth.as_deref().unwrap_or("")
        )
        .trim_end()
        .to_string()
    }

    /// Recorded sex, if non-blank.
    pub fn recorded_sex(&self) -> Option<&str> {
        self.sex.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label() {
        let mut patient = PatientRecord::new("42", "Ada", "Lovelace");
        assert_eq!(patient.display_label(), "Ada Lovelace (42)");

        patient.date_of_birth = Some("1980-01-01".into());
        assert_eq!(patient.display_label(), "Ada Lovelace (42) 1980-01-01");
    }

    #[test]
    fn test_recorded_sex_ignores_blank() {
        let mut patient = PatientRecord::new("42", "Ada", "Lovelace");
        assert_eq!(patient.recorded_sex(), None);

        patient.sex = Some("  ".into());
        assert_eq!(patient.recorded_sex(), None);

        patient.sex = Some("F".into());
        assert_eq!(patient.recorded_sex(), Some("F"));
    }
}
