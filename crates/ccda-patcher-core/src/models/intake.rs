//! Clinic intake form answers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The latest intake-form answer set for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeForm {
    /// Form row id (higher is newer)
    pub id: i64,
    /// Host patient identifier
    pub pid: String,
    /// When the answers were recorded (`YYYY-MM-DD`, optionally followed by a time)
    pub date: Option<String>,
    /// Free-text sexual identity answer
    pub sexual_identity: Option<String>,
    /// Free-text gender identity answer
    pub gender_identity: Option<String>,
}

impl IntakeForm {
    /// Create an empty intake form.
    pub fn new(id: i64, pid: impl Into<String>) -> Self {
        Self {
            id,
            pid: pid.into(),
            date: None,
            sexual_identity: None,
            gender_identity: None,
        }
    }

    /// Sexual identity answer, if one was given.
    pub fn sexual_identity(&self) -> Option<&str> {
        non_blank(self.sexual_identity.as_deref())
    }

    /// Gender identity answer, if one was given.
    pub fn gender_identity(&self) -> Option<&str> {
        non_blank(self.gender_identity.as_deref())
    }

    /// Recorded date with any time-of-day discarded.
    pub fn recorded_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_answers_are_absent() {
        let mut form = IntakeForm::new(1, "42");
        assert_eq!(form.sexual_identity(), None);

        form.sexual_identity = Some(String::new());
        assert_eq!(form.sexual_identity(), None);

        form.sexual_identity = Some("Pansexual".into());
        assert_eq!(form.sexual_identity(), Some("Pansexual"));
    }

    #[test]
    fn test_recorded_date_discards_time() {
        let mut form = IntakeForm::new(1, "42");
        form.date = Some("2022-03-01 14:30:00".into());
        assert_eq!(form.recorded_date(), NaiveDate::from_ymd_opt(2022, 3, 1));

        form.date = Some("not a date".into());
        assert_eq!(form.recorded_date(), None);
    }
}
