//! Save-event payload exchanged with the host.

use serde::{Deserialize, Deserializer, Serialize};

/// Payload of the host's pre-save event for a generated C-CDA.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveEvent {
    /// Serialized C-CDA document
    #[serde(rename = "CCDA")]
    pub ccda: String,
    /// Host patient identifier
    #[serde(deserialize_with = "pid_from_text_or_number")]
    pub pid: String,
}

impl SaveEvent {
    pub fn new(ccda: impl Into<String>, pid: impl Into<String>) -> Self {
        Self {
            ccda: ccda.into(),
            pid: pid.into(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Hosts send `pid` as either a string or an integer.
fn pid_from_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Pid {
        Text(String),
        Number(i64),
    }

    Ok(match Pid::deserialize(deserializer)? {
        Pid::Text(text) => text,
        Pid::Number(number) => number.to_string(),
    })
}
