//! Static vocabulary bindings for clinic intake answers.
//!
//! Each table maps the free text captured by the clinic's intake form to a canonical
//! `(display name, code)` pair. Lookups are exact and case-sensitive; anything not in a
//! table resolves to [`UNKNOWN`].

mod tables;

pub use tables::*;

/// Fallback for values with no binding.
pub const UNKNOWN: CodedValue = CodedValue {
    display: "unknown",
    code: "UKN",
};

/// HL7 NullFlavor codes that can appear in place of a vocabulary code.
const NULL_FLAVOR_CODES: &[&str] = &["OTH", "UKN", "UNK", "ASKU", "NI", "NA"];

/// An external code system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSystem {
    pub oid: &'static str,
    pub name: &'static str,
}

pub const SNOMED_CT: CodeSystem = CodeSystem {
    oid: "2.16.840.1.113883.6.96",
    name: "SNOMED CT",
};

pub const LOINC: CodeSystem = CodeSystem {
    oid: "2.16.840.1.113883.6.1",
    name: "LOINC",
};

pub const CPT_4: CodeSystem = CodeSystem {
    oid: "2.16.840.1.113883.6.12",
    name: "CPT-4",
};

pub const ADMINISTRATIVE_GENDER: CodeSystem = CodeSystem {
    oid: "2.16.840.1.113883.5.1",
    name: "AdministrativeGender",
};

pub const NULL_FLAVOR: CodeSystem = CodeSystem {
    oid: "2.16.840.1.113883.5.1008",
    name: "NullFlavor",
};

/// A display name and code pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodedValue {
    pub display: &'static str,
    pub code: &'static str,
}

impl CodedValue {
    /// Whether the code is an HL7 null flavor rather than a vocabulary concept.
    pub fn is_null_flavor(&self) -> bool {
        NULL_FLAVOR_CODES.contains(&self.code)
    }
}

/// One row of a mapping table: intake text, display name, code.
pub type MappingEntry = (&'static str, &'static str, &'static str);

/// An immutable intake-text → coded value table.
#[derive(Debug)]
pub struct CodeMapping {
    /// Table name used in log messages
    pub name: &'static str,
    /// Code system of the mapped (non null-flavor) codes
    pub code_system: CodeSystem,
    pub entries: &'static [MappingEntry],
}

impl CodeMapping {
    /// Exact, case-sensitive lookup.
    pub fn get(&self, value: &str) -> Option<CodedValue> {
        self.entries
            .iter()
            .find(|(key, _, _)| *key == value)
            .map(|&(_, display, code)| CodedValue { display, code })
    }

    /// Lookup with the unknown fallback.
    pub fn lookup(&self, value: &str) -> CodedValue {
        match self.get(value) {
            Some(coded) => coded,
            None => {
                match self.closest_key(value) {
                    Some(suggestion) => tracing::warn!(
                        table = self.name,
                        value,
                        suggestion,
                        "unmapped intake value, falling back to unknown"
                    ),
                    None => tracing::warn!(
                        table = self.name,
                        value,
                        "unmapped intake value, falling back to unknown"
                    ),
                }
                UNKNOWN
            }
        }
    }

    /// Code system a value should be rendered against.
    pub fn code_system_for(&self, coded: &CodedValue) -> CodeSystem {
        if coded.is_null_flavor() {
            NULL_FLAVOR
        } else {
            self.code_system
        }
    }

    /// Closest known key by Jaro-Winkler similarity, for diagnostics only.
    pub fn closest_key(&self, value: &str) -> Option<&'static str> {
        const MIN_SIMILARITY: f64 = 0.85;

        self.entries
            .iter()
            .map(|(key, _, _)| (*key, strsim::jaro_winkler(&value.to_lowercase(), &key.to_lowercase())))
            .filter(|(_, score)| *score >= MIN_SIMILARITY)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(key, _)| key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _, _)| *key)
    }
}
