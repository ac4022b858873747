//! Encounter annotation from per-visit billing forms.

use std::sync::LazyLock;

use regex::Regex;

use super::{normalize_visit_date, PatchResult};
use crate::coding::CPT_4;
use crate::models::BillingForm;
use crate::repository::BillingFormRepository;
use crate::xml::{Element, Node};

/// Four digits followed by a digit or capital letter (`90834`, `0001F`, `0591T`).
static CPT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{4}[0-9A-Z])\b").expect("valid regex"));

/// A CPT code pulled out of a billing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CptCode {
    pub code: String,
    /// Entry text with the code removed, or the whole entry when nothing else is left
    pub display: String,
}

/// Extract the first CPT-shaped token from a free-text billing entry.
pub fn extract_cpt_code(entry: &str) -> Option<CptCode> {
    let token = CPT_TOKEN.captures(entry)?.get(1)?;

    let rest = format!("{}{}", &entry[..token.start()], &entry[token.end()..]);
    let rest = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    let display = if rest.is_empty() { entry.trim().to_string() } else { rest };

    Some(CptCode {
        code: token.as_str().to_string(),
        display,
    })
}

/// What one annotation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncounterReport {
    /// Encounters examined
    pub encounters: usize,
    /// `entryRelationship` elements appended
    pub codes_added: usize,
    /// Encounters skipped for a missing or unparseable date
    pub undated: usize,
    /// Billing entries with no CPT token
    pub unparsed_entries: usize,
    /// Narrative cells that received diagnosis codes
    pub diagnosis_cells: usize,
}

impl EncounterReport {
    pub fn changed(&self) -> bool {
        self.codes_added > 0 || self.diagnosis_cells > 0
    }
}

/// Work planned for one encounter before the section is mutated.
struct PlannedEncounter {
    relationships: Vec<Element>,
    reference: Option<String>,
    diagnoses: Vec<String>,
}

/// Attach CPT codes (and diagnosis codes) from billing forms to each encounter entry.
pub fn annotate_encounters<R>(section: &mut Element, pid: &str, billing: &R) -> PatchResult<EncounterReport>
where
    R: BillingFormRepository + ?Sized,
{
    let mut report = EncounterReport::default();
    let mut plans = Vec::new();

    for entry in section.child_elements().filter(|e| e.is("entry")) {
        let Some(encounter) = entry.child("encounter") else {
            plans.push(None);
            continue;
        };
        report.encounters += 1;

        let raw_date = encounter_time(encounter);
        let Some(date) = raw_date.and_then(normalize_visit_date) else {
            tracing::warn!(pid, date = raw_date.unwrap_or(""), "encounter has no usable date, skipping");
            report.undated += 1;
            plans.push(None);
            continue;
        };

        let forms = billing.for_visit(pid, date)?;
        if forms.is_empty() {
            tracing::debug!(pid, %date, "no billing forms for visit");
            plans.push(None);
            continue;
        }

        let mut relationships = Vec::new();
        for cpt in forms.iter().flat_map(BillingForm::cpt_entries) {
            match extract_cpt_code(cpt) {
                Some(code) => relationships.push(cpt_relationship(&code)),
                None => {
                    tracing::warn!(pid, entry = cpt, "billing entry carries no CPT code");
                    report.unparsed_entries += 1;
                }
            }
        }

        plans.push(Some(PlannedEncounter {
            relationships,
            reference: encounter_reference(encounter),
            diagnoses: visit_diagnoses(&forms),
        }));
    }

    let mut diagnosis_updates = Vec::new();
    let entries = section.child_elements_mut().filter(|e| e.is("entry"));
    for (entry, plan) in entries.zip(plans) {
        let (Some(plan), Some(encounter)) = (plan, entry.child_mut("encounter")) else {
            continue;
        };

        report.codes_added += plan.relationships.len();
        for relationship in plan.relationships {
            insert_relationship(encounter, relationship);
        }
        if let Some(reference) = plan.reference {
            if !plan.diagnoses.is_empty() {
                diagnosis_updates.push((reference, plan.diagnoses));
            }
        }
    }

    for (reference, codes) in diagnosis_updates {
        if append_diagnoses(section, &reference, &codes) {
            report.diagnosis_cells += 1;
        } else {
            tracing::debug!(pid, reference = %reference, "encounter reference does not resolve to a narrative cell");
        }
    }

    Ok(report)
}

fn encounter_time(encounter: &Element) -> Option<&str> {
    let time = encounter.child("effectiveTime")?;
    time.attr("value")
        .or_else(|| time.child("low").and_then(|low| low.attr("value")))
}

/// Encounter Diagnosis act template.
const ENCOUNTER_DIAGNOSIS_TEMPLATE: &str = "2.16.840.1.113883.10.20.22.4.80";

/// Narrative id that lists the encounter's diagnoses, without the leading `#`.
///
/// A reference inside the Encounter Diagnosis `entryRelationship` wins over the
/// encounter's own `text/reference`, which usually points at the visit description.
fn encounter_reference(encounter: &Element) -> Option<String> {
    encounter
        .child_elements()
        .filter(|e| e.is("entryRelationship") && is_diagnosis_relationship(e))
        .find_map(reference_id)
        .or_else(|| encounter.child("text").and_then(reference_id))
}

fn is_diagnosis_relationship(relationship: &Element) -> bool {
    relationship
        .find(&|e: &Element| e.is("templateId") && e.attr("root") == Some(ENCOUNTER_DIAGNOSIS_TEMPLATE))
        .is_some()
}

fn reference_id(scope: &Element) -> Option<String> {
    let id = |e: &Element| e.attr("value").map(|v| v.trim().trim_start_matches('#').to_string());
    let reference = scope.find(&|e: &Element| e.is("reference") && id(e).is_some_and(|v| !v.is_empty()))?;
    id(reference)
}

fn visit_diagnoses(forms: &[BillingForm]) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for code in forms.iter().flat_map(BillingForm::diagnosis_codes) {
        if !codes.iter().any(|c| c == code) {
            codes.push(code.to_string());
        }
    }
    codes
}

fn cpt_relationship(cpt: &CptCode) -> Element {
    Element::new("entryRelationship").with_attr("typeCode", "REFR").with_child(
        Element::new("act")
            .with_attr("classCode", "ACT")
            .with_attr("moodCode", "EVN")
            .with_child(
                Element::new("code")
                    .with_attr("code", cpt.code.as_str())
                    .with_attr("displayName", cpt.display.as_str())
                    .with_attr("codeSystem", CPT_4.oid)
                    .with_attr("codeSystemName", CPT_4.name),
            )
            .with_child(Element::new("statusCode").with_attr("code", "completed")),
    )
}

/// Relationships precede any trailing `reference`/`precondition` children.
fn insert_relationship(encounter: &mut Element, relationship: Element) {
    let tail = encounter
        .children
        .iter()
        .position(|n| matches!(n, Node::Element(e) if e.is("reference") || e.is("precondition")));
    match tail {
        Some(idx) => encounter.children.insert(idx, Node::Element(relationship)),
        None => encounter.push(relationship),
    }
}

/// Append codes not already shown to the narrative element with `ID == reference`.
fn append_diagnoses(section: &mut Element, reference: &str, codes: &[String]) -> bool {
    let Some(cell) = section
        .child_mut("text")
        .and_then(|text| text.find_mut(&|e: &Element| e.attr("ID") == Some(reference)))
    else {
        return false;
    };

    let existing = cell.text();
    let shown: Vec<&str> = existing
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .collect();
    let missing: Vec<&str> = codes
        .iter()
        .map(String::as_str)
        .filter(|code| !shown.contains(code))
        .collect();
    if missing.is_empty() {
        return false;
    }

    let separator = if existing.trim().is_empty() { "" } else { ", " };
    cell.children
        .push(Node::Text(format!("{}{}", separator, missing.join(", "))));
    true
}
