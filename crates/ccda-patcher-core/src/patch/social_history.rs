//! Social History section patching.
//!
//! Every fact is written twice: as a narrative table row and as a coded `entry/observation`.
//! The row's first cell carries a `social<N>` id that the observation references, so the
//! two copies stay linked.

use chrono::NaiveDate;

use super::{hl7_date, PatchResult};
use crate::coding::{CodeMapping, CodedValue, BIRTH_SEX, GENDER_IDENTITY, LOINC, SEXUAL_ORIENTATION};
use crate::models::{IntakeForm, PatientRecord};
use crate::repository::{IntakeFormRepository, PatientRepository};
use crate::xml::{Element, Node};

/// Column headers of the default narrative table.
pub const TABLE_HEADERS: [&str; 3] = ["Social History Element", "Description", "Effective Dates"];

/// Prefix of generated narrative row ids.
pub const ROW_ID_PREFIX: &str = "social";

/// Coded observation shape for one kind of social-history fact.
#[derive(Debug)]
pub struct ObservationTemplate {
    /// Narrative row label
    pub label: &'static str,
    /// `(root, extension)` template ids
    pub template_ids: &'static [(&'static str, &'static str)],
    /// LOINC question code
    pub loinc_code: &'static str,
    pub loinc_display: &'static str,
    /// Vocabulary the answer is mapped through
    pub mapping: &'static CodeMapping,
    /// Whether the observation carries an `effectiveTime`
    pub timed: bool,
}

pub static SEXUAL_ORIENTATION_OBSERVATION: ObservationTemplate = ObservationTemplate {
    label: "Sexual Orientation",
    template_ids: &[
        ("2.16.840.1.113883.10.20.22.4.38", "2022-06-01"),
        ("2.16.840.1.113883.10.20.22.4.501", "2023-05-01"),
    ],
    loinc_code: "76690-7",
    loinc_display: "Sexual Orientation",
    mapping: &SEXUAL_ORIENTATION,
    timed: true,
};

pub static GENDER_IDENTITY_OBSERVATION: ObservationTemplate = ObservationTemplate {
    label: "Gender Identity",
    template_ids: &[("2.16.840.1.113883.10.20.34.3.45", "2022-06-01")],
    loinc_code: "76691-5",
    loinc_display: "Gender identity",
    mapping: &GENDER_IDENTITY,
    timed: true,
};

pub static BIRTH_SEX_OBSERVATION: ObservationTemplate = ObservationTemplate {
    label: "Birth Sex",
    template_ids: &[("2.16.840.1.113883.10.20.22.4.200", "2016-06-01")],
    loinc_code: "76689-9",
    loinc_display: "Sex Assigned At Birth",
    mapping: &BIRTH_SEX,
    timed: false,
};

/// Make sure the section's `text` holds a table with a body to append to.
///
/// A missing `text`, or one without a `table`, is replaced by the default table. A table
/// without a `tbody` gets one. Returns `true` if anything was changed.
pub fn ensure_table_skeleton(section: &mut Element) -> bool {
    let has_table = section
        .child("text")
        .is_some_and(|text| text.find(&|e: &Element| e.is_ignore_case("table")).is_some());

    if !has_table {
        replace_text(section, default_text());
        return true;
    }

    let Some(table) = section
        .child_mut("text")
        .and_then(|text| text.find_mut(&|e: &Element| e.is_ignore_case("table")))
    else {
        return false;
    };

    if table.child_elements().any(|e| e.is_ignore_case("tbody")) {
        return false;
    }
    table.push(Element::new("tbody").with_child(placeholder_row()));
    true
}

/// Append a sexual-orientation row and observation from the latest intake form.
///
/// Returns `false` without touching the section when the patient has no answer on file.
pub fn append_orientation_row<R>(section: &mut Element, pid: &str, intake: &R) -> PatchResult<bool>
where
    R: IntakeFormRepository + ?Sized,
{
    let Some(form) = intake.latest_for(pid)? else {
        tracing::debug!(pid, "no intake form, skipping sexual orientation");
        return Ok(false);
    };
    Ok(append_intake_fact(
        section,
        &form,
        form.sexual_identity(),
        &SEXUAL_ORIENTATION_OBSERVATION,
    ))
}

/// Append a gender-identity row and observation from the latest intake form.
pub fn append_gender_identity_row<R>(section: &mut Element, pid: &str, intake: &R) -> PatchResult<bool>
where
    R: IntakeFormRepository + ?Sized,
{
    let Some(form) = intake.latest_for(pid)? else {
        tracing::debug!(pid, "no intake form, skipping gender identity");
        return Ok(false);
    };
    Ok(append_intake_fact(
        section,
        &form,
        form.gender_identity(),
        &GENDER_IDENTITY_OBSERVATION,
    ))
}

/// Append a birth-sex row and observation from the patient's demographics.
///
/// Returns `false` when the patient is unknown or has no recorded sex.
pub fn append_birth_sex_row<R>(section: &mut Element, pid: &str, patients: &R) -> PatchResult<bool>
where
    R: PatientRepository + ?Sized,
{
    let Some(patient) = patients.get_by_id(pid)? else {
        tracing::warn!(pid, "patient not found, skipping birth sex");
        return Ok(false);
    };
    Ok(append_birth_sex_fact(section, &patient))
}

/// Append the birth-sex fact for an already loaded patient.
pub fn append_birth_sex_fact(section: &mut Element, patient: &PatientRecord) -> bool {
    let Some(sex) = patient.recorded_sex() else {
        tracing::debug!(pid = %patient.pid, "no recorded sex, skipping birth sex");
        return false;
    };

    let coded = BIRTH_SEX_OBSERVATION.mapping.lookup(sex);
    let effective = patient.date_of_birth.clone().unwrap_or_default();
    append_fact(section, &BIRTH_SEX_OBSERVATION, sex, &effective, coded, None)
}

fn append_intake_fact(
    section: &mut Element,
    form: &IntakeForm,
    answer: Option<&str>,
    template: &ObservationTemplate,
) -> bool {
    let Some(answer) = answer else {
        tracing::debug!(pid = %form.pid, fact = template.label, "no intake answer, skipping");
        return false;
    };

    let coded = template.mapping.lookup(answer);
    let recorded = form.recorded_date();
    let effective = recorded
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    append_fact(section, template, coded.display, &effective, coded, recorded)
}

/// Append one row and its observation entry.
fn append_fact(
    section: &mut Element,
    template: &ObservationTemplate,
    value: &str,
    effective: &str,
    coded: CodedValue,
    effective_date: Option<NaiveDate>,
) -> bool {
    ensure_table_skeleton(section);

    let Some(tbody) = table_body_mut(section) else {
        tracing::warn!(fact = template.label, "social history table has no body");
        return false;
    };

    remove_placeholder_rows(tbody);
    let row_id = next_row_id(tbody);
    tbody.push(
        Element::new("tr")
            .with_child(Element::new("td").with_attr("ID", row_id.as_str()).with_text(template.label))
            .with_child(Element::new("td").with_text(value))
            .with_child(Element::new("td").with_text(effective)),
    );

    let entry = Element::new("entry")
        .with_attr("typeCode", "DRIV")
        .with_child(build_observation(template, coded, effective_date, &row_id));
    insert_entry(section, entry);
    true
}

/// Next free `social<N>` id: one past the number of id-carrying cells, bumped past collisions.
pub fn next_row_id(tbody: &Element) -> String {
    let ids: Vec<&str> = tbody
        .find_all(&|e: &Element| e.is_ignore_case("td") || e.is_ignore_case("th"))
        .into_iter()
        .filter_map(|cell| cell.attr("ID"))
        .filter(|id| !id.is_empty())
        .collect();

    let mut n = ids.len() + 1;
    while ids.contains(&format!("{}{}", ROW_ID_PREFIX, n).as_str()) {
        n += 1;
    }
    format!("{}{}", ROW_ID_PREFIX, n)
}

/// Build the coded observation for one fact.
pub fn build_observation(
    template: &ObservationTemplate,
    coded: CodedValue,
    effective_date: Option<NaiveDate>,
    row_id: &str,
) -> Element {
    let mut observation = Element::new("observation")
        .with_attr("classCode", "OBS")
        .with_attr("moodCode", "EVN");

    for (root, extension) in template.template_ids {
        observation.push(
            Element::new("templateId")
                .with_attr("root", *root)
                .with_attr("extension", *extension),
        );
    }

    observation.push(Element::new("id").with_attr("root", uuid::Uuid::new_v4().to_string()));
    observation.push(
        Element::new("code")
            .with_attr("code", template.loinc_code)
            .with_attr("displayName", template.loinc_display)
            .with_attr("codeSystem", LOINC.oid)
            .with_attr("codeSystemName", LOINC.name),
    );
    observation.push(
        Element::new("text").with_child(Element::new("reference").with_attr("value", format!("#{}", row_id))),
    );
    observation.push(Element::new("statusCode").with_attr("code", "completed"));

    if template.timed {
        let low = match effective_date {
            Some(date) => Element::new("low").with_attr("value", hl7_date(date)),
            None => Element::new("low").with_attr("nullFlavor", "UNK"),
        };
        observation.push(Element::new("effectiveTime").with_child(low));
    }

    let system = template.mapping.code_system_for(&coded);
    observation.push(
        Element::new("value")
            .with_attr("xsi:type", "CD")
            .with_attr("code", coded.code)
            .with_attr("displayName", coded.display)
            .with_attr("codeSystem", system.oid)
            .with_attr("codeSystemName", system.name),
    );

    observation
}

fn table_body_mut(section: &mut Element) -> Option<&mut Element> {
    section
        .child_mut("text")?
        .find_mut(&|e: &Element| e.is_ignore_case("tbody"))
}

/// A row whose cells are all empty and unlabelled.
fn is_placeholder_row(row: &Element) -> bool {
    row.is_ignore_case("tr")
        && row
            .child_elements()
            .all(|cell| cell.attr("ID").is_none() && cell.text().trim().is_empty())
}

fn remove_placeholder_rows(tbody: &mut Element) {
    tbody.children.retain(|n| match n {
        Node::Element(row) => !is_placeholder_row(row),
        _ => true,
    });
}

fn placeholder_row() -> Element {
    Element::new("tr")
        .with_child(Element::new("td"))
        .with_child(Element::new("td"))
        .with_child(Element::new("td"))
}

fn default_text() -> Element {
    let mut header = Element::new("tr");
    for title in TABLE_HEADERS {
        header.push(Element::new("th").with_text(title));
    }

    Element::new("text").with_child(
        Element::new("table")
            .with_attr("border", "1")
            .with_attr("width", "100%")
            .with_child(Element::new("thead").with_child(header))
            .with_child(Element::new("tbody").with_child(placeholder_row())),
    )
}

/// Replace the section's `text`, or insert one after its `title` (or `code`).
fn replace_text(section: &mut Element, text: Element) {
    let position = |name: &str| {
        section
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.is(name)))
    };

    if let Some(idx) = position("text") {
        section.children[idx] = Node::Element(text);
    } else if let Some(idx) = position("title").or_else(|| position("code")) {
        section.children.insert(idx + 1, Node::Element(text));
    } else {
        section.children.insert(0, Node::Element(text));
    }
}

/// Insert after the last existing `entry`, else before nested `component`s, else at the end.
fn insert_entry(section: &mut Element, entry: Element) {
    let last_entry = section
        .children
        .iter()
        .rposition(|n| matches!(n, Node::Element(e) if e.is("entry")));
    let first_component = section
        .children
        .iter()
        .position(|n| matches!(n, Node::Element(e) if e.is("component")));

    match (last_entry, first_component) {
        (Some(idx), _) => section.children.insert(idx + 1, Node::Element(entry)),
        (None, Some(idx)) => section.children.insert(idx, Node::Element(entry)),
        (None, None) => section.push(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IntakeForm;
    use crate::repository::MemoryStore;

    fn section_with(text: Element) -> Element {
        Element::new("section")
            .with_child(Element::new("title").with_text("Social History"))
            .with_child(text)
    }

    fn rows(section: &Element) -> Vec<Vec<String>> {
        section
            .find(&|e: &Element| e.is_ignore_case("tbody"))
            .unwrap()
            .child_elements()
            .map(|tr| tr.child_elements().map(|td| td.text()).collect())
            .collect()
    }

    fn entries(section: &Element) -> usize {
        section.child_elements().filter(|e| e.is("entry")).count()
    }

    #[test]
    fn test_skeleton_built_for_empty_text() {
        let mut section = section_with(Element::new("text"));
        assert!(ensure_table_skeleton(&mut section));

        let headers: Vec<String> = section
            .find_all(&|e: &Element| e.is("th"))
            .into_iter()
            .map(|th| th.text())
            .collect();
        assert_eq!(headers, TABLE_HEADERS);
        assert_eq!(rows(&section), vec![vec![String::new(), String::new(), String::new()]]);

        // Already built: untouched
        assert!(!ensure_table_skeleton(&mut section));
    }

    #[test]
    fn test_skeleton_inserted_after_title_when_text_missing() {
        let mut section = Element::new("section")
            .with_child(Element::new("code"))
            .with_child(Element::new("title").with_text("Social History"))
            .with_child(Element::new("entry"));
        ensure_table_skeleton(&mut section);

        let names: Vec<&str> = section.child_elements().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["code", "title", "text", "entry"]);
    }

    #[test]
    fn test_skeleton_adds_missing_tbody() {
        let mut section = section_with(Element::new("text").with_child(Element::new("TABLE")));
        assert!(ensure_table_skeleton(&mut section));
        assert!(section.find(&|e: &Element| e.is("tbody")).is_some());
    }

    #[test]
    fn test_next_row_id_counts_existing() {
        let tbody = Element::new("tbody")
            .with_child(Element::new("tr").with_child(Element::new("td").with_attr("ID", "social1")))
            .with_child(Element::new("TR").with_child(Element::new("TD").with_attr("ID", "social2")));
        assert_eq!(next_row_id(&tbody), "social3");
        assert_eq!(next_row_id(&Element::new("tbody")), "social1");
    }

    #[test]
    fn test_next_row_id_skips_collisions() {
        let tbody = Element::new("tbody")
            .with_child(Element::new("tr").with_child(Element::new("td").with_attr("ID", "social2")));
        assert_eq!(next_row_id(&tbody), "social3");
    }

    #[test]
    fn test_birth_sex_row_replaces_placeholder() {
        let mut store = MemoryStore::new();
        let mut patient = PatientRecord::new("42", "Ada", "Lovelace");
        patient.sex = Some("F".into());
        patient.date_of_birth = Some("1980-01-01".into());
        store.insert_patient(patient);

        let mut section = section_with(Element::new("text"));
        assert!(append_birth_sex_row(&mut section, "42", &store).unwrap());

        assert_eq!(rows(&section), vec![vec!["Birth Sex", "F", "1980-01-01"]]);
        let cell = section.find(&|e: &Element| e.is("td")).unwrap();
        assert_eq!(cell.attr("ID"), Some("social1"));

        let value = section.find(&|e: &Element| e.is("value")).unwrap();
        assert_eq!(value.attr("code"), Some("F"));
        assert_eq!(value.attr("codeSystem"), Some("2.16.840.1.113883.5.1"));
        assert!(section.find(&|e: &Element| e.is("effectiveTime")).is_none());
    }

    #[test]
    fn test_orientation_noop_without_answer() {
        let mut store = MemoryStore::new();
        store.insert_intake_form(IntakeForm::new(1, "42"));

        let mut section = section_with(Element::new("text"));
        ensure_table_skeleton(&mut section);
        let before = section.clone();

        assert!(!append_orientation_row(&mut section, "42", &store).unwrap());
        assert!(!append_orientation_row(&mut section, "nobody", &store).unwrap());
        assert_eq!(section, before);
    }

    #[test]
    fn test_orientation_row_and_entry_linked() {
        let mut store = MemoryStore::new();
        let mut form = IntakeForm::new(1, "42");
        form.sexual_identity = Some("Gay".into());
        form.date = Some("2022-03-01".into());
        store.insert_intake_form(form);

        let mut section = section_with(Element::new("text"));
        assert!(append_orientation_row(&mut section, "42", &store).unwrap());

        assert_eq!(rows(&section), vec![vec!["Sexual Orientation", "Gay or lesbian", "2022-03-01"]]);
        assert_eq!(entries(&section), 1);

        let reference = section.find(&|e: &Element| e.is("reference")).unwrap();
        assert_eq!(reference.attr("value"), Some("#social1"));
        let low = section.find(&|e: &Element| e.is("low")).unwrap();
        assert_eq!(low.attr("value"), Some("20220301"));
        let value = section.find(&|e: &Element| e.is("value")).unwrap();
        assert_eq!(value.attr("code"), Some("38628009"));
        assert_eq!(value.attr("codeSystemName"), Some("SNOMED CT"));
    }

    #[test]
    fn test_gender_identity_after_existing_rows() {
        let mut store = MemoryStore::new();
        let mut form = IntakeForm::new(1, "42");
        form.gender_identity = Some("Non-binary".into());
        store.insert_intake_form(form);

        let tbody = Element::new("tbody").with_child(
            Element::new("tr")
                .with_child(Element::new("td").with_attr("ID", "social1").with_text("Smoking Status"))
                .with_child(Element::new("td").with_text("Never smoker"))
                .with_child(Element::new("td")),
        );
        let mut section = section_with(Element::new("text").with_child(Element::new("table").with_child(tbody)))
            .with_child(Element::new("entry"));
        assert!(append_gender_identity_row(&mut section, "42", &store).unwrap());

        let all_rows = rows(&section);
        assert_eq!(all_rows.len(), 2);
        assert_eq!(all_rows[1][0], "Gender Identity");
        assert_eq!(entries(&section), 2);

        let low = section.find(&|e: &Element| e.is("low")).unwrap();
        assert_eq!(low.attr("nullFlavor"), Some("UNK"));
    }

    #[test]
    fn test_entry_inserted_before_subsections() {
        let mut section = section_with(Element::new("text")).with_child(Element::new("component"));
        insert_entry(&mut section, Element::new("entry"));
        let names: Vec<&str> = section.child_elements().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["title", "text", "entry", "component"]);
    }
}
