//! Section lookup.
//!
//! Sections are named by [`SectionKind`]. How a `section` element is recognised is left to a
//! [`SectionLocator`]: generated documents are matched on title text today, and documents
//! that carry stable template ids can be matched on those instead.

use serde::{Deserialize, Serialize};

use crate::xml::Element;

/// Clinical topics the patcher edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    SocialHistory,
    Encounters,
}

impl SectionKind {
    /// Human-readable section title emitted by the host generator.
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::SocialHistory => "Social History",
            SectionKind::Encounters => "Encounters",
        }
    }

    /// C-CDA section template root.
    pub fn template_root(&self) -> &'static str {
        match self {
            SectionKind::SocialHistory => "2.16.840.1.113883.10.20.22.2.17",
            SectionKind::Encounters => "2.16.840.1.113883.10.20.22.2.22.1",
        }
    }
}

/// Decides whether a `section` element holds a given topic.
pub trait SectionLocator {
    fn matches(&self, section: &Element, kind: SectionKind) -> bool;
}

/// Matches on the text of the section's `title` child.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleLocator;

impl SectionLocator for TitleLocator {
    fn matches(&self, section: &Element, kind: SectionKind) -> bool {
        section
            .child("title")
            .is_some_and(|title| title.text() == kind.title())
    }
}

/// Matches on a `templateId/@root` child.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateIdLocator;

impl SectionLocator for TemplateIdLocator {
    fn matches(&self, section: &Element, kind: SectionKind) -> bool {
        section
            .child_elements()
            .any(|e| e.is("templateId") && e.attr("root") == Some(kind.template_root()))
    }
}

/// Configurable choice of locator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorStrategy {
    #[default]
    Title,
    TemplateId,
}

impl SectionLocator for LocatorStrategy {
    fn matches(&self, section: &Element, kind: SectionKind) -> bool {
        match self {
            LocatorStrategy::Title => TitleLocator.matches(section, kind),
            LocatorStrategy::TemplateId => TemplateIdLocator.matches(section, kind),
        }
    }
}

impl std::str::FromStr for LocatorStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(LocatorStrategy::Title),
            "template-id" | "templateid" => Ok(LocatorStrategy::TemplateId),
            other => Err(format!("unknown section locator: {}", other)),
        }
    }
}

/// First `component/section` in document order that holds `kind`.
pub fn find_section<'a, L>(root: &'a Element, locator: &L, kind: SectionKind) -> Option<&'a Element>
where
    L: SectionLocator + ?Sized,
{
    let is_component = root.is("component");
    for child in root.child_elements() {
        if is_component && child.is("section") && locator.matches(child, kind) {
            return Some(child);
        }
        if let Some(found) = find_section(child, locator, kind) {
            return Some(found);
        }
    }
    None
}

pub fn find_section_mut<'a, L>(root: &'a mut Element, locator: &L, kind: SectionKind) -> Option<&'a mut Element>
where
    L: SectionLocator + ?Sized,
{
    let is_component = root.is("component");
    for child in root.child_elements_mut() {
        if is_component && child.is("section") && locator.matches(child, kind) {
            return Some(child);
        }
        if let Some(found) = find_section_mut(child, locator, kind) {
            return Some(found);
        }
    }
    None
}
