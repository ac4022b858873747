//! Schema-repair passes.
//!
//! Each pass is stateless and idempotent, walks the whole document and is a no-op when
//! nothing matches.

use crate::xml::{Element, Node};

/// Literal the host writes in place of an unformattable timestamp.
pub const INVALID_DATE: &str = "Invalid date";

/// One repair over the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairPass {
    /// Drop empty `extension` attributes from `assignedEntity/id`.
    EmptyIdExtension,
    /// Remove `time` elements whose value is `Invalid date`.
    InvalidTime,
    /// Remove `author` elements that lack a `time` child.
    AuthorWithoutTime,
    /// Remove `component` elements with no content, innermost first.
    EmptyComponent,
    /// Give every empty `tbody` a single `tr/td`.
    EmptyTableBody,
}

impl RepairPass {
    /// Every pass, in the order [`repair_all`] runs them.
    ///
    /// Time removal precedes author removal so an author left without a valid time is
    /// dropped in the same run.
    pub const ALL: [RepairPass; 5] = [
        RepairPass::EmptyIdExtension,
        RepairPass::InvalidTime,
        RepairPass::AuthorWithoutTime,
        RepairPass::EmptyComponent,
        RepairPass::EmptyTableBody,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RepairPass::EmptyIdExtension => "empty-id-extension",
            RepairPass::InvalidTime => "invalid-time",
            RepairPass::AuthorWithoutTime => "author-without-time",
            RepairPass::EmptyComponent => "empty-component",
            RepairPass::EmptyTableBody => "empty-table-body",
        }
    }

    /// Apply the pass to `root` and its descendants. Returns the number of fixes made.
    pub fn apply(&self, root: &mut Element) -> usize {
        match self {
            RepairPass::EmptyIdExtension => drop_empty_id_extensions(root),
            RepairPass::InvalidTime => root.remove_descendants(&mut |e: &Element| {
                e.is("time") && e.attr("value").map(str::trim) == Some(INVALID_DATE)
            }),
            RepairPass::AuthorWithoutTime => {
                root.remove_descendants(&mut |e: &Element| e.is("author") && !e.has_child("time"))
            }
            RepairPass::EmptyComponent => {
                root.remove_descendants(&mut |e: &Element| e.is("component") && e.is_blank())
            }
            RepairPass::EmptyTableBody => fill_empty_table_bodies(root),
        }
    }
}

/// Fix counts per pass from one [`repair_all`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub fixes: Vec<(RepairPass, usize)>,
}

impl RepairReport {
    pub fn total(&self) -> usize {
        self.fixes.iter().map(|(_, n)| n).sum()
    }

    pub fn count(&self, pass: RepairPass) -> usize {
        self.fixes
            .iter()
            .filter(|(p, _)| *p == pass)
            .map(|(_, n)| n)
            .sum()
    }
}

/// Run every pass in [`RepairPass::ALL`] order.
pub fn repair_all(root: &mut Element) -> RepairReport {
    let mut report = RepairReport::default();
    for pass in RepairPass::ALL {
        let fixed = pass.apply(root);
        if fixed > 0 {
            tracing::debug!(pass = pass.name(), fixed, "schema repair applied");
        }
        report.fixes.push((pass, fixed));
    }
    report
}

fn drop_empty_id_extensions(root: &mut Element) -> usize {
    let mut fixed = 0;
    root.for_each_mut(&mut |e: &mut Element| {
        if !e.is("assignedEntity") {
            return;
        }
        for id in e.child_elements_mut().filter(|c| c.is("id")) {
            if id.attr("extension").is_some_and(|ext| ext.trim().is_empty()) {
                id.remove_attr("extension");
                fixed += 1;
            }
        }
    });
    fixed
}

fn fill_empty_table_bodies(root: &mut Element) -> usize {
    let mut fixed = 0;
    root.for_each_mut(&mut |e: &mut Element| {
        if e.is_ignore_case("tbody") && !e.has_element_children() {
            e.children
                .push(Node::Element(Element::new("tr").with_child(Element::new("td"))));
            fixed += 1;
        }
    });
    fixed
}
