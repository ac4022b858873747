//! Save-event handlers.
//!
//! The host raises one pre-save event per generated document. A [`HandlerChain`] runs
//! each registered [`SaveHandler`] over the event in order; every handler parses the
//! current document, patches it and writes it back into the event.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::PatcherConfig;
use crate::models::SaveEvent;
use crate::patch::{
    annotate_encounters, append_birth_sex_row, append_gender_identity_row, append_orientation_row,
    ensure_xsi_namespace, find_section_mut, repair_all, LocatorStrategy, PatchError, PatchResult,
    SectionKind,
};
use crate::repository::HostStore;
use crate::xml::Document;

/// A subscriber to the document pre-save event.
pub trait SaveHandler {
    fn name(&self) -> &'static str;

    /// Patch `event.ccda` in place.
    fn handle(&self, event: &mut SaveEvent) -> PatchResult<()>;
}

/// Patching operations that can be registered as handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    SexualOrientation,
    GenderIdentity,
    BirthSex,
    Encounters,
    Repairs,
}

impl Operation {
    /// Canonical registration order.
    pub const ALL: [Operation; 5] = [
        Operation::SexualOrientation,
        Operation::GenderIdentity,
        Operation::BirthSex,
        Operation::Encounters,
        Operation::Repairs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::SexualOrientation => "sexual-orientation",
            Operation::GenderIdentity => "gender-identity",
            Operation::BirthSex => "birth-sex",
            Operation::Encounters => "encounters",
            Operation::Repairs => "repairs",
        }
    }

    fn section(&self) -> Option<SectionKind> {
        match self {
            Operation::SexualOrientation | Operation::GenderIdentity | Operation::BirthSex => {
                Some(SectionKind::SocialHistory)
            }
            Operation::Encounters => Some(SectionKind::Encounters),
            Operation::Repairs => None,
        }
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == wanted)
            .ok_or_else(|| format!("unknown handler: {}", s.trim()))
    }
}

/// Runs one [`Operation`] against the host store.
pub struct DocumentPatcher<'a, S: HostStore + ?Sized> {
    operation: Operation,
    locator: LocatorStrategy,
    store: &'a S,
}

impl<'a, S: HostStore + ?Sized> DocumentPatcher<'a, S> {
    pub fn new(operation: Operation, locator: LocatorStrategy, store: &'a S) -> Self {
        Self {
            operation,
            locator,
            store,
        }
    }

    /// Apply the operation to a parsed document. Returns whether anything changed.
    ///
    /// Missing host data or a missing section leaves the document as it is.
    fn patch(&self, doc: &mut Document, pid: &str) -> PatchResult<bool> {
        let Some(kind) = self.operation.section() else {
            return Ok(repair_all(&mut doc.root).total() > 0);
        };

        let Some(section) = find_section_mut(&mut doc.root, &self.locator, kind) else {
            let patient = self
                .store
                .get_by_id(pid)?
                .map_or_else(|| pid.to_string(), |p| p.display_label());
            tracing::warn!(
                %patient,
                section = kind.title(),
                handler = self.operation.name(),
                "section not found, document unchanged"
            );
            return Ok(false);
        };

        let changed = match self.operation {
            Operation::SexualOrientation => append_orientation_row(section, pid, self.store)?,
            Operation::GenderIdentity => append_gender_identity_row(section, pid, self.store)?,
            Operation::BirthSex => append_birth_sex_row(section, pid, self.store)?,
            Operation::Encounters => annotate_encounters(section, pid, self.store)?.changed(),
            Operation::Repairs => false,
        };

        // Observation values are typed with xsi:type
        if changed && kind == SectionKind::SocialHistory {
            ensure_xsi_namespace(&mut doc.root);
        }
        Ok(changed)
    }
}

impl<'a, S: HostStore + ?Sized> SaveHandler for DocumentPatcher<'a, S> {
    fn name(&self) -> &'static str {
        self.operation.name()
    }

    fn handle(&self, event: &mut SaveEvent) -> PatchResult<()> {
        if event.ccda.trim().is_empty() {
            return Err(PatchError::DocumentMissing(event.pid.clone()));
        }

        let mut doc = Document::parse(&event.ccda)?;
        if self.patch(&mut doc, &event.pid)? {
            event.ccda = doc.to_xml()?;
            tracing::debug!(pid = %event.pid, handler = self.name(), "document patched");
        } else {
            tracing::debug!(pid = %event.pid, handler = self.name(), "nothing to patch");
        }
        Ok(())
    }
}

/// Ordered list of save handlers.
#[derive(Default)]
pub struct HandlerChain<'a> {
    handlers: Vec<Box<dyn SaveHandler + 'a>>,
}

impl<'a> HandlerChain<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The enabled operations of `config`, in canonical order, over `store`.
    pub fn standard<S>(config: &PatcherConfig, store: &'a S) -> Self
    where
        S: HostStore + ?Sized,
    {
        let mut chain = Self::new();
        for operation in Operation::ALL {
            if config.is_enabled(operation) {
                chain.register(DocumentPatcher::new(operation, config.locator, store));
            }
        }
        chain
    }

    pub fn register<H: SaveHandler + 'a>(&mut self, handler: H) -> &mut Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every handler in registration order. The first error stops the chain; patches
    /// already applied by earlier handlers stay in the event.
    pub fn dispatch(&self, event: &mut SaveEvent) -> PatchResult<()> {
        let before = fingerprint(&event.ccda);

        for handler in &self.handlers {
            if let Err(e) = handler.handle(event) {
                tracing::warn!(pid = %event.pid, handler = handler.name(), error = %e, "save handler failed");
                return Err(e);
            }
        }

        tracing::info!(
            pid = %event.pid,
            handlers = self.handlers.len(),
            before = %before,
            after = %fingerprint(&event.ccda),
            "save event patched"
        );
        Ok(())
    }
}

/// Short SHA-256 fingerprint of a document, for log correlation.
pub fn fingerprint(document: &str) -> String {
    let digest = Sha256::digest(document.as_bytes());
    hex::encode(&digest[..8])
}
